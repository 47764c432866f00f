//! Portfolio Core - boot entry point
//!
//! Boots the core context the way the site does on page load and logs what
//! the cache, limiter and memo report.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_core::models::UserRecord;
use portfolio_core::helpers::percentage_default;
use portfolio_core::{Config, CoreError, Measure, SharedCore, UserService};

/// Upper bound on demo login attempts, whatever the configured limit.
const MAX_DEMO_LOGINS: u64 = 100;

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the shared core context and user service
/// 4. Boot (optionally preloading the process cache)
/// 5. Exercise login tracking and memoization, then log cache statistics
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Portfolio Core");

    let config = Config::from_env();
    info!(
        "Configuration loaded: preload={}, rate_window={}ms, login_limit={}, window_policy={}, helper_mode={}",
        config.preload,
        config.rate_window_ms,
        config.login_rate_limit,
        config.window_policy,
        config.helper_mode
    );

    let core = SharedCore::from_config(&config);
    let users = UserService::new(core.clone()).await;
    users.boot(config.preload).await.context("boot failed")?;

    users
        .register_user(&UserRecord::new("owner", "Site Owner").with_scores(vec![90.0, 85.0, 99.0]))
        .await
        .context("registering the owner profile")?;

    for attempt in 1..=config.login_rate_limit.saturating_add(1).min(MAX_DEMO_LOGINS) {
        match users.track_login("owner").await {
            Ok(()) => info!(attempt, "login tracked"),
            Err(CoreError::RateLimited(lane)) => warn!(attempt, lane = %lane, "login refused"),
            Err(e) => return Err(e).context("tracking login"),
        }
    }

    let measure = Measure::shared(21.0);
    let doubled = core.expensive_calculation(&measure).await;
    let again = core.expensive_calculation(&Arc::clone(&measure)).await;
    info!(doubled, again, "memoized calculation");

    let stats = core.cache_stats().await;
    info!(
        hit_rate_pct = percentage_default(stats.hits as f64, (stats.hits + stats.misses) as f64),
        "cache hit rate"
    );
    info!(
        "Cache stats: {}",
        serde_json::to_string(&stats).context("serializing cache stats")?
    );

    info!("Portfolio Core shutdown complete");
    Ok(())
}
