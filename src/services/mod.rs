//! Services Module
//!
//! Features built on top of the core context.
//!
//! # Services
//! - Users: login tracking, profile caching and permission checks

mod users;

pub use users::{UserService, LOGIN_LANE};
