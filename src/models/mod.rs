//! Records stored in and read back from the process cache.

pub mod user;

// Re-export commonly used types
pub use user::{LoginRecord, PreparedUser, Role, User, UserPatch, UserRecord};
