//! Data models
//!
//! Shared between the commission engine and whatever layer sits in front of it.
//! Enum columns use `#[cfg_attr(feature = "db", derive(sqlx::Type))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod leadership;
pub mod member;
pub mod rate_config;
pub mod sale;
pub mod tier;

// Re-exports
pub use leadership::*;
pub use member::*;
pub use rate_config::*;
pub use sale::*;
pub use tier::*;
