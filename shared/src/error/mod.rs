//! Unified error system for the referral network platform
//!
//! This module provides the coded error shape every caller of the engine sees:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Configuration errors (rate tables, leadership ladder)
//! - 2xxx: Network errors (sponsor graph, members, sales)
//! - 9xxx: System errors
//!
//! Only structural failures are errors. "Not eligible", "not qualified" and
//! "incomplete cycle set" are ordinary results and never reach this module.
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::configuration_missing("DIRECT_SALE rate version");
//! assert_eq!(err.code, ErrorCode::ConfigurationMissing);
//! assert!(err.is_structural());
//!
//! let err = AppError::not_found("Member 42").with_detail("member_id", 42);
//! assert_eq!(err.code, ErrorCode::NotFound);
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
