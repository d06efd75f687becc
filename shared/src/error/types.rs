//! Error type surfaced to callers of the engine

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the error shape handed to outer layers, providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details for debugging
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (member ids, config family, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Whether this error signals a data-integrity problem upstream
    pub fn is_structural(&self) -> bool {
        self.code.is_structural()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    /// Create a configuration-missing error
    pub fn configuration_missing(what: impl Into<String>) -> Self {
        let w = what.into();
        Self::with_message(
            ErrorCode::ConfigurationMissing,
            format!("No active configuration: {}", w),
        )
        .with_detail("configuration", w)
    }

    /// Create a cyclic-graph error naming the revisited member
    pub fn cyclic_graph(member_id: i64) -> Self {
        Self::with_message(
            ErrorCode::CyclicGraphDetected,
            format!("Sponsor graph cycle detected at member {}", member_id),
        )
        .with_detail("member_id", member_id)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }
}

impl From<ErrorCode> for AppError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_message() {
        let err = AppError::new(ErrorCode::SaleNotFound);
        assert_eq!(err.message, "Sale not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_details_accumulate() {
        let err = AppError::cyclic_graph(7).with_detail("root_id", 1);
        let details = err.details.unwrap();
        assert_eq!(details.get("member_id"), Some(&Value::from(7)));
        assert_eq!(details.get("root_id"), Some(&Value::from(1)));
    }

    #[test]
    fn test_structural_flag_follows_code() {
        assert!(AppError::configuration_missing("CYCLE_BONUS").is_structural());
        assert!(!AppError::not_found("Member 1").is_structural());
    }
}
