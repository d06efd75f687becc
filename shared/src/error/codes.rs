//! Unified error codes
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Configuration errors
//! - 2xxx: Network errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Configuration ====================
    /// No active version exists for a rate family or leadership level
    ConfigurationMissing = 1001,
    /// A rate table failed validation and was not published
    InvalidRateTable = 1002,
    /// A leadership level definition failed validation
    InvalidLevelDefinition = 1003,

    // ==================== 2xxx: Network ====================
    /// The sponsor graph contains a cycle
    CyclicGraphDetected = 2001,
    /// Member not found in the directory
    MemberNotFound = 2002,
    /// Sale event not found
    SaleNotFound = 2003,
    /// Sale is not credited to the requested member
    SaleNotCredited = 2004,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Startup configuration (environment) error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Data-integrity failures that must reach an operator.
    #[inline]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            ErrorCode::ConfigurationMissing | ErrorCode::CyclicGraphDetected
        )
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",

            // Configuration
            ErrorCode::ConfigurationMissing => "Required configuration has no active version",
            ErrorCode::InvalidRateTable => "Rate table is invalid",
            ErrorCode::InvalidLevelDefinition => "Leadership level definition is invalid",

            // Network
            ErrorCode::CyclicGraphDetected => "Sponsor graph contains a cycle",
            ErrorCode::MemberNotFound => "Member not found",
            ErrorCode::SaleNotFound => "Sale not found",
            ErrorCode::SaleNotCredited => "Sale is not credited to this member",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),

            // Configuration
            1001 => Ok(ErrorCode::ConfigurationMissing),
            1002 => Ok(ErrorCode::InvalidRateTable),
            1003 => Ok(ErrorCode::InvalidLevelDefinition),

            // Network
            2001 => Ok(ErrorCode::CyclicGraphDetected),
            2002 => Ok(ErrorCode::MemberNotFound),
            2003 => Ok(ErrorCode::SaleNotFound),
            2004 => Ok(ErrorCode::SaleNotCredited),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trips_through_u16() {
        for code in [
            ErrorCode::Success,
            ErrorCode::ConfigurationMissing,
            ErrorCode::CyclicGraphDetected,
            ErrorCode::SaleNotCredited,
            ErrorCode::DatabaseError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_display_is_padded() {
        assert_eq!(ErrorCode::NotFound.to_string(), "E0003");
        assert_eq!(ErrorCode::ConfigurationMissing.to_string(), "E1001");
    }

    #[test]
    fn test_structural_codes() {
        assert!(ErrorCode::ConfigurationMissing.is_structural());
        assert!(ErrorCode::CyclicGraphDetected.is_structural());
        assert!(!ErrorCode::MemberNotFound.is_structural());
        assert!(!ErrorCode::InvalidRateTable.is_structural());
    }

    #[test]
    fn test_serde_uses_numeric_code() {
        let json = serde_json::to_string(&ErrorCode::CyclicGraphDetected).unwrap();
        assert_eq!(json, "2001");
        let back: ErrorCode = serde_json::from_str("1001").unwrap();
        assert_eq!(back, ErrorCode::ConfigurationMissing);
    }
}
