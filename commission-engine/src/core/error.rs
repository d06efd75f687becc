//! Engine errors
//!
//! Only failures to compute live here. Business outcomes such as "not
//! eligible", "not qualified" or an incomplete cycle set are plain results.

use crate::db::repository::RepoError;
use shared::error::{AppError, ErrorCode};
use shared::models::{InvalidLevelDefinition, InvalidRateTable};
use thiserror::Error;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No active configuration: {0}")]
    ConfigurationMissing(String),

    #[error("Sponsor graph cycle detected at member {member_id}")]
    CyclicGraphDetected { member_id: i64 },

    #[error(transparent)]
    InvalidRateTable(#[from] InvalidRateTable),

    #[error(transparent)]
    InvalidLevelDefinition(#[from] InvalidLevelDefinition),

    #[error("Member not found: {0}")]
    MemberNotFound(i64),

    #[error("Sale not found: {0}")]
    SaleNotFound(i64),

    #[error("Sale {sale_id} is not credited to member {member_id}")]
    SaleNotCredited { sale_id: i64, member_id: i64 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepoError),
}

impl EngineError {
    /// Data-integrity failures that operators must hear about
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            EngineError::ConfigurationMissing(_) | EngineError::CyclicGraphDetected { .. }
        )
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        if err.is_structural() {
            tracing::error!(error = %err, "Structural failure in commission engine");
        }
        match err {
            EngineError::ConfigurationMissing(what) => AppError::configuration_missing(what),
            EngineError::CyclicGraphDetected { member_id } => AppError::cyclic_graph(member_id),
            EngineError::InvalidRateTable(e) => {
                AppError::with_message(ErrorCode::InvalidRateTable, e.to_string())
            }
            EngineError::InvalidLevelDefinition(e) => {
                AppError::with_message(ErrorCode::InvalidLevelDefinition, e.to_string())
            }
            EngineError::MemberNotFound(id) => {
                AppError::with_message(ErrorCode::MemberNotFound, format!("Member not found: {id}"))
                    .with_detail("member_id", id)
            }
            EngineError::SaleNotFound(id) => {
                AppError::with_message(ErrorCode::SaleNotFound, format!("Sale not found: {id}"))
                    .with_detail("sale_id", id)
            }
            EngineError::SaleNotCredited { sale_id, member_id } => AppError::with_message(
                ErrorCode::SaleNotCredited,
                format!("Sale {sale_id} is not credited to member {member_id}"),
            )
            .with_detail("sale_id", sale_id)
            .with_detail("member_id", member_id),
            EngineError::InvalidRequest(msg) => AppError::invalid_request(msg),
            EngineError::Config(msg) => AppError::with_message(ErrorCode::ConfigError, msg),
            EngineError::Repository(e) => {
                tracing::error!(error = %e, "Repository error occurred");
                match e {
                    RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
                    other => AppError::database(other.to_string()),
                }
            }
        }
    }
}
