//! Shared types for the referral network platform
//!
//! Common types used by the commission engine and by any outer layer that
//! talks to it: the tier catalog, member and sale records, versioned rate
//! tables, leadership level definitions and the unified error system.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{
    Gen1Requirement, LeadershipLevelConfig, LevelAchievement, LevelRequirements, Member,
    MonthlyMaintenance, RateConfigType, RateTable, RateVersion, SaleEvent, TeamComposition, Tier,
    TierCatalog,
};
