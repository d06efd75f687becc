//! Leadership Level Models (TLI ladder)

use super::tier::Tier;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of levels in the leadership ladder
pub const LEADERSHIP_LEVEL_COUNT: u8 = 11;

/// Direct-referral requirement for a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gen1Requirement {
    /// Direct referrals needed
    pub count: u32,
    /// Leadership level those referrals must hold; 0 means any active referral
    pub must_be_at_level: u8,
    /// Calendar months the referrals must have held that level
    pub min_months_at_level: u32,
}

/// Monthly upkeep expected once a level is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyMaintenance {
    pub required: bool,
    /// Personal direct sales needed in each cycle window
    pub personal_sales_required: u32,
}

/// Thresholds for one leadership level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRequirements {
    pub level: u8,
    pub name: String,
    pub pv_threshold: i64,
    pub min_tier: Tier,
    pub gen1_requirement: Gen1Requirement,
    /// Integer percent of the downline at or above the Silver-equivalent tier
    pub silver_plus_percent_required: u32,
    pub min_team_size: u32,
    pub monthly_maintenance: MonthlyMaintenance,
    /// One-time reward paid on first reaching the level
    pub reward: Decimal,
}

/// Rejection reason for a malformed level definition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid leadership level: {0}")]
pub struct InvalidLevelDefinition(pub String);

impl LevelRequirements {
    pub fn validate(&self) -> Result<(), InvalidLevelDefinition> {
        if !(1..=LEADERSHIP_LEVEL_COUNT).contains(&self.level) {
            return Err(InvalidLevelDefinition(format!(
                "level {} outside 1..={LEADERSHIP_LEVEL_COUNT}",
                self.level
            )));
        }
        if self.name.trim().is_empty() {
            return Err(InvalidLevelDefinition(format!(
                "level {} has no name",
                self.level
            )));
        }
        if self.pv_threshold < 0 {
            return Err(InvalidLevelDefinition(format!(
                "level {} has a negative PV threshold",
                self.level
            )));
        }
        if self.silver_plus_percent_required > 100 {
            return Err(InvalidLevelDefinition(format!(
                "level {} requires {}% Silver+",
                self.level, self.silver_plus_percent_required
            )));
        }
        if self.min_tier.is_white_label() {
            return Err(InvalidLevelDefinition(format!(
                "level {} cannot require the white-label tier",
                self.level
            )));
        }
        if self.gen1_requirement.must_be_at_level >= self.level {
            return Err(InvalidLevelDefinition(format!(
                "level {} cannot require referrals at level {}",
                self.level, self.gen1_requirement.must_be_at_level
            )));
        }
        if self.reward < Decimal::ZERO {
            return Err(InvalidLevelDefinition(format!(
                "level {} has a negative reward",
                self.level
            )));
        }
        Ok(())
    }
}

/// One immutable version of a level definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadershipLevelConfig {
    pub id: i64,
    pub requirements: LevelRequirements,
    /// Strictly increasing per level, starting at 1
    pub version: i64,
    pub is_active: bool,
    pub modified_by: String,
    pub reason: String,
    pub effective_date: i64,
    pub created_at: i64,
}

impl LeadershipLevelConfig {
    pub fn level(&self) -> u8 {
        self.requirements.level
    }
}
