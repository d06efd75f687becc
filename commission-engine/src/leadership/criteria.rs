//! Per-level criteria, evaluated in a fixed order

use crate::utils::time::months_between;
use chrono_tz::Tz;
use serde::Serialize;
use shared::models::{LevelRequirements, Member, TeamComposition, Tier};
use std::fmt;

/// One unmet requirement of a level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "criterion", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionFailure {
    MinTier { required: Tier, actual: Tier },
    PvThreshold { required: i64, actual: i64 },
    TeamSize { required: u32, actual: u32 },
    SilverPlus { required: u32, actual: u32 },
    Gen1Referrals {
        required: u32,
        at_level: u8,
        min_months: u32,
        actual: u32,
    },
}

impl fmt::Display for CriterionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriterionFailure::MinTier { required, actual } => {
                write!(f, "tier {actual} is below the required {required}")
            }
            CriterionFailure::PvThreshold { required, actual } => {
                write!(f, "PV {actual} is below the required {required}")
            }
            CriterionFailure::TeamSize { required, actual } => {
                write!(f, "team of {actual} is below the required {required}")
            }
            CriterionFailure::SilverPlus { required, actual } => {
                write!(f, "Silver+ share {actual}% is below the required {required}%")
            }
            CriterionFailure::Gen1Referrals {
                required,
                at_level: 0,
                actual,
                ..
            } => write!(f, "{actual} of {required} required direct referrals"),
            CriterionFailure::Gen1Referrals {
                required,
                at_level,
                min_months,
                actual,
            } => write!(
                f,
                "{actual} of {required} direct referrals have held level {at_level} for {min_months} month(s)"
            ),
        }
    }
}

/// Everything a level check reads
pub struct QualificationInput<'a> {
    pub member: &'a Member,
    /// Tier the gate lets the member earn at
    pub earning_tier: Tier,
    /// Fresh composition of the full downline
    pub composition: &'a TeamComposition,
    /// Direct referrals with their achievement history
    pub referrals: &'a [Member],
    pub as_of: i64,
    pub tz: Tz,
}

impl QualificationInput<'_> {
    fn seasoned_referrals(&self, at_level: u8, min_months: u32) -> u32 {
        self.referrals
            .iter()
            .filter_map(|r| r.reached_level_at(at_level))
            .filter(|&since| since <= self.as_of && months_between(since, self.as_of, self.tz) >= min_months)
            .count() as u32
    }
}

/// Checks (a) tier, (b) PV, (c) team size, (d) Silver+, (e) gen-1 referrals.
///
/// With `must_be_at_level == 0` check (e) only counts direct referrals.
///
/// With `stop_at_first` the result holds at most one failure.
pub fn evaluate(
    requirements: &LevelRequirements,
    input: &QualificationInput<'_>,
    stop_at_first: bool,
) -> Vec<CriterionFailure> {
    let mut failures = Vec::new();

    if input.earning_tier < requirements.min_tier {
        failures.push(CriterionFailure::MinTier {
            required: requirements.min_tier,
            actual: input.earning_tier,
        });
        if stop_at_first {
            return failures;
        }
    }

    if input.member.accumulated_pv < requirements.pv_threshold {
        failures.push(CriterionFailure::PvThreshold {
            required: requirements.pv_threshold,
            actual: input.member.accumulated_pv,
        });
        if stop_at_first {
            return failures;
        }
    }

    if input.composition.total_members < requirements.min_team_size {
        failures.push(CriterionFailure::TeamSize {
            required: requirements.min_team_size,
            actual: input.composition.total_members,
        });
        if stop_at_first {
            return failures;
        }
    }

    if input.composition.silver_plus_percentage < requirements.silver_plus_percent_required {
        failures.push(CriterionFailure::SilverPlus {
            required: requirements.silver_plus_percent_required,
            actual: input.composition.silver_plus_percentage,
        });
        if stop_at_first {
            return failures;
        }
    }

    let gen1 = requirements.gen1_requirement;
    if gen1.count > 0 {
        let actual = if gen1.must_be_at_level == 0 {
            input.referrals.len() as u32
        } else {
            input.seasoned_referrals(gen1.must_be_at_level, gen1.min_months_at_level)
        };
        if actual < gen1.count {
            failures.push(CriterionFailure::Gen1Referrals {
                required: gen1.count,
                at_level: gen1.must_be_at_level,
                min_months: gen1.min_months_at_level,
                actual,
            });
        }
    }

    failures
}
