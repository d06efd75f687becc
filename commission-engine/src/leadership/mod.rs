//! Leadership Qualification (TLI)
//!
//! 11 级领导力阶梯。Levels are walked 1 → 11; the first level failing any
//! criterion ends the walk. "Not qualified" is a normal result, only a
//! missing level definition is an error.

mod criteria;

pub use criteria::{CriterionFailure, QualificationInput, evaluate};

use crate::commission::CycleWindow;
use crate::core::{EngineError, EngineResult};
use crate::eligibility::{EarningScheme, Eligibility, EligibilityGate};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{LEADERSHIP_LEVEL_COUNT, LeadershipLevelConfig, LevelRequirements};

pub const NOT_ELIGIBLE: &str = "Not Eligible";
pub const NOT_QUALIFIED: &str = "Not Qualified";

/// The active ladder, complete and ordered by level
#[derive(Debug, Clone, Serialize)]
pub struct Ladder {
    levels: Vec<LevelRequirements>,
}

impl Ladder {
    pub fn from_configs(configs: Vec<LeadershipLevelConfig>) -> EngineResult<Self> {
        Self::from_requirements(configs.into_iter().map(|c| c.requirements).collect())
    }

    pub fn from_requirements(mut levels: Vec<LevelRequirements>) -> EngineResult<Self> {
        levels.sort_by_key(|l| l.level);
        levels.dedup_by_key(|l| l.level);
        for (expected, requirements) in (1..=LEADERSHIP_LEVEL_COUNT).zip(&levels) {
            if requirements.level != expected {
                return Err(EngineError::ConfigurationMissing(format!(
                    "leadership level {expected}"
                )));
            }
        }
        if levels.len() != LEADERSHIP_LEVEL_COUNT as usize {
            return Err(EngineError::ConfigurationMissing(format!(
                "leadership level {}",
                levels.len() + 1
            )));
        }
        Ok(Self { levels })
    }

    pub fn level(&self, level: u8) -> Option<&LevelRequirements> {
        level
            .checked_sub(1)
            .and_then(|i| self.levels.get(i as usize))
    }

    pub fn levels(&self) -> &[LevelRequirements] {
        &self.levels
    }
}

/// Outcome of checking a single level
#[derive(Debug, Clone, Serialize)]
pub struct LevelCheck {
    pub level: u8,
    pub name: String,
    pub qualified: bool,
    pub failures: Vec<CriterionFailure>,
    pub eligibility: Eligibility,
}

impl LevelCheck {
    pub fn failure_reasons(&self) -> Vec<String> {
        match self.eligibility {
            Eligibility::Ineligible { reason } => vec![reason.to_string()],
            Eligibility::Eligible { .. } => self.failures.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Result of the ladder walk
#[derive(Debug, Clone, Serialize)]
pub struct QualificationVerdict {
    /// 0 when no level is reached
    pub level: u8,
    pub name: String,
    /// Sum of the rewards of every qualified level
    pub total_potential_reward: Decimal,
    pub qualified_levels: Vec<u8>,
    /// Diagnostics for the level that stopped the walk
    pub next_level: Option<LevelCheck>,
    pub eligibility: Eligibility,
}

/// Walk the ladder from level 1, stopping at the first failed criterion
pub fn highest_qualified_level(
    gate: &dyn EligibilityGate,
    ladder: &Ladder,
    input: &QualificationInput<'_>,
) -> QualificationVerdict {
    let eligibility = gate.check(input.member, EarningScheme::Leadership);
    if !eligibility.is_eligible() {
        return QualificationVerdict {
            level: 0,
            name: NOT_ELIGIBLE.to_string(),
            total_potential_reward: Decimal::ZERO,
            qualified_levels: Vec::new(),
            next_level: None,
            eligibility,
        };
    }

    let mut reached: Option<&LevelRequirements> = None;
    let mut qualified_levels = Vec::new();
    let mut total_potential_reward = Decimal::ZERO;
    let mut next_level = None;

    for requirements in ladder.levels() {
        if !evaluate(requirements, input, true).is_empty() {
            next_level = Some(LevelCheck {
                level: requirements.level,
                name: requirements.name.clone(),
                qualified: false,
                failures: evaluate(requirements, input, false),
                eligibility,
            });
            break;
        }
        qualified_levels.push(requirements.level);
        total_potential_reward += requirements.reward;
        reached = Some(requirements);
    }

    tracing::debug!(
        member_id = input.member.id,
        level = reached.map_or(0, |r| r.level),
        "Leadership walk finished"
    );
    QualificationVerdict {
        level: reached.map_or(0, |r| r.level),
        name: reached.map_or_else(|| NOT_QUALIFIED.to_string(), |r| r.name.clone()),
        total_potential_reward,
        qualified_levels,
        next_level,
        eligibility,
    }
}

/// Check one level on its own, reporting every failed criterion
pub fn check_level(
    gate: &dyn EligibilityGate,
    ladder: &Ladder,
    input: &QualificationInput<'_>,
    level: u8,
) -> EngineResult<LevelCheck> {
    let requirements = ladder.level(level).ok_or_else(|| {
        EngineError::InvalidRequest(format!(
            "leadership level {level} outside 1..={LEADERSHIP_LEVEL_COUNT}"
        ))
    })?;
    let eligibility = gate.check(input.member, EarningScheme::Leadership);
    let failures = if eligibility.is_eligible() {
        evaluate(requirements, input, false)
    } else {
        Vec::new()
    };
    Ok(LevelCheck {
        level,
        name: requirements.name.clone(),
        qualified: eligibility.is_eligible() && failures.is_empty(),
        failures,
        eligibility,
    })
}

/// Monthly upkeep of a reached level
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceStatus {
    pub level: u8,
    pub window: CycleWindow,
    pub required: bool,
    pub personal_sales_required: u32,
    pub personal_sales: u32,
    pub met: bool,
}

/// `personal_sales` are the member's own sales inside `window`
pub fn check_maintenance(
    requirements: &LevelRequirements,
    window: CycleWindow,
    personal_sales: u32,
) -> MaintenanceStatus {
    let maintenance = requirements.monthly_maintenance;
    MaintenanceStatus {
        level: requirements.level,
        window,
        required: maintenance.required,
        personal_sales_required: maintenance.personal_sales_required,
        personal_sales,
        met: !maintenance.required || personal_sales >= maintenance.personal_sales_required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commission::test_support::member;
    use crate::eligibility::WhiteLabelGate;
    use crate::rates::defaults::default_leadership_ladder;
    use crate::utils::time::day_start_millis;
    use chrono::NaiveDate;
    use chrono_tz::Tz;
    use shared::models::{LevelAchievement, Member, TeamComposition, Tier};

    fn ladder() -> Ladder {
        Ladder::from_requirements(default_leadership_ladder()).unwrap()
    }

    fn composition(total: u32, silver_plus: u32) -> TeamComposition {
        let mut c = TeamComposition::empty(0);
        c.total_members = total;
        c.silver_plus_percentage = silver_plus;
        c
    }

    fn date(y: i32, m: u32, d: u32) -> i64 {
        day_start_millis(NaiveDate::from_ymd_opt(y, m, d).unwrap(), Tz::UTC)
    }

    fn input<'a>(
        m: &'a Member,
        composition: &'a TeamComposition,
        referrals: &'a [Member],
        as_of: i64,
    ) -> QualificationInput<'a> {
        QualificationInput {
            member: m,
            earning_tier: m.effective_tier(),
            composition,
            referrals,
            as_of,
            tz: Tz::UTC,
        }
    }

    fn referral_at(id: i64, level: u8, since: i64) -> Member {
        let mut r = member(id, Tier::Silver, None);
        r.achievements = vec![LevelAchievement {
            level,
            achieved_at: since,
        }];
        r
    }

    #[test]
    fn test_white_label_is_not_eligible() {
        let mut m = member(1, Tier::Diamond, None);
        m.accumulated_pv = 1_000_000;
        let c = composition(10_000, 100);
        let v = highest_qualified_level(&WhiteLabelGate, &ladder(), &input(&m, &c, &[], 0));
        assert_eq!(v.level, 0);
        assert_eq!(v.name, NOT_ELIGIBLE);
        assert!(v.next_level.is_none());
    }

    fn fresh_referrals() -> Vec<Member> {
        vec![member(2, Tier::Bronze, None), member(3, Tier::Bronze, None)]
    }

    #[test]
    fn test_level_one_without_referral_history() {
        let mut m = member(1, Tier::Bronze, None);
        m.accumulated_pv = 200;
        let c = composition(5, 0);
        let referrals = fresh_referrals();
        let v = highest_qualified_level(&WhiteLabelGate, &ladder(), &input(&m, &c, &referrals, 0));
        assert_eq!(v.level, 1);
        assert_eq!(v.name, "Ignite Pathfinder");
        assert_eq!(v.total_potential_reward, Decimal::from(600));
        let next = v.next_level.unwrap();
        assert_eq!(next.level, 2);
        assert!(matches!(next.failures[..], [CriterionFailure::Gen1Referrals { actual: 0, .. }]));
    }

    #[test]
    fn test_walk_stops_at_pv_failure() {
        let mut m = member(1, Tier::Platinum, None);
        m.accumulated_pv = 100;
        let c = composition(100_000, 100);
        let referrals = fresh_referrals();
        let v = highest_qualified_level(&WhiteLabelGate, &ladder(), &input(&m, &c, &referrals, 0));
        assert_eq!(v.level, 1);
        assert_eq!(v.qualified_levels, vec![1]);
        let next = v.next_level.unwrap();
        assert_eq!(next.level, 2);
        assert!(matches!(next.failures[0], CriterionFailure::PvThreshold { required: 150, actual: 100 }));
    }

    #[test]
    fn test_no_level_reports_not_qualified() {
        let m = member(1, Tier::Fam, None);
        let c = composition(0, 0);
        let v = highest_qualified_level(&WhiteLabelGate, &ladder(), &input(&m, &c, &[], 0));
        assert_eq!(v.level, 0);
        assert_eq!(v.name, NOT_QUALIFIED);
        assert_eq!(v.next_level.unwrap().level, 1);
    }

    #[test]
    fn test_override_lets_white_label_qualify() {
        let mut m = member(1, Tier::Diamond, Some(Tier::Platinum));
        m.accumulated_pv = 100;
        let c = composition(5, 0);
        let referrals = fresh_referrals();
        let v = highest_qualified_level(&WhiteLabelGate, &ladder(), &input(&m, &c, &referrals, 0));
        assert_eq!(v.level, 1);
    }

    #[test]
    fn test_level_one_needs_two_direct_referrals() {
        let mut m = member(1, Tier::Bronze, None);
        m.accumulated_pv = 50;
        // One direct referral plus a grandchild
        let c = composition(2, 0);
        let referrals = fresh_referrals();
        let v = highest_qualified_level(&WhiteLabelGate, &ladder(), &input(&m, &c, &referrals[..1], 0));
        assert_eq!(v.level, 0);
        assert_eq!(v.name, NOT_QUALIFIED);
        let next = v.next_level.unwrap();
        assert_eq!(next.level, 1);
        assert!(matches!(
            next.failures[..],
            [CriterionFailure::Gen1Referrals { required: 2, at_level: 0, actual: 1, .. }]
        ));
        assert_eq!(next.failure_reasons(), vec!["1 of 2 required direct referrals"]);

        let v = highest_qualified_level(&WhiteLabelGate, &ladder(), &input(&m, &c, &referrals, 0));
        assert_eq!(v.level, 1);
    }

    #[test]
    fn test_gen1_referrals_need_months_at_level() {
        let mut m = member(1, Tier::Bronze, None);
        m.accumulated_pv = 200;
        let c = composition(5, 0);
        let as_of = date(2024, 5, 10);
        let referrals = vec![
            referral_at(2, 1, date(2024, 3, 1)),
            referral_at(3, 2, date(2024, 4, 9)),
            // Reached this month; not seasoned yet
            referral_at(4, 1, date(2024, 5, 1)),
        ];
        let v = highest_qualified_level(&WhiteLabelGate, &ladder(), &input(&m, &c, &referrals, as_of));
        assert_eq!(v.level, 2);

        let short = &referrals[1..];
        let v = highest_qualified_level(&WhiteLabelGate, &ladder(), &input(&m, &c, short, as_of));
        assert_eq!(v.level, 1);
    }

    #[test]
    fn test_check_level_reports_every_failure() {
        let m = member(1, Tier::Fam, None);
        let c = composition(0, 0);
        let check = check_level(&WhiteLabelGate, &ladder(), &input(&m, &c, &[], 0), 6).unwrap();
        assert!(!check.qualified);
        assert_eq!(check.failures.len(), 5);
        assert_eq!(check.failure_reasons().len(), 5);
        assert!(check_level(&WhiteLabelGate, &ladder(), &input(&m, &c, &[], 0), 12).is_err());
        assert!(check_level(&WhiteLabelGate, &ladder(), &input(&m, &c, &[], 0), 0).is_err());
    }

    #[test]
    fn test_check_level_for_ineligible_member() {
        let m = member(1, Tier::Diamond, None);
        let c = composition(0, 0);
        let check = check_level(&WhiteLabelGate, &ladder(), &input(&m, &c, &[], 0), 1).unwrap();
        assert!(!check.qualified);
        assert_eq!(check.failure_reasons(), vec!["not eligible: white-label tier without override"]);
    }

    #[test]
    fn test_incomplete_ladder_is_missing_configuration() {
        let mut levels = default_leadership_ladder();
        levels.remove(4);
        assert!(matches!(
            Ladder::from_requirements(levels),
            Err(EngineError::ConfigurationMissing(msg)) if msg.contains('5')
        ));
        let mut levels = default_leadership_ladder();
        levels.pop();
        assert!(Ladder::from_requirements(levels).is_err());
    }

    #[test]
    fn test_maintenance() {
        let ladder = ladder();
        let window = CycleWindow::enclosing(date(2024, 5, 10), 4, Tz::UTC).unwrap();
        let status = check_maintenance(ladder.level(3).unwrap(), window, 1);
        assert!(status.required);
        assert!(!status.met);
        assert!(check_maintenance(ladder.level(3).unwrap(), window, 2).met);
        assert!(check_maintenance(ladder.level(1).unwrap(), window, 0).met);
    }
}
