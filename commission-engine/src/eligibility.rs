//! Eligibility Gate
//!
//! Consulted first by every calculator and by the qualification engine.
//! White-label members earn nothing from the network unless they hold an
//! externally granted override naming the tier they earn at.

use serde::{Deserialize, Serialize};
use shared::models::{Member, Tier};
use std::fmt;

/// Earning scheme asking for a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EarningScheme {
    /// ISP
    DirectSale,
    /// QPB
    CycleBonus,
    /// TSC
    TeamCommission,
    /// TLI
    Leadership,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IneligibleReason {
    WhiteLabelWithoutOverride,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::WhiteLabelWithoutOverride => {
                f.write_str("not eligible: white-label tier without override")
            }
        }
    }
}

/// Gate verdict; ineligibility is an outcome, not an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Eligibility {
    Eligible { earning_tier: Tier },
    Ineligible { reason: IneligibleReason },
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible { .. })
    }

    pub fn earning_tier(&self) -> Option<Tier> {
        match self {
            Eligibility::Eligible { earning_tier } => Some(*earning_tier),
            Eligibility::Ineligible { .. } => None,
        }
    }
}

/// Capability check shared by all earning schemes
pub trait EligibilityGate: Send + Sync {
    fn check(&self, member: &Member, scheme: EarningScheme) -> Eligibility;

    fn is_eligible(&self, member: &Member, scheme: EarningScheme) -> bool {
        self.check(member, scheme).is_eligible()
    }
}

/// The single white-label rule, identical for every scheme
#[derive(Debug, Clone, Copy, Default)]
pub struct WhiteLabelGate;

impl EligibilityGate for WhiteLabelGate {
    fn check(&self, member: &Member, scheme: EarningScheme) -> Eligibility {
        let verdict = if member.tier.is_white_label() && member.effective_tier_override.is_none() {
            Eligibility::Ineligible {
                reason: IneligibleReason::WhiteLabelWithoutOverride,
            }
        } else {
            Eligibility::Eligible {
                earning_tier: member.effective_tier(),
            }
        };
        if !verdict.is_eligible() {
            tracing::debug!(member_id = member.id, ?scheme, ?verdict, "Eligibility gate rejected member");
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(tier: Tier, override_tier: Option<Tier>) -> Member {
        Member {
            id: 1,
            name: "m".into(),
            tier,
            sponsor_id: None,
            accumulated_pv: 1_000_000,
            joined_at: 0,
            effective_tier_override: override_tier,
            team_composition: None,
            achievements: vec![],
        }
    }

    #[test]
    fn test_white_label_without_override_is_rejected_for_every_scheme() {
        let gate = WhiteLabelGate;
        let m = member(Tier::Diamond, None);
        for scheme in [
            EarningScheme::DirectSale,
            EarningScheme::CycleBonus,
            EarningScheme::TeamCommission,
            EarningScheme::Leadership,
        ] {
            assert_eq!(
                gate.check(&m, scheme),
                Eligibility::Ineligible {
                    reason: IneligibleReason::WhiteLabelWithoutOverride
                }
            );
        }
    }

    #[test]
    fn test_override_grants_earning_tier() {
        let gate = WhiteLabelGate;
        let m = member(Tier::Diamond, Some(Tier::Platinum));
        assert_eq!(
            gate.check(&m, EarningScheme::DirectSale).earning_tier(),
            Some(Tier::Platinum)
        );
    }

    #[test]
    fn test_ladder_tiers_are_eligible() {
        let gate = WhiteLabelGate;
        for tier in Tier::ALL.into_iter().filter(|t| !t.is_white_label()) {
            assert!(gate.is_eligible(&member(tier, None), EarningScheme::CycleBonus));
        }
    }

    #[test]
    fn test_only_the_member_tier_is_gated() {
        let gate = WhiteLabelGate;
        // An override naming the white-label tier does not block an ordinary member
        let m = member(Tier::Gold, Some(Tier::Diamond));
        for scheme in [
            EarningScheme::DirectSale,
            EarningScheme::CycleBonus,
            EarningScheme::TeamCommission,
            EarningScheme::Leadership,
        ] {
            assert_eq!(gate.check(&m, scheme).earning_tier(), Some(Tier::Diamond));
        }

        let m = member(Tier::Diamond, Some(Tier::Diamond));
        assert!(gate.is_eligible(&m, EarningScheme::DirectSale));
    }
}
