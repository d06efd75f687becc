//! Member Model

use super::tier::Tier;
use crate::util::HOUR_MILLIS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default lifetime of a team composition snapshot (24h)
pub const COMPOSITION_TTL_MILLIS: i64 = 24 * HOUR_MILLIS;

/// Member record as held by the Member Directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub tier: Tier,
    /// None only for the network root
    pub sponsor_id: Option<i64>,
    /// Only grows, through sale attribution
    pub accumulated_pv: i64,
    /// Enrollment time (Unix millis)
    pub joined_at: i64,
    /// Externally granted earning tier; wins over `tier` when present
    pub effective_tier_override: Option<Tier>,
    /// Cached downline statistics, recomputed lazily
    pub team_composition: Option<TeamComposition>,
    /// Leadership levels reached so far
    #[serde(default)]
    pub achievements: Vec<LevelAchievement>,
}

impl Member {
    /// Tier used for every earning calculation
    pub fn effective_tier(&self) -> Tier {
        self.effective_tier_override.unwrap_or(self.tier)
    }

    /// Composition snapshot if it is younger than `ttl_millis` at `now`
    pub fn fresh_composition(&self, now: i64, ttl_millis: i64) -> Option<&TeamComposition> {
        self.team_composition
            .as_ref()
            .filter(|c| !c.is_stale(now, ttl_millis))
    }

    /// Earliest time this member reached `level` or anything above it
    pub fn reached_level_at(&self, level: u8) -> Option<i64> {
        self.achievements
            .iter()
            .filter(|a| a.level >= level)
            .map(|a| a.achieved_at)
            .min()
    }

    /// Highest leadership level on record
    pub fn highest_recorded_level(&self) -> u8 {
        self.achievements.iter().map(|a| a.level).max().unwrap_or(0)
    }
}

/// Create member payload (enrollment is owned by the directory, not the engine)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberCreate {
    pub name: String,
    pub tier: Option<Tier>,
    pub sponsor_id: Option<i64>,
    pub joined_at: Option<i64>,
    pub effective_tier_override: Option<Tier>,
}

/// Aggregate tier statistics over a member's entire downline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamComposition {
    pub total_members: u32,
    pub tier_counts: BTreeMap<Tier, u32>,
    /// Integer percentages; need not sum to exactly 100
    pub tier_percentages: BTreeMap<Tier, u32>,
    pub silver_plus_percentage: u32,
    /// Unix millis
    pub computed_at: i64,
}

impl TeamComposition {
    pub fn empty(computed_at: i64) -> Self {
        Self {
            total_members: 0,
            tier_counts: Tier::ALL.into_iter().map(|t| (t, 0)).collect(),
            tier_percentages: Tier::ALL.into_iter().map(|t| (t, 0)).collect(),
            silver_plus_percentage: 0,
            computed_at,
        }
    }

    pub fn is_stale(&self, now: i64, ttl_millis: i64) -> bool {
        now - self.computed_at > ttl_millis
    }

    pub fn count_of(&self, tier: Tier) -> u32 {
        self.tier_counts.get(&tier).copied().unwrap_or(0)
    }

    /// Members whose tier is at or above `threshold`
    pub fn count_at_or_above(&self, threshold: Tier) -> u32 {
        self.tier_counts
            .iter()
            .filter(|(tier, _)| **tier >= threshold)
            .map(|(_, n)| *n)
            .sum()
    }
}

/// A leadership level reached by a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelAchievement {
    pub level: u8,
    /// Unix millis
    pub achieved_at: i64,
}
