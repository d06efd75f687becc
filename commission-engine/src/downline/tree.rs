//! Materialized downline subtree and its statistics

use crate::core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use shared::models::{TeamComposition, Tier};
use std::collections::{BTreeMap, HashMap};

/// One downline member with its depth below the root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeMember {
    pub id: i64,
    /// Direct sponsor (the root for generation 1)
    pub sponsor_id: i64,
    pub tier: Tier,
    /// Direct referral = 1
    pub generation: u32,
}

/// Per-generation head count and tier mix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub members: u32,
    pub tier_counts: BTreeMap<Tier, u32>,
}

/// Result of a breadth-first walk, in visit order
#[derive(Debug, Clone)]
pub struct DownlineTree {
    root_id: i64,
    max_generation: Option<u32>,
    members: Vec<TreeMember>,
    generation_of: HashMap<i64, u32>,
}

impl DownlineTree {
    pub(super) fn new(root_id: i64, max_generation: Option<u32>, members: Vec<TreeMember>) -> Self {
        let generation_of = members.iter().map(|m| (m.id, m.generation)).collect();
        Self {
            root_id,
            max_generation,
            members,
            generation_of,
        }
    }

    /// A tree holding only the root, for earners whose downline is not walked
    pub fn root_only(root_id: i64) -> Self {
        Self::new(root_id, Some(0), Vec::new())
    }

    pub fn root_id(&self) -> i64 {
        self.root_id
    }

    /// Whether the walk covered the whole downline
    pub fn is_complete(&self) -> bool {
        self.max_generation.is_none()
    }

    pub fn members(&self) -> &[TreeMember] {
        &self.members
    }

    pub fn total_members(&self) -> usize {
        self.members.len()
    }

    /// Generation of a downline member; `None` for the root and outsiders
    pub fn generation_of(&self, member_id: i64) -> Option<u32> {
        self.generation_of.get(&member_id).copied()
    }

    pub fn members_at(&self, generation: u32) -> impl Iterator<Item = &TreeMember> {
        self.members.iter().filter(move |m| m.generation == generation)
    }

    pub fn max_depth(&self) -> u32 {
        self.members.iter().map(|m| m.generation).max().unwrap_or(0)
    }

    pub fn generation_stats(&self) -> BTreeMap<u32, GenerationStats> {
        let mut stats: BTreeMap<u32, GenerationStats> = BTreeMap::new();
        for member in &self.members {
            let entry = stats.entry(member.generation).or_default();
            entry.members += 1;
            *entry.tier_counts.entry(member.tier).or_insert(0) += 1;
        }
        stats
    }

    /// Tier counts and percentages over the entire downline.
    ///
    /// Refuses a depth-capped tree: composition is defined over every generation.
    pub fn composition(&self, silver_plus_threshold: Tier, computed_at: i64) -> EngineResult<TeamComposition> {
        if !self.is_complete() {
            return Err(EngineError::InvalidRequest(format!(
                "team composition of member {} needs an uncapped downline",
                self.root_id
            )));
        }

        let mut composition = TeamComposition::empty(computed_at);
        let total = self.total_members() as u32;
        composition.total_members = total;
        if total == 0 {
            return Ok(composition);
        }

        for member in &self.members {
            *composition.tier_counts.entry(member.tier).or_insert(0) += 1;
        }
        composition.tier_percentages = composition
            .tier_counts
            .iter()
            .map(|(tier, count)| (*tier, percent_of(*count, total)))
            .collect();
        composition.silver_plus_percentage =
            percent_of(composition.count_at_or_above(silver_plus_threshold), total);
        Ok(composition)
    }
}

/// `count / total * 100`, rounded half away from zero
fn percent_of(count: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (count, total) = (u64::from(count), u64::from(total));
    ((count * 200 + total) / (total * 2)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downline::{DownlineIndex, NetworkNode};

    fn flat_downline(tiers: &[Tier]) -> DownlineIndex {
        let mut nodes = vec![NetworkNode {
            id: 0,
            sponsor_id: None,
            tier: Tier::Gold,
        }];
        nodes.extend(tiers.iter().enumerate().map(|(i, tier)| NetworkNode {
            id: i as i64 + 1,
            sponsor_id: Some(0),
            tier: *tier,
        }));
        DownlineIndex::from_nodes(nodes)
    }

    #[test]
    fn test_silver_plus_percentage_three_of_ten() {
        let mut tiers = vec![Tier::Bronze; 7];
        tiers.extend([Tier::Silver, Tier::Gold, Tier::Diamond]);
        let tree = flat_downline(&tiers).build_subtree(0, None).unwrap();

        let c = tree.composition(Tier::Silver, 5).unwrap();
        assert_eq!(c.total_members, 10);
        assert_eq!(c.silver_plus_percentage, 30);
        assert_eq!(c.tier_percentages[&Tier::Bronze], 70);
        assert_eq!(c.tier_counts.values().sum::<u32>(), c.total_members);
        assert_eq!(c.computed_at, 5);
    }

    #[test]
    fn test_percentages_round_and_need_not_sum_to_hundred() {
        let tree = flat_downline(&[Tier::Bronze, Tier::Copper, Tier::Silver])
            .build_subtree(0, None)
            .unwrap();
        let c = tree.composition(Tier::Silver, 0).unwrap();
        // 33.33 → 33 for each
        assert_eq!(c.tier_percentages[&Tier::Bronze], 33);
        assert_eq!(c.tier_percentages.values().sum::<u32>(), 99);
        assert_eq!(c.silver_plus_percentage, 33);
    }

    #[test]
    fn test_half_percent_rounds_up() {
        assert_eq!(percent_of(1, 8), 13); // 12.5
        assert_eq!(percent_of(0, 8), 0);
        assert_eq!(percent_of(8, 8), 100);
    }

    #[test]
    fn test_empty_downline_composition() {
        let tree = flat_downline(&[]).build_subtree(0, None).unwrap();
        let c = tree.composition(Tier::Silver, 1).unwrap();
        assert_eq!(c.total_members, 0);
        assert_eq!(c.silver_plus_percentage, 0);
        assert!(c.tier_counts.values().all(|n| *n == 0));
    }

    #[test]
    fn test_capped_tree_refuses_composition() {
        let tree = flat_downline(&[Tier::Bronze]).build_subtree(0, Some(10)).unwrap();
        assert!(tree.composition(Tier::Silver, 0).is_err());
    }

    #[test]
    fn test_generation_stats() {
        let index = DownlineIndex::from_nodes(vec![
            NetworkNode { id: 1, sponsor_id: None, tier: Tier::Gold },
            NetworkNode { id: 2, sponsor_id: Some(1), tier: Tier::Silver },
            NetworkNode { id: 3, sponsor_id: Some(1), tier: Tier::Silver },
            NetworkNode { id: 4, sponsor_id: Some(3), tier: Tier::Fam },
        ]);
        let stats = index.build_subtree(1, None).unwrap().generation_stats();
        assert_eq!(stats[&1].members, 2);
        assert_eq!(stats[&1].tier_counts[&Tier::Silver], 2);
        assert_eq!(stats[&2].members, 1);
        assert!(!stats.contains_key(&3));
    }
}
