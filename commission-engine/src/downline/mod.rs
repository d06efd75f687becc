//! Downline Index
//!
//! Arena of network nodes plus a per-slot referral adjacency list, built once
//! from a directory snapshot. Traversals are breadth-first with an explicit
//! visited set: a revisited node means the sponsor graph has a cycle, which is
//! reported as [`EngineError::CyclicGraphDetected`] instead of looping.
//!
//! ```text
//!            root                 generation 0 (not part of the downline)
//!          /      \
//!        a          b             generation 1 (direct referrals)
//!      /   \         \
//!     c     d         e           generation 2
//! ```

mod tree;

pub use tree::{DownlineTree, GenerationStats, TreeMember};

use crate::core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use shared::models::Tier;
use std::collections::{HashMap, HashSet, VecDeque};

/// Minimal member view the index needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: i64,
    pub sponsor_id: Option<i64>,
    pub tier: Tier,
}

/// Sponsor → referral adjacency over a snapshot of the network
#[derive(Debug, Clone, Default)]
pub struct DownlineIndex {
    nodes: Vec<NetworkNode>,
    slots: HashMap<i64, usize>,
    referrals: Vec<Vec<usize>>,
}

impl DownlineIndex {
    pub fn from_nodes(nodes: Vec<NetworkNode>) -> Self {
        let slots: HashMap<i64, usize> = nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| (node.id, slot))
            .collect();
        let mut referrals = vec![Vec::new(); nodes.len()];

        for (slot, node) in nodes.iter().enumerate() {
            let Some(sponsor_id) = node.sponsor_id else {
                continue;
            };
            match slots.get(&sponsor_id) {
                Some(&sponsor_slot) => referrals[sponsor_slot].push(slot),
                None => tracing::warn!(
                    member_id = node.id,
                    sponsor_id,
                    "Sponsor not in network snapshot, treating member as a root"
                ),
            }
        }

        Self {
            nodes,
            slots,
            referrals,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, member_id: i64) -> bool {
        self.slots.contains_key(&member_id)
    }

    pub fn node(&self, member_id: i64) -> Option<&NetworkNode> {
        self.slots.get(&member_id).map(|&slot| &self.nodes[slot])
    }

    fn slot_of(&self, member_id: i64) -> EngineResult<usize> {
        self.slots
            .get(&member_id)
            .copied()
            .ok_or(EngineError::MemberNotFound(member_id))
    }

    /// Ids of a member's direct referrals (generation 1)
    pub fn direct_referrals(&self, member_id: i64) -> EngineResult<Vec<i64>> {
        let slot = self.slot_of(member_id)?;
        Ok(self.referrals[slot]
            .iter()
            .map(|&child| self.nodes[child].id)
            .collect())
    }

    /// Breadth-first walk of `root_id`'s downline.
    ///
    /// `max_generation` bounds the walk (TSC needs at most 10); `None` walks
    /// the entire downline. Cycle detection covers everything walked.
    pub fn build_subtree(
        &self,
        root_id: i64,
        max_generation: Option<u32>,
    ) -> EngineResult<DownlineTree> {
        let root_slot = self.slot_of(root_id)?;
        let mut visited: HashSet<usize> = HashSet::from([root_slot]);
        let mut queue: VecDeque<(usize, u32)> = VecDeque::from([(root_slot, 0)]);
        let mut members = Vec::new();

        while let Some((slot, generation)) = queue.pop_front() {
            if max_generation.is_some_and(|cap| generation >= cap) {
                continue;
            }
            for &child in &self.referrals[slot] {
                if !visited.insert(child) {
                    let member_id = self.nodes[child].id;
                    tracing::error!(root_id, member_id, "Cycle in sponsor graph");
                    return Err(EngineError::CyclicGraphDetected { member_id });
                }
                let node = &self.nodes[child];
                members.push(TreeMember {
                    id: node.id,
                    sponsor_id: self.nodes[slot].id,
                    tier: node.tier,
                    generation: generation + 1,
                });
                queue.push_back((child, generation + 1));
            }
        }

        tracing::debug!(
            root_id,
            members = members.len(),
            ?max_generation,
            "Downline subtree built"
        );
        Ok(DownlineTree::new(root_id, max_generation, members))
    }

    /// Ancestors of `member_id`, nearest sponsor first
    pub fn upline(&self, member_id: i64) -> EngineResult<Vec<i64>> {
        let mut current = self.slot_of(member_id)?;
        let mut visited: HashSet<usize> = HashSet::from([current]);
        let mut ancestors = Vec::new();

        while let Some(sponsor_id) = self.nodes[current].sponsor_id {
            let Some(&sponsor_slot) = self.slots.get(&sponsor_id) else {
                break;
            };
            if !visited.insert(sponsor_slot) {
                tracing::error!(member_id, sponsor_id, "Cycle in sponsor graph");
                return Err(EngineError::CyclicGraphDetected {
                    member_id: sponsor_id,
                });
            }
            ancestors.push(sponsor_id);
            current = sponsor_slot;
        }
        Ok(ancestors)
    }
}
