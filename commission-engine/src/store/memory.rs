//! In-memory stores
//!
//! Same contract as the SQLite store: one active version per family or
//! level, versions counting up from 1, and PV credit claimed once per sale.

use super::{MemberDirectory, RateConfigStore};
use crate::core::{EngineError, EngineResult};
use crate::downline::NetworkNode;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{
    LeadershipLevelConfig, LevelAchievement, LevelRequirements, Member, MemberCreate,
    RateConfigType, RateTable, RateVersion, SaleCreate, SaleEvent, TeamComposition, Tier,
};
use shared::util::now_millis;
use std::collections::{BTreeMap, HashSet};

#[derive(Default)]
struct DirectoryState {
    members: BTreeMap<i64, Member>,
    sales: BTreeMap<i64, SaleEvent>,
    credited_sales: HashSet<i64>,
    next_id: i64,
}

impl DirectoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
struct ConfigState {
    rate_versions: Vec<RateVersion>,
    level_configs: Vec<LeadershipLevelConfig>,
}

#[derive(Default)]
pub struct InMemoryStore {
    directory: RwLock<DirectoryState>,
    config: RwLock<ConfigState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enroll_member(&self, data: MemberCreate) -> EngineResult<Member> {
        let mut state = self.directory.write();
        if let Some(sponsor_id) = data.sponsor_id
            && !state.members.contains_key(&sponsor_id)
        {
            return Err(EngineError::MemberNotFound(sponsor_id));
        }
        let id = state.next_id();
        let member = Member {
            id,
            name: data.name,
            tier: data.tier.unwrap_or(Tier::LOWEST),
            sponsor_id: data.sponsor_id,
            accumulated_pv: 0,
            joined_at: data.joined_at.unwrap_or_else(now_millis),
            effective_tier_override: data.effective_tier_override,
            team_composition: None,
            achievements: Vec::new(),
        };
        state.members.insert(id, member.clone());
        Ok(member)
    }

    pub fn change_tier(
        &self,
        member_id: i64,
        tier: Tier,
        effective_tier_override: Option<Tier>,
    ) -> EngineResult<()> {
        let mut state = self.directory.write();
        let member = state
            .members
            .get_mut(&member_id)
            .ok_or(EngineError::MemberNotFound(member_id))?;
        member.tier = tier;
        member.effective_tier_override = effective_tier_override;
        Ok(())
    }

    pub fn record_sale(&self, data: SaleCreate) -> EngineResult<SaleEvent> {
        let mut state = self.directory.write();
        for id in [data.buyer_member_id, data.seller_member_id] {
            if !state.members.contains_key(&id) {
                return Err(EngineError::MemberNotFound(id));
            }
        }
        let id = state.next_id();
        let sale = SaleEvent {
            id,
            buyer_member_id: data.buyer_member_id,
            seller_member_id: data.seller_member_id,
            tier_purchased: data.tier_purchased,
            price_at_sale: data.price(),
            timestamp: data.timestamp,
        };
        state.sales.insert(id, sale.clone());
        Ok(sale)
    }
}

fn sorted_sales<'a>(sales: impl Iterator<Item = &'a SaleEvent>) -> Vec<SaleEvent> {
    let mut list: Vec<SaleEvent> = sales.cloned().collect();
    list.sort_by_key(|s| (s.timestamp, s.id));
    list
}

#[async_trait]
impl MemberDirectory for InMemoryStore {
    async fn find_member(&self, id: i64) -> EngineResult<Option<Member>> {
        Ok(self.directory.read().members.get(&id).cloned())
    }

    async fn find_members(&self, ids: &[i64]) -> EngineResult<Vec<Member>> {
        let state = self.directory.read();
        Ok(ids
            .iter()
            .filter_map(|id| state.members.get(id).cloned())
            .collect())
    }

    async fn direct_referrals(&self, sponsor_id: i64) -> EngineResult<Vec<Member>> {
        let state = self.directory.read();
        let mut referrals: Vec<Member> = state
            .members
            .values()
            .filter(|m| m.sponsor_id == Some(sponsor_id))
            .cloned()
            .collect();
        referrals.sort_by_key(|m| (m.joined_at, m.id));
        Ok(referrals)
    }

    async fn network_snapshot(&self) -> EngineResult<Vec<NetworkNode>> {
        Ok(self
            .directory
            .read()
            .members
            .values()
            .map(|m| NetworkNode {
                id: m.id,
                sponsor_id: m.sponsor_id,
                tier: m.tier,
            })
            .collect())
    }

    async fn find_sale(&self, id: i64) -> EngineResult<Option<SaleEvent>> {
        Ok(self.directory.read().sales.get(&id).cloned())
    }

    async fn sales_by_sellers_between(
        &self,
        seller_ids: &[i64],
        start: i64,
        end: i64,
    ) -> EngineResult<Vec<SaleEvent>> {
        let sellers: HashSet<i64> = seller_ids.iter().copied().collect();
        let state = self.directory.read();
        Ok(sorted_sales(state.sales.values().filter(|s| {
            sellers.contains(&s.seller_member_id) && s.occurred_within(start, end)
        })))
    }

    async fn sales_by_seller_between(
        &self,
        seller_id: i64,
        start: i64,
        end: i64,
    ) -> EngineResult<Vec<SaleEvent>> {
        let state = self.directory.read();
        Ok(sorted_sales(state.sales.values().filter(|s| {
            s.seller_member_id == seller_id && s.occurred_within(start, end)
        })))
    }

    async fn save_team_composition(
        &self,
        member_id: i64,
        composition: &TeamComposition,
    ) -> EngineResult<()> {
        let mut state = self.directory.write();
        let member = state
            .members
            .get_mut(&member_id)
            .ok_or(EngineError::MemberNotFound(member_id))?;
        member.team_composition = Some(composition.clone());
        Ok(())
    }

    async fn credit_sale_pv(&self, sale_id: i64, member_ids: &[i64], pv: i64) -> EngineResult<bool> {
        let mut state = self.directory.write();
        if state.credited_sales.contains(&sale_id) {
            return Ok(false);
        }
        // All or nothing, like the transactional store
        if let Some(missing) = member_ids.iter().find(|id| !state.members.contains_key(id)) {
            return Err(EngineError::MemberNotFound(*missing));
        }
        for id in member_ids {
            if let Some(member) = state.members.get_mut(id) {
                member.accumulated_pv += pv;
            }
        }
        state.credited_sales.insert(sale_id);
        Ok(true)
    }

    async fn record_achievement(
        &self,
        member_id: i64,
        level: u8,
        achieved_at: i64,
    ) -> EngineResult<bool> {
        let mut state = self.directory.write();
        let member = state
            .members
            .get_mut(&member_id)
            .ok_or(EngineError::MemberNotFound(member_id))?;
        if member.achievements.iter().any(|a| a.level == level) {
            return Ok(false);
        }
        member.achievements.push(LevelAchievement { level, achieved_at });
        member.achievements.sort_by_key(|a| a.level);
        Ok(true)
    }
}

#[async_trait]
impl RateConfigStore for InMemoryStore {
    async fn find_active(&self, config_type: RateConfigType) -> EngineResult<Option<RateVersion>> {
        Ok(self
            .config
            .read()
            .rate_versions
            .iter()
            .find(|v| v.config_type == config_type && v.is_active)
            .cloned())
    }

    async fn publish_new_version(
        &self,
        rates: RateTable,
        author: &str,
        reason: &str,
        effective_date: i64,
    ) -> EngineResult<RateVersion> {
        rates.validate()?;
        let config_type = rates.config_type();
        let mut state = self.config.write();
        let mut latest = 0;
        for v in state
            .rate_versions
            .iter_mut()
            .filter(|v| v.config_type == config_type)
        {
            v.is_active = false;
            latest = latest.max(v.version);
        }
        let version = RateVersion {
            id: state.rate_versions.len() as i64 + 1,
            config_type,
            rates,
            effective_date,
            version: latest + 1,
            is_active: true,
            modified_by: author.to_string(),
            reason: reason.to_string(),
            created_at: now_millis(),
        };
        state.rate_versions.push(version.clone());
        Ok(version)
    }

    async fn history(&self, config_type: RateConfigType) -> EngineResult<Vec<RateVersion>> {
        let mut list: Vec<RateVersion> = self
            .config
            .read()
            .rate_versions
            .iter()
            .filter(|v| v.config_type == config_type)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(list)
    }

    async fn active_leadership_levels(&self) -> EngineResult<Vec<LeadershipLevelConfig>> {
        let mut list: Vec<LeadershipLevelConfig> = self
            .config
            .read()
            .level_configs
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        list.sort_by_key(|c| c.level());
        Ok(list)
    }

    async fn publish_leadership_level(
        &self,
        requirements: LevelRequirements,
        author: &str,
        reason: &str,
        effective_date: i64,
    ) -> EngineResult<LeadershipLevelConfig> {
        requirements.validate()?;
        let level = requirements.level;
        let mut state = self.config.write();
        let mut latest = 0;
        for c in state.level_configs.iter_mut().filter(|c| c.level() == level) {
            c.is_active = false;
            latest = latest.max(c.version);
        }
        let config = LeadershipLevelConfig {
            id: state.level_configs.len() as i64 + 1,
            requirements,
            version: latest + 1,
            is_active: true,
            modified_by: author.to_string(),
            reason: reason.to_string(),
            effective_date,
            created_at: now_millis(),
        };
        state.level_configs.push(config.clone());
        Ok(config)
    }

    async fn leadership_level_history(&self, level: u8) -> EngineResult<Vec<LeadershipLevelConfig>> {
        let mut list: Vec<LeadershipLevelConfig> = self
            .config
            .read()
            .level_configs
            .iter()
            .filter(|c| c.level() == level)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(list)
    }
}
