//! SQLite-backed stores over the repository layer

use super::{MemberDirectory, RateConfigStore};
use crate::core::EngineResult;
use crate::db::DbService;
use crate::db::repository::{leadership_level, member, rate_version, sale};
use crate::downline::NetworkNode;
use async_trait::async_trait;
use shared::models::{
    LeadershipLevelConfig, LevelRequirements, Member, MemberCreate, RateConfigType, RateTable,
    RateVersion, SaleCreate, SaleEvent, TeamComposition, Tier,
};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: &DbService) -> Self {
        Self {
            pool: db.pool.clone(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Enrollment, owned by the directory rather than the engine
    pub async fn enroll_member(&self, data: MemberCreate) -> EngineResult<Member> {
        Ok(member::create(&self.pool, data).await?)
    }

    pub async fn change_tier(
        &self,
        member_id: i64,
        tier: Tier,
        effective_tier_override: Option<Tier>,
    ) -> EngineResult<()> {
        Ok(member::update_tier(&self.pool, member_id, tier, effective_tier_override).await?)
    }

    pub async fn record_sale(&self, data: SaleCreate) -> EngineResult<SaleEvent> {
        Ok(sale::create(&self.pool, data).await?)
    }
}

#[async_trait]
impl MemberDirectory for SqliteStore {
    async fn find_member(&self, id: i64) -> EngineResult<Option<Member>> {
        Ok(member::find_by_id(&self.pool, id).await?)
    }

    async fn find_members(&self, ids: &[i64]) -> EngineResult<Vec<Member>> {
        Ok(member::find_by_ids(&self.pool, ids).await?)
    }

    async fn direct_referrals(&self, sponsor_id: i64) -> EngineResult<Vec<Member>> {
        Ok(member::find_referrals(&self.pool, sponsor_id).await?)
    }

    async fn network_snapshot(&self) -> EngineResult<Vec<NetworkNode>> {
        Ok(member::network_snapshot(&self.pool).await?)
    }

    async fn find_sale(&self, id: i64) -> EngineResult<Option<SaleEvent>> {
        Ok(sale::find_by_id(&self.pool, id).await?)
    }

    async fn sales_by_sellers_between(
        &self,
        seller_ids: &[i64],
        start: i64,
        end: i64,
    ) -> EngineResult<Vec<SaleEvent>> {
        Ok(sale::find_by_sellers_between(&self.pool, seller_ids, start, end).await?)
    }

    async fn sales_by_seller_between(
        &self,
        seller_id: i64,
        start: i64,
        end: i64,
    ) -> EngineResult<Vec<SaleEvent>> {
        Ok(sale::find_by_seller_between(&self.pool, seller_id, start, end).await?)
    }

    async fn save_team_composition(
        &self,
        member_id: i64,
        composition: &TeamComposition,
    ) -> EngineResult<()> {
        Ok(member::save_team_composition(&self.pool, member_id, composition).await?)
    }

    async fn credit_sale_pv(&self, sale_id: i64, member_ids: &[i64], pv: i64) -> EngineResult<bool> {
        Ok(member::credit_sale_pv(&self.pool, sale_id, member_ids, pv).await?)
    }

    async fn record_achievement(
        &self,
        member_id: i64,
        level: u8,
        achieved_at: i64,
    ) -> EngineResult<bool> {
        Ok(member::record_achievement(&self.pool, member_id, level, achieved_at).await?)
    }
}

#[async_trait]
impl RateConfigStore for SqliteStore {
    async fn find_active(&self, config_type: RateConfigType) -> EngineResult<Option<RateVersion>> {
        Ok(rate_version::find_active(&self.pool, config_type).await?)
    }

    async fn publish_new_version(
        &self,
        rates: RateTable,
        author: &str,
        reason: &str,
        effective_date: i64,
    ) -> EngineResult<RateVersion> {
        rates.validate()?;
        Ok(rate_version::publish(&self.pool, &rates, author, reason, effective_date).await?)
    }

    async fn history(&self, config_type: RateConfigType) -> EngineResult<Vec<RateVersion>> {
        Ok(rate_version::history(&self.pool, config_type).await?)
    }

    async fn active_leadership_levels(&self) -> EngineResult<Vec<LeadershipLevelConfig>> {
        Ok(leadership_level::find_all_active(&self.pool).await?)
    }

    async fn publish_leadership_level(
        &self,
        requirements: LevelRequirements,
        author: &str,
        reason: &str,
        effective_date: i64,
    ) -> EngineResult<LeadershipLevelConfig> {
        requirements.validate()?;
        Ok(leadership_level::publish(&self.pool, &requirements, author, reason, effective_date).await?)
    }

    async fn leadership_level_history(&self, level: u8) -> EngineResult<Vec<LeadershipLevelConfig>> {
        Ok(leadership_level::history(&self.pool, level).await?)
    }
}
