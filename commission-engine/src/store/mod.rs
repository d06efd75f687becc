//! External collaborators of the engine
//!
//! [`MemberDirectory`] owns members and sale events; [`RateConfigStore`] owns
//! the versioned rate tables and leadership ladder. The engine reads both and
//! writes only PV credit, composition snapshots, achievements and new
//! configuration versions.
//!
//! Two implementations ship: [`SqliteStore`] over the repository layer and
//! [`InMemoryStore`] for tests and embedding.

mod memory;
mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::core::{EngineError, EngineResult};
use crate::downline::NetworkNode;
use async_trait::async_trait;
use shared::models::{
    LeadershipLevelConfig, LevelRequirements, Member, RateConfigType, RateTable, RateVersion,
    SaleEvent, TeamComposition,
};

#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn find_member(&self, id: i64) -> EngineResult<Option<Member>>;

    /// Members for the given ids; unknown ids are skipped
    async fn find_members(&self, ids: &[i64]) -> EngineResult<Vec<Member>>;

    /// Direct referrals with their achievements, oldest first
    async fn direct_referrals(&self, sponsor_id: i64) -> EngineResult<Vec<Member>>;

    /// Sponsor edges and tiers of the whole network
    async fn network_snapshot(&self) -> EngineResult<Vec<NetworkNode>>;

    async fn find_sale(&self, id: i64) -> EngineResult<Option<SaleEvent>>;

    /// Sales credited to any of `seller_ids` with `start <= timestamp < end`, oldest first
    async fn sales_by_sellers_between(
        &self,
        seller_ids: &[i64],
        start: i64,
        end: i64,
    ) -> EngineResult<Vec<SaleEvent>>;

    /// Sales credited to `seller_id` with `start <= timestamp < end`, oldest first
    async fn sales_by_seller_between(
        &self,
        seller_id: i64,
        start: i64,
        end: i64,
    ) -> EngineResult<Vec<SaleEvent>>;

    async fn save_team_composition(
        &self,
        member_id: i64,
        composition: &TeamComposition,
    ) -> EngineResult<()>;

    /// Add `pv` to every listed member, at most once per sale.
    ///
    /// Returns `false` when the sale had already been credited.
    async fn credit_sale_pv(&self, sale_id: i64, member_ids: &[i64], pv: i64) -> EngineResult<bool>;

    /// Returns `false` when the level was already on record
    async fn record_achievement(&self, member_id: i64, level: u8, achieved_at: i64)
    -> EngineResult<bool>;
}

#[async_trait]
pub trait RateConfigStore: Send + Sync {
    async fn find_active(&self, config_type: RateConfigType) -> EngineResult<Option<RateVersion>>;

    /// Active version of a family; a missing one is a structural failure
    async fn get_active(&self, config_type: RateConfigType) -> EngineResult<RateVersion> {
        self.find_active(config_type).await?.ok_or_else(|| {
            EngineError::ConfigurationMissing(format!("{config_type} rate version"))
        })
    }

    /// Atomically supersede the active version of `rates.config_type()`
    async fn publish_new_version(
        &self,
        rates: RateTable,
        author: &str,
        reason: &str,
        effective_date: i64,
    ) -> EngineResult<RateVersion>;

    /// All versions of a family, newest first
    async fn history(&self, config_type: RateConfigType) -> EngineResult<Vec<RateVersion>>;

    /// Active definitions ordered by level (possibly incomplete)
    async fn active_leadership_levels(&self) -> EngineResult<Vec<LeadershipLevelConfig>>;

    async fn publish_leadership_level(
        &self,
        requirements: LevelRequirements,
        author: &str,
        reason: &str,
        effective_date: i64,
    ) -> EngineResult<LeadershipLevelConfig>;

    async fn leadership_level_history(&self, level: u8) -> EngineResult<Vec<LeadershipLevelConfig>>;
}
