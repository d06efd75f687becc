//! Commission engine facade
//!
//! Loads snapshots from the [`MemberDirectory`], resolves the active rate
//! versions from the [`RateConfigStore`] and hands both to the pure
//! calculators. The downline is walked at most once per call.

use crate::commission::{
    CycleWindow, IspResult, QpbResult, TscResult, calculate_isp, calculate_qpb, calculate_tsc,
};
use crate::core::{EngineError, EngineResult, EngineSettings};
use crate::downline::{DownlineIndex, DownlineTree, GenerationStats};
use crate::eligibility::{EarningScheme, Eligibility, EligibilityGate, WhiteLabelGate};
use crate::leadership::{
    self, Ladder, LevelCheck, MaintenanceStatus, QualificationInput, QualificationVerdict,
};
use crate::rates::defaults::{self, ActiveConfiguration};
use crate::rates::{CycleBonusRates, DirectSaleRates, GenerationDecayRates};
use crate::store::{MemberDirectory, RateConfigStore};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{
    InvalidRateTable, LAST_TEAM_GENERATION, LeadershipLevelConfig, LevelRequirements, Member,
    RateConfigType, RateTable, RateVersion, SaleEvent, TeamComposition,
};
use shared::util::now_millis;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything a member earned over a period
#[derive(Debug, Clone, Serialize)]
pub struct CommissionStatement {
    pub member_id: i64,
    pub period_start: i64,
    pub period_end: i64,
    pub isp: Vec<IspResult>,
    pub isp_total: Decimal,
    pub qpb: QpbResult,
    pub tsc: TscResult,
    pub total: Decimal,
    pub eligibility: Eligibility,
}

/// Downline shape of a member
#[derive(Debug, Clone, Serialize)]
pub struct TeamOverview {
    pub member_id: i64,
    pub composition: TeamComposition,
    pub generations: BTreeMap<u32, GenerationStats>,
    pub max_depth: u32,
}

/// Result of persisting a ladder walk
#[derive(Debug, Clone, Serialize)]
pub struct QualificationRecord {
    pub verdict: QualificationVerdict,
    /// Levels recorded by this call
    pub newly_reached: Vec<u8>,
}

pub struct CommissionEngine {
    directory: Arc<dyn MemberDirectory>,
    rates: Arc<dyn RateConfigStore>,
    gate: Arc<dyn EligibilityGate>,
    settings: EngineSettings,
}

impl CommissionEngine {
    pub fn new(
        directory: Arc<dyn MemberDirectory>,
        rates: Arc<dyn RateConfigStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            directory,
            rates,
            gate: Arc::new(WhiteLabelGate),
            settings,
        }
    }

    /// Replace the default white-label gate
    pub fn with_gate(mut self, gate: Arc<dyn EligibilityGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ========== Lookups ==========

    async fn member(&self, member_id: i64) -> EngineResult<Member> {
        self.directory
            .find_member(member_id)
            .await?
            .ok_or(EngineError::MemberNotFound(member_id))
    }

    async fn network(&self) -> EngineResult<DownlineIndex> {
        Ok(DownlineIndex::from_nodes(self.directory.network_snapshot().await?))
    }

    async fn direct_sale_rates(&self) -> EngineResult<DirectSaleRates> {
        DirectSaleRates::from_version(&self.rates.get_active(RateConfigType::DirectSale).await?)
    }

    async fn cycle_bonus_rates(&self) -> EngineResult<CycleBonusRates> {
        CycleBonusRates::from_version(&self.rates.get_active(RateConfigType::CycleBonus).await?)
    }

    async fn generation_decay_rates(&self) -> EngineResult<GenerationDecayRates> {
        GenerationDecayRates::from_version(
            &self.rates.get_active(RateConfigType::GenerationDecay).await?,
        )
    }

    async fn ladder(&self) -> EngineResult<Ladder> {
        Ladder::from_configs(self.rates.active_leadership_levels().await?)
    }

    fn check_period(period_start: i64, period_end: i64) -> EngineResult<()> {
        if period_start >= period_end {
            return Err(EngineError::InvalidRequest(format!(
                "empty period [{period_start}, {period_end})"
            )));
        }
        Ok(())
    }

    // ========== Commissions ==========

    /// ISP for one direct sale
    pub async fn compute_isp(&self, member_id: i64, sale_id: i64) -> EngineResult<IspResult> {
        let member = self.member(member_id).await?;
        let sale = self
            .directory
            .find_sale(sale_id)
            .await?
            .ok_or(EngineError::SaleNotFound(sale_id))?;
        let rates = self.direct_sale_rates().await?;
        calculate_isp(self.gate.as_ref(), &member, &sale, &rates)
    }

    /// QPB for the cycle window enclosing `as_of`
    pub async fn compute_qpb(&self, member_id: i64, as_of: i64) -> EngineResult<QpbResult> {
        let member = self.member(member_id).await?;
        let rates = self.cycle_bonus_rates().await?;
        let sales = if self.gate.is_eligible(&member, EarningScheme::CycleBonus) {
            let window = CycleWindow::enclosing(as_of, rates.cycle_start_day, self.settings.timezone)?;
            self.directory
                .sales_by_seller_between(member_id, window.start, window.end)
                .await?
        } else {
            Vec::new()
        };
        calculate_qpb(
            self.gate.as_ref(),
            &member,
            as_of,
            &sales,
            &rates,
            self.settings.timezone,
        )
    }

    /// TSC over `[period_start, period_end)`
    pub async fn compute_tsc(
        &self,
        member_id: i64,
        period_start: i64,
        period_end: i64,
    ) -> EngineResult<TscResult> {
        Self::check_period(period_start, period_end)?;
        let member = self.member(member_id).await?;
        let rates = self.generation_decay_rates().await?;
        let tree = self.team_tree(&member, EarningScheme::TeamCommission).await?;
        let sales = self.team_sales(&tree, &rates, period_start, period_end).await?;
        calculate_tsc(
            self.gate.as_ref(),
            &member,
            &tree,
            &sales,
            period_start,
            period_end,
            &rates,
        )
    }

    /// Downline to generation 10, skipped entirely for ineligible earners
    async fn team_tree(&self, member: &Member, scheme: EarningScheme) -> EngineResult<DownlineTree> {
        if !self.gate.is_eligible(member, scheme) {
            return Ok(DownlineTree::root_only(member.id));
        }
        self.network()
            .await?
            .build_subtree(member.id, Some(u32::from(LAST_TEAM_GENERATION)))
    }

    /// Sales of the members sitting in paid generations
    async fn team_sales(
        &self,
        tree: &DownlineTree,
        rates: &GenerationDecayRates,
        period_start: i64,
        period_end: i64,
    ) -> EngineResult<Vec<SaleEvent>> {
        let sellers: Vec<i64> = rates
            .generations()
            .flat_map(|generation| tree.members_at(u32::from(generation)))
            .map(|m| m.id)
            .collect();
        if sellers.is_empty() {
            return Ok(Vec::new());
        }
        self.directory
            .sales_by_sellers_between(&sellers, period_start, period_end)
            .await
    }

    /// ISP for every direct sale in the period, QPB for the cycle holding the
    /// period's last instant, and TSC for the period
    pub async fn compute_statement(
        &self,
        member_id: i64,
        period_start: i64,
        period_end: i64,
    ) -> EngineResult<CommissionStatement> {
        Self::check_period(period_start, period_end)?;
        let member = self.member(member_id).await?;
        let direct_rates = self.direct_sale_rates().await?;
        let cycle_rates = self.cycle_bonus_rates().await?;
        let decay_rates = self.generation_decay_rates().await?;
        let eligibility = self.gate.check(&member, EarningScheme::DirectSale);

        // Ineligible earners get zeroed results without any sale lookups
        let direct_sales = if eligibility.is_eligible() {
            self.directory
                .sales_by_seller_between(member_id, period_start, period_end)
                .await?
        } else {
            Vec::new()
        };
        let isp = direct_sales
            .iter()
            .map(|sale| calculate_isp(self.gate.as_ref(), &member, sale, &direct_rates))
            .collect::<EngineResult<Vec<_>>>()?;
        let isp_total: Decimal = isp.iter().map(|r| r.amount).sum();

        let qpb_as_of = period_end - 1;
        let cycle_sales = if self.gate.is_eligible(&member, EarningScheme::CycleBonus) {
            let window =
                CycleWindow::enclosing(qpb_as_of, cycle_rates.cycle_start_day, self.settings.timezone)?;
            self.directory
                .sales_by_seller_between(member_id, window.start, window.end)
                .await?
        } else {
            Vec::new()
        };
        let qpb = calculate_qpb(
            self.gate.as_ref(),
            &member,
            qpb_as_of,
            &cycle_sales,
            &cycle_rates,
            self.settings.timezone,
        )?;

        let tree = self.team_tree(&member, EarningScheme::TeamCommission).await?;
        let team_sales = self.team_sales(&tree, &decay_rates, period_start, period_end).await?;
        let tsc = calculate_tsc(
            self.gate.as_ref(),
            &member,
            &tree,
            &team_sales,
            period_start,
            period_end,
            &decay_rates,
        )?;

        let total = isp_total + qpb.total + tsc.total;
        tracing::info!(member_id, %isp_total, qpb = %qpb.total, tsc = %tsc.total, %total, "Statement computed");
        Ok(CommissionStatement {
            member_id,
            period_start,
            period_end,
            isp,
            isp_total,
            qpb,
            tsc,
            total,
            eligibility,
        })
    }

    // ========== Team ==========

    /// Recompute and store the composition of the member's full downline
    pub async fn refresh_team_composition(&self, member_id: i64) -> EngineResult<TeamComposition> {
        self.member(member_id).await?;
        let tree = self.network().await?.build_subtree(member_id, None)?;
        self.store_composition(&tree, now_millis()).await
    }

    async fn store_composition(&self, tree: &DownlineTree, now: i64) -> EngineResult<TeamComposition> {
        let composition = tree.composition(self.settings.silver_plus_threshold, now)?;
        self.directory
            .save_team_composition(tree.root_id(), &composition)
            .await?;
        tracing::debug!(
            member_id = tree.root_id(),
            total = composition.total_members,
            silver_plus = composition.silver_plus_percentage,
            "Team composition refreshed"
        );
        Ok(composition)
    }

    /// Cached composition when fresh, otherwise a recomputed and stored one
    async fn current_composition(&self, member: &Member, now: i64) -> EngineResult<TeamComposition> {
        if let Some(cached) = member.fresh_composition(now, self.settings.composition_ttl_millis) {
            return Ok(cached.clone());
        }
        let tree = self.network().await?.build_subtree(member.id, None)?;
        self.store_composition(&tree, now).await
    }

    /// Per-generation statistics plus the composition snapshot
    pub async fn team_overview(&self, member_id: i64) -> EngineResult<TeamOverview> {
        let member = self.member(member_id).await?;
        let now = now_millis();
        let tree = self.network().await?.build_subtree(member_id, None)?;
        let composition = match member.fresh_composition(now, self.settings.composition_ttl_millis) {
            Some(cached) => cached.clone(),
            None => self.store_composition(&tree, now).await?,
        };
        Ok(TeamOverview {
            member_id,
            composition,
            generations: tree.generation_stats(),
            max_depth: tree.max_depth(),
        })
    }

    /// Credit the sale's PV to the seller and their whole upline, once
    pub async fn attribute_sale_pv(&self, sale_id: i64) -> EngineResult<bool> {
        let sale = self
            .directory
            .find_sale(sale_id)
            .await?
            .ok_or(EngineError::SaleNotFound(sale_id))?;
        let index = self.network().await?;
        let mut credited = vec![sale.seller_member_id];
        credited.extend(index.upline(sale.seller_member_id)?);

        let pv = sale.pv();
        let applied = self.directory.credit_sale_pv(sale_id, &credited, pv).await?;
        if applied {
            tracing::info!(sale_id, pv, members = credited.len(), "Sale PV attributed");
        } else {
            tracing::debug!(sale_id, "Sale PV already attributed");
        }
        Ok(applied)
    }

    // ========== Leadership ==========

    async fn with_qualification_input<T>(
        &self,
        member: &Member,
        as_of: i64,
        run: impl FnOnce(&QualificationInput<'_>) -> T,
    ) -> EngineResult<T> {
        let eligibility = self.gate.check(member, EarningScheme::Leadership);
        let (composition, referrals) = if eligibility.is_eligible() {
            (
                self.current_composition(member, as_of).await?,
                self.directory.direct_referrals(member.id).await?,
            )
        } else {
            (TeamComposition::empty(as_of), Vec::new())
        };
        let input = QualificationInput {
            member,
            earning_tier: eligibility.earning_tier().unwrap_or(member.tier),
            composition: &composition,
            referrals: &referrals,
            as_of,
            tz: self.settings.timezone,
        };
        Ok(run(&input))
    }

    pub async fn highest_qualified_level(&self, member_id: i64) -> EngineResult<QualificationVerdict> {
        self.highest_qualified_level_at(member_id, now_millis()).await
    }

    /// Ladder walk with gen-1 durations measured up to `as_of`
    pub async fn highest_qualified_level_at(
        &self,
        member_id: i64,
        as_of: i64,
    ) -> EngineResult<QualificationVerdict> {
        let member = self.member(member_id).await?;
        let ladder = self.ladder().await?;
        self.with_qualification_input(&member, as_of, |input| {
            leadership::highest_qualified_level(self.gate.as_ref(), &ladder, input)
        })
        .await
    }

    pub async fn check_level(&self, member_id: i64, level: u8) -> EngineResult<LevelCheck> {
        let member = self.member(member_id).await?;
        let ladder = self.ladder().await?;
        self.with_qualification_input(&member, now_millis(), |input| {
            leadership::check_level(self.gate.as_ref(), &ladder, input, level)
        })
        .await?
    }

    /// Walk the ladder and store every newly reached level as an achievement
    pub async fn record_qualification(&self, member_id: i64, as_of: i64) -> EngineResult<QualificationRecord> {
        let verdict = self.highest_qualified_level_at(member_id, as_of).await?;
        let mut newly_reached = Vec::new();
        for &level in &verdict.qualified_levels {
            if self.directory.record_achievement(member_id, level, as_of).await? {
                newly_reached.push(level);
            }
        }
        if !newly_reached.is_empty() {
            tracing::info!(member_id, levels = ?newly_reached, "Leadership levels reached");
        }
        Ok(QualificationRecord {
            verdict,
            newly_reached,
        })
    }

    /// Upkeep of the member's highest qualified level; `None` below level 1
    pub async fn check_maintenance(
        &self,
        member_id: i64,
        as_of: i64,
    ) -> EngineResult<Option<MaintenanceStatus>> {
        let verdict = self.highest_qualified_level_at(member_id, as_of).await?;
        if verdict.level == 0 {
            return Ok(None);
        }
        let ladder = self.ladder().await?;
        let requirements = ladder
            .level(verdict.level)
            .ok_or_else(|| EngineError::ConfigurationMissing(format!("leadership level {}", verdict.level)))?;
        let cycle = self.cycle_bonus_rates().await?;
        let window = CycleWindow::enclosing(as_of, cycle.cycle_start_day, self.settings.timezone)?;
        let personal_sales = self
            .directory
            .sales_by_seller_between(member_id, window.start, window.end)
            .await?
            .len() as u32;
        Ok(Some(leadership::check_maintenance(requirements, window, personal_sales)))
    }

    // ========== Configuration ==========

    /// Publish a new version of a rate family; returns the stored version
    pub async fn publish_rate_version(
        &self,
        config_type: RateConfigType,
        rates: RateTable,
        author: &str,
        reason: &str,
    ) -> EngineResult<RateVersion> {
        if rates.config_type() != config_type {
            return Err(InvalidRateTable(format!(
                "{} table published as {config_type}",
                rates.config_type()
            ))
            .into());
        }
        if author.trim().is_empty() {
            return Err(EngineError::InvalidRequest("author is required".into()));
        }
        let version = self
            .rates
            .publish_new_version(rates, author, reason, now_millis())
            .await?;
        tracing::info!(
            %config_type,
            version = version.version,
            author,
            reason,
            "Rate version published"
        );
        Ok(version)
    }

    pub async fn publish_leadership_level(
        &self,
        requirements: LevelRequirements,
        author: &str,
        reason: &str,
    ) -> EngineResult<LeadershipLevelConfig> {
        if author.trim().is_empty() {
            return Err(EngineError::InvalidRequest("author is required".into()));
        }
        let config = self
            .rates
            .publish_leadership_level(requirements, author, reason, now_millis())
            .await?;
        tracing::info!(
            level = config.level(),
            version = config.version,
            author,
            reason,
            "Leadership level published"
        );
        Ok(config)
    }

    pub async fn rate_history(&self, config_type: RateConfigType) -> EngineResult<Vec<RateVersion>> {
        self.rates.history(config_type).await
    }

    pub async fn leadership_level_history(&self, level: u8) -> EngineResult<Vec<LeadershipLevelConfig>> {
        self.rates.leadership_level_history(level).await
    }

    /// Fails with `ConfigurationMissing` unless every family and level is active
    pub async fn verify_configuration(&self) -> EngineResult<ActiveConfiguration> {
        defaults::verify_active(self.rates.as_ref()).await
    }
}
