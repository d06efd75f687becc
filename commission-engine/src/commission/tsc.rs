//! Generational Team Calculator (TSC)
//!
//! Sales credited to downline members at generations 2..=10 are summed per
//! generation and paid at that generation's decay rate. Generation 1 belongs
//! to ISP. White-label members are ordinary nodes here: they do not block the
//! sales beneath them from reaching the earner.

use crate::core::{EngineError, EngineResult};
use crate::downline::DownlineTree;
use crate::eligibility::{EarningScheme, Eligibility, EligibilityGate};
use crate::rates::GenerationDecayRates;
use crate::utils::money::round_money;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{FIRST_TEAM_GENERATION, LAST_TEAM_GENERATION, Member, SaleEvent};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct TscResult {
    pub period_start: i64,
    pub period_end: i64,
    pub total: Decimal,
    /// Every paid generation, zero where nothing sold
    pub by_generation: BTreeMap<u8, Decimal>,
    pub sales_counted: usize,
    pub eligibility: Eligibility,
}

/// Team commission over `[period_start, period_end)`.
///
/// `tree` must be rooted at the earner and reach at least generation 10.
pub fn calculate_tsc(
    gate: &dyn EligibilityGate,
    earner: &Member,
    tree: &DownlineTree,
    sales: &[SaleEvent],
    period_start: i64,
    period_end: i64,
    rates: &GenerationDecayRates,
) -> EngineResult<TscResult> {
    let eligibility = gate.check(earner, EarningScheme::TeamCommission);
    let mut result = TscResult {
        period_start,
        period_end,
        total: Decimal::ZERO,
        by_generation: rates.generations().map(|g| (g, Decimal::ZERO)).collect(),
        sales_counted: 0,
        eligibility,
    };
    if !eligibility.is_eligible() {
        return Ok(result);
    }
    if tree.root_id() != earner.id {
        return Err(EngineError::InvalidRequest(format!(
            "downline of member {} used for member {}",
            tree.root_id(),
            earner.id
        )));
    }

    let mut volume: BTreeMap<u8, Decimal> = BTreeMap::new();
    for sale in sales.iter().filter(|s| s.occurred_within(period_start, period_end)) {
        let Some(generation) = tree.generation_of(sale.seller_member_id) else {
            continue;
        };
        let Ok(generation) = u8::try_from(generation) else {
            continue;
        };
        if !(FIRST_TEAM_GENERATION..=LAST_TEAM_GENERATION).contains(&generation) {
            continue;
        }
        *volume.entry(generation).or_insert(Decimal::ZERO) += sale.price_at_sale;
        result.sales_counted += 1;
    }

    for (generation, sales_total) in volume {
        let amount = round_money(sales_total * rates.rate_for(generation)?);
        result.by_generation.insert(generation, amount);
        result.total += amount;
    }

    tracing::debug!(
        member_id = earner.id,
        sales = result.sales_counted,
        total = %result.total,
        "TSC calculated"
    );
    Ok(result)
}
