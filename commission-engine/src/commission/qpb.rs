//! Cycle Bonus Calculator (QPB)
//!
//! Direct sales inside the enclosing cycle window are taken in arrival order
//! and cut into consecutive sets of `set_size`. The first complete set pays
//! `first_set_rate`, every later one `additional_set_rate`. A trailing partial
//! set earns nothing yet. Grouping is never re-optimized.

use super::cycle::CycleWindow;
use crate::core::EngineResult;
use crate::eligibility::{EarningScheme, Eligibility, EligibilityGate};
use crate::rates::CycleBonusRates;
use crate::utils::money::round_money;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{IntroductoryWindow, Member, SaleEvent};
use shared::util::DAY_MILLIS;

/// One complete set
#[derive(Debug, Clone, Serialize)]
pub struct CycleSet {
    /// 1-indexed
    pub index: u32,
    pub sale_ids: Vec<i64>,
    pub sales_total: Decimal,
    pub rate: Decimal,
    pub bonus: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct QpbResult {
    pub window: CycleWindow,
    pub total: Decimal,
    pub sets_completed: u32,
    pub breakdown: Vec<CycleSet>,
    /// Sales waiting for their set to complete
    pub incomplete_sale_ids: Vec<i64>,
    pub eligibility: Eligibility,
}

/// Cycle bonus for the window enclosing `as_of`.
///
/// `sales` may contain anything; only sales credited to the earner inside
/// the window (and inside the introductory window, when one is configured)
/// are grouped.
pub fn calculate_qpb(
    gate: &dyn EligibilityGate,
    earner: &Member,
    as_of: i64,
    sales: &[SaleEvent],
    rates: &CycleBonusRates,
    tz: Tz,
) -> EngineResult<QpbResult> {
    let eligibility = gate.check(earner, EarningScheme::CycleBonus);
    let window = CycleWindow::enclosing(as_of, rates.cycle_start_day, tz)?;
    let mut result = QpbResult {
        window,
        total: Decimal::ZERO,
        sets_completed: 0,
        breakdown: Vec::new(),
        incomplete_sale_ids: Vec::new(),
        eligibility,
    };
    if !eligibility.is_eligible() {
        return Ok(result);
    }

    let introductory_end = match rates.introductory_window {
        IntroductoryWindow::Unrestricted => None,
        IntroductoryWindow::FirstDaysAfterJoining { days } => {
            Some(earner.joined_at + i64::from(days) * DAY_MILLIS)
        }
    };

    let mut qualifying: Vec<&SaleEvent> = sales
        .iter()
        .filter(|s| s.seller_member_id == earner.id && window.contains(s.timestamp))
        .filter(|s| introductory_end.is_none_or(|end| s.timestamp < end))
        .collect();
    qualifying.sort_by_key(|s| (s.timestamp, s.id));

    let set_size = rates.set_size.max(1) as usize;
    let sets = qualifying.chunks_exact(set_size);
    result.incomplete_sale_ids = sets.remainder().iter().map(|s| s.id).collect();

    for (i, set) in sets.enumerate() {
        let index = i as u32 + 1;
        let sales_total: Decimal = set.iter().map(|s| s.price_at_sale).sum();
        let rate = rates.rate_for_set(index);
        let bonus = round_money(sales_total * rate);
        result.total += bonus;
        result.breakdown.push(CycleSet {
            index,
            sale_ids: set.iter().map(|s| s.id).collect(),
            sales_total,
            rate,
            bonus,
        });
    }
    result.sets_completed = result.breakdown.len() as u32;

    tracing::debug!(
        member_id = earner.id,
        cycle_start = %window.first_day,
        sets = result.sets_completed,
        pending = result.incomplete_sale_ids.len(),
        total = %result.total,
        "QPB calculated"
    );
    Ok(result)
}
