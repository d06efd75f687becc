//! Direct-Sale Calculator (ISP)
//!
//! `price_at_sale * rate[effective tier]` for a sale credited to the earner.

use crate::core::{EngineError, EngineResult};
use crate::eligibility::{EarningScheme, Eligibility, EligibilityGate};
use crate::rates::DirectSaleRates;
use crate::utils::money::round_money;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{Member, SaleEvent};

#[derive(Debug, Clone, Serialize)]
pub struct IspResult {
    pub sale_id: i64,
    pub amount: Decimal,
    /// Zero when ineligible
    pub rate: Decimal,
    pub eligibility: Eligibility,
}

pub fn calculate_isp(
    gate: &dyn EligibilityGate,
    earner: &Member,
    sale: &SaleEvent,
    rates: &DirectSaleRates,
) -> EngineResult<IspResult> {
    let eligibility = gate.check(earner, EarningScheme::DirectSale);
    let Some(tier) = eligibility.earning_tier() else {
        return Ok(IspResult {
            sale_id: sale.id,
            amount: Decimal::ZERO,
            rate: Decimal::ZERO,
            eligibility,
        });
    };

    if sale.seller_member_id != earner.id {
        return Err(EngineError::SaleNotCredited {
            sale_id: sale.id,
            member_id: earner.id,
        });
    }

    let rate = rates.rate_for(tier)?;
    let amount = round_money(sale.price_at_sale * rate);
    tracing::debug!(member_id = earner.id, sale_id = sale.id, %tier, %rate, %amount, "ISP calculated");

    Ok(IspResult {
        sale_id: sale.id,
        amount,
        rate,
        eligibility,
    })
}
