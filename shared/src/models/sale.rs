//! Sale Event Model

use super::tier::{Tier, TierCatalog};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An enrollment or upgrade purchase, credited to the buyer's direct sponsor.
///
/// Produced by the Member Directory and immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleEvent {
    pub id: i64,
    /// The new or upgrading member
    pub buyer_member_id: i64,
    /// The direct sponsor credited with the sale
    pub seller_member_id: i64,
    pub tier_purchased: Tier,
    pub price_at_sale: Decimal,
    /// Unix millis
    pub timestamp: i64,
}

impl SaleEvent {
    /// PV credited up the network for this sale
    pub fn pv(&self) -> i64 {
        TierCatalog::pv_of(self.tier_purchased)
    }

    /// Half-open `[start, end)` containment
    pub fn occurred_within(&self, start: i64, end: i64) -> bool {
        self.timestamp >= start && self.timestamp < end
    }
}

/// Record sale payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleCreate {
    pub buyer_member_id: i64,
    pub seller_member_id: i64,
    pub tier_purchased: Tier,
    /// Defaults to the catalog price of `tier_purchased`
    pub price_at_sale: Option<Decimal>,
    pub timestamp: i64,
}

impl SaleCreate {
    pub fn price(&self) -> Decimal {
        self.price_at_sale
            .unwrap_or_else(|| TierCatalog::price_of(self.tier_purchased))
    }
}
