//! Tier Catalog
//!
//! Static mapping from membership tier to list price and point-value (PV).
//! PV is never stored: it is always `round(price / 20)`, half away from zero.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currency units per point of PV
const PRICE_PER_PV: i64 = 20;

/// Membership tier (T0..T6)
///
/// Ordering follows the ladder, so `Tier::Silver >= Tier::Bronze` holds.
/// `Diamond` is the white-label tier and sits above the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Tier {
    Fam,
    Bronze,
    Copper,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Tier {
    /// All tiers in ladder order
    pub const ALL: [Tier; 7] = [
        Tier::Fam,
        Tier::Bronze,
        Tier::Copper,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Diamond,
    ];

    /// Tier assigned on enrollment
    pub const LOWEST: Tier = Tier::Fam;

    /// Ordinal position (T0 = FAM ... T6 = DIAMOND)
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Tier> {
        Self::ALL.get(ordinal as usize).copied()
    }

    /// The tier directly beneath this one, if any
    pub fn next_lower(self) -> Option<Tier> {
        self.ordinal()
            .checked_sub(1)
            .and_then(Tier::from_ordinal)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Tier::Fam => "FAM",
            Tier::Bronze => "BRONZE",
            Tier::Copper => "COPPER",
            Tier::Silver => "SILVER",
            Tier::Gold => "GOLD",
            Tier::Platinum => "PLATINUM",
            Tier::Diamond => "DIAMOND",
        }
    }

    pub fn is_white_label(self) -> bool {
        TierCatalog::is_white_label(self)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown tier name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tier: {0}")]
pub struct UnknownTier(pub String);

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Tier::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownTier(s.to_string()))
    }
}

/// One catalog row
#[derive(Debug, Clone, Copy)]
struct TierEntry {
    /// List price in whole currency units
    price: i64,
    white_label: bool,
}

/// Indexed by `Tier::ordinal`
const CATALOG: [TierEntry; 7] = [
    TierEntry { price: 0, white_label: false },
    TierEntry { price: 480, white_label: false },
    TierEntry { price: 990, white_label: false },
    TierEntry { price: 2000, white_label: false },
    TierEntry { price: 2980, white_label: false },
    TierEntry { price: 4980, white_label: false },
    // White-label sets its own price outside the ladder
    TierEntry { price: 4980, white_label: true },
];

/// Pure lookups over the static tier table
pub struct TierCatalog;

impl TierCatalog {
    fn entry(tier: Tier) -> &'static TierEntry {
        &CATALOG[tier.ordinal() as usize]
    }

    /// List price of a tier package
    pub fn price_of(tier: Tier) -> Decimal {
        Decimal::from(Self::entry(tier).price)
    }

    /// Point-value of a tier package: `round(price / 20)`
    pub fn pv_of(tier: Tier) -> i64 {
        (Self::price_of(tier) / Decimal::from(PRICE_PER_PV))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or_default()
    }

    pub fn is_white_label(tier: Tier) -> bool {
        Self::entry(tier).white_label
    }

    /// Highest tier that still takes part in network earnings.
    ///
    /// A white-label member holding an override earns at this tier.
    pub fn highest_network_tier() -> Tier {
        Tier::ALL
            .into_iter()
            .rev()
            .find(|t| !Self::is_white_label(*t))
            .unwrap_or(Tier::LOWEST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pv_is_rounded_price_over_twenty() {
        for tier in Tier::ALL {
            let expected = (TierCatalog::price_of(tier) / Decimal::from(20))
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            assert_eq!(Decimal::from(TierCatalog::pv_of(tier)), expected, "{tier}");
        }
    }

    #[test]
    fn test_catalog_values() {
        assert_eq!(TierCatalog::price_of(Tier::Silver), Decimal::from(2000));
        assert_eq!(TierCatalog::pv_of(Tier::Silver), 100);
        // 990 / 20 = 49.5 rounds away from zero
        assert_eq!(TierCatalog::pv_of(Tier::Copper), 50);
        assert_eq!(TierCatalog::pv_of(Tier::Gold), 149);
        assert_eq!(TierCatalog::pv_of(Tier::Fam), 0);
    }

    #[test]
    fn test_exactly_one_white_label_tier() {
        let white_label: Vec<Tier> = Tier::ALL
            .into_iter()
            .filter(|t| TierCatalog::is_white_label(*t))
            .collect();
        assert_eq!(white_label, vec![Tier::Diamond]);
        assert!(Tier::Diamond.is_white_label());
    }

    #[test]
    fn test_ladder_is_monotonic_outside_white_label() {
        let ladder: Vec<Tier> = Tier::ALL
            .into_iter()
            .filter(|t| !t.is_white_label())
            .collect();
        for pair in ladder.windows(2) {
            assert!(TierCatalog::price_of(pair[0]) <= TierCatalog::price_of(pair[1]));
            assert!(TierCatalog::pv_of(pair[0]) <= TierCatalog::pv_of(pair[1]));
        }
    }

    #[test]
    fn test_highest_network_tier_is_platinum() {
        assert_eq!(TierCatalog::highest_network_tier(), Tier::Platinum);
    }

    #[test]
    fn test_ordinals_and_parsing() {
        assert_eq!(Tier::Silver.ordinal(), 3);
        assert_eq!(Tier::from_ordinal(6), Some(Tier::Diamond));
        assert_eq!(Tier::from_ordinal(7), None);
        assert_eq!(Tier::Fam.next_lower(), None);
        assert_eq!(Tier::Gold.next_lower(), Some(Tier::Silver));
        assert_eq!("silver".parse::<Tier>(), Ok(Tier::Silver));
        assert_eq!(Tier::Platinum.to_string(), "PLATINUM");
        assert!("emerald".parse::<Tier>().is_err());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Tier::Copper).unwrap(), "\"COPPER\"");
        let t: Tier = serde_json::from_str("\"DIAMOND\"").unwrap();
        assert_eq!(t, Tier::Diamond);
    }
}
