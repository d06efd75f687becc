//! Rate Configuration Models
//!
//! Versioned rate tables for the three commission families. A version row is
//! immutable after creation; publishing supersedes it with `version + 1`.

use super::tier::Tier;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// First and last generation paid by the generational team commission
pub const FIRST_TEAM_GENERATION: u8 = 2;
pub const LAST_TEAM_GENERATION: u8 = 10;

/// Rate family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum RateConfigType {
    DirectSale,
    CycleBonus,
    GenerationDecay,
}

impl RateConfigType {
    pub const ALL: [RateConfigType; 3] = [
        RateConfigType::DirectSale,
        RateConfigType::CycleBonus,
        RateConfigType::GenerationDecay,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            RateConfigType::DirectSale => "DIRECT_SALE",
            RateConfigType::CycleBonus => "CYCLE_BONUS",
            RateConfigType::GenerationDecay => "GENERATION_DECAY",
        }
    }
}

impl fmt::Display for RateConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateConfigType {
    type Err = InvalidRateTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RateConfigType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| InvalidRateTable(format!("unknown config type: {s}")))
    }
}

/// Rejection reason for a malformed rate table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rate table: {0}")]
pub struct InvalidRateTable(pub String);

/// Which of the earner's cycle sales count toward the cycle bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntroductoryWindow {
    /// Every sale in the cycle counts
    #[default]
    Unrestricted,
    /// Only sales made within `days` of the earner joining count
    FirstDaysAfterJoining { days: u32 },
}

/// Rate table payload, one shape per family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateTable {
    /// Direct-sale (ISP) rate keyed by the earner's effective tier
    DirectSale { rates: BTreeMap<Tier, Decimal> },
    /// Cycle bonus (QPB) set rates and window shape
    CycleBonus {
        first_set_rate: Decimal,
        additional_set_rate: Decimal,
        set_size: u32,
        /// Day of month the cycle opens (window closes the day before, next month)
        cycle_start_day: u32,
        #[serde(default)]
        introductory_window: IntroductoryWindow,
    },
    /// Team (TSC) rate keyed by generation depth 2..=10
    GenerationDecay {
        #[serde(with = "generation_keys")]
        rates: BTreeMap<u8, Decimal>,
    },
}

/// Generation map with JSON object keys ("2".."10")
///
/// 内部标签枚举会先缓冲内容, 整数键无法直接还原, 这里显式按字符串解析
mod generation_keys {
    use rust_decimal::Decimal;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(rates: &BTreeMap<u8, Decimal>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_map(rates.iter().map(|(generation, rate)| (generation.to_string(), rate)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<u8, Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        BTreeMap::<String, Decimal>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, rate)| {
                key.parse::<u8>()
                    .map(|generation| (generation, rate))
                    .map_err(|_| D::Error::custom(format!("invalid generation key: {key}")))
            })
            .collect()
    }
}

impl RateTable {
    pub fn config_type(&self) -> RateConfigType {
        match self {
            RateTable::DirectSale { .. } => RateConfigType::DirectSale,
            RateTable::CycleBonus { .. } => RateConfigType::CycleBonus,
            RateTable::GenerationDecay { .. } => RateConfigType::GenerationDecay,
        }
    }

    /// Structural checks run before a table may be published
    pub fn validate(&self) -> Result<(), InvalidRateTable> {
        match self {
            RateTable::DirectSale { rates } => {
                for tier in Tier::ALL {
                    let rate = rates.get(&tier).ok_or_else(|| {
                        InvalidRateTable(format!("direct-sale rate missing for {tier}"))
                    })?;
                    check_fraction(&format!("direct-sale rate for {tier}"), *rate)?;
                }
                Ok(())
            }
            RateTable::CycleBonus {
                first_set_rate,
                additional_set_rate,
                set_size,
                cycle_start_day,
                introductory_window,
            } => {
                check_fraction("first set rate", *first_set_rate)?;
                check_fraction("additional set rate", *additional_set_rate)?;
                if *set_size == 0 {
                    return Err(InvalidRateTable("set size must be positive".into()));
                }
                // 28 keeps the window well-defined in February
                if !(1..=28).contains(cycle_start_day) {
                    return Err(InvalidRateTable(format!(
                        "cycle start day {cycle_start_day} outside 1..=28"
                    )));
                }
                if let IntroductoryWindow::FirstDaysAfterJoining { days: 0 } = introductory_window {
                    return Err(InvalidRateTable(
                        "introductory window must span at least one day".into(),
                    ));
                }
                Ok(())
            }
            RateTable::GenerationDecay { rates } => {
                if let Some(g) = rates
                    .keys()
                    .find(|g| !(FIRST_TEAM_GENERATION..=LAST_TEAM_GENERATION).contains(*g))
                {
                    return Err(InvalidRateTable(format!(
                        "generation {g} outside {FIRST_TEAM_GENERATION}..={LAST_TEAM_GENERATION}"
                    )));
                }
                let mut previous: Option<Decimal> = None;
                for generation in FIRST_TEAM_GENERATION..=LAST_TEAM_GENERATION {
                    let rate = *rates.get(&generation).ok_or_else(|| {
                        InvalidRateTable(format!("rate missing for generation {generation}"))
                    })?;
                    check_fraction(&format!("generation {generation} rate"), rate)?;
                    if let Some(prev) = previous
                        && rate > prev
                    {
                        return Err(InvalidRateTable(format!(
                            "generation {generation} rate {rate} exceeds the shallower rate {prev}"
                        )));
                    }
                    previous = Some(rate);
                }
                Ok(())
            }
        }
    }
}

fn check_fraction(what: &str, rate: Decimal) -> Result<(), InvalidRateTable> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(InvalidRateTable(format!("{what} {rate} outside [0, 1]")));
    }
    Ok(())
}

/// One immutable version of a rate family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateVersion {
    pub id: i64,
    pub config_type: RateConfigType,
    pub rates: RateTable,
    /// Unix millis
    pub effective_date: i64,
    /// Strictly increasing per config type, starting at 1
    pub version: i64,
    pub is_active: bool,
    pub modified_by: String,
    pub reason: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn decay(values: [&str; 9]) -> RateTable {
        RateTable::GenerationDecay {
            rates: (FIRST_TEAM_GENERATION..=LAST_TEAM_GENERATION)
                .zip(values)
                .map(|(g, v)| (g, dec(v)))
                .collect(),
        }
    }

    #[test]
    fn test_direct_sale_requires_every_tier() {
        let mut rates: BTreeMap<Tier, Decimal> =
            Tier::ALL.into_iter().map(|t| (t, dec("0.1"))).collect();
        assert!(RateTable::DirectSale { rates: rates.clone() }.validate().is_ok());

        rates.remove(&Tier::Gold);
        let err = RateTable::DirectSale { rates }.validate().unwrap_err();
        assert!(err.0.contains("GOLD"));
    }

    #[test]
    fn test_rates_must_be_fractions() {
        let rates = Tier::ALL.into_iter().map(|t| (t, dec("1.5"))).collect();
        assert!(RateTable::DirectSale { rates }.validate().is_err());
    }

    #[test]
    fn test_generation_decay_must_not_increase() {
        let ok = decay(["0.10", "0.05", "0.03", "0.02", "0.01", "0.01", "0.01", "0.01", "0.01"]);
        assert!(ok.validate().is_ok());

        let bad = decay(["0.10", "0.05", "0.06", "0.02", "0.01", "0.01", "0.01", "0.01", "0.01"]);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_generation_decay_rejects_generation_one() {
        let mut table = decay(["0.10", "0.05", "0.03", "0.02", "0.01", "0.01", "0.01", "0.01", "0.01"]);
        if let RateTable::GenerationDecay { rates } = &mut table {
            rates.insert(1, dec("0.2"));
        }
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_cycle_bonus_start_day_bounds() {
        let table = |day| RateTable::CycleBonus {
            first_set_rate: dec("0.075"),
            additional_set_rate: dec("0.10"),
            set_size: 3,
            cycle_start_day: day,
            introductory_window: IntroductoryWindow::Unrestricted,
        };
        assert!(table(4).validate().is_ok());
        assert!(table(0).validate().is_err());
        assert!(table(29).validate().is_err());
    }

    #[test]
    fn test_rate_table_json_shape() {
        let table = RateTable::CycleBonus {
            first_set_rate: dec("0.075"),
            additional_set_rate: dec("0.10"),
            set_size: 3,
            cycle_start_day: 4,
            introductory_window: IntroductoryWindow::FirstDaysAfterJoining { days: 90 },
        };
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["type"], "CYCLE_BONUS");
        assert_eq!(json["introductory_window"]["mode"], "FIRST_DAYS_AFTER_JOINING");
        assert_eq!(json["introductory_window"]["days"], 90);

        let back: RateTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.config_type(), RateConfigType::CycleBonus);
    }

    #[test]
    fn test_every_family_survives_a_json_column() {
        let tables = [
            RateTable::DirectSale {
                rates: Tier::ALL.into_iter().map(|t| (t, dec("0.25"))).collect(),
            },
            RateTable::CycleBonus {
                first_set_rate: dec("0.075"),
                additional_set_rate: dec("0.10"),
                set_size: 3,
                cycle_start_day: 4,
                introductory_window: IntroductoryWindow::Unrestricted,
            },
            decay(["0.10", "0.05", "0.03", "0.02", "0.01", "0.01", "0.01", "0.01", "0.01"]),
        ];
        for table in tables {
            let text = serde_json::to_string(&table).unwrap();
            let back: RateTable = serde_json::from_str(&text).unwrap();
            assert_eq!(back, table);
        }
    }

    #[test]
    fn test_generation_keys_are_strings() {
        let table = decay(["0.10", "0.05", "0.03", "0.02", "0.01", "0.01", "0.01", "0.01", "0.01"]);
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["type"], "GENERATION_DECAY");
        assert!(json["rates"].get("2").is_some());

        let bad = r#"{"type":"GENERATION_DECAY","rates":{"two":"0.10"}}"#;
        let err = serde_json::from_str::<RateTable>(bad).unwrap_err();
        assert!(err.to_string().contains("invalid generation key"));
    }

    #[test]
    fn test_config_type_names() {
        assert_eq!("GENERATION_DECAY".parse(), Ok(RateConfigType::GenerationDecay));
        assert_eq!(RateConfigType::DirectSale.to_string(), "DIRECT_SALE");
        assert!("ISP".parse::<RateConfigType>().is_err());
    }
}
