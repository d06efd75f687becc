//! Typed views over the active rate versions
//!
//! Calculators never see a raw [`RateTable`]; they take the view for their
//! family, which remembers the version it came from for reporting.

pub mod defaults;

use crate::core::{EngineError, EngineResult};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{
    FIRST_TEAM_GENERATION, IntroductoryWindow, LAST_TEAM_GENERATION, RateConfigType, RateTable,
    RateVersion, Tier,
};
use std::collections::BTreeMap;

fn wrong_shape(version: &RateVersion) -> EngineError {
    EngineError::ConfigurationMissing(format!(
        "{} version {} holds a {} table",
        version.config_type,
        version.version,
        version.rates.config_type()
    ))
}

/// ISP rates by earning tier
#[derive(Debug, Clone, Serialize)]
pub struct DirectSaleRates {
    pub version: i64,
    rates: BTreeMap<Tier, Decimal>,
}

impl DirectSaleRates {
    pub fn from_version(version: &RateVersion) -> EngineResult<Self> {
        match &version.rates {
            RateTable::DirectSale { rates } => Ok(Self {
                version: version.version,
                rates: rates.clone(),
            }),
            _ => Err(wrong_shape(version)),
        }
    }

    pub fn rate_for(&self, tier: Tier) -> EngineResult<Decimal> {
        self.rates.get(&tier).copied().ok_or_else(|| {
            EngineError::ConfigurationMissing(format!(
                "{} rate for tier {tier}",
                RateConfigType::DirectSale
            ))
        })
    }
}

/// QPB set rates and window shape
#[derive(Debug, Clone, Serialize)]
pub struct CycleBonusRates {
    pub version: i64,
    pub first_set_rate: Decimal,
    pub additional_set_rate: Decimal,
    pub set_size: u32,
    pub cycle_start_day: u32,
    pub introductory_window: IntroductoryWindow,
}

impl CycleBonusRates {
    pub fn from_version(version: &RateVersion) -> EngineResult<Self> {
        match &version.rates {
            RateTable::CycleBonus {
                first_set_rate,
                additional_set_rate,
                set_size,
                cycle_start_day,
                introductory_window,
            } => Ok(Self {
                version: version.version,
                first_set_rate: *first_set_rate,
                additional_set_rate: *additional_set_rate,
                set_size: *set_size,
                cycle_start_day: *cycle_start_day,
                introductory_window: *introductory_window,
            }),
            _ => Err(wrong_shape(version)),
        }
    }

    /// Rate for the Nth complete set (1-indexed)
    pub fn rate_for_set(&self, n: u32) -> Decimal {
        if n <= 1 {
            self.first_set_rate
        } else {
            self.additional_set_rate
        }
    }
}

/// TSC rates by generation depth
#[derive(Debug, Clone, Serialize)]
pub struct GenerationDecayRates {
    pub version: i64,
    rates: BTreeMap<u8, Decimal>,
}

impl GenerationDecayRates {
    pub fn from_version(version: &RateVersion) -> EngineResult<Self> {
        match &version.rates {
            RateTable::GenerationDecay { rates } => Ok(Self {
                version: version.version,
                rates: rates.clone(),
            }),
            _ => Err(wrong_shape(version)),
        }
    }

    pub fn rate_for(&self, generation: u8) -> EngineResult<Decimal> {
        self.rates.get(&generation).copied().ok_or_else(|| {
            EngineError::ConfigurationMissing(format!(
                "{} rate for generation {generation}",
                RateConfigType::GenerationDecay
            ))
        })
    }

    /// Paid generations, shallowest first
    pub fn generations(&self) -> impl Iterator<Item = u8> {
        FIRST_TEAM_GENERATION..=LAST_TEAM_GENERATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::defaults::default_rate_table;

    fn version_of(table: RateTable) -> RateVersion {
        RateVersion {
            id: 1,
            config_type: table.config_type(),
            rates: table,
            effective_date: 0,
            version: 3,
            is_active: true,
            modified_by: "system".into(),
            reason: "test".into(),
            created_at: 0,
        }
    }

    #[test]
    fn test_views_keep_version_number() {
        let v = version_of(default_rate_table(RateConfigType::DirectSale));
        let rates = DirectSaleRates::from_version(&v).unwrap();
        assert_eq!(rates.version, 3);
        assert_eq!(rates.rate_for(Tier::Silver).unwrap(), Decimal::new(25, 2));
    }

    #[test]
    fn test_wrong_family_is_configuration_missing() {
        let v = version_of(default_rate_table(RateConfigType::GenerationDecay));
        let err = CycleBonusRates::from_version(&v).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_set_rates() {
        let v = version_of(default_rate_table(RateConfigType::CycleBonus));
        let rates = CycleBonusRates::from_version(&v).unwrap();
        assert_eq!(rates.rate_for_set(1), Decimal::new(75, 3));
        assert_eq!(rates.rate_for_set(2), Decimal::new(10, 2));
        assert_eq!(rates.rate_for_set(7), Decimal::new(10, 2));
    }

    #[test]
    fn test_missing_generation_rate() {
        let v = version_of(RateTable::GenerationDecay {
            rates: BTreeMap::from([(2, Decimal::new(1, 1))]),
        });
        let rates = GenerationDecayRates::from_version(&v).unwrap();
        assert!(rates.rate_for(2).is_ok());
        assert!(rates.rate_for(3).unwrap_err().is_structural());
    }
}
