//! 默认配置 (Default configuration)
//!
//! Seeded on bootstrap when a rate family or leadership level has no active
//! version. Once seeded, every change goes through a published version.

use crate::core::EngineResult;
use crate::leadership::Ladder;
use crate::store::RateConfigStore;
use rust_decimal::Decimal;
use shared::models::{
    Gen1Requirement, IntroductoryWindow, LevelRequirements, MonthlyMaintenance, RateConfigType,
    RateTable, RateVersion, Tier,
};
use shared::util::now_millis;

/// Author recorded on seeded versions
pub const SEED_AUTHOR: &str = "system";

pub fn default_rate_table(config_type: RateConfigType) -> RateTable {
    match config_type {
        RateConfigType::DirectSale => RateTable::DirectSale {
            rates: [
                (Tier::Fam, Decimal::ZERO),
                (Tier::Bronze, Decimal::new(18, 2)),
                (Tier::Copper, Decimal::new(22, 2)),
                (Tier::Silver, Decimal::new(25, 2)),
                (Tier::Gold, Decimal::new(28, 2)),
                (Tier::Platinum, Decimal::new(30, 2)),
                // White-label members only earn through an override tier
                (Tier::Diamond, Decimal::ZERO),
            ]
            .into_iter()
            .collect(),
        },
        RateConfigType::CycleBonus => RateTable::CycleBonus {
            first_set_rate: Decimal::new(75, 3),
            additional_set_rate: Decimal::new(10, 2),
            set_size: 3,
            cycle_start_day: 4,
            introductory_window: IntroductoryWindow::Unrestricted,
        },
        RateConfigType::GenerationDecay => RateTable::GenerationDecay {
            rates: [10, 5, 3, 2, 1, 1, 1, 1, 1]
                .into_iter()
                .zip(2u8..)
                .map(|(percent, generation)| (generation, Decimal::new(percent, 2)))
                .collect(),
        },
    }
}

/// (name, PV threshold, reward, Silver+ %)
const LADDER: [(&str, i64, i64, u32); 11] = [
    ("Ignite Pathfinder", 50, 600, 0),
    ("Guardian of Growth", 150, 1_500, 0),
    ("Cash Catalyst", 300, 3_000, 0),
    ("Freedom Architect", 1_500, 15_000, 0),
    ("Lifestyle Ambassador", 3_000, 30_000, 0),
    ("Mama I Made It", 15_000, 150_000, 10),
    ("Estate Pioneer", 40_000, 375_000, 15),
    ("Capital Visionary", 80_000, 600_000, 20),
    ("Mega Estate Builder", 100_000, 750_000, 30),
    ("Titan Capitalist", 200_000, 1_500_000, 35),
    ("Billionaire Legacy Builder", 700_000, 5_000_000, 40),
];

/// Every level only asks for a non-empty downline
const MIN_TEAM_SIZE: u32 = 1;

fn min_tier_for(level: u8) -> Tier {
    match level {
        1..=2 => Tier::Bronze,
        3..=4 => Tier::Copper,
        5..=6 => Tier::Silver,
        7 => Tier::Gold,
        _ => Tier::Platinum,
    }
}

fn gen1_requirement_for(level: u8) -> Gen1Requirement {
    match level {
        1 => Gen1Requirement {
            count: 2,
            must_be_at_level: 0,
            min_months_at_level: 0,
        },
        2..=5 => Gen1Requirement {
            count: 2,
            must_be_at_level: level - 1,
            min_months_at_level: 1,
        },
        6 => Gen1Requirement {
            count: 3,
            must_be_at_level: 5,
            min_months_at_level: 1,
        },
        _ => Gen1Requirement {
            count: 3,
            must_be_at_level: level - 1,
            min_months_at_level: 2,
        },
    }
}

fn maintenance_for(level: u8) -> MonthlyMaintenance {
    let personal_sales_required = match level {
        1 => 0,
        2 => 1,
        3..=4 => 2,
        5..=6 => 3,
        _ => 7,
    };
    MonthlyMaintenance {
        required: personal_sales_required > 0,
        personal_sales_required,
    }
}

pub fn default_leadership_ladder() -> Vec<LevelRequirements> {
    LADDER
        .iter()
        .zip(1u8..)
        .map(
            |(&(name, pv_threshold, reward, silver_plus), level)| LevelRequirements {
                level,
                name: name.to_string(),
                pv_threshold,
                min_tier: min_tier_for(level),
                gen1_requirement: gen1_requirement_for(level),
                silver_plus_percent_required: silver_plus,
                min_team_size: MIN_TEAM_SIZE,
                monthly_maintenance: maintenance_for(level),
                reward: Decimal::from(reward),
            },
        )
        .collect()
}

/// What a seeding pass published
#[derive(Debug, Default, Clone)]
pub struct SeedReport {
    pub rate_families: Vec<RateConfigType>,
    pub levels: Vec<u8>,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.rate_families.is_empty() && self.levels.is_empty()
    }
}

/// Publish defaults for every family and level that has no active version.
///
/// Existing active versions are never touched.
pub async fn seed_defaults(store: &dyn RateConfigStore) -> EngineResult<SeedReport> {
    let now = now_millis();
    let mut report = SeedReport::default();

    for config_type in RateConfigType::ALL {
        if store.find_active(config_type).await?.is_some() {
            continue;
        }
        let version = store
            .publish_new_version(default_rate_table(config_type), SEED_AUTHOR, "default configuration", now)
            .await?;
        tracing::info!(config_type = %config_type, version = version.version, "Seeded default rate version");
        report.rate_families.push(config_type);
    }

    let active: Vec<u8> = store
        .active_leadership_levels()
        .await?
        .iter()
        .map(|c| c.level())
        .collect();
    for requirements in default_leadership_ladder() {
        if active.contains(&requirements.level) {
            continue;
        }
        let level = requirements.level;
        store
            .publish_leadership_level(requirements, SEED_AUTHOR, "default configuration", now)
            .await?;
        report.levels.push(level);
    }
    if !report.levels.is_empty() {
        tracing::info!(levels = ?report.levels, "Seeded default leadership levels");
    }
    Ok(report)
}

/// Active configuration the engine can run with
#[derive(Debug, Clone)]
pub struct ActiveConfiguration {
    pub rate_versions: Vec<RateVersion>,
    pub ladder: Ladder,
}

/// Startup invariant: every rate family and all leadership levels are active
pub async fn verify_active(store: &dyn RateConfigStore) -> EngineResult<ActiveConfiguration> {
    let mut rate_versions = Vec::with_capacity(RateConfigType::ALL.len());
    for config_type in RateConfigType::ALL {
        rate_versions.push(store.get_active(config_type).await?);
    }
    let ladder = Ladder::from_configs(store.active_leadership_levels().await?)?;
    Ok(ActiveConfiguration {
        rate_versions,
        ladder,
    })
}
