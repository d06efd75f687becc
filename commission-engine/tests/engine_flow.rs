//! 端到端测试 - 通过引擎门面驱动内存存储
//!
//! Network used throughout (all sales in March 2024, UTC):
//!
//! ```text
//! M (SILVER) ── B1 ── C1 ── D1
//!            ├─ B2
//!            └─ B3
//! W (DIAMOND, no override) ── X
//! ```

use chrono::NaiveDate;
use commission_engine::rates::defaults::{default_rate_table, seed_defaults};
use commission_engine::{
    CommissionEngine, EngineError, EngineSettings, InMemoryStore, MemberDirectory,
};
use rust_decimal::Decimal;
use shared::models::{MemberCreate, RateConfigType, RateTable, SaleCreate, Tier};
use std::sync::Arc;

fn at(month: u32, day: u32, hour: u32) -> i64 {
    NaiveDate::from_ymd_opt(2024, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis()
}

struct Network {
    store: Arc<InMemoryStore>,
    engine: CommissionEngine,
    m: i64,
    b1: i64,
    c1: i64,
    d1: i64,
    w: i64,
    /// Sales in creation order: M→B1, M→B2, M→B3, B1→C1, C1→D1, W→X
    sales: Vec<i64>,
}

fn enroll(store: &InMemoryStore, name: &str, tier: Tier, sponsor_id: Option<i64>) -> i64 {
    store
        .enroll_member(MemberCreate {
            name: name.to_string(),
            tier: Some(tier),
            sponsor_id,
            joined_at: Some(at(1, 1, 0)),
            effective_tier_override: None,
        })
        .unwrap()
        .id
}

fn sell(store: &InMemoryStore, seller: i64, buyer: i64, tier: Tier, timestamp: i64) -> i64 {
    store
        .record_sale(SaleCreate {
            buyer_member_id: buyer,
            seller_member_id: seller,
            tier_purchased: tier,
            price_at_sale: None,
            timestamp,
        })
        .unwrap()
        .id
}

async fn network() -> Network {
    let store = Arc::new(InMemoryStore::new());
    seed_defaults(store.as_ref()).await.unwrap();
    let engine = CommissionEngine::new(store.clone(), store.clone(), EngineSettings::default());

    let m = enroll(&store, "M", Tier::Silver, None);
    let b1 = enroll(&store, "B1", Tier::Silver, Some(m));
    let b2 = enroll(&store, "B2", Tier::Silver, Some(m));
    let b3 = enroll(&store, "B3", Tier::Silver, Some(m));
    let c1 = enroll(&store, "C1", Tier::Silver, Some(b1));
    let d1 = enroll(&store, "D1", Tier::Silver, Some(c1));
    let w = enroll(&store, "W", Tier::Diamond, None);
    let x = enroll(&store, "X", Tier::Silver, Some(w));

    let sales = vec![
        sell(&store, m, b1, Tier::Silver, at(3, 5, 10)),
        sell(&store, m, b2, Tier::Silver, at(3, 6, 10)),
        sell(&store, m, b3, Tier::Silver, at(3, 7, 10)),
        sell(&store, b1, c1, Tier::Silver, at(3, 8, 10)),
        sell(&store, c1, d1, Tier::Silver, at(3, 9, 10)),
        sell(&store, w, x, Tier::Silver, at(3, 5, 10)),
    ];

    Network {
        store,
        engine,
        m,
        b1,
        c1,
        d1,
        w,
        sales,
    }
}

#[tokio::test]
async fn test_direct_sale_of_silver_package_pays_500() {
    let n = network().await;
    let isp = n.engine.compute_isp(n.m, n.sales[0]).await.unwrap();
    assert_eq!(isp.amount, Decimal::from(500));
    assert_eq!(isp.rate, Decimal::new(25, 2));
}

#[tokio::test]
async fn test_isp_for_sale_credited_elsewhere_fails() {
    let n = network().await;
    assert!(matches!(
        n.engine.compute_isp(n.m, n.sales[3]).await,
        Err(EngineError::SaleNotCredited { .. })
    ));
}

#[tokio::test]
async fn test_three_sales_in_cycle_pay_450() {
    let n = network().await;
    let qpb = n.engine.compute_qpb(n.m, at(3, 20, 0)).await.unwrap();
    assert_eq!(qpb.sets_completed, 1);
    assert_eq!(qpb.total, Decimal::from(450));
    assert_eq!(qpb.breakdown[0].sale_ids, n.sales[..3].to_vec());

    // The previous cycle (Feb 4 - Mar 3) holds none of them
    let earlier = n.engine.compute_qpb(n.m, at(3, 3, 23)).await.unwrap();
    assert_eq!(earlier.total, Decimal::ZERO);
    assert!(earlier.incomplete_sale_ids.is_empty());
}

#[tokio::test]
async fn test_team_commission_skips_generation_one() {
    let n = network().await;
    let tsc = n.engine.compute_tsc(n.m, at(3, 1, 0), at(4, 1, 0)).await.unwrap();
    // B1's sale is generation 1 (ISP for B1); C1's sale is generation 2
    assert_eq!(tsc.sales_counted, 1);
    assert_eq!(tsc.by_generation[&2], Decimal::from(200));
    assert_eq!(tsc.total, Decimal::from(200));
    assert_eq!(tsc.by_generation.len(), 9);
}

#[tokio::test]
async fn test_white_label_without_override_earns_nothing() {
    let n = network().await;
    let isp = n.engine.compute_isp(n.w, n.sales[5]).await.unwrap();
    assert_eq!(isp.amount, Decimal::ZERO);
    assert!(!isp.eligibility.is_eligible());

    let qpb = n.engine.compute_qpb(n.w, at(3, 20, 0)).await.unwrap();
    assert_eq!(qpb.total, Decimal::ZERO);
    let tsc = n.engine.compute_tsc(n.w, at(3, 1, 0), at(4, 1, 0)).await.unwrap();
    assert_eq!(tsc.total, Decimal::ZERO);

    let verdict = n.engine.highest_qualified_level(n.w).await.unwrap();
    assert_eq!(verdict.level, 0);
    assert_eq!(verdict.name, "Not Eligible");
}

#[tokio::test]
async fn test_override_restores_earning() {
    let n = network().await;
    n.store.change_tier(n.w, Tier::Diamond, Some(Tier::Platinum)).unwrap();
    let isp = n.engine.compute_isp(n.w, n.sales[5]).await.unwrap();
    // 2000 * 0.30
    assert_eq!(isp.amount, Decimal::from(600));
}

#[tokio::test]
async fn test_statement_combines_all_schemes() {
    let n = network().await;
    let statement = n
        .engine
        .compute_statement(n.m, at(3, 4, 0), at(4, 4, 0))
        .await
        .unwrap();
    assert_eq!(statement.isp.len(), 3);
    assert_eq!(statement.isp_total, Decimal::from(1500));
    assert_eq!(statement.qpb.total, Decimal::from(450));
    assert_eq!(statement.tsc.total, Decimal::from(200));
    assert_eq!(statement.total, Decimal::from(2150));
}

#[tokio::test]
async fn test_statement_for_white_label_is_empty() {
    let n = network().await;
    let statement = n
        .engine
        .compute_statement(n.w, at(3, 4, 0), at(4, 4, 0))
        .await
        .unwrap();
    assert!(!statement.eligibility.is_eligible());
    assert!(statement.isp.is_empty());
    assert!(statement.qpb.incomplete_sale_ids.is_empty());
    assert_eq!(statement.tsc.sales_counted, 0);
    assert_eq!(statement.total, Decimal::ZERO);
}

#[tokio::test]
async fn test_pv_attribution_climbs_the_upline_once() {
    let n = network().await;
    for &sale_id in &n.sales[..5] {
        assert!(n.engine.attribute_sale_pv(sale_id).await.unwrap());
    }
    assert!(!n.engine.attribute_sale_pv(n.sales[4]).await.unwrap());

    let pv = |id: i64| {
        let store = n.store.clone();
        async move { store.find_member(id).await.unwrap().unwrap().accumulated_pv }
    };
    assert_eq!(pv(n.m).await, 500);
    assert_eq!(pv(n.b1).await, 200);
    assert_eq!(pv(n.c1).await, 100);
    assert_eq!(pv(n.d1).await, 0);
}

#[tokio::test]
async fn test_qualification_is_recorded_once() {
    let n = network().await;
    for &sale_id in &n.sales[..5] {
        n.engine.attribute_sale_pv(sale_id).await.unwrap();
    }

    let record = n.engine.record_qualification(n.m, at(3, 20, 0)).await.unwrap();
    assert_eq!(record.verdict.level, 1);
    assert_eq!(record.newly_reached, vec![1]);
    let next = record.verdict.next_level.as_ref().unwrap();
    assert_eq!(next.level, 2);
    assert!(!next.failure_reasons().is_empty());

    let again = n.engine.record_qualification(n.m, at(3, 21, 0)).await.unwrap();
    assert!(again.newly_reached.is_empty());

    let check = n.engine.check_level(n.m, 6).await.unwrap();
    assert!(!check.qualified);
    assert!(check.failures.len() > 1);

    // Level 1 carries no monthly upkeep
    let upkeep = n.engine.check_maintenance(n.m, at(3, 20, 0)).await.unwrap().unwrap();
    assert_eq!(upkeep.level, 1);
    assert!(upkeep.met);
}

#[tokio::test]
async fn test_team_overview() {
    let n = network().await;
    let overview = n.engine.team_overview(n.m).await.unwrap();
    assert_eq!(overview.composition.total_members, 5);
    assert_eq!(overview.composition.silver_plus_percentage, 100);
    assert_eq!(overview.max_depth, 3);
    assert_eq!(overview.generations[&1].members, 3);
    assert_eq!(overview.generations[&3].members, 1);
}

#[tokio::test]
async fn test_publishing_rates_changes_results() {
    let n = network().await;
    let RateTable::DirectSale { mut rates } = default_rate_table(RateConfigType::DirectSale) else {
        unreachable!()
    };
    rates.insert(Tier::Silver, Decimal::new(30, 2));

    let version = n
        .engine
        .publish_rate_version(
            RateConfigType::DirectSale,
            RateTable::DirectSale { rates },
            "admin",
            "silver promotion",
        )
        .await
        .unwrap();
    assert_eq!(version.version, 2);

    let history = n.engine.rate_history(RateConfigType::DirectSale).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.iter().filter(|v| v.is_active).count(), 1);

    let isp = n.engine.compute_isp(n.m, n.sales[0]).await.unwrap();
    assert_eq!(isp.amount, Decimal::from(600));
}

#[tokio::test]
async fn test_configuration_is_complete_after_seeding() {
    let n = network().await;
    let active = n.engine.verify_configuration().await.unwrap();
    assert_eq!(active.rate_versions.len(), 3);
    assert_eq!(active.ladder.levels().len(), 11);
}
