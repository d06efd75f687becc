//! PV 归属压力测试 - 随机网络 + 并发重复归属
//!
//! Every sale is attributed twice from concurrent tasks; exactly one call per
//! sale may apply, and every member ends with the PV of all sales made by
//! themselves or anyone below them.

use commission_engine::rates::defaults::seed_defaults;
use commission_engine::{CommissionEngine, EngineSettings, InMemoryStore, MemberDirectory};
use rand::Rng;
use shared::models::{MemberCreate, SaleCreate, Tier, TierCatalog};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const MEMBER_COUNT: usize = 300;
const SALE_COUNT: usize = 1000;
const CONCURRENCY: usize = 32;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_attribution_credits_each_sale_once() {
    let store = Arc::new(InMemoryStore::new());
    seed_defaults(store.as_ref()).await.unwrap();
    let engine = Arc::new(CommissionEngine::new(
        store.clone(),
        store.clone(),
        EngineSettings::default(),
    ));

    let mut rng = rand::thread_rng();
    let mut ids: Vec<i64> = Vec::with_capacity(MEMBER_COUNT);
    let mut sponsor_of: HashMap<i64, Option<i64>> = HashMap::new();
    for i in 0..MEMBER_COUNT {
        let sponsor_id = (i > 0).then(|| ids[rng.gen_range(0..ids.len())]);
        let member = store
            .enroll_member(MemberCreate {
                name: format!("member-{i}"),
                tier: Some(Tier::ALL[rng.gen_range(0..Tier::ALL.len())]),
                sponsor_id,
                joined_at: Some(0),
                effective_tier_override: None,
            })
            .unwrap();
        sponsor_of.insert(member.id, sponsor_id);
        ids.push(member.id);
    }

    let mut expected: HashMap<i64, i64> = HashMap::new();
    let mut sales = Vec::with_capacity(SALE_COUNT);
    for i in 0..SALE_COUNT {
        let seller = ids[rng.gen_range(0..ids.len())];
        let buyer = ids[rng.gen_range(0..ids.len())];
        let tier = Tier::ALL[rng.gen_range(0..Tier::ALL.len())];
        let sale = store
            .record_sale(SaleCreate {
                buyer_member_id: buyer,
                seller_member_id: seller,
                tier_purchased: tier,
                price_at_sale: None,
                timestamp: i as i64,
            })
            .unwrap();
        sales.push(sale.id);

        let pv = TierCatalog::pv_of(tier);
        let mut current = Some(seller);
        while let Some(id) = current {
            *expected.entry(id).or_insert(0) += pv;
            current = sponsor_of[&id];
        }
    }

    let applied = Arc::new(AtomicUsize::new(0));
    let mut work: Vec<i64> = sales.iter().chain(sales.iter()).copied().collect();
    work.reverse();
    let chunk_size = work.len().div_ceil(CONCURRENCY);
    let mut handles = Vec::new();
    for chunk in work.chunks(chunk_size) {
        let chunk = chunk.to_vec();
        let engine = engine.clone();
        let applied = applied.clone();
        handles.push(tokio::spawn(async move {
            for sale_id in chunk {
                if engine.attribute_sale_pv(sale_id).await.unwrap() {
                    applied.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(applied.load(Ordering::Relaxed), SALE_COUNT);
    for member in store.find_members(&ids).await.unwrap() {
        assert_eq!(
            member.accumulated_pv,
            expected.get(&member.id).copied().unwrap_or(0),
            "member {}",
            member.id
        );
    }
}
