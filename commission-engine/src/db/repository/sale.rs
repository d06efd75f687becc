//! Sale Event Repository
//!
//! Sale events are immutable once recorded; there is no update path.

use super::{ID_CHUNK, RepoError, RepoResult, parse_decimal};
use shared::models::{SaleCreate, SaleEvent, Tier};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const SALE_SELECT: &str = "SELECT id, buyer_member_id, seller_member_id, tier_purchased, price_at_sale, timestamp FROM sale_event";

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: i64,
    buyer_member_id: i64,
    seller_member_id: i64,
    tier_purchased: Tier,
    price_at_sale: String,
    timestamp: i64,
}

impl TryFrom<SaleRow> for SaleEvent {
    type Error = RepoError;

    fn try_from(row: SaleRow) -> RepoResult<Self> {
        Ok(SaleEvent {
            price_at_sale: parse_decimal("price_at_sale", &row.price_at_sale)?,
            id: row.id,
            buyer_member_id: row.buyer_member_id,
            seller_member_id: row.seller_member_id,
            tier_purchased: row.tier_purchased,
            timestamp: row.timestamp,
        })
    }
}

fn collect(rows: Vec<SaleRow>) -> RepoResult<Vec<SaleEvent>> {
    rows.into_iter().map(SaleEvent::try_from).collect()
}

pub async fn create(pool: &SqlitePool, data: SaleCreate) -> RepoResult<SaleEvent> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO sale_event (id, buyer_member_id, seller_member_id, tier_purchased, price_at_sale, timestamp) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(id)
    .bind(data.buyer_member_id)
    .bind(data.seller_member_id)
    .bind(data.tier_purchased)
    .bind(data.price().to_string())
    .bind(data.timestamp)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to record sale".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<SaleEvent>> {
    let sql = format!("{SALE_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, SaleRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(SaleEvent::try_from).transpose()
}

/// Sales credited to any of `seller_ids` with `start <= timestamp < end`, oldest first
pub async fn find_by_sellers_between(
    pool: &SqlitePool,
    seller_ids: &[i64],
    start: i64,
    end: i64,
) -> RepoResult<Vec<SaleEvent>> {
    let mut sales = Vec::new();
    for chunk in seller_ids.chunks(ID_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("{SALE_SELECT} WHERE timestamp >= "));
        qb.push_bind(start);
        qb.push(" AND timestamp < ");
        qb.push_bind(end);
        qb.push(" AND seller_member_id IN (");
        let mut separated = qb.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        let rows = qb.build_query_as::<SaleRow>().fetch_all(pool).await?;
        sales.extend(collect(rows)?);
    }
    sales.sort_by_key(|s| (s.timestamp, s.id));
    Ok(sales)
}

/// Sales credited to one seller with `start <= timestamp < end`, oldest first
pub async fn find_by_seller_between(
    pool: &SqlitePool,
    seller_id: i64,
    start: i64,
    end: i64,
) -> RepoResult<Vec<SaleEvent>> {
    let sql = format!(
        "{SALE_SELECT} WHERE seller_member_id = ?1 AND timestamp >= ?2 AND timestamp < ?3 ORDER BY timestamp, id"
    );
    let rows = sqlx::query_as::<_, SaleRow>(&sql)
        .bind(seller_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;
    collect(rows)
}
