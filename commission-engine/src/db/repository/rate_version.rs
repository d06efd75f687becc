//! Rate Version Repository
//!
//! Rows are append-only. Publishing runs in one transaction: deactivate the
//! current row, then insert `max(version) + 1` as the new active row. The
//! partial unique index on `is_active = 1` rejects any second active row.

use super::{RepoError, RepoResult};
use shared::models::{RateConfigType, RateTable, RateVersion};
use sqlx::SqlitePool;

const RATE_VERSION_SELECT: &str = "SELECT id, config_type, rates, effective_date, version, is_active, modified_by, reason, created_at FROM rate_version";

#[derive(Debug, sqlx::FromRow)]
struct RateVersionRow {
    id: i64,
    config_type: RateConfigType,
    rates: String,
    effective_date: i64,
    version: i64,
    is_active: bool,
    modified_by: String,
    reason: String,
    created_at: i64,
}

impl TryFrom<RateVersionRow> for RateVersion {
    type Error = RepoError;

    fn try_from(row: RateVersionRow) -> RepoResult<Self> {
        let rates: RateTable = serde_json::from_str(&row.rates)?;
        if rates.config_type() != row.config_type {
            return Err(RepoError::Corrupt(format!(
                "rate_version {} is {} but holds a {} table",
                row.id,
                row.config_type,
                rates.config_type()
            )));
        }
        Ok(RateVersion {
            id: row.id,
            config_type: row.config_type,
            rates,
            effective_date: row.effective_date,
            version: row.version,
            is_active: row.is_active,
            modified_by: row.modified_by,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

pub async fn find_active(
    pool: &SqlitePool,
    config_type: RateConfigType,
) -> RepoResult<Option<RateVersion>> {
    let sql = format!("{RATE_VERSION_SELECT} WHERE config_type = ? AND is_active = 1");
    let row = sqlx::query_as::<_, RateVersionRow>(&sql)
        .bind(config_type)
        .fetch_optional(pool)
        .await?;
    row.map(RateVersion::try_from).transpose()
}

/// Every version of a family, newest first
pub async fn history(pool: &SqlitePool, config_type: RateConfigType) -> RepoResult<Vec<RateVersion>> {
    let sql = format!("{RATE_VERSION_SELECT} WHERE config_type = ? ORDER BY version DESC");
    let rows = sqlx::query_as::<_, RateVersionRow>(&sql)
        .bind(config_type)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(RateVersion::try_from).collect()
}

/// Supersede the active version of `rates.config_type()` with a new one
pub async fn publish(
    pool: &SqlitePool,
    rates: &RateTable,
    modified_by: &str,
    reason: &str,
    effective_date: i64,
) -> RepoResult<RateVersion> {
    let config_type = rates.config_type();
    let payload = serde_json::to_string(rates)?;
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    let mut tx = pool.begin().await?;

    // Write first so the transaction holds the write lock before reading MAX(version)
    sqlx::query("UPDATE rate_version SET is_active = 0 WHERE config_type = ? AND is_active = 1")
        .bind(config_type)
        .execute(&mut *tx)
        .await?;

    let previous: Option<i64> =
        sqlx::query_scalar("SELECT MAX(version) FROM rate_version WHERE config_type = ?")
            .bind(config_type)
            .fetch_one(&mut *tx)
            .await?;
    let version = previous.unwrap_or(0) + 1;

    sqlx::query(
        "INSERT INTO rate_version (id, config_type, rates, effective_date, version, is_active, modified_by, reason, created_at) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8)",
    )
    .bind(id)
    .bind(config_type)
    .bind(&payload)
    .bind(effective_date)
    .bind(version)
    .bind(modified_by)
    .bind(reason)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(RateVersion {
        id,
        config_type,
        rates: rates.clone(),
        effective_date,
        version,
        is_active: true,
        modified_by: modified_by.to_string(),
        reason: reason.to_string(),
        created_at: now,
    })
}
