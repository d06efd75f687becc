//! Leadership Level Config Repository
//!
//! Same versioning discipline as `rate_version`, keyed by level instead of family.

use super::{RepoError, RepoResult};
use shared::models::{LeadershipLevelConfig, LevelRequirements};
use sqlx::SqlitePool;

const LEVEL_SELECT: &str = "SELECT id, level, definition, version, is_active, modified_by, reason, effective_date, created_at FROM leadership_level_config";

#[derive(Debug, sqlx::FromRow)]
struct LevelRow {
    id: i64,
    level: i64,
    definition: String,
    version: i64,
    is_active: bool,
    modified_by: String,
    reason: String,
    effective_date: i64,
    created_at: i64,
}

impl TryFrom<LevelRow> for LeadershipLevelConfig {
    type Error = RepoError;

    fn try_from(row: LevelRow) -> RepoResult<Self> {
        let requirements: LevelRequirements = serde_json::from_str(&row.definition)?;
        if i64::from(requirements.level) != row.level {
            return Err(RepoError::Corrupt(format!(
                "leadership_level_config {} stored under level {} but defines level {}",
                row.id, row.level, requirements.level
            )));
        }
        Ok(LeadershipLevelConfig {
            id: row.id,
            requirements,
            version: row.version,
            is_active: row.is_active,
            modified_by: row.modified_by,
            reason: row.reason,
            effective_date: row.effective_date,
            created_at: row.created_at,
        })
    }
}

/// Active definition of every level that has one, ordered by level
pub async fn find_all_active(pool: &SqlitePool) -> RepoResult<Vec<LeadershipLevelConfig>> {
    let sql = format!("{LEVEL_SELECT} WHERE is_active = 1 ORDER BY level");
    let rows = sqlx::query_as::<_, LevelRow>(&sql).fetch_all(pool).await?;
    rows.into_iter().map(LeadershipLevelConfig::try_from).collect()
}

pub async fn history(pool: &SqlitePool, level: u8) -> RepoResult<Vec<LeadershipLevelConfig>> {
    let sql = format!("{LEVEL_SELECT} WHERE level = ? ORDER BY version DESC");
    let rows = sqlx::query_as::<_, LevelRow>(&sql)
        .bind(i64::from(level))
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(LeadershipLevelConfig::try_from).collect()
}

pub async fn publish(
    pool: &SqlitePool,
    requirements: &LevelRequirements,
    modified_by: &str,
    reason: &str,
    effective_date: i64,
) -> RepoResult<LeadershipLevelConfig> {
    let level = i64::from(requirements.level);
    let definition = serde_json::to_string(requirements)?;
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE leadership_level_config SET is_active = 0 WHERE level = ? AND is_active = 1")
        .bind(level)
        .execute(&mut *tx)
        .await?;

    let previous: Option<i64> =
        sqlx::query_scalar("SELECT MAX(version) FROM leadership_level_config WHERE level = ?")
            .bind(level)
            .fetch_one(&mut *tx)
            .await?;
    let version = previous.unwrap_or(0) + 1;

    sqlx::query(
        "INSERT INTO leadership_level_config (id, level, definition, version, is_active, modified_by, reason, effective_date, created_at) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?7, ?8)",
    )
    .bind(id)
    .bind(level)
    .bind(&definition)
    .bind(version)
    .bind(modified_by)
    .bind(reason)
    .bind(effective_date)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(LeadershipLevelConfig {
        id,
        requirements: requirements.clone(),
        version,
        is_active: true,
        modified_by: modified_by.to_string(),
        reason: reason.to_string(),
        effective_date,
        created_at: now,
    })
}
