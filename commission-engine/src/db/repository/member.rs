//! Member Repository

use super::{ID_CHUNK, RepoError, RepoResult};
use crate::downline::NetworkNode;
use shared::models::{LevelAchievement, Member, MemberCreate, TeamComposition, Tier};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;

const MEMBER_SELECT: &str = "SELECT id, name, tier, sponsor_id, accumulated_pv, joined_at, effective_tier_override, team_composition FROM member";

#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    id: i64,
    name: String,
    tier: Tier,
    sponsor_id: Option<i64>,
    accumulated_pv: i64,
    joined_at: i64,
    effective_tier_override: Option<Tier>,
    team_composition: Option<String>,
}

impl MemberRow {
    fn into_member(self) -> RepoResult<Member> {
        let team_composition = self
            .team_composition
            .as_deref()
            .map(serde_json::from_str::<TeamComposition>)
            .transpose()?;
        Ok(Member {
            id: self.id,
            name: self.name,
            tier: self.tier,
            sponsor_id: self.sponsor_id,
            accumulated_pv: self.accumulated_pv,
            joined_at: self.joined_at,
            effective_tier_override: self.effective_tier_override,
            team_composition,
            achievements: Vec::new(),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AchievementRow {
    member_id: i64,
    level: i64,
    achieved_at: i64,
}

pub async fn create(pool: &SqlitePool, data: MemberCreate) -> RepoResult<Member> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO member (id, name, tier, sponsor_id, accumulated_pv, joined_at, effective_tier_override, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, ?7)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(data.tier.unwrap_or(Tier::LOWEST))
    .bind(data.sponsor_id)
    .bind(data.joined_at.unwrap_or(now))
    .bind(data.effective_tier_override)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create member".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Member>> {
    let sql = format!("{MEMBER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, MemberRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let mut member = row.into_member()?;
    member.achievements = find_achievements(pool, id).await?;
    Ok(Some(member))
}

/// Members for the given ids, in no particular order; unknown ids are skipped
pub async fn find_by_ids(pool: &SqlitePool, ids: &[i64]) -> RepoResult<Vec<Member>> {
    let mut members = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(ID_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("{MEMBER_SELECT} WHERE id IN ("));
        let mut separated = qb.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        let rows = qb.build_query_as::<MemberRow>().fetch_all(pool).await?;
        for row in rows {
            members.push(row.into_member()?);
        }
    }

    let mut achievements = find_achievements_for(pool, ids).await?;
    for member in &mut members {
        if let Some(list) = achievements.remove(&member.id) {
            member.achievements = list;
        }
    }
    Ok(members)
}

/// Direct referrals of a sponsor with their achievements, oldest first
pub async fn find_referrals(pool: &SqlitePool, sponsor_id: i64) -> RepoResult<Vec<Member>> {
    let sql = format!("{MEMBER_SELECT} WHERE sponsor_id = ? ORDER BY joined_at, id");
    let rows = sqlx::query_as::<_, MemberRow>(&sql)
        .bind(sponsor_id)
        .fetch_all(pool)
        .await?;
    let mut members = rows
        .into_iter()
        .map(MemberRow::into_member)
        .collect::<RepoResult<Vec<_>>>()?;

    let ids: Vec<i64> = members.iter().map(|m| m.id).collect();
    let mut achievements = find_achievements_for(pool, &ids).await?;
    for member in &mut members {
        if let Some(list) = achievements.remove(&member.id) {
            member.achievements = list;
        }
    }
    Ok(members)
}

/// Sponsor edges and tiers for every member, the input of the downline index
pub async fn network_snapshot(pool: &SqlitePool) -> RepoResult<Vec<NetworkNode>> {
    let rows = sqlx::query_as::<_, (i64, Option<i64>, Tier)>(
        "SELECT id, sponsor_id, tier FROM member ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, sponsor_id, tier)| NetworkNode {
            id,
            sponsor_id,
            tier,
        })
        .collect())
}

/// Tier changes come from the enrollment/upgrade flow outside the engine
pub async fn update_tier(
    pool: &SqlitePool,
    id: i64,
    tier: Tier,
    effective_tier_override: Option<Tier>,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE member SET tier = ?1, effective_tier_override = ?2, updated_at = ?3 WHERE id = ?4",
    )
    .bind(tier)
    .bind(effective_tier_override)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Member {id} not found")));
    }
    Ok(())
}

pub async fn save_team_composition(
    pool: &SqlitePool,
    id: i64,
    composition: &TeamComposition,
) -> RepoResult<()> {
    let json = serde_json::to_string(composition)?;
    let rows = sqlx::query("UPDATE member SET team_composition = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(json)
        .bind(composition.computed_at)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Member {id} not found")));
    }
    Ok(())
}

/// Claim a sale for PV credit and add `pv` to every listed member.
///
/// Returns `false` without touching any balance when the sale was already claimed.
pub async fn credit_sale_pv(
    pool: &SqlitePool,
    sale_id: i64,
    member_ids: &[i64],
    pv: i64,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let claimed = sqlx::query(
        "INSERT OR IGNORE INTO sale_pv_attribution (sale_id, pv, credited_members, attributed_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(sale_id)
    .bind(pv)
    .bind(member_ids.len() as i64)
    .bind(now)
    .execute(&mut *tx)
    .await?;
    if claimed.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    for id in member_ids {
        let rows = sqlx::query(
            "UPDATE member SET accumulated_pv = accumulated_pv + ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(pv)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if rows.rows_affected() == 0 {
            // Dropping the transaction rolls the claim back
            return Err(RepoError::NotFound(format!("Member {id} not found")));
        }
    }

    tx.commit().await?;
    Ok(true)
}

pub async fn find_achievements(pool: &SqlitePool, member_id: i64) -> RepoResult<Vec<LevelAchievement>> {
    let rows = sqlx::query_as::<_, AchievementRow>(
        "SELECT member_id, level, achieved_at FROM leadership_achievement WHERE member_id = ? ORDER BY level",
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(to_achievement).collect())
}

async fn find_achievements_for(
    pool: &SqlitePool,
    member_ids: &[i64],
) -> RepoResult<HashMap<i64, Vec<LevelAchievement>>> {
    let mut grouped: HashMap<i64, Vec<LevelAchievement>> = HashMap::new();
    for chunk in member_ids.chunks(ID_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT member_id, level, achieved_at FROM leadership_achievement WHERE member_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY member_id, level");
        let rows = qb.build_query_as::<AchievementRow>().fetch_all(pool).await?;
        for row in rows {
            grouped
                .entry(row.member_id)
                .or_default()
                .push(to_achievement(row));
        }
    }
    Ok(grouped)
}

fn to_achievement(row: AchievementRow) -> LevelAchievement {
    LevelAchievement {
        level: row.level as u8,
        achieved_at: row.achieved_at,
    }
}

/// Record that a member reached a level; the first record per level wins
pub async fn record_achievement(
    pool: &SqlitePool,
    member_id: i64,
    level: u8,
    achieved_at: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "INSERT OR IGNORE INTO leadership_achievement (member_id, level, achieved_at) VALUES (?1, ?2, ?3)",
    )
    .bind(member_id)
    .bind(level as i64)
    .bind(achieved_at)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
