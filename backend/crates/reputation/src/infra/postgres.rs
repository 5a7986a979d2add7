//! PostgreSQL Repository Implementation

use crate::domain::entity::Miner;
use crate::domain::repository::MinerRepository;
use crate::domain::value_object::{MinerId, MinerName};
use crate::error::ReputationResult;
use sqlx::PgPool;

/// PostgreSQL-backed miner repository
#[derive(Clone)]
pub struct PgMinerRepository {
    pool: PgPool,
}

impl PgMinerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl MinerRepository for PgMinerRepository {
    async fn find(&self, id: &MinerId) -> ReputationResult<Option<Miner>> {
        let row = sqlx::query_as::<_, MinerRow>(
            r#"
            SELECT miner_id, score, banned, name
            FROM miners
            WHERE miner_id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MinerRow::into_miner))
    }

    async fn is_banned(&self, id: &MinerId) -> ReputationResult<bool> {
        let banned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM miners WHERE miner_id = $1 AND banned)",
        )
        .bind(id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(banned)
    }

    async fn adjust_score(&self, id: &MinerId, delta: i64) -> ReputationResult<i64> {
        let score = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO miners (miner_id, score)
            VALUES ($1, $2)
            ON CONFLICT (miner_id)
            DO UPDATE SET score = miners.score + EXCLUDED.score, updated_at = NOW()
            RETURNING score
            "#,
        )
        .bind(id.as_str())
        .bind(delta)
        .fetch_one(&self.pool)
        .await?;

        Ok(score)
    }

    async fn claim_name(&self, id: &MinerId, name: &MinerName) -> ReputationResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO miners (miner_id, name)
            VALUES ($1, $2)
            ON CONFLICT (miner_id)
            DO UPDATE SET name = EXCLUDED.name, updated_at = NOW()
            "#,
        )
        .bind(id.as_str())
        .bind(name.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            // miners_name_key
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn leaderboard(&self, limit: usize) -> ReputationResult<Vec<Miner>> {
        let rows = sqlx::query_as::<_, MinerRow>(
            r#"
            SELECT miner_id, score, banned, name
            FROM miners
            WHERE score > 0
            ORDER BY score DESC, miner_id ASC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MinerRow::into_miner).collect())
    }
}

// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct MinerRow {
    miner_id: String,
    score: i64,
    banned: bool,
    name: Option<String>,
}

impl MinerRow {
    fn into_miner(self) -> Miner {
        Miner {
            id: MinerId::new(self.miner_id),
            score: self.score,
            banned: self.banned,
            name: self.name.map(MinerName::from_trusted),
        }
    }
}
