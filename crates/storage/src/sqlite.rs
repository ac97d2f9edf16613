use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;
use tagwise_core::{Correction, CorrectionBackend, CorrectionId, MatchType, PatternKey};

use crate::db::{create_db, create_in_memory_db, DbPool};
use crate::Error;

const SELECT_COLUMNS: &str = "SELECT id, pattern, match_type, tags, confidence, times_applied, \
     entity_id, entity_name, created_at, updated_at, revision FROM corrections";

/// Correction records in a SQLite table. Cloning shares the pool.
#[derive(Clone)]
pub struct SqliteBackend {
    pool: DbPool,
}

impl SqliteBackend {
    pub async fn open(path: &Path) -> Result<Self, Error> {
        let pool = create_db(path).await?;
        tracing::debug!("Opened correction database at {}", path.display());
        Ok(Self::from_pool(pool))
    }

    pub async fn open_in_memory() -> Result<Self, Error> {
        Ok(Self::from_pool(create_in_memory_db().await?))
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct CorrectionRow {
    id: String,
    pattern: String,
    match_type: String,
    tags: String,
    confidence: f64,
    times_applied: i64,
    entity_id: Option<String>,
    entity_name: Option<String>,
    created_at: String,
    updated_at: String,
    revision: i64,
}

impl TryFrom<CorrectionRow> for Correction {
    type Error = Error;

    fn try_from(r: CorrectionRow) -> Result<Self, Error> {
        let invalid = |reason: String| Error::InvalidRow {
            id: r.id.clone(),
            reason,
        };

        let match_type = r
            .match_type
            .parse::<MatchType>()
            .map_err(|e| invalid(e.to_string()))?;
        let times_applied = u32::try_from(r.times_applied)
            .map_err(|_| invalid(format!("times_applied out of range: {}", r.times_applied)))?;
        let revision = u64::try_from(r.revision)
            .map_err(|_| invalid(format!("revision out of range: {}", r.revision)))?;
        let created_at = decode_dt(&r.created_at).map_err(&invalid)?;
        let updated_at = decode_dt(&r.updated_at).map_err(&invalid)?;

        Ok(Correction {
            id: r.id.parse()?,
            pattern: r.pattern,
            match_type,
            tags: serde_json::from_str(&r.tags)?,
            confidence: r.confidence,
            times_applied,
            entity_id: r.entity_id,
            entity_name: r.entity_name,
            created_at,
            updated_at,
            revision,
        })
    }
}

// Fixed precision keeps the text column lexically ordered by time.
fn encode_dt(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_dt(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp {s:?}: {e}"))
}

impl CorrectionBackend for SqliteBackend {
    type Error = Error;

    async fn get(&self, id: CorrectionId) -> Result<Option<Correction>, Error> {
        let row = sqlx::query_as::<_, CorrectionRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Correction::try_from).transpose()
    }

    async fn find(&self, key: &PatternKey) -> Result<Option<Correction>, Error> {
        let row = sqlx::query_as::<_, CorrectionRow>(&format!(
            "{SELECT_COLUMNS} WHERE pattern = ? AND match_type = ?"
        ))
        .bind(key.pattern())
        .bind(key.match_type().as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Correction::try_from).transpose()
    }

    async fn scan(&self, min_confidence: f64) -> Result<Vec<Correction>, Error> {
        let rows = sqlx::query_as::<_, CorrectionRow>(&format!(
            "{SELECT_COLUMNS} WHERE confidence >= ? ORDER BY created_at, id"
        ))
        .bind(min_confidence)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Correction::try_from).collect()
    }

    async fn insert(&self, c: &Correction) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO corrections (
                id, pattern, match_type, tags, confidence, times_applied,
                entity_id, entity_name, created_at, updated_at, revision
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (pattern, match_type) DO NOTHING
            "#,
        )
        .bind(c.id.to_string())
        .bind(&c.pattern)
        .bind(c.match_type.as_str())
        .bind(serde_json::to_string(&c.tags)?)
        .bind(c.confidence)
        .bind(i64::from(c.times_applied))
        .bind(&c.entity_id)
        .bind(&c.entity_name)
        .bind(encode_dt(c.created_at))
        .bind(encode_dt(c.updated_at))
        .bind(c.revision as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn replace(&self, c: &Correction, expected_revision: u64) -> Result<bool, Error> {
        // pattern and match_type are immutable and never rewritten.
        let result = sqlx::query(
            r#"
            UPDATE corrections
            SET tags = ?, confidence = ?, times_applied = ?, entity_id = ?,
                entity_name = ?, updated_at = ?, revision = ?
            WHERE id = ? AND revision = ?
            "#,
        )
        .bind(serde_json::to_string(&c.tags)?)
        .bind(c.confidence)
        .bind(i64::from(c.times_applied))
        .bind(&c.entity_id)
        .bind(&c.entity_name)
        .bind(encode_dt(c.updated_at))
        .bind(c.revision as i64)
        .bind(c.id.to_string())
        .bind(expected_revision as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove(&self, id: CorrectionId, expected_revision: Option<u64>) -> Result<bool, Error> {
        let expected = expected_revision.map(|r| r as i64);
        let result =
            sqlx::query("DELETE FROM corrections WHERE id = ? AND (? IS NULL OR revision = ?)")
                .bind(id.to_string())
                .bind(expected)
                .bind(expected)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }
}
