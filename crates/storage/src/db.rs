use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

pub type DbPool = Pool<Sqlite>;

/// Open (creating if missing) the correction database at `path`.
pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// An in-memory database. The single connection is never recycled, since
/// closing it would discard the data.
pub async fn create_in_memory_db() -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS corrections (
            id TEXT PRIMARY KEY,
            pattern TEXT NOT NULL,
            match_type TEXT NOT NULL CHECK (match_type IN ('exact', 'contains')),
            tags TEXT NOT NULL DEFAULT '[]',
            confidence REAL NOT NULL CHECK (confidence >= 0.0 AND confidence <= 1.0),
            times_applied INTEGER NOT NULL DEFAULT 0,
            entity_id TEXT,
            entity_name TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            revision INTEGER NOT NULL DEFAULT 0,
            UNIQUE (pattern, match_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_corrections_confidence ON corrections (confidence)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_db_makes_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrections.db");
        assert!(!path.exists());

        let pool = create_db(&path).await.unwrap();
        assert!(path.exists());

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM corrections")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn migrations_are_rerunnable() {
        let pool = create_in_memory_db().await.unwrap();
        run_migrations(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn schema_rejects_out_of_range_confidence() {
        let pool = create_in_memory_db().await.unwrap();
        let result = sqlx::query(
            "INSERT INTO corrections (id, pattern, match_type, confidence, created_at, updated_at)
             VALUES ('x', 'NETFLIX', 'exact', 1.5, '', '')",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}
