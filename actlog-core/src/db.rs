//! SQLite pool setup and the activity-log table.
//!
//! Every caller borrows a connection from the pool per operation and releases
//! it on all exit paths; there is no shared connection object.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;

/// Open (creating the file if needed) a pooled SQLite connection.
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", config.path))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
}

/// In-memory pool for tests. Capped at one connection so every query sees
/// the same database.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
}

/// Idempotent create-if-absent for the single activity-log table.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_activity_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            data_type TEXT NOT NULL,
            data_content TEXT NOT NULL,
            client_timestamp TEXT NOT NULL,
            server_timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn health_check(pool: &SqlitePool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT sqlite_version()")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

/// Insert one activity event. `id` and `server_timestamp` are assigned by
/// the store; returns the new row id.
pub async fn insert_event(
    pool: &SqlitePool,
    session_id: &str,
    data_type: &str,
    data_content: &str,
    client_timestamp: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO user_activity_log (session_id, data_type, data_content, client_timestamp)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(session_id)
    .bind(data_type)
    .bind(data_content)
    .bind(client_timestamp)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityEvent;

    async fn test_pool() -> SqlitePool {
        let pool = create_memory_pool().await.unwrap();
        init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let pool = test_pool().await;
        init_schema(&pool).await.unwrap();
        init_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let pool = test_pool().await;
        let a = insert_event(&pool, "s1", "playerState", "{}", "t1")
            .await
            .unwrap();
        let b = insert_event(&pool, "s1", "playerState", "{}", "t2")
            .await
            .unwrap();
        assert!(b > a, "ids must be monotonically increasing");
    }

    #[tokio::test]
    async fn test_inserted_row_reads_back() {
        let pool = test_pool().await;
        let id = insert_event(&pool, "s1", "discoveredClues", r#"["c1"]"#, "2024-01-01T00:00:00Z")
            .await
            .unwrap();

        let event: ActivityEvent = sqlx::query_as(
            "SELECT id, session_id, data_type, data_content, client_timestamp, server_timestamp \
             FROM user_activity_log WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(event.id, id);
        assert_eq!(event.session_id, "s1");
        assert_eq!(event.data_type, "discoveredClues");
        assert_eq!(event.data_content, r#"["c1"]"#);
        assert_eq!(event.client_timestamp, "2024-01-01T00:00:00Z");
        assert!(!event.server_timestamp.is_empty(), "store must assign server_timestamp");
    }

    #[tokio::test]
    async fn test_health_check_reports_version() {
        let pool = test_pool().await;
        let version = health_check(&pool).await.unwrap();
        assert!(!version.is_empty());
    }
}
