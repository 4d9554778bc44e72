use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(database_url, DEFAULT_MAX_CONNECTIONS, DEFAULT_TIMEOUT_SECS).await
}

/// Opens the catalog database, creating the SQLite file on first use.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .connect_with(options)
        .await
}

#[cfg(test)]
mod tests {
    use super::connect_with_settings;

    #[tokio::test]
    async fn zero_connection_limit_is_clamped() {
        let pool = connect_with_settings("sqlite::memory:", 0, 0).await.expect("connect");
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await.expect("query");
        assert_eq!(one, 1);
        pool.close().await;
    }

    #[tokio::test]
    async fn missing_database_file_is_created() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("storefront.db");
        assert!(!path.exists());

        let pool = connect_with_settings(&format!("sqlite://{}", path.display()), 1, 2)
            .await
            .expect("connect should create the file");
        let foreign_keys: i64 =
            sqlx::query_scalar("PRAGMA foreign_keys").fetch_one(&pool).await.expect("pragma");
        pool.close().await;

        assert!(path.exists());
        assert_eq!(foreign_keys, 1);
    }

    #[tokio::test]
    async fn invalid_url_is_reported() {
        let result = connect_with_settings("postgres://nope", 1, 1).await;
        assert!(result.is_err());
    }
}
