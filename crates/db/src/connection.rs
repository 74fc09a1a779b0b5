use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

pub type DbPool = sqlx::SqlitePool;

pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(database_url, 5, 30).await
}

/// Open a pool with per-connection pragmas applied.
///
/// `timeout_secs` bounds connection acquisition, which is the only timeout
/// a catalog query is subject to.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}

#[cfg(test)]
mod tests {
    use super::connect_with_settings;

    #[tokio::test]
    async fn foreign_keys_are_enforced_per_connection() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");

        let enabled: i64 =
            sqlx::query_scalar("PRAGMA foreign_keys").fetch_one(&pool).await.expect("pragma");

        assert_eq!(enabled, 1);
    }
}
