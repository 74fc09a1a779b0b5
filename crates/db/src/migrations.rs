use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::run_pending;
    use crate::{connect_with_settings, migrations::MIGRATOR};

    const MANAGED_TABLES: &[&str] = &["item", "customer_order", "order_line", "item_view"];

    const MANAGED_SCHEMA_OBJECTS: &[&str] = &[
        "item",
        "customer_order",
        "order_line",
        "item_view",
        "idx_item_category",
        "idx_item_popularity",
        "idx_item_created_at",
        "idx_item_price",
        "idx_customer_order_user_id",
        "idx_order_line_item_id",
        "idx_item_view_user_id",
    ];

    async fn table_count(pool: &sqlx::SqlitePool, table: &str) -> i64 {
        sqlx::query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(table)
        .fetch_one(pool)
        .await
        .expect("check table")
        .get::<i64, _>("count")
    }

    #[tokio::test]
    async fn migrations_create_baseline_tables() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        for table in MANAGED_TABLES {
            assert_eq!(table_count(&pool, table).await, 1, "table `{table}` should exist");
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");
        run_pending(&pool).await.expect("re-run migrations");

        assert_eq!(table_count(&pool, "item").await, 1);
    }

    #[tokio::test]
    async fn migrations_are_reversible() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");

        for table in MANAGED_TABLES {
            assert_eq!(table_count(&pool, table).await, 0, "table `{table}` should be dropped");
        }
    }

    #[tokio::test]
    async fn migrations_up_down_up_preserves_schema_signature() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        let initial_signature = managed_schema_signature(&pool).await;
        assert_eq!(
            initial_signature.len(),
            MANAGED_SCHEMA_OBJECTS.len(),
            "initial migration pass should create all managed schema objects",
        );

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");

        let after_down_signature = managed_schema_signature(&pool).await;
        assert!(
            after_down_signature.is_empty(),
            "managed schema objects should be removed after full undo",
        );

        run_pending(&pool).await.expect("re-run migrations");

        let after_second_up_signature = managed_schema_signature(&pool).await;
        assert_eq!(
            after_second_up_signature, initial_signature,
            "up/down/up should preserve migration-managed schema signature",
        );
    }

    #[tokio::test]
    async fn item_constraints_reject_out_of_range_values() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        let negative_price = sqlx::query(
            "INSERT INTO item (id, name, price, category, created_at)
             VALUES ('bad-1', 'Bad', -1.0, 'misc', '2025-01-01T00:00:00+00:00')",
        )
        .execute(&pool)
        .await;
        assert!(negative_price.is_err(), "negative price should be rejected");

        let rating_above_five = sqlx::query(
            "INSERT INTO item (id, name, price, category, rating_average, created_at)
             VALUES ('bad-2', 'Bad', 1.0, 'misc', 5.5, '2025-01-01T00:00:00+00:00')",
        )
        .execute(&pool)
        .await;
        assert!(rating_above_five.is_err(), "rating above 5 should be rejected");
    }

    async fn managed_schema_signature(pool: &sqlx::SqlitePool) -> Vec<(String, String, String)> {
        let mut signature: Vec<(String, String, String)> = sqlx::query(
            "SELECT type, name, IFNULL(sql, '') AS sql
             FROM sqlite_master
             WHERE type IN ('table', 'index')",
        )
        .fetch_all(pool)
        .await
        .expect("load schema objects")
        .into_iter()
        .filter_map(|row| {
            let name = row.get::<String, _>("name");
            if MANAGED_SCHEMA_OBJECTS.contains(&name.as_str()) {
                Some((row.get::<String, _>("type"), name, row.get::<String, _>("sql")))
            } else {
                None
            }
        })
        .collect();
        signature.sort();
        signature
    }
}
