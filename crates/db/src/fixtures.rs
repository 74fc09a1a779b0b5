use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// One shopper in the demo catalog and the history seeded for them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemoUser {
    pub user_id: &'static str,
    pub orders: i64,
    pub views: i64,
    pub description: &'static str,
}

pub const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        user_id: "user-alice",
        orders: 2,
        views: 3,
        description: "electronics buyer with recent views",
    },
    DemoUser { user_id: "user-bob", orders: 0, views: 2, description: "browsing only, no orders" },
    DemoUser { user_id: "user-carol", orders: 1, views: 0, description: "single books order" },
    DemoUser { user_id: "user-newcomer", orders: 0, views: 0, description: "no history" },
];

const DEMO_ITEM_IDS: &[&str] = &[
    "itm-001", "itm-002", "itm-003", "itm-004", "itm-005", "itm-006", "itm-007", "itm-008",
    "itm-009", "itm-010", "itm-011", "itm-012", "itm-013", "itm-014", "itm-015", "itm-016",
];

const OUT_OF_STOCK_ITEM_IDS: &[&str] = &["itm-005", "itm-014"];

const DEMO_ORDER_IDS: &[&str] = &["ord-001", "ord-002", "ord-003"];

const EXPECTED_ORDER_LINES: i64 = 5;

/// Deterministic demo catalog: sixteen items across five categories, three
/// orders and a handful of views. Loading is idempotent.
pub struct DemoCatalog;

impl DemoCatalog {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_catalog.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            items_seeded: DEMO_ITEM_IDS.len(),
            orders_seeded: DEMO_ORDER_IDS.len(),
            users: DEMO_USERS.to_vec(),
        })
    }

    /// Check that every fixture row is present and in the expected state.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let quoted_items = sql_array_from_ids(DEMO_ITEM_IDS);
        let item_count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(1) FROM item WHERE id IN {quoted_items}"))
                .fetch_one(pool)
                .await?;
        checks.push(("items".to_string(), item_count == DEMO_ITEM_IDS.len() as i64));

        let quoted_out_of_stock = sql_array_from_ids(OUT_OF_STOCK_ITEM_IDS);
        let out_of_stock: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM item WHERE in_stock = 0 AND id IN {quoted_out_of_stock}"
        ))
        .fetch_one(pool)
        .await?;
        checks.push((
            "out-of-stock-items".to_string(),
            out_of_stock == OUT_OF_STOCK_ITEM_IDS.len() as i64,
        ));

        let quoted_orders = sql_array_from_ids(DEMO_ORDER_IDS);
        let line_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM order_line WHERE order_id IN {quoted_orders}"
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("order-lines".to_string(), line_count == EXPECTED_ORDER_LINES));

        for user in DEMO_USERS {
            let orders: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM customer_order WHERE user_id = ?1")
                    .bind(user.user_id)
                    .fetch_one(pool)
                    .await?;
            checks.push((format!("{}-orders", user.user_id), orders == user.orders));

            let views: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM item_view WHERE user_id = ?1")
                .bind(user.user_id)
                .fetch_one(pool)
                .await?;
            checks.push((format!("{}-views", user.user_id), views == user.views));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{}'", id)).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub items_seeded: usize,
    pub orders_seeded: usize,
    pub users: Vec<DemoUser>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[test]
    fn sql_fixture_mentions_every_seeded_id() {
        for id in DEMO_ITEM_IDS.iter().chain(DEMO_ORDER_IDS) {
            assert!(DemoCatalog::SQL.contains(&format!("'{id}'")), "fixture should seed {id}");
        }
        for user in DEMO_USERS.iter().filter(|user| user.orders + user.views > 0) {
            assert!(DemoCatalog::SQL.contains(user.user_id), "fixture should seed {}", user.user_id);
        }
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = setup().await;

        let first = DemoCatalog::load(&pool).await.expect("load demo catalog");
        let first_verification = DemoCatalog::verify(&pool).await.expect("verify demo catalog");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);
        assert_eq!(first.items_seeded, 16);
        assert_eq!(first.users.len(), DEMO_USERS.len());

        DemoCatalog::load(&pool).await.expect("reload demo catalog");
        let second_verification = DemoCatalog::verify(&pool).await.expect("re-verify");
        assert!(second_verification.all_present);
        assert_eq!(first_verification.checks, second_verification.checks);
    }

    #[tokio::test]
    async fn verify_reports_missing_rows_on_empty_database() {
        let pool = setup().await;

        let verification = DemoCatalog::verify(&pool).await.expect("verify empty database");

        assert!(!verification.all_present);
        let failed: Vec<&str> = verification
            .checks
            .iter()
            .filter(|(_, ok)| !ok)
            .map(|(label, _)| label.as_str())
            .collect();
        assert!(failed.contains(&"items"));
        assert!(failed.contains(&"user-alice-orders"));
        assert!(!failed.contains(&"user-newcomer-orders"), "newcomer has no history either way");
    }
}
