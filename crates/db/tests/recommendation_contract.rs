use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::Row;

use curio_core::domain::item::ItemId;
use curio_core::recommendations::{RecommendationEngine, SessionContext};
use curio_db::{
    connect_with_settings, migrations, CatalogRepository, DemoCatalog, InMemoryCatalogStore,
    SqlCatalogStore, DEMO_USERS,
};

type ContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr, $($arg:tt)*) => {
        if $left != $right {
            return Err(format!(
                "{}: `{:?}` != `{:?}`",
                format!($($arg)*),
                $left,
                $right
            ));
        }
    };
}

#[derive(Debug, Deserialize)]
struct RecommendationCase {
    name: String,
    user_id: String,
    categories: Vec<String>,
    strategy: String,
    excluded: Vec<String>,
    expected: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RecommendationContract {
    dataset: String,
    page_size: usize,
    cases: Vec<RecommendationCase>,
}

fn load_contract() -> ContractTestResult<RecommendationContract> {
    serde_json::from_str(include_str!("../../../config/fixtures/demo_recommendations.json"))
        .map_err(|err| format!("recommendation contract JSON must parse: {err}"))
}

async fn seeded_sql_store() -> ContractTestResult<SqlCatalogStore> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|err| format!("connect: {err}"))?;
    migrations::run_pending(&pool).await.map_err(|err| format!("migrate: {err}"))?;
    DemoCatalog::load(&pool).await.map_err(|err| format!("seed: {err}"))?;
    Ok(SqlCatalogStore::new(pool))
}

/// Copy the seeded SQL catalog into an in-memory store.
async fn mirrored_memory_store(sql: &SqlCatalogStore) -> ContractTestResult<InMemoryCatalogStore> {
    let memory = InMemoryCatalogStore::new();

    let item_ids: Vec<ItemId> = sqlx::query_scalar::<_, String>("SELECT id FROM item")
        .fetch_all(sql.pool())
        .await
        .map_err(|err| format!("list item ids: {err}"))?
        .into_iter()
        .map(ItemId)
        .collect();
    for item in sql.items_by_ids(&item_ids).await.map_err(|err| err.to_string())? {
        memory.save_item(item).await.map_err(|err| err.to_string())?;
    }

    for user in DEMO_USERS {
        for order in sql.orders_by_user(user.user_id).await.map_err(|err| err.to_string())? {
            memory.save_order(order).await.map_err(|err| err.to_string())?;
        }
    }

    let views = sqlx::query("SELECT user_id, item_id, viewed_at FROM item_view")
        .fetch_all(sql.pool())
        .await
        .map_err(|err| format!("list views: {err}"))?;
    for row in views {
        let viewed_at: String = row.get("viewed_at");
        let viewed_at = DateTime::parse_from_rfc3339(&viewed_at)
            .map_err(|err| format!("viewed_at: {err}"))?
            .with_timezone(&Utc);
        let user_id: String = row.get("user_id");
        let item_id = ItemId(row.get("item_id"));
        memory.record_view(&user_id, &item_id, viewed_at).await.map_err(|err| err.to_string())?;
    }

    Ok(memory)
}

#[test]
fn contract_cases_are_well_formed() -> ContractTestResult {
    let contract = load_contract()?;
    require_eq!(contract.dataset, "demo_catalog", "dataset name");
    require!(!contract.cases.is_empty());

    let mut names = HashSet::new();
    for case in &contract.cases {
        require!(names.insert(case.name.clone()), "duplicate case name: {}", case.name);
        require!(
            case.expected.len() <= contract.page_size,
            "case {} expects more than a page of items",
            case.name
        );
        let unique: HashSet<&String> = case.expected.iter().collect();
        require_eq!(unique.len(), case.expected.len(), "case {} repeats an item", case.name);
        for excluded in &case.excluded {
            require!(
                !case.expected.contains(excluded),
                "case {} expects purchased item {excluded}",
                case.name
            );
        }
        require!(
            DEMO_USERS.iter().any(|user| user.user_id == case.user_id),
            "case {} refers to an unknown demo user",
            case.name
        );
    }

    Ok(())
}

#[tokio::test]
async fn demo_catalog_recommendations_match_contract() -> ContractTestResult {
    let contract = load_contract()?;
    let engine = RecommendationEngine::new(seeded_sql_store().await?);

    for case in &contract.cases {
        let session = SessionContext::new().with_categories(case.categories.iter().cloned());
        let recommendation = engine.recommend(&case.user_id, &session).await;

        require_eq!(
            recommendation.outcome.as_str(),
            case.strategy.as_str(),
            "strategy for case {}",
            case.name
        );
        let ids: Vec<&str> = recommendation.items.iter().map(|item| item.id.as_str()).collect();
        require_eq!(ids, case.expected, "items for case {}", case.name);
        for excluded in &case.excluded {
            require!(
                !ids.contains(&excluded.as_str()),
                "case {} recommended purchased item {excluded}",
                case.name
            );
        }
    }

    Ok(())
}

#[tokio::test]
async fn in_memory_store_matches_sql_store_on_every_case() -> ContractTestResult {
    let contract = load_contract()?;
    let sql = seeded_sql_store().await?;
    let memory = mirrored_memory_store(&sql).await?;
    let sql_engine = RecommendationEngine::new(sql);
    let memory_engine = RecommendationEngine::new(memory);

    for case in &contract.cases {
        let session = SessionContext::new().with_categories(case.categories.iter().cloned());
        let from_sql = sql_engine.recommend(&case.user_id, &session).await;
        let from_memory = memory_engine.recommend(&case.user_id, &session).await;

        require_eq!(from_memory, from_sql, "stores disagree on case {}", case.name);
    }

    Ok(())
}

#[tokio::test]
async fn broken_view_log_degrades_to_top_rated_items() -> ContractTestResult {
    let sql = seeded_sql_store().await?;
    sqlx::query("DROP TABLE item_view")
        .execute(sql.pool())
        .await
        .map_err(|err| format!("drop item_view: {err}"))?;
    let expected = sql.top_rated_items(10).await.map_err(|err| err.to_string())?;
    let engine = RecommendationEngine::new(sql);

    let recommendation = engine.recommend("user-alice", &SessionContext::new()).await;

    require_eq!(recommendation.outcome.as_str(), "degraded", "strategy");
    require_eq!(recommendation.items, expected, "degraded items");
    let ids: Vec<&str> = recommendation.items.iter().map(|item| item.id.as_str()).collect();
    require_eq!(
        ids,
        vec![
            "itm-010", "itm-007", "itm-011", "itm-003", "itm-001", "itm-013", "itm-006",
            "itm-012", "itm-002", "itm-015"
        ],
        "top-rated order"
    );

    Ok(())
}
