use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use curio_db::DbPool;
use serde::Serialize;

/// Readiness of the service and its catalog database.
#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(&state.db_pool).await;
    let ready = catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "curio-server accepting requests".to_string(),
        },
        catalog,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

// An empty catalog is still ready; the engine answers with an empty page.
async fn catalog_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM item WHERE in_stock = 1")
        .fetch_one(pool)
        .await
    {
        Ok(in_stock) => {
            HealthCheck { status: "ready", detail: format!("{in_stock} items in stock") }
        }
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("catalog query failed: {error}") }
        }
    }
}
