use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use curio_core::domain::item::Item;
use curio_core::domain::user::UserId;
use curio_core::errors::{ApplicationError, DomainError, InterfaceError};
use curio_core::recommendations::{CatalogStore, RecommendationEngine, SessionContext};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub struct RecommendationState<S> {
    engine: Arc<RecommendationEngine<S>>,
}

impl<S> Clone for RecommendationState<S> {
    fn clone(&self) -> Self {
        Self { engine: Arc::clone(&self.engine) }
    }
}

/// One item as rendered to storefront clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub image: String,
    pub rating: f64,
    pub in_stock: bool,
    pub discount: f64,
}

impl From<&Item> for RecommendedItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.as_str().to_string(),
            name: item.name.clone(),
            price: item.price,
            category: item.category.clone(),
            image: item.image_or_placeholder().to_string(),
            rating: if item.rating.count == 0 { 0.0 } else { item.rating.average },
            in_stock: item.in_stock,
            discount: item.discount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<RecommendedItem>,
    pub strategy: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub correlation_id: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub fn router<S>(engine: RecommendationEngine<S>) -> Router
where
    S: CatalogStore + 'static,
{
    Router::new()
        .route("/api/recommendations/{user_id}", post(recommend::<S>))
        .with_state(RecommendationState { engine: Arc::new(engine) })
}

async fn recommend<S>(
    Path(user_id): Path<String>,
    State(state): State<RecommendationState<S>>,
    body: Bytes,
) -> ApiResult<RecommendationsResponse>
where
    S: CatalogStore + 'static,
{
    let correlation_id = format!("req-{}", uuid::Uuid::new_v4());

    let user_id = UserId::parse(&user_id)
        .map_err(|error| reject(ApplicationError::from(error), &correlation_id))?;
    let session = parse_session(&body).map_err(|error| reject(error, &correlation_id))?;

    let recommendation = state.engine.recommend(user_id.as_str(), &session).await;

    info!(
        event_name = "system.http.recommendations_served",
        correlation_id = %correlation_id,
        user_id = %user_id,
        strategy = recommendation.outcome.as_str(),
        item_count = recommendation.items.len(),
        "recommendations served"
    );

    Ok(Json(RecommendationsResponse {
        recommendations: recommendation.items.iter().map(RecommendedItem::from).collect(),
        strategy: recommendation.outcome.as_str().to_string(),
    }))
}

/// An empty body means no session context.
fn parse_session(body: &[u8]) -> Result<SessionContext, ApplicationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SessionContext::default());
    }

    serde_json::from_slice(body).map_err(|error| {
        ApplicationError::from(DomainError::InvariantViolation(format!(
            "session context must be JSON: {error}"
        )))
    })
}

fn reject(error: ApplicationError, correlation_id: &str) -> (StatusCode, Json<ApiError>) {
    let interface = error.into_interface(correlation_id);
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    warn!(
        event_name = "system.http.request_rejected",
        correlation_id = %correlation_id,
        status = status.as_u16(),
        error = %interface,
        "recommendation request rejected"
    );

    (
        status,
        Json(ApiError {
            error: interface.user_message().to_string(),
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}
