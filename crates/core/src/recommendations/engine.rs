//! Recommendation engine implementation

use tracing::{debug, error, info, warn};

use super::materialize::materialize;
use super::scoring::score_candidates;
use super::signals::collect_signals;
use super::store::{CatalogStore, StoreResult};
use super::types::{Recommendation, SessionContext};
use super::PAGE_SIZE;
use crate::domain::item::{Item, ItemId};

/// Ranks catalog items for a user over a [`CatalogStore`].
///
/// Three result policies exist: a weighted score over the collected signals,
/// a cold-start page of fresh well-rated items when the user has no
/// behavior, category or price signal, and a degraded page of top-rated items
/// when the store fails. Callers always get a list.
#[derive(Debug, Clone)]
pub struct RecommendationEngine<S> {
    store: S,
}

impl<S> RecommendationEngine<S>
where
    S: CatalogStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Up to [`PAGE_SIZE`] items for `user_id`, best first.
    pub async fn get_recommendations(&self, user_id: &str, session: &SessionContext) -> Vec<Item> {
        self.recommend(user_id, session).await.items
    }

    /// Like [`Self::get_recommendations`], tagged with the policy that produced it.
    pub async fn recommend(&self, user_id: &str, session: &SessionContext) -> Recommendation {
        let recommendation = match self.try_recommend(user_id, session).await {
            Ok(recommendation) => recommendation,
            Err(error) => {
                warn!(
                    event_name = "recommendations.engine.store_failure",
                    user_id = %user_id,
                    error = %error,
                    "catalog store failed, serving top-rated fallback"
                );
                self.degraded(user_id, error.to_string()).await
            }
        };

        if recommendation.items.is_empty() {
            warn!(
                event_name = "recommendations.engine.no_inventory",
                user_id = %user_id,
                strategy = recommendation.outcome.as_str(),
                "no in-stock items available for recommendation"
            );
        }

        recommendation
    }

    async fn try_recommend(
        &self,
        user_id: &str,
        session: &SessionContext,
    ) -> StoreResult<Recommendation> {
        let signals = collect_signals(&self.store, user_id, session).await?;
        debug!(
            event_name = "recommendations.engine.signals_collected",
            user_id = %user_id,
            purchased = signals.purchased.len(),
            behavior = signals.behavior.len(),
            category = signals.category.len(),
            price_affinity = signals.price_affinity.len(),
            popularity = signals.popularity.len(),
            average_order_value = ?signals.average_order_value,
            "recommendation signals collected"
        );

        if !signals.has_contextual_signal() {
            let items = self.store.fetch_recent_items(PAGE_SIZE).await?;
            info!(
                event_name = "recommendations.engine.cold_start",
                user_id = %user_id,
                count = items.len(),
                "no user signal, serving recent items"
            );
            return Ok(Recommendation::cold_start(items));
        }

        let ranked = score_candidates(&signals, PAGE_SIZE);
        let ids: Vec<ItemId> = ranked.iter().map(|candidate| candidate.item_id.clone()).collect();
        let items = materialize(&self.store, &ids).await?;

        info!(
            event_name = "recommendations.engine.scored",
            user_id = %user_id,
            candidates = ranked.len(),
            count = items.len(),
            "recommendations ranked"
        );
        Ok(Recommendation::scored(items, ranked))
    }

    async fn degraded(&self, user_id: &str, reason: String) -> Recommendation {
        match self.store.fetch_top_rated_items(PAGE_SIZE).await {
            Ok(items) => {
                info!(
                    event_name = "recommendations.engine.degraded",
                    user_id = %user_id,
                    count = items.len(),
                    "serving top-rated items"
                );
                Recommendation::degraded(items, reason)
            }
            Err(fallback_error) => {
                error!(
                    event_name = "recommendations.engine.fallback_failed",
                    user_id = %user_id,
                    error = %fallback_error,
                    "top-rated fallback query failed"
                );
                Recommendation::degraded(Vec::new(), reason)
            }
        }
    }
}
