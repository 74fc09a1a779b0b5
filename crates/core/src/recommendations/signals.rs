//! Signal fetchers
//!
//! Each fetcher reads one candidate set from the catalog store. Absent data is
//! an empty set; store failures propagate to the engine, which owns fallback.

use std::collections::HashSet;

use crate::domain::item::{Item, ItemId};
use crate::domain::order::average_order_total;

use super::materialize::order_by_rank;
use super::store::{CatalogStore, StoreResult};
use super::types::SessionContext;
use super::{CANDIDATE_LIMIT, POPULARITY_LIMIT, PRICE_BAND_LOWER, PRICE_BAND_UPPER};

/// Every candidate set gathered for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSignals {
    /// Unique purchased ids in first-seen order; excluded from scored results.
    pub purchased: Vec<ItemId>,
    /// Purchased and viewed items resolved from the catalog.
    pub behavior: Vec<Item>,
    pub category: Vec<Item>,
    pub price_affinity: Vec<Item>,
    pub popularity: Vec<Item>,
    pub average_order_value: Option<f64>,
}

impl CandidateSignals {
    /// Whether any user-specific signal exists. Popularity does not count: it
    /// is populated whenever the catalog has stock.
    pub fn has_contextual_signal(&self) -> bool {
        !self.behavior.is_empty() || !self.category.is_empty() || !self.price_affinity.is_empty()
    }
}

/// Unique item ids across all of the user's orders.
pub async fn purchased_item_ids<S>(store: &S, user_id: &str) -> StoreResult<Vec<ItemId>>
where
    S: CatalogStore + ?Sized,
{
    let orders = store.fetch_orders_by_user(user_id).await?;
    let mut seen = HashSet::new();
    let ids = orders
        .iter()
        .flat_map(|order| order.item_ids())
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect();
    Ok(ids)
}

pub async fn viewed_item_ids<S>(store: &S, user_id: &str) -> StoreResult<Vec<ItemId>>
where
    S: CatalogStore + ?Sized,
{
    store.fetch_viewed_item_ids(user_id).await
}

/// Items for the behavior ids, in the order the ids were given.
pub async fn behavior_items<S>(store: &S, ids: &[ItemId]) -> StoreResult<Vec<Item>>
where
    S: CatalogStore + ?Sized,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let items = store.fetch_items_by_ids(ids).await?;
    Ok(order_by_rank(ids, items))
}

/// In-stock items in the session's categories; empty when there are none.
pub async fn category_items<S>(store: &S, categories: &[String]) -> StoreResult<Vec<Item>>
where
    S: CatalogStore + ?Sized,
{
    if categories.is_empty() {
        return Ok(Vec::new());
    }

    store.fetch_items_by_category(categories, CANDIDATE_LIMIT).await
}

pub async fn average_order_value<S>(store: &S, user_id: &str) -> StoreResult<Option<f64>>
where
    S: CatalogStore + ?Sized,
{
    let orders = store.fetch_orders_by_user(user_id).await?;
    Ok(average_order_total(&orders))
}

/// Inclusive price band around an average order value.
pub fn price_band(average_order_value: f64) -> (f64, f64) {
    (average_order_value * PRICE_BAND_LOWER, average_order_value * PRICE_BAND_UPPER)
}

/// In-stock items near the average order value; empty when it is undefined.
pub async fn price_affinity_items<S>(
    store: &S,
    average_order_value: Option<f64>,
) -> StoreResult<Vec<Item>>
where
    S: CatalogStore + ?Sized,
{
    let Some(average) = average_order_value else {
        return Ok(Vec::new());
    };

    let (min, max) = price_band(average);
    store.fetch_items_by_price_range(min, max, CANDIDATE_LIMIT).await
}

pub async fn popular_items<S>(store: &S, limit: usize) -> StoreResult<Vec<Item>>
where
    S: CatalogStore + ?Sized,
{
    store.fetch_popular_items(limit).await
}

/// Run every fetcher for one request.
///
/// Independent reads are issued together; behavior hydration waits for the
/// purchase and view ids and the price fetch waits for the average.
pub async fn collect_signals<S>(
    store: &S,
    user_id: &str,
    session: &SessionContext,
) -> StoreResult<CandidateSignals>
where
    S: CatalogStore + ?Sized,
{
    let (purchased, viewed, category, popularity, average) = tokio::try_join!(
        purchased_item_ids(store, user_id),
        viewed_item_ids(store, user_id),
        category_items(store, session.categories()),
        popular_items(store, POPULARITY_LIMIT),
        average_order_value(store, user_id),
    )?;

    let behavior_ids: Vec<ItemId> = {
        let mut seen = HashSet::new();
        purchased.iter().chain(viewed.iter()).filter(|id| seen.insert(*id)).cloned().collect()
    };

    let (behavior, price_affinity) = tokio::try_join!(
        behavior_items(store, &behavior_ids),
        price_affinity_items(store, average),
    )?;

    Ok(CandidateSignals {
        purchased,
        behavior,
        category,
        price_affinity,
        popularity,
        average_order_value: average,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendations::test_support::item;

    #[test]
    fn price_band_is_seventy_to_one_thirty_percent() {
        let (min, max) = price_band(1_000.0);
        assert!((min - 700.0).abs() < 1e-9);
        assert!((max - 1_300.0).abs() < 1e-9);
    }

    #[test]
    fn contextual_signal_ignores_popularity() {
        let signals = CandidateSignals {
            popularity: vec![item("pop-1", "home", 100.0)],
            ..CandidateSignals::default()
        };
        assert!(!signals.has_contextual_signal());
    }
}
