use async_trait::async_trait;

use crate::domain::item::{Item, ItemId};
use crate::domain::order::Order;
use crate::errors::ApplicationError;

/// Result type for catalog store calls
pub type StoreResult<T> = Result<T, ApplicationError>;

/// Read-only view of the catalog and order history the engine ranks over.
///
/// Every query that filters on stock returns only in-stock items. Absence of
/// data is an empty result; only genuine storage failures are errors.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn fetch_orders_by_user(&self, user_id: &str) -> StoreResult<Vec<Order>>;

    /// Items the user has viewed. Stores without view tracking report none.
    async fn fetch_viewed_item_ids(&self, user_id: &str) -> StoreResult<Vec<ItemId>> {
        let _ = user_id;
        Ok(Vec::new())
    }

    /// Items with the given ids, in no particular order, stock not filtered.
    async fn fetch_items_by_ids(&self, ids: &[ItemId]) -> StoreResult<Vec<Item>>;

    /// In-stock items in any of `categories`, by rating count descending.
    async fn fetch_items_by_category(
        &self,
        categories: &[String],
        limit: usize,
    ) -> StoreResult<Vec<Item>>;

    /// In-stock items priced within `min..=max`.
    async fn fetch_items_by_price_range(
        &self,
        min: f64,
        max: f64,
        limit: usize,
    ) -> StoreResult<Vec<Item>>;

    /// In-stock items by rating count, then rating average, both descending.
    async fn fetch_popular_items(&self, limit: usize) -> StoreResult<Vec<Item>>;

    /// In-stock items by creation time, then rating average, both descending.
    async fn fetch_recent_items(&self, limit: usize) -> StoreResult<Vec<Item>>;

    /// In-stock items by rating average descending.
    async fn fetch_top_rated_items(&self, limit: usize) -> StoreResult<Vec<Item>>;
}
