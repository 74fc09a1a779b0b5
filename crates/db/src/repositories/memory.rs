use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use curio_core::domain::item::{Item, ItemId};
use curio_core::domain::order::Order;
use curio_core::recommendations::{CatalogStore, StoreResult};

use super::{CatalogRepository, RepositoryError, VIEW_HISTORY_LIMIT};

#[derive(Clone, Debug)]
struct ItemView {
    user_id: String,
    item_id: ItemId,
    viewed_at: DateTime<Utc>,
}

/// Catalog held in process memory, with the same filters and orderings as
/// [`super::SqlCatalogStore`].
#[derive(Default)]
pub struct InMemoryCatalogStore {
    items: RwLock<HashMap<ItemId, Item>>,
    orders: RwLock<HashMap<String, Order>>,
    views: RwLock<Vec<ItemView>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn in_stock_where<F, C>(&self, keep: F, compare: C, limit: usize) -> Vec<Item>
    where
        F: Fn(&Item) -> bool,
        C: Fn(&Item, &Item) -> Ordering,
    {
        let items = self.items.read().await;
        let mut matching: Vec<Item> =
            items.values().filter(|item| item.in_stock && keep(item)).cloned().collect();
        matching.sort_by(|a, b| compare(a, b).then_with(|| a.id.cmp(&b.id)));
        matching.truncate(limit);
        matching
    }
}

fn by_rating_count(a: &Item, b: &Item) -> Ordering {
    b.rating.count.cmp(&a.rating.count)
}

fn by_rating_average(a: &Item, b: &Item) -> Ordering {
    b.rating.average.total_cmp(&a.rating.average)
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn fetch_orders_by_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> =
            orders.values().filter(|order| order.user_id == user_id).cloned().collect();
        matching.sort_by(|a, b| {
            a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0))
        });
        Ok(matching)
    }

    async fn fetch_viewed_item_ids(&self, user_id: &str) -> StoreResult<Vec<ItemId>> {
        let views = self.views.read().await;
        let mut last_viewed: HashMap<&ItemId, DateTime<Utc>> = HashMap::new();
        for view in views.iter().filter(|view| view.user_id == user_id) {
            let entry = last_viewed.entry(&view.item_id).or_insert(view.viewed_at);
            if view.viewed_at > *entry {
                *entry = view.viewed_at;
            }
        }

        let mut ranked: Vec<(&ItemId, DateTime<Utc>)> = last_viewed.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        Ok(ranked.into_iter().take(VIEW_HISTORY_LIMIT).map(|(id, _)| id.clone()).collect())
    }

    async fn fetch_items_by_ids(&self, ids: &[ItemId]) -> StoreResult<Vec<Item>> {
        let items = self.items.read().await;
        let mut found: Vec<Item> = ids.iter().filter_map(|id| items.get(id)).cloned().collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found.dedup_by(|a, b| a.id == b.id);
        Ok(found)
    }

    async fn fetch_items_by_category(
        &self,
        categories: &[String],
        limit: usize,
    ) -> StoreResult<Vec<Item>> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .in_stock_where(|item| categories.contains(&item.category), by_rating_count, limit)
            .await)
    }

    async fn fetch_items_by_price_range(
        &self,
        min: f64,
        max: f64,
        limit: usize,
    ) -> StoreResult<Vec<Item>> {
        let in_band = |item: &Item| item.price >= min && item.price <= max;
        Ok(self.in_stock_where(in_band, |_, _| Ordering::Equal, limit).await)
    }

    async fn fetch_popular_items(&self, limit: usize) -> StoreResult<Vec<Item>> {
        Ok(self
            .in_stock_where(
                |_| true,
                |a, b| by_rating_count(a, b).then_with(|| by_rating_average(a, b)),
                limit,
            )
            .await)
    }

    async fn fetch_recent_items(&self, limit: usize) -> StoreResult<Vec<Item>> {
        Ok(self
            .in_stock_where(
                |_| true,
                |a, b| b.created_at.cmp(&a.created_at).then_with(|| by_rating_average(a, b)),
                limit,
            )
            .await)
    }

    async fn fetch_top_rated_items(&self, limit: usize) -> StoreResult<Vec<Item>> {
        Ok(self.in_stock_where(|_| true, by_rating_average, limit).await)
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogStore {
    async fn save_item(&self, item: Item) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        items.insert(item.id.clone(), item);
        Ok(())
    }

    async fn save_order(&self, order: Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id.0.clone(), order);
        Ok(())
    }

    async fn record_view(
        &self,
        user_id: &str,
        item_id: &ItemId,
        viewed_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut views = self.views.write().await;
        views.push(ItemView { user_id: user_id.to_string(), item_id: item_id.clone(), viewed_at });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use curio_core::domain::item::{Item, ItemId, Rating};
    use curio_core::recommendations::CatalogStore;

    use super::InMemoryCatalogStore;
    use crate::repositories::{CatalogRepository, VIEW_HISTORY_LIMIT};

    fn sample_item(id: &str, category: &str, count: u32, average: f64) -> Item {
        Item {
            id: ItemId::from(id),
            name: format!("Item {id}"),
            price: 10.0,
            category: category.to_string(),
            image: None,
            rating: Rating { average, count },
            in_stock: true,
            discount: 0.0,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("timestamp"),
        }
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    #[tokio::test]
    async fn save_item_replaces_by_id() {
        let store = InMemoryCatalogStore::new();
        store.save_item(sample_item("itm-1", "books", 1, 4.0)).await.expect("save");
        let mut updated = sample_item("itm-1", "books", 2, 4.0);
        updated.name = "Renamed".to_string();
        store.save_item(updated.clone()).await.expect("resave");

        let found = store.fetch_items_by_ids(&[ItemId::from("itm-1")]).await.expect("find");

        assert_eq!(found, vec![updated]);
    }

    #[tokio::test]
    async fn repeated_ids_resolve_once() {
        let store = InMemoryCatalogStore::new();
        store.save_item(sample_item("itm-1", "books", 1, 4.0)).await.expect("save");

        let found = store
            .fetch_items_by_ids(&[ItemId::from("itm-1"), ItemId::from("itm-1")])
            .await
            .expect("find");

        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn out_of_stock_items_are_hidden_from_listings() {
        let store = InMemoryCatalogStore::new();
        let mut sold_out = sample_item("sold-out", "books", 100, 5.0);
        sold_out.in_stock = false;
        store.save_item(sold_out).await.expect("save");
        store.save_item(sample_item("in-stock", "books", 1, 1.0)).await.expect("save");

        let categories = vec!["books".to_string()];
        assert_eq!(ids(&store.fetch_popular_items(10).await.expect("popular")), vec!["in-stock"]);
        assert_eq!(ids(&store.fetch_top_rated_items(10).await.expect("top")), vec!["in-stock"]);
        assert_eq!(
            ids(&store.fetch_items_by_category(&categories, 10).await.expect("category")),
            vec!["in-stock"]
        );
        assert_eq!(
            store.fetch_items_by_ids(&[ItemId::from("sold-out")]).await.expect("by id").len(),
            1,
            "lookup by id ignores stock"
        );
    }

    #[tokio::test]
    async fn view_history_is_capped() {
        let store = InMemoryCatalogStore::new();
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("timestamp");
        for n in 0..(VIEW_HISTORY_LIMIT + 5) {
            let viewed_at = base + Duration::seconds(n as i64);
            let item_id = ItemId(format!("itm-{n:03}"));
            store.record_view("user-1", &item_id, viewed_at).await.expect("record");
        }

        let viewed = store.fetch_viewed_item_ids("user-1").await.expect("views");

        assert_eq!(viewed.len(), VIEW_HISTORY_LIMIT);
        assert_eq!(viewed[0].as_str(), format!("itm-{:03}", VIEW_HISTORY_LIMIT + 4));
    }
}
