use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use super::store::{CatalogStore, StoreResult};
use crate::domain::item::{Item, ItemId, Rating};
use crate::domain::order::{Order, OrderId, OrderLine};
use crate::errors::ApplicationError;

pub fn item(id: &str, category: &str, price: f64) -> Item {
    Item {
        id: ItemId::from(id),
        name: format!("Item {id}"),
        price,
        category: category.to_string(),
        image: None,
        rating: Rating { average: 4.0, count: 10 },
        in_stock: true,
        discount: 0.0,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("valid timestamp"),
    }
}

pub fn order(id: &str, item_ids: &[&str], total: f64) -> Order {
    Order {
        id: OrderId(id.to_string()),
        user_id: "user-1".to_string(),
        lines: item_ids
            .iter()
            .map(|item_id| OrderLine {
                item_id: ItemId::from(*item_id),
                quantity: 1,
                unit_price: 0.0,
            })
            .collect(),
        total,
        created_at: Utc::now(),
    }
}

/// Calls a [`ScriptedStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Orders,
    Views,
    ItemsByIds,
    Category,
    PriceRange,
    Popular,
    Recent,
    TopRated,
}

/// Catalog store returning canned answers per call.
#[derive(Default)]
pub struct ScriptedStore {
    pub orders: Vec<Order>,
    pub viewed: Vec<ItemId>,
    /// Items resolvable by id, returned in reverse to mimic unordered lookups.
    pub catalog: Vec<Item>,
    pub category: Vec<Item>,
    pub price_range: Vec<Item>,
    pub popular: Vec<Item>,
    pub recent: Vec<Item>,
    pub top_rated: Vec<Item>,
    pub failing: Vec<Call>,
    pub calls: Mutex<Vec<Call>>,
    pub price_ranges: Mutex<Vec<(f64, f64)>>,
}

impl ScriptedStore {
    fn record(&self, call: Call) -> StoreResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.failing.contains(&call) {
            return Err(ApplicationError::Persistence(format!("{call:?} query failed")));
        }
        Ok(())
    }

    pub fn called(&self, call: Call) -> bool {
        self.calls.lock().map(|calls| calls.contains(&call)).unwrap_or(false)
    }
}

#[async_trait]
impl CatalogStore for ScriptedStore {
    async fn fetch_orders_by_user(&self, _user_id: &str) -> StoreResult<Vec<Order>> {
        self.record(Call::Orders)?;
        Ok(self.orders.clone())
    }

    async fn fetch_viewed_item_ids(&self, _user_id: &str) -> StoreResult<Vec<ItemId>> {
        self.record(Call::Views)?;
        Ok(self.viewed.clone())
    }

    async fn fetch_items_by_ids(&self, ids: &[ItemId]) -> StoreResult<Vec<Item>> {
        self.record(Call::ItemsByIds)?;
        Ok(self.catalog.iter().rev().filter(|item| ids.contains(&item.id)).cloned().collect())
    }

    async fn fetch_items_by_category(
        &self,
        _categories: &[String],
        limit: usize,
    ) -> StoreResult<Vec<Item>> {
        self.record(Call::Category)?;
        Ok(self.category.iter().take(limit).cloned().collect())
    }

    async fn fetch_items_by_price_range(
        &self,
        min: f64,
        max: f64,
        limit: usize,
    ) -> StoreResult<Vec<Item>> {
        self.record(Call::PriceRange)?;
        if let Ok(mut ranges) = self.price_ranges.lock() {
            ranges.push((min, max));
        }
        Ok(self.price_range.iter().take(limit).cloned().collect())
    }

    async fn fetch_popular_items(&self, limit: usize) -> StoreResult<Vec<Item>> {
        self.record(Call::Popular)?;
        Ok(self.popular.iter().take(limit).cloned().collect())
    }

    async fn fetch_recent_items(&self, limit: usize) -> StoreResult<Vec<Item>> {
        self.record(Call::Recent)?;
        Ok(self.recent.iter().take(limit).cloned().collect())
    }

    async fn fetch_top_rated_items(&self, limit: usize) -> StoreResult<Vec<Item>> {
        self.record(Call::TopRated)?;
        Ok(self.top_rated.iter().take(limit).cloned().collect())
    }
}
