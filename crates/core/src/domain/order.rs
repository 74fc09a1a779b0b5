use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::item::ItemId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub quantity: u32,
    pub unit_price: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: String,
    pub lines: Vec<OrderLine>,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.lines.iter().map(|line| &line.item_id)
    }
}

/// Mean order total across `orders`.
///
/// Returns `None` for an empty history and for a zero mean; a zero mean cannot
/// describe a usable price band.
pub fn average_order_total(orders: &[Order]) -> Option<f64> {
    if orders.is_empty() {
        return None;
    }

    let sum: f64 = orders.iter().map(|order| order.total).sum();
    let average = sum / orders.len() as f64;
    (average > 0.0).then_some(average)
}
