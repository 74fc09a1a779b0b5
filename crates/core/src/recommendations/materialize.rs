use std::collections::HashMap;

use super::store::{CatalogStore, StoreResult};
use crate::domain::item::{Item, ItemId};

/// Hydrate ranked ids into items, in rank order.
pub async fn materialize<S>(store: &S, ranked: &[ItemId]) -> StoreResult<Vec<Item>>
where
    S: CatalogStore + ?Sized,
{
    if ranked.is_empty() {
        return Ok(Vec::new());
    }

    let items = store.fetch_items_by_ids(ranked).await?;
    Ok(order_by_rank(ranked, items))
}

/// Re-sort `items` to follow `ranked`. Ids without an item are skipped and
/// items whose id is not ranked are dropped.
pub fn order_by_rank(ranked: &[ItemId], items: Vec<Item>) -> Vec<Item> {
    let mut by_id: HashMap<ItemId, Item> =
        items.into_iter().map(|item| (item.id.clone(), item)).collect();

    ranked.iter().filter_map(|id| by_id.remove(id)).collect()
}
