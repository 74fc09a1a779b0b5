use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use curio_core::domain::item::{Item, ItemId};
use curio_core::domain::order::Order;
use curio_core::errors::ApplicationError;

pub mod catalog;
pub mod memory;

pub use catalog::SqlCatalogStore;
pub use memory::InMemoryCatalogStore;

/// Distinct viewed items read per user, most recently viewed first.
pub const VIEW_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::Persistence(error.to_string())
    }
}

/// Write side of the catalog; reads go through
/// [`curio_core::recommendations::CatalogStore`].
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Insert or replace an item by id.
    async fn save_item(&self, item: Item) -> Result<(), RepositoryError>;

    /// Insert or replace an order together with all of its lines.
    async fn save_order(&self, order: Order) -> Result<(), RepositoryError>;

    async fn record_view(
        &self,
        user_id: &str,
        item_id: &ItemId,
        viewed_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}
