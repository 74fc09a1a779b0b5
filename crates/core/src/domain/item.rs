use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Image shown for catalog entries that carry no image of their own.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=150&h=150&fit=crop&crop=center";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Aggregate customer rating of a catalog item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Mean star rating in `0.0..=5.0`.
    pub average: f64,
    /// Number of ratings the average was computed from.
    pub count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub image: Option<String>,
    pub rating: Rating,
    pub in_stock: bool,
    #[serde(default)]
    pub discount: f64,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn image_or_placeholder(&self) -> &str {
        self.image
            .as_deref()
            .filter(|image| !image.trim().is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE_URL)
    }
}
