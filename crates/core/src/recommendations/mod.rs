//! Personalized recommendation engine
//!
//! Merges weak behavioral signals (purchase and view history, session category
//! interest, price affinity, global popularity) into one ranked page of catalog
//! items, with a recency fallback for cold users and a rating-only fallback
//! when the catalog store fails.

mod engine;
mod materialize;
mod scoring;
mod signals;
mod store;
mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::RecommendationEngine;
pub use materialize::{materialize, order_by_rank};
pub use scoring::{score_candidates, ScoreBoard, ScoredCandidate};
pub use signals::{
    average_order_value, behavior_items, category_items, collect_signals, popular_items,
    price_affinity_items, price_band, purchased_item_ids, viewed_item_ids, CandidateSignals,
};
pub use store::{CatalogStore, StoreResult};
pub use types::*;

/// Weight of an item the user bought or viewed.
pub const BEHAVIOR_WEIGHT: f64 = 0.50;

/// Weight of an item in one of the session's categories of interest.
pub const CATEGORY_WEIGHT: f64 = 0.25;

/// Weight of an item priced near the user's average order value.
pub const PRICE_AFFINITY_WEIGHT: f64 = 0.15;

/// Weight of a globally popular item.
pub const POPULARITY_WEIGHT: f64 = 0.10;

/// All signal weights, in scoring order.
pub const SIGNAL_WEIGHTS: SignalWeights = SignalWeights {
    behavior: BEHAVIOR_WEIGHT,
    category: CATEGORY_WEIGHT,
    price_affinity: PRICE_AFFINITY_WEIGHT,
    popularity: POPULARITY_WEIGHT,
};

/// Maximum number of items in a recommendation page.
pub const PAGE_SIZE: usize = 10;

/// Per-signal fetch limit for category and price-affinity candidates.
pub const CANDIDATE_LIMIT: usize = 10;

/// Number of popular items fetched as a scoring signal.
pub const POPULARITY_LIMIT: usize = 10;

/// Lower bound of the price-affinity band, as a multiple of the average order value.
pub const PRICE_BAND_LOWER: f64 = 0.7;

/// Upper bound of the price-affinity band, as a multiple of the average order value.
pub const PRICE_BAND_UPPER: f64 = 1.3;
