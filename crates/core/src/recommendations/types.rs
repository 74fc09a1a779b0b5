//! Types for the recommendation engine

use serde::{Deserialize, Serialize};

use super::scoring::ScoredCandidate;
use super::SIGNAL_WEIGHTS;
use crate::domain::item::Item;

/// Caller-supplied browsing context for a single request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Categories the user is currently browsing or has in the cart.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set categories of current interest
    pub fn with_categories<I, C>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Categories of interest; empty when none were supplied.
    pub fn categories(&self) -> &[String] {
        self.categories.as_deref().unwrap_or(&[])
    }
}

/// Weights for the four scoring signals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalWeights {
    /// Weight for purchased or viewed items (0.50)
    pub behavior: f64,
    /// Weight for session category matches (0.25)
    pub category: f64,
    /// Weight for price-affinity matches (0.15)
    pub price_affinity: f64,
    /// Weight for popular items (0.10)
    pub popularity: f64,
}

/// One independent source of evidence about user preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Behavior,
    Category,
    PriceAffinity,
    Popularity,
}

impl Signal {
    /// Signals in the order their candidates enter the score board.
    pub const SCORING_ORDER: [Signal; 4] =
        [Signal::Behavior, Signal::Category, Signal::PriceAffinity, Signal::Popularity];

    pub fn weight(&self) -> f64 {
        match self {
            Signal::Behavior => SIGNAL_WEIGHTS.behavior,
            Signal::Category => SIGNAL_WEIGHTS.category,
            Signal::PriceAffinity => SIGNAL_WEIGHTS.price_affinity,
            Signal::Popularity => SIGNAL_WEIGHTS.popularity,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Behavior => "behavior",
            Signal::Category => "category",
            Signal::PriceAffinity => "price_affinity",
            Signal::Popularity => "popularity",
        }
    }
}

/// Which of the three result policies produced a recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum RecommendationOutcome {
    /// Weighted, purchase-excluded ranking over the collected signals.
    Scored,
    /// No behavior, category or price signal: freshest well-rated stock.
    ColdStart,
    /// The catalog store failed mid-computation: top-rated stock.
    Degraded { reason: String },
}

impl RecommendationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationOutcome::Scored => "scored",
            RecommendationOutcome::ColdStart => "cold_start",
            RecommendationOutcome::Degraded { .. } => "degraded",
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, RecommendationOutcome::Scored)
    }
}

/// A ranked page of items together with how it was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub outcome: RecommendationOutcome,
    pub items: Vec<Item>,
    /// Score breakdown of the ranked items; empty for fallback results.
    pub scores: Vec<ScoredCandidate>,
}

impl Recommendation {
    pub fn scored(items: Vec<Item>, scores: Vec<ScoredCandidate>) -> Self {
        Self { outcome: RecommendationOutcome::Scored, items, scores }
    }

    pub fn cold_start(items: Vec<Item>) -> Self {
        Self { outcome: RecommendationOutcome::ColdStart, items, scores: Vec::new() }
    }

    pub fn degraded(items: Vec<Item>, reason: impl Into<String>) -> Self {
        Self {
            outcome: RecommendationOutcome::Degraded { reason: reason.into() },
            items,
            scores: Vec::new(),
        }
    }
}
