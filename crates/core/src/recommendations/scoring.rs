//! Weighted scoring and ranking of candidate items

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::signals::CandidateSignals;
use super::types::Signal;
use crate::domain::item::{Item, ItemId};

/// Fixed-point units per 1.0 of score. Weights are summed as integers so that
/// equal weight sums compare equal regardless of accumulation order.
const SCORE_SCALE: f64 = 10_000.0;

fn to_units(weight: f64) -> u64 {
    (weight * SCORE_SCALE).round() as u64
}

/// Accumulated score of one candidate item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub item_id: ItemId,
    score: f64,
    /// Signals that contributed, in the order they were applied.
    pub signals: Vec<Signal>,
    #[serde(skip)]
    units: u64,
}

impl ScoredCandidate {
    fn new(item_id: ItemId, signal: Signal, units: u64) -> Self {
        Self { item_id, score: units as f64 / SCORE_SCALE, signals: vec![signal], units }
    }

    fn credit(&mut self, signal: Signal, units: u64) {
        self.signals.push(signal);
        self.units += units;
        self.score = self.units as f64 / SCORE_SCALE;
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

/// Per-request mapping of item id to accumulated score.
///
/// Iteration and ranking follow first-seen insertion order, which makes the
/// order signals are applied in the tie-break rule.
#[derive(Debug, Default)]
pub struct ScoreBoard {
    entries: Vec<ScoredCandidate>,
    index: HashMap<ItemId, usize>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit every item in `items` with the weight of `signal`.
    ///
    /// An item is credited at most once per signal.
    pub fn add(&mut self, items: &[Item], signal: Signal) {
        let units = to_units(signal.weight());

        for item in items {
            match self.index.get(&item.id) {
                Some(&position) => {
                    let entry = &mut self.entries[position];
                    if !entry.signals.contains(&signal) {
                        entry.credit(signal, units);
                    }
                }
                None => {
                    self.index.insert(item.id.clone(), self.entries.len());
                    self.entries.push(ScoredCandidate::new(item.id.clone(), signal, units));
                }
            }
        }
    }

    /// Drop every candidate whose id is in `excluded`, whatever its score.
    pub fn exclude(&mut self, excluded: &HashSet<ItemId>) {
        if excluded.is_empty() {
            return;
        }

        self.entries.retain(|entry| !excluded.contains(&entry.item_id));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.item_id.clone(), position))
            .collect();
    }

    pub fn score_of(&self, id: &ItemId) -> Option<f64> {
        self.index.get(id).map(|&position| self.entries[position].score())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Candidates by descending score, ties in insertion order, at most `limit`.
    pub fn into_ranked(mut self, limit: usize) -> Vec<ScoredCandidate> {
        // `sort_by` is stable, which the tie-break relies on.
        self.entries.sort_by(|a, b| b.units.cmp(&a.units));
        self.entries.truncate(limit);
        self.entries
    }
}

/// Score every candidate set, drop purchased items and rank the remainder.
pub fn score_candidates(signals: &CandidateSignals, limit: usize) -> Vec<ScoredCandidate> {
    let mut board = ScoreBoard::new();
    for signal in Signal::SCORING_ORDER {
        let items = match signal {
            Signal::Behavior => &signals.behavior,
            Signal::Category => &signals.category,
            Signal::PriceAffinity => &signals.price_affinity,
            Signal::Popularity => &signals.popularity,
        };
        board.add(items, signal);
    }

    let purchased: HashSet<ItemId> = signals.purchased.iter().cloned().collect();
    board.exclude(&purchased);
    board.into_ranked(limit)
}
