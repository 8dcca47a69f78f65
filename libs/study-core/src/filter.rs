//! Card list filtering by difficulty label or star.

use crate::algorithm::difficulty;
use crate::types::{Attempt, Card, Difficulty};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardFilter {
    All,
    Label(Difficulty),
    Starred,
}

impl Default for CardFilter {
    fn default() -> Self {
        Self::All
    }
}

impl CardFilter {
    /// Parse a filter name as shown in the card list ("All", "Starred" or a label).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "starred" => Some(Self::Starred),
            other => Difficulty::from_str(other).map(Self::Label),
        }
    }
}

/// Cards matching `filter`, in pool order.
pub fn filter_cards<'a>(
    cards: &'a [Card],
    history: &[Attempt],
    filter: CardFilter,
    starred: &HashSet<i64>,
) -> Vec<&'a Card> {
    match filter {
        CardFilter::All => cards.iter().collect(),
        CardFilter::Starred => cards.iter().filter(|c| starred.contains(&c.uid)).collect(),
        CardFilter::Label(wanted) => cards
            .iter()
            .filter(|c| difficulty::label(c, history) == wanted)
            .collect(),
    }
}
