//! Shared fixtures for study-core integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use study_core::{Attempt, AttemptResult, Card};

/// Five-card Spanish vocabulary deck in the plain-text deck format.
pub const SPANISH_DECK: &str = "\
ID: 1
T: perro
D: dog

ID: 2
T: gato
D: cat

pájaro :: bird
pez :: fish

T: caballo
D: horse
";

pub fn spanish_deck() -> Vec<Card> {
    study_core::parse(SPANISH_DECK).expect("fixture deck parses")
}

pub fn three_cards() -> Vec<Card> {
    vec![
        Card::new(1, "A", "alpha"),
        Card::new(2, "B", "beta"),
        Card::new(3, "C", "gamma"),
    ]
}

/// Fixed clock: `step` seconds after a base instant.
pub fn at(step: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap() + Duration::seconds(step)
}

/// Attempts with consecutive ids, one second apart.
pub fn attempts(entries: &[(i64, AttemptResult, u64)]) -> Vec<Attempt> {
    entries
        .iter()
        .enumerate()
        .map(|(i, &(uid, result, ms))| Attempt::new(i as i64 + 1, uid, result, at(i as i64), ms))
        .collect()
}
