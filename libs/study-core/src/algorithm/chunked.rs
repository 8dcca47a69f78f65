//! Chunked adaptive scheduler.
//!
//! Works on a small rotating chunk of cards. When nothing in the chunk still
//! needs learning, the scheduler flips between the full pool and a review
//! pool of repeatedly missed cards and builds a new chunk, ranked by
//! difficulty and by how far each card is from the mastery target.
//! Within a chunk the next card is the one with the highest selection
//! priority (difficulty, time since last seen, and a small random jitter).

use super::difficulty::{score, CardScore};
use super::QuestionScheduler;
use crate::settings::{ConfigUpdate, SchedulerConfig};
use crate::types::{Attempt, Card};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

const DIFFICULTY_PRIORITY: f64 = 0.75;
const RECENCY_PRIORITY: f64 = 0.25;
const JITTER_PRIORITY: f64 = 0.05;

/// History entries after which a card's recency term saturates.
pub const RECENCY_SATURATION: f64 = 20.0;

/// Which pool the current chunk was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Building,
    Reviewing,
}

/// Per-session scheduling state. Starts cold and is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkState {
    /// Card uids of the active chunk, in ranking order.
    pub current_chunk: Vec<i64>,
    pub in_review: bool,
}

impl ChunkState {
    pub fn phase(&self) -> Phase {
        if self.in_review {
            Phase::Reviewing
        } else {
            Phase::Building
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChunkedScheduler<R = StdRng> {
    config: SchedulerConfig,
    state: ChunkState,
    rng: R,
}

impl ChunkedScheduler<StdRng> {
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl Default for ChunkedScheduler<StdRng> {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl<R: Rng> ChunkedScheduler<R> {
    /// Use an explicit random source (seed it to get a reproducible order).
    pub fn with_rng(config: SchedulerConfig, rng: R) -> Self {
        Self {
            config: config.normalized(),
            state: ChunkState::default(),
            rng,
        }
    }

    pub fn state(&self) -> &ChunkState {
        &self.state
    }

    fn needs_learning(&self, card: &CardScore) -> bool {
        card.total_attempts < self.config.mastery_target as usize
            || card.difficulty > self.config.difficulty_threshold
    }

    /// Whether the active chunk must be replaced before selecting.
    fn chunk_is_stale(&self, chunk_size: usize, scores: &HashMap<i64, CardScore>) -> bool {
        let chunk = &self.state.current_chunk;
        if chunk.is_empty() || chunk.len() > chunk_size {
            return true;
        }
        // A uid missing from the pool means the caller swapped card sets.
        if chunk.iter().any(|uid| !scores.contains_key(uid)) {
            return true;
        }
        !chunk
            .iter()
            .filter_map(|uid| scores.get(uid))
            .any(|s| self.needs_learning(s))
    }

    fn build_chunk(&mut self, cards: &[Card], chunk_size: usize, scores: &HashMap<i64, CardScore>) {
        let mut pool: Vec<&Card> = Vec::new();
        if self.state.in_review {
            pool = cards
                .iter()
                .filter(|c| {
                    scores
                        .get(&c.uid)
                        .is_some_and(|s| s.total_attempts > 0 && s.recent_misses > 1)
                })
                .collect();
            if pool.is_empty() {
                tracing::debug!("review pool empty, falling back to full pool");
            }
        }
        if pool.is_empty() {
            pool = cards.iter().collect();
        }

        // Exact score ties are broken by a random key so a cold start does
        // not always favour the head of the deck.
        let config = self.config;
        let rng = &mut self.rng;
        let mut ranked: Vec<(f64, f64, i64)> = pool
            .iter()
            .filter_map(|c| {
                let s = scores.get(&c.uid)?;
                Some((chunk_score(&config, s), rng.gen::<f64>(), c.uid))
            })
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.total_cmp(&b.1)));

        self.state.current_chunk = ranked
            .into_iter()
            .take(chunk_size)
            .map(|(_, _, uid)| uid)
            .collect();

        tracing::debug!(
            phase = ?self.state.phase(),
            pool = pool.len(),
            chunk = ?self.state.current_chunk,
            "rebuilt chunk"
        );
    }

    fn select_from_chunk(&mut self, history: &[Attempt], scores: &HashMap<i64, CardScore>) -> Option<i64> {
        let mut last_seen: HashMap<i64, usize> = HashMap::new();
        for (i, attempt) in history.iter().enumerate() {
            last_seen.insert(attempt.card_uid, i);
        }

        let mut best: Option<(i64, f64)> = None;
        for &uid in &self.state.current_chunk {
            let Some(card) = scores.get(&uid) else {
                continue;
            };
            let since = last_seen.get(&uid).map(|&i| history.len() - 1 - i);
            let priority = selection_priority(card.difficulty, since, self.rng.gen::<f64>());
            // Strict comparison keeps the earliest card on exact ties.
            if best.map_or(true, |(_, p)| priority > p) {
                best = Some((uid, priority));
            }
        }

        if let Some((uid, priority)) = best {
            tracing::trace!(uid, priority, "selected card");
        }
        best.map(|(uid, _)| uid)
    }
}

impl<R: Rng> QuestionScheduler for ChunkedScheduler<R> {
    fn name(&self) -> &'static str {
        "chunked"
    }

    fn next_question(&mut self, cards: &[Card], history: &[Attempt]) -> usize {
        if cards.is_empty() {
            tracing::warn!("next_question called with an empty card pool");
            return 0;
        }

        let chunk_size = self.config.chunk_size.min(cards.len());
        let scores: HashMap<i64, CardScore> =
            cards.iter().map(|c| (c.uid, score(c, history))).collect();

        if self.chunk_is_stale(chunk_size, &scores) {
            self.state.in_review = !self.state.in_review;
            self.build_chunk(cards, chunk_size, &scores);
        }

        self.select_from_chunk(history, &scores)
            .and_then(|uid| cards.iter().position(|c| c.uid == uid))
            .unwrap_or(0)
    }

    fn set_config(&mut self, update: &ConfigUpdate) {
        self.config = self.config.apply(update);
        self.state = ChunkState::default();
        tracing::debug!(config = ?self.config, "scheduler config replaced, chunk reset");
    }

    fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

/// Ranking used when building a chunk: difficulty plus the share of the
/// mastery target still missing.
pub fn chunk_score(config: &SchedulerConfig, card: &CardScore) -> f64 {
    let target = config.mastery_target.max(1) as f64;
    let remaining = (target - card.total_attempts as f64).max(0.0) / target;
    config.difficulty_weight * card.difficulty + config.attempt_weight * remaining
}

/// Recency contribution in `[0, 1]`. `None` means the card was never attempted.
pub fn recency_term(entries_since_last_attempt: Option<usize>) -> f64 {
    match entries_since_last_attempt {
        Some(n) => (n as f64 / RECENCY_SATURATION).min(1.0),
        None => 1.0,
    }
}

/// Selection priority inside a chunk. `jitter` is expected in `[0, 1)`.
pub fn selection_priority(difficulty: f64, entries_since_last_attempt: Option<usize>, jitter: f64) -> f64 {
    DIFFICULTY_PRIORITY * difficulty
        + RECENCY_PRIORITY * recency_term(entries_since_last_attempt)
        + JITTER_PRIORITY * jitter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::difficulty;
    use crate::settings::Rigor;
    use crate::types::AttemptResult;
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::mock::StepRng;
    use rand_chacha::ChaCha8Rng;

    fn deck(n: i64) -> Vec<Card> {
        (1..=n)
            .map(|uid| Card::new(uid, format!("term {uid}"), format!("definition {uid}")))
            .collect()
    }

    fn record(history: &mut Vec<Attempt>, uid: i64, result: AttemptResult, ms: u64) {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
            + Duration::seconds(history.len() as i64);
        history.push(Attempt::new(history.len() as i64 + 1, uid, result, at, ms));
    }

    fn seeded(config: SchedulerConfig, seed: u64) -> ChunkedScheduler<ChaCha8Rng> {
        ChunkedScheduler::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Jitter and tie-break keys are always zero.
    fn zero_jitter(config: SchedulerConfig) -> ChunkedScheduler<StepRng> {
        ChunkedScheduler::with_rng(config, StepRng::new(0, 0))
    }

    #[test]
    fn cold_start_takes_first_chunk() {
        let cards = deck(10);
        let mut scheduler = zero_jitter(SchedulerConfig::default().with_chunk_size(4));

        let index = scheduler.next_question(&cards, &[]);

        assert_eq!(index, 0);
        assert_eq!(scheduler.state().current_chunk, vec![1, 2, 3, 4]);
    }

    #[test]
    fn chunk_never_exceeds_pool() {
        let cards = deck(3);
        let mut scheduler = seeded(SchedulerConfig::default().with_chunk_size(7), 1);
        let index = scheduler.next_question(&cards, &[]);
        assert!(index < 3);
        assert_eq!(scheduler.state().current_chunk.len(), 3);
    }

    #[test]
    fn recency_term_saturates() {
        assert_eq!(recency_term(Some(0)), 0.0);
        assert_eq!(recency_term(Some(10)), 0.5);
        assert_eq!(recency_term(Some(20)), 1.0);
        assert_eq!(recency_term(Some(500)), recency_term(Some(20)));
        assert_eq!(recency_term(None), 1.0);
    }

    #[test]
    fn jitter_is_bounded() {
        let low = selection_priority(0.3, Some(4), 0.0);
        let high = selection_priority(0.3, Some(4), 0.999_999);
        assert!(high - low < 0.05 + 1e-12);
    }

    #[test]
    fn review_falls_back_to_full_pool() {
        // Everything learned under relaxed rigor, nothing missed twice.
        let cards = deck(3);
        let mut history = Vec::new();
        for uid in 1..=3 {
            record(&mut history, uid, AttemptResult::Correct, 400);
        }
        let mut scheduler = seeded(Rigor::Relaxed.preset().with_chunk_size(3), 7);

        scheduler.next_question(&cards, &history);
        assert_eq!(scheduler.state().phase(), Phase::Reviewing);
        assert_eq!(scheduler.state().current_chunk.len(), 3);

        // Chunk is exhausted, so the next call flips back and rebuilds.
        scheduler.next_question(&cards, &history);
        assert_eq!(scheduler.state().phase(), Phase::Building);
        assert_eq!(scheduler.state().current_chunk.len(), 3);
    }

    #[test]
    fn review_chunk_holds_repeatedly_missed_cards() {
        let cards = deck(5);
        let mut history = Vec::new();
        record(&mut history, 4, AttemptResult::Incorrect, 3_000);
        record(&mut history, 2, AttemptResult::Incorrect, 3_000);
        record(&mut history, 4, AttemptResult::Incorrect, 3_000);
        record(&mut history, 2, AttemptResult::Correct, 3_000);

        // First rebuild enters review.
        let mut scheduler = seeded(SchedulerConfig::default().with_chunk_size(5), 3);
        let index = scheduler.next_question(&cards, &history);

        assert_eq!(scheduler.state().phase(), Phase::Reviewing);
        assert_eq!(scheduler.state().current_chunk, vec![4]);
        assert_eq!(cards[index].uid, 4);
    }

    #[test]
    fn enough_attempts_but_still_difficult_keeps_chunk() {
        let cards = deck(4);
        let mut history = Vec::new();
        for _ in 0..3 {
            record(&mut history, 1, AttemptResult::Incorrect, 1_000);
        }
        let config = SchedulerConfig::default().with_chunk_size(1);
        let card = difficulty::score(&cards[0], &history);
        assert!(card.total_attempts >= config.mastery_target as usize);
        assert!(card.difficulty > config.difficulty_threshold);

        let mut scheduler = seeded(config, 17);
        for _ in 0..20 {
            assert_eq!(scheduler.next_question(&cards, &history), 0);
            assert_eq!(scheduler.state().current_chunk, vec![1]);
            assert_eq!(scheduler.state().phase(), Phase::Reviewing);
        }
    }

    #[test]
    fn chunk_ranks_by_difficulty_then_missing_attempts() {
        let cards = deck(4);
        let mut history = Vec::new();
        // card 1: learned; card 2: one slow miss; cards 3, 4: unseen
        record(&mut history, 1, AttemptResult::Correct, 100);
        record(&mut history, 1, AttemptResult::Correct, 100);
        record(&mut history, 2, AttemptResult::Incorrect, 4_000);

        let mut scheduler = zero_jitter(SchedulerConfig::default().with_chunk_size(3));
        scheduler.next_question(&cards, &history);

        // unseen: 0.7 * 1.0 + 0.3 * 1.0 = 1.0
        // card 2: 0.7 * 0.94 + 0.3 * 0.5 = 0.808
        assert_eq!(scheduler.state().current_chunk, vec![3, 4, 2]);
    }

    #[test]
    fn set_config_resets_chunk() {
        let cards = deck(6);
        let mut scheduler = seeded(SchedulerConfig::default().with_chunk_size(5), 11);
        scheduler.next_question(&cards, &[]);
        assert!(!scheduler.state().current_chunk.is_empty());

        scheduler.set_config(&ConfigUpdate {
            chunk_size: Some(2),
            mastery_target: Some(0),
            ..Default::default()
        });
        assert_eq!(scheduler.state(), &ChunkState::default());
        assert_eq!(scheduler.config().mastery_target, 1);

        scheduler.next_question(&cards, &[]);
        assert_eq!(scheduler.state().current_chunk.len(), 2);
    }

    #[test]
    fn swapped_card_pool_forces_rebuild() {
        let mut scheduler = seeded(SchedulerConfig::default().with_chunk_size(2), 5);
        scheduler.next_question(&deck(4), &[]);

        let other: Vec<Card> = (100..104).map(|uid| Card::new(uid, "t", "d")).collect();
        let index = scheduler.next_question(&other, &[]);

        assert!(index < other.len());
        assert!(scheduler
            .state()
            .current_chunk
            .iter()
            .all(|uid| (100..104).contains(uid)));
    }

    #[test]
    fn always_returns_a_valid_index() {
        let cards = deck(9);
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut history = Vec::new();
        // Attempts against uids that are not in the pool.
        record(&mut history, 404, AttemptResult::Incorrect, 1_000);
        record(&mut history, -3, AttemptResult::Unsure, 1_000);

        let mut scheduler = seeded(SchedulerConfig::default().with_chunk_size(4), 42);
        for _ in 0..300 {
            let index = scheduler.next_question(&cards, &history);
            assert!(index < cards.len());
            let result = match rng.gen_range(0..3) {
                0 => AttemptResult::Correct,
                1 => AttemptResult::Incorrect,
                _ => AttemptResult::Unsure,
            };
            record(&mut history, cards[index].uid, result, rng.gen_range(0..15_000));
        }
    }

    #[test]
    fn single_card_pool() {
        let cards = deck(1);
        let mut history = Vec::new();
        let mut scheduler = seeded(SchedulerConfig::default(), 2);
        for _ in 0..10 {
            assert_eq!(scheduler.next_question(&cards, &history), 0);
            record(&mut history, 1, AttemptResult::Correct, 200);
        }
    }

    #[test]
    fn same_seed_same_order() {
        let cards = deck(8);
        let mut a = seeded(SchedulerConfig::default().with_chunk_size(3), 1234);
        let mut b = seeded(SchedulerConfig::default().with_chunk_size(3), 1234);
        let mut history_a = Vec::new();
        let mut history_b = Vec::new();

        for step in 0..40 {
            let ia = a.next_question(&cards, &history_a);
            let ib = b.next_question(&cards, &history_b);
            assert_eq!(ia, ib);
            let result = if step % 3 == 0 {
                AttemptResult::Incorrect
            } else {
                AttemptResult::Correct
            };
            record(&mut history_a, cards[ia].uid, result, 1_500);
            record(&mut history_b, cards[ib].uid, result, 1_500);
        }
    }
}
