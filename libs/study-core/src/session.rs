//! Study session driver.
//!
//! Owns everything one practice run needs: the card pool, the attempt
//! history, the scheduler and the answer checker. Storage stays outside;
//! callers persist the attempts returned here and hand back the confirmed
//! records through [`StudySession::confirm_attempt`].

use crate::algorithm::chunked::ChunkedScheduler;
use crate::algorithm::{difficulty, QuestionScheduler};
use crate::error::SessionError;
use crate::filter::{filter_cards, CardFilter};
use crate::history::AttemptHistory;
use crate::matching::{AnswerOracle, ShortAnswerMatcher};
use crate::settings::{AnswerType, PracticeSettings, PracticeSettingsUpdate, QuizMode};
use crate::types::{Attempt, AttemptResult, Card, Difficulty};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Options offered for a multiple-choice question, correct one included.
pub const CHOICE_COUNT: usize = 4;

/// What the learner is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Prompt with the term, expect the definition.
    RecallDefinition,
    /// Prompt with the definition, expect the term.
    RecallTerm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    ShortAnswer,
    MultipleChoice { options: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub card_index: usize,
    pub card_uid: i64,
    pub direction: Direction,
    pub prompt: String,
    pub expected: String,
    pub kind: QuestionKind,
}

pub struct StudySession<S = ChunkedScheduler, O = ShortAnswerMatcher, R = StdRng> {
    cards: Vec<Card>,
    history: AttemptHistory,
    /// History length when the session started; later entries are this session's.
    session_start: usize,
    scheduler: S,
    oracle: O,
    settings: PracticeSettings,
    rng: R,
    current: Option<Question>,
}

impl StudySession {
    /// Session with the chunked scheduler, the lenient matcher and entropy-seeded randomness.
    pub fn with_defaults(
        cards: Vec<Card>,
        history: Vec<Attempt>,
        settings: PracticeSettings,
    ) -> Result<Self, SessionError> {
        Self::new(
            cards,
            history,
            settings,
            ChunkedScheduler::new(settings.scheduler_config()),
            ShortAnswerMatcher,
            StdRng::from_entropy(),
        )
    }
}

impl<S, O, R> StudySession<S, O, R>
where
    S: QuestionScheduler,
    O: AnswerOracle,
    R: Rng,
{
    pub fn new(
        cards: Vec<Card>,
        history: Vec<Attempt>,
        settings: PracticeSettings,
        mut scheduler: S,
        oracle: O,
        rng: R,
    ) -> Result<Self, SessionError> {
        if cards.is_empty() {
            return Err(SessionError::EmptyDeck);
        }
        scheduler.set_config(&settings.scheduler_config().into());

        let session_start = history.len();
        tracing::info!(
            cards = cards.len(),
            prior_attempts = session_start,
            scheduler = scheduler.name(),
            "study session started"
        );

        Ok(Self {
            cards,
            history: AttemptHistory::from_attempts(history),
            session_start,
            scheduler,
            oracle,
            settings,
            rng,
            current: None,
        })
    }

    /// Ask the scheduler for the next card and prepare a question for it.
    pub fn next_question(&mut self) -> &Question {
        let index = self
            .scheduler
            .next_question(&self.cards, self.history.as_slice())
            .min(self.cards.len() - 1);

        let direction = match self.settings.quiz_mode {
            QuizMode::TermToDefinition => Direction::RecallDefinition,
            QuizMode::DefinitionToTerm => Direction::RecallTerm,
            QuizMode::Both if self.rng.gen_bool(0.5) => Direction::RecallTerm,
            QuizMode::Both => Direction::RecallDefinition,
        };
        let multiple_choice = match self.settings.answer_type {
            AnswerType::MultipleChoice => true,
            AnswerType::ShortAnswer => false,
            AnswerType::Both => self.rng.gen_bool(0.5),
        };

        let card = &self.cards[index];
        let (prompt, expected) = match direction {
            Direction::RecallDefinition => (card.term.clone(), card.definition.clone()),
            Direction::RecallTerm => (card.definition.clone(), card.term.clone()),
        };
        let card_uid = card.uid;

        let kind = if multiple_choice {
            QuestionKind::MultipleChoice {
                options: self.choice_options(&expected, direction),
            }
        } else {
            QuestionKind::ShortAnswer
        };

        tracing::debug!(card_uid, ?direction, "next question");
        self.current.insert(Question {
            card_index: index,
            card_uid,
            direction,
            prompt,
            expected,
            kind,
        })
    }

    fn choice_options(&mut self, expected: &str, direction: Direction) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(expected);
        let mut distractors: Vec<&str> = Vec::new();
        for card in &self.cards {
            let side = match direction {
                Direction::RecallDefinition => card.definition.as_str(),
                Direction::RecallTerm => card.term.as_str(),
            };
            if seen.insert(side) {
                distractors.push(side);
            }
        }
        distractors.shuffle(&mut self.rng);

        let mut options: Vec<String> = std::iter::once(expected)
            .chain(distractors.into_iter().take(CHOICE_COUNT - 1))
            .map(str::to_string)
            .collect();
        options.shuffle(&mut self.rng);
        options
    }

    /// Grade `guess` for the current question and append a provisional attempt.
    pub fn submit_answer(
        &mut self,
        guess: &str,
        response_ms: u64,
        now: DateTime<Utc>,
    ) -> Result<Attempt, SessionError> {
        let question = self.current.as_ref().ok_or(SessionError::NoActiveQuestion)?;

        let correct = match &question.kind {
            QuestionKind::MultipleChoice { .. } => guess.trim() == question.expected.trim(),
            QuestionKind::ShortAnswer => self.oracle.is_correct(guess, &question.expected),
        };

        let attempt = Attempt::new(
            self.history.next_provisional_id(),
            question.card_uid,
            AttemptResult::from_correct(correct),
            now,
            response_ms,
        );
        self.history.push(attempt.clone());

        tracing::debug!(
            card_uid = attempt.card_uid,
            result = attempt.result.as_str(),
            response_ms,
            "answer recorded"
        );
        Ok(attempt)
    }

    /// Swap a provisional attempt for the record confirmed by storage.
    pub fn confirm_attempt(&mut self, provisional_id: i64, saved: Attempt) -> Result<(), SessionError> {
        self.history.replace(provisional_id, saved)?;
        Ok(())
    }

    /// Correct the result of the current card's latest attempt
    /// ("I was right" / "I was unsure" / "I was wrong").
    pub fn mark_last(&mut self, result: AttemptResult) -> Result<Option<Attempt>, SessionError> {
        let question = self.current.as_ref().ok_or(SessionError::NoActiveQuestion)?;
        let Some(id) = self.history.last_for_card(question.card_uid).map(|a| a.id) else {
            return Ok(None);
        };

        let previous = self.history.set_result(id, result)?;
        tracing::debug!(id, from = previous.as_str(), to = result.as_str(), "attempt corrected");

        Ok(self.history.last_for_card(question.card_uid).cloned())
    }

    /// Merge preference overrides and reconfigure the scheduler.
    pub fn update_settings(&mut self, update: &PracticeSettingsUpdate) {
        self.settings = self.settings.merge(update);
        self.scheduler
            .set_config(&self.settings.scheduler_config().into());
        tracing::info!(
            rigor = self.settings.rigor.as_str(),
            chunk_size = self.settings.chunk_size,
            "practice settings updated"
        );
    }

    /// Difficulty badge for every card, in pool order.
    pub fn labels(&self) -> Vec<(&Card, Difficulty)> {
        self.cards
            .iter()
            .map(|card| (card, difficulty::label(card, self.history.as_slice())))
            .collect()
    }

    pub fn filter(&self, filter: CardFilter, starred: &HashSet<i64>) -> Vec<&Card> {
        filter_cards(&self.cards, self.history.as_slice(), filter, starred)
    }

    /// Attempts made in this session that are currently marked correct.
    pub fn score(&self) -> usize {
        self.session_attempts()
            .iter()
            .filter(|a| a.result == AttemptResult::Correct)
            .count()
    }

    /// Attempts made in this session.
    pub fn total_attempts(&self) -> usize {
        self.session_attempts().len()
    }

    fn session_attempts(&self) -> &[Attempt] {
        &self.history.as_slice()[self.session_start..]
    }

    pub fn current(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn history(&self) -> &AttemptHistory {
        &self.history
    }

    pub fn settings(&self) -> &PracticeSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::chunked::ChunkState;
    use crate::error::HistoryError;
    use crate::settings::Rigor;
    use chrono::TimeZone;
    use rand_chacha::ChaCha8Rng;

    type TestSession = StudySession<ChunkedScheduler<ChaCha8Rng>, ShortAnswerMatcher, ChaCha8Rng>;

    fn deck() -> Vec<Card> {
        vec![
            Card::new(1, "perro", "dog"),
            Card::new(2, "gato", "cat"),
            Card::new(3, "pájaro", "bird"),
            Card::new(4, "pez", "fish"),
            Card::new(5, "caballo", "horse"),
        ]
    }

    fn session_with(cards: Vec<Card>, settings: PracticeSettings) -> TestSession {
        StudySession::new(
            cards,
            Vec::new(),
            settings,
            ChunkedScheduler::with_rng(settings.scheduler_config(), ChaCha8Rng::seed_from_u64(1)),
            ShortAnswerMatcher,
            ChaCha8Rng::seed_from_u64(2),
        )
        .unwrap()
    }

    fn short_answer(quiz_mode: QuizMode) -> PracticeSettings {
        PracticeSettings {
            quiz_mode,
            answer_type: AnswerType::ShortAnswer,
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 18, 30, 0).unwrap()
    }

    #[test]
    fn empty_deck_is_rejected() {
        let result = StudySession::with_defaults(Vec::new(), Vec::new(), PracticeSettings::default());
        assert!(matches!(result, Err(SessionError::EmptyDeck)));
    }

    #[test]
    fn answering_requires_a_question() {
        let mut session = session_with(deck(), PracticeSettings::default());
        assert_eq!(
            session.submit_answer("dog", 100, now()).unwrap_err(),
            SessionError::NoActiveQuestion
        );
        assert_eq!(
            session.mark_last(AttemptResult::Correct).unwrap_err(),
            SessionError::NoActiveQuestion
        );
    }

    #[test]
    fn term_to_definition_prompts_with_term() {
        let mut session = session_with(deck(), short_answer(QuizMode::TermToDefinition));
        let question = session.next_question().clone();
        let card = &session.cards()[question.card_index];

        assert_eq!(question.direction, Direction::RecallDefinition);
        assert_eq!(question.prompt, card.term);
        assert_eq!(question.expected, card.definition);
        assert_eq!(question.kind, QuestionKind::ShortAnswer);
    }

    #[test]
    fn definition_to_term_prompts_with_definition() {
        let mut session = session_with(deck(), short_answer(QuizMode::DefinitionToTerm));
        let question = session.next_question().clone();
        let card = &session.cards()[question.card_index];
        assert_eq!(question.prompt, card.definition);
        assert_eq!(question.expected, card.term);
    }

    #[test]
    fn submit_records_provisional_attempt() {
        let mut session = session_with(deck(), short_answer(QuizMode::TermToDefinition));
        let expected = session.next_question().expected.clone();

        let attempt = session.submit_answer(&expected, 1_200, now()).unwrap();
        assert!(attempt.is_provisional());
        assert_eq!(attempt.result, AttemptResult::Correct);
        assert_eq!(attempt.response_ms, Some(1_200));
        assert_eq!(session.score(), 1);
        assert_eq!(session.total_attempts(), 1);

        session.next_question();
        let wrong = session.submit_answer("no idea", 4_000, now()).unwrap();
        assert_eq!(wrong.result, AttemptResult::Incorrect);
        assert!(wrong.id < attempt.id);
        assert_eq!(session.score(), 1);
        assert_eq!(session.total_attempts(), 2);
    }

    #[test]
    fn confirm_replaces_provisional_record() {
        let mut session = session_with(deck(), short_answer(QuizMode::TermToDefinition));
        session.next_question();
        let attempt = session.submit_answer("dog", 800, now()).unwrap();

        let saved = Attempt { id: 77, ..attempt.clone() };
        session.confirm_attempt(attempt.id, saved).unwrap();
        assert_eq!(session.history().as_slice()[0].id, 77);
        assert_eq!(session.total_attempts(), 1);

        let err = session.confirm_attempt(-123, attempt).unwrap_err();
        assert_eq!(err, SessionError::History(HistoryError::AttemptNotFound(-123)));
    }

    #[test]
    fn corrections_move_the_score() {
        let mut session = session_with(deck(), short_answer(QuizMode::TermToDefinition));
        session.next_question();
        session.submit_answer("wrong answer entirely", 900, now()).unwrap();
        assert_eq!(session.score(), 0);

        let patched = session.mark_last(AttemptResult::Correct).unwrap().unwrap();
        assert_eq!(patched.result, AttemptResult::Correct);
        assert_eq!(session.score(), 1);

        session.mark_last(AttemptResult::Unsure).unwrap();
        assert_eq!(session.score(), 0);
        assert_eq!(session.total_attempts(), 1);
    }

    #[test]
    fn mark_without_attempt_is_a_no_op() {
        let mut session = session_with(deck(), PracticeSettings::default());
        session.next_question();
        assert_eq!(session.mark_last(AttemptResult::Unsure).unwrap(), None);
    }

    #[test]
    fn multiple_choice_offers_distinct_options() {
        let settings = PracticeSettings {
            quiz_mode: QuizMode::TermToDefinition,
            answer_type: AnswerType::MultipleChoice,
            ..Default::default()
        };
        let mut session = session_with(deck(), settings);
        let question = session.next_question().clone();

        let QuestionKind::MultipleChoice { options } = &question.kind else {
            panic!("expected multiple choice, got {:?}", question.kind);
        };
        assert_eq!(options.len(), CHOICE_COUNT);
        assert!(options.contains(&question.expected));
        let distinct: HashSet<&String> = options.iter().collect();
        assert_eq!(distinct.len(), options.len());

        // Near misses are not accepted in multiple choice.
        let attempt = session.submit_answer("dogs", 500, now()).unwrap();
        if question.expected != "dogs" {
            assert_eq!(attempt.result, AttemptResult::Incorrect);
        }
    }

    #[test]
    fn small_deck_limits_options() {
        let settings = PracticeSettings {
            answer_type: AnswerType::MultipleChoice,
            ..Default::default()
        };
        let cards = vec![Card::new(1, "sí", "yes"), Card::new(2, "no", "no")];
        let mut session = session_with(cards, settings);
        let question = session.next_question().clone();
        match question.kind {
            QuestionKind::MultipleChoice { options } => assert_eq!(options.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn settings_update_reconfigures_scheduler() {
        let mut session = session_with(deck(), PracticeSettings::default());
        session.next_question();
        assert!(!session.scheduler().state().current_chunk.is_empty());

        session.update_settings(&PracticeSettingsUpdate {
            rigor: Some(Rigor::Intense),
            chunk_size: Some(2),
            ..Default::default()
        });

        assert_eq!(session.settings().rigor, Rigor::Intense);
        assert_eq!(session.scheduler().config().mastery_target, 3);
        assert_eq!(session.scheduler().config().chunk_size, 2);
        assert_eq!(session.scheduler().state(), &ChunkState::default());
    }

    #[test]
    fn prior_history_counts_for_labels_but_not_score() {
        let history = vec![Attempt::new(1, 1, AttemptResult::Correct, now(), 300)];
        let settings = PracticeSettings::default();
        let session: TestSession = StudySession::new(
            deck(),
            history,
            settings,
            ChunkedScheduler::with_rng(settings.scheduler_config(), ChaCha8Rng::seed_from_u64(3)),
            ShortAnswerMatcher,
            ChaCha8Rng::seed_from_u64(4),
        )
        .unwrap();

        assert_eq!(session.score(), 0);
        assert_eq!(session.total_attempts(), 0);
        let labels = session.labels();
        assert_eq!(labels[0].1, Difficulty::Proficient);
        assert!(labels[1..].iter().all(|(_, d)| *d == Difficulty::New));
        assert_eq!(
            session.filter(CardFilter::Label(Difficulty::New), &HashSet::new()).len(),
            4
        );
    }
}
