//! Interactive question loop.

use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use study_core::store::{AttemptStore, NewAttempt};
use study_core::{
    AnswerOracle, AttemptResult, CardFilter, QuestionKind, QuestionScheduler, StudySession,
};

/// Outcome of one practice run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub correct: usize,
    pub answered: usize,
}

enum Command {
    Quit,
    Labels,
    /// `None` when the filter name was not recognised.
    Filter(Option<CardFilter>),
    Star,
    Mark(AttemptResult),
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if let Some(name) = line.strip_prefix(":filter") {
        if name.is_empty() || name.starts_with(' ') {
            return Some(Command::Filter(CardFilter::from_str(name.trim())));
        }
    }
    match line {
        ":star" => Some(Command::Star),
        ":q" | ":quit" => Some(Command::Quit),
        ":labels" => Some(Command::Labels),
        ":right" => Some(Command::Mark(AttemptResult::Correct)),
        ":wrong" => Some(Command::Mark(AttemptResult::Incorrect)),
        ":unsure" => Some(Command::Mark(AttemptResult::Unsure)),
        _ => None,
    }
}

/// Ask questions until `:q` or end of input. Every attempt and correction
/// is written to `store` under `set_id`.
pub fn practice<S, O, R, St, I, W>(
    session: &mut StudySession<S, O, R>,
    store: &mut St,
    set_id: i64,
    mut input: I,
    out: &mut W,
) -> Result<Summary>
where
    S: QuestionScheduler,
    O: AnswerOracle,
    R: Rng,
    St: AttemptStore,
    I: BufRead,
    W: Write,
{
    writeln!(
        out,
        "{} cards. Type the answer, or :q to quit, :labels for progress, \
         :star to star a card, :filter <all|starred|new|challenging|familiar|proficient>.",
        session.cards().len()
    )?;
    let mut starred: HashSet<i64> = HashSet::new();

    'questions: loop {
        let question = session.next_question().clone();
        writeln!(out, "\n{}", question.prompt)?;
        if let QuestionKind::MultipleChoice { options } = &question.kind {
            for (i, option) in options.iter().enumerate() {
                writeln!(out, "  {}) {}", i + 1, option)?;
            }
        }

        let mut asked_at = Instant::now();
        let guess = loop {
            write!(out, "> ")?;
            out.flush()?;
            let Some(line) = read_line(&mut input)? else {
                break 'questions;
            };
            match parse_command(&line) {
                Some(Command::Quit) => break 'questions,
                Some(Command::Mark(_)) => writeln!(out, "Answer first, then correct it.")?,
                Some(command) => {
                    show(session, &mut starred, command, out)?;
                    // Browsing is not answering time.
                    asked_at = Instant::now();
                }
                None => break resolve_choice(&question.kind, line.trim()),
            }
        };

        let elapsed_ms = asked_at.elapsed().as_millis() as u64;
        let attempt = session.submit_answer(&guess, elapsed_ms, Utc::now())?;
        match store.save_attempt(set_id, &NewAttempt::from(&attempt)) {
            Ok(saved) => session.confirm_attempt(attempt.id, saved)?,
            // The provisional record stays in the session history.
            Err(err) => tracing::warn!(error = %err, "failed to save attempt"),
        }

        if attempt.result == AttemptResult::Correct {
            writeln!(out, "Correct.")?;
        } else {
            writeln!(out, "Not quite: {}", question.expected)?;
        }

        write!(out, "[enter] next, :right / :wrong / :unsure to correct > ")?;
        out.flush()?;
        let Some(line) = read_line(&mut input)? else {
            break;
        };
        match parse_command(&line) {
            Some(Command::Quit) => break,
            Some(Command::Mark(result)) => {
                if let Some(updated) = session.mark_last(result)? {
                    if !updated.is_provisional() {
                        if let Err(err) = store.update_result(updated.id, result) {
                            tracing::warn!(error = %err, id = updated.id, "failed to save correction");
                        }
                    }
                    writeln!(out, "Marked {}.", result.as_str())?;
                }
            }
            Some(command) => show(session, &mut starred, command, out)?,
            None => {}
        }
    }

    let summary = Summary {
        correct: session.score(),
        answered: session.total_attempts(),
    };
    writeln!(out, "\nScore: {}/{}", summary.correct, summary.answered)?;
    Ok(summary)
}

fn read_line<I: BufRead>(input: &mut I) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// A number picks the matching multiple-choice option; anything else is the answer itself.
fn resolve_choice(kind: &QuestionKind, guess: &str) -> String {
    if let QuestionKind::MultipleChoice { options } = kind {
        if let Some(option) = guess
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| options.get(i))
        {
            return option.clone();
        }
    }
    guess.to_string()
}

/// Commands that only look at the deck: `:labels`, `:filter` and `:star`.
fn show<S, O, R, W>(
    session: &StudySession<S, O, R>,
    starred: &mut HashSet<i64>,
    command: Command,
    out: &mut W,
) -> Result<()>
where
    S: QuestionScheduler,
    O: AnswerOracle,
    R: Rng,
    W: Write,
{
    match command {
        Command::Labels => {
            for (card, label) in session.labels() {
                writeln!(out, "  [{:<11}] {}", label.as_str(), card.term)?;
            }
        }
        Command::Filter(Some(filter)) => {
            let cards = session.filter(filter, starred);
            if cards.is_empty() {
                writeln!(out, "  (no cards)")?;
            }
            for card in cards {
                writeln!(out, "  {} :: {}", card.term, card.definition)?;
            }
        }
        Command::Filter(None) => writeln!(
            out,
            "Unknown filter. Use all, starred, new, challenging, familiar or proficient."
        )?,
        Command::Star => {
            if let Some(question) = session.current() {
                let uid = question.card_uid;
                if starred.insert(uid) {
                    writeln!(out, "Starred.")?;
                } else {
                    starred.remove(&uid);
                    writeln!(out, "Unstarred.")?;
                }
            }
        }
        Command::Quit | Command::Mark(_) => {}
    }
    Ok(())
}
