//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;
use study_core::settings::MAX_CHUNK_SIZE;
use study_core::{AnswerType, PracticeSettingsUpdate, QuizMode, Rigor};

/// Practice a flashcard deck with adaptive question ordering.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Deck file (`T:`/`D:` blocks or `term :: definition` lines)
    pub deck: PathBuf,

    /// Set the attempts are recorded under
    #[arg(long, default_value_t = 1)]
    pub set_id: i64,

    /// Whose preferences to load and save
    #[arg(short, long, default_value = "local")]
    pub user: String,

    /// relaxed, balanced or intense
    #[arg(short, long, value_parser = parse_rigor)]
    pub rigor: Option<Rigor>,

    /// Cards practiced together before rotating
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..=MAX_CHUNK_SIZE as u64))]
    pub chunk_size: Option<u64>,

    /// term-to-definition, definition-to-term or both
    #[arg(short, long, value_parser = parse_quiz_mode)]
    pub quiz_mode: Option<QuizMode>,

    /// multiple-choice, short-answer or both
    #[arg(short, long, value_parser = parse_answer_type)]
    pub answer_type: Option<AnswerType>,

    /// Seed for a reproducible question order
    #[arg(long)]
    pub seed: Option<u64>,

    /// Where attempts and preferences are kept
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl Args {
    /// Preference overrides given on the command line.
    pub fn settings_update(&self) -> PracticeSettingsUpdate {
        PracticeSettingsUpdate {
            quiz_mode: self.quiz_mode,
            answer_type: self.answer_type,
            rigor: self.rigor,
            chunk_size: self.chunk_size.map(|n| n as usize),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("flashcard-practice")
        })
    }
}

fn parse_rigor(s: &str) -> Result<Rigor, String> {
    Rigor::from_str(&s.to_lowercase()).ok_or_else(|| format!("unknown rigor level: {s}"))
}

fn parse_quiz_mode(s: &str) -> Result<QuizMode, String> {
    QuizMode::from_str(&s.to_lowercase()).ok_or_else(|| format!("unknown quiz mode: {s}"))
}

fn parse_answer_type(s: &str) -> Result<AnswerType, String> {
    AnswerType::from_str(&s.to_lowercase()).ok_or_else(|| format!("unknown answer type: {s}"))
}
