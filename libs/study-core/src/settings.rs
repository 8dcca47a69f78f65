//! Scheduler configuration and practice preferences.

use serde::{Deserialize, Serialize};

/// Largest chunk size accepted from stored or user-supplied preferences.
pub const MAX_CHUNK_SIZE: usize = 50;

pub const DEFAULT_CHUNK_SIZE: usize = 7;

/// Tuning for the chunked scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub chunk_size: usize,
    pub mastery_target: u32,
    pub difficulty_threshold: f64,
    pub difficulty_weight: f64,
    pub attempt_weight: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Rigor::Balanced.preset().with_chunk_size(DEFAULT_CHUNK_SIZE)
    }
}

impl SchedulerConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Clamp fields into the ranges the scheduler relies on.
    pub fn normalized(mut self) -> Self {
        self.chunk_size = self.chunk_size.max(1);
        self.mastery_target = self.mastery_target.max(1);
        self.difficulty_threshold = if self.difficulty_threshold.is_nan() {
            0.0
        } else {
            self.difficulty_threshold.clamp(0.0, 1.0)
        };
        self
    }

    /// Overwrite the fields present in `update`.
    pub fn apply(self, update: &ConfigUpdate) -> Self {
        Self {
            chunk_size: update.chunk_size.unwrap_or(self.chunk_size),
            mastery_target: update.mastery_target.unwrap_or(self.mastery_target),
            difficulty_threshold: update
                .difficulty_threshold
                .unwrap_or(self.difficulty_threshold),
            difficulty_weight: update.difficulty_weight.unwrap_or(self.difficulty_weight),
            attempt_weight: update.attempt_weight.unwrap_or(self.attempt_weight),
        }
        .normalized()
    }
}

/// Partial scheduler configuration (all fields optional).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_target: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_weight: Option<f64>,
}

impl From<SchedulerConfig> for ConfigUpdate {
    fn from(config: SchedulerConfig) -> Self {
        Self {
            chunk_size: Some(config.chunk_size),
            mastery_target: Some(config.mastery_target),
            difficulty_threshold: Some(config.difficulty_threshold),
            difficulty_weight: Some(config.difficulty_weight),
            attempt_weight: Some(config.attempt_weight),
        }
    }
}

/// Named rigor levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rigor {
    Relaxed,
    Balanced,
    Intense,
}

impl Default for Rigor {
    fn default() -> Self {
        Self::Balanced
    }
}

impl Rigor {
    /// Scheduler parameters for this level. Chunk size is chosen separately.
    pub fn preset(self) -> SchedulerConfig {
        let (mastery_target, difficulty_threshold, difficulty_weight, attempt_weight) = match self {
            Self::Relaxed => (1, 0.2, 0.6, 0.4),
            Self::Balanced => (2, 0.1, 0.7, 0.3),
            Self::Intense => (3, 0.08, 0.8, 0.2),
        };
        SchedulerConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            mastery_target,
            difficulty_threshold,
            difficulty_weight,
            attempt_weight,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relaxed => "relaxed",
            Self::Balanced => "balanced",
            Self::Intense => "intense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "relaxed" => Some(Self::Relaxed),
            "balanced" => Some(Self::Balanced),
            "intense" => Some(Self::Intense),
            _ => None,
        }
    }
}

/// Which side of the card is shown as the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuizMode {
    /// Show the term, expect the definition.
    TermToDefinition,
    /// Show the definition, expect the term.
    DefinitionToTerm,
    Both,
}

impl Default for QuizMode {
    fn default() -> Self {
        Self::Both
    }
}

impl QuizMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TermToDefinition => "term-to-definition",
            Self::DefinitionToTerm => "definition-to-term",
            Self::Both => "both",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "term-to-definition" => Some(Self::TermToDefinition),
            "definition-to-term" => Some(Self::DefinitionToTerm),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// How answers are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerType {
    MultipleChoice,
    ShortAnswer,
    Both,
}

impl Default for AnswerType {
    fn default() -> Self {
        Self::ShortAnswer
    }
}

impl AnswerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple-choice",
            Self::ShortAnswer => "short-answer",
            Self::Both => "both",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "multiple-choice" => Some(Self::MultipleChoice),
            "short-answer" => Some(Self::ShortAnswer),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// Per-set practice preferences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PracticeSettings {
    pub quiz_mode: QuizMode,
    pub answer_type: AnswerType,
    pub rigor: Rigor,
    pub chunk_size: usize,
}

impl Default for PracticeSettings {
    fn default() -> Self {
        Self {
            quiz_mode: QuizMode::default(),
            answer_type: AnswerType::default(),
            rigor: Rigor::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Preference overrides (all fields optional).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PracticeSettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_mode: Option<QuizMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_type: Option<AnswerType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rigor: Option<Rigor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
}

impl PracticeSettings {
    /// Merge overrides on top of these settings.
    pub fn merge(&self, update: &PracticeSettingsUpdate) -> Self {
        Self {
            quiz_mode: update.quiz_mode.unwrap_or(self.quiz_mode),
            answer_type: update.answer_type.unwrap_or(self.answer_type),
            rigor: update.rigor.unwrap_or(self.rigor),
            chunk_size: update
                .chunk_size
                .unwrap_or(self.chunk_size)
                .clamp(1, MAX_CHUNK_SIZE),
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        self.rigor.preset().with_chunk_size(self.chunk_size).normalized()
    }
}

impl From<PracticeSettings> for PracticeSettingsUpdate {
    fn from(settings: PracticeSettings) -> Self {
        Self {
            quiz_mode: Some(settings.quiz_mode),
            answer_type: Some(settings.answer_type),
            rigor: Some(settings.rigor),
            chunk_size: Some(settings.chunk_size),
        }
    }
}
