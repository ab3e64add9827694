//! Question records and the bank they are drawn from.

use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{QuizError, QuizResult};

/// Every question offers exactly this many answers.
pub const ANSWERS_PER_QUESTION: usize = 4;

/// The bank shipped with the game.
const BUILTIN_BANK: &str = include_str!("../data/questions.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub answers: Vec<String>,
    /// Index into `answers` of the right answer.
    pub correct: usize,
    /// Shown after the player answers.
    pub explanation: String,
    pub difficulty: Difficulty,
    pub category: String,
}

impl Question {
    pub fn is_correct(&self, answer: usize) -> bool {
        answer == self.correct
    }

    fn validate(&self, index: usize) -> QuizResult<()> {
        let invalid = |reason: String| QuizError::InvalidQuestion { index, reason };
        if self.question.trim().is_empty() {
            return Err(invalid("question text is empty".into()));
        }
        if self.answers.len() != ANSWERS_PER_QUESTION {
            return Err(invalid(format!(
                "expected {ANSWERS_PER_QUESTION} answers, found {}",
                self.answers.len()
            )));
        }
        if self.correct >= ANSWERS_PER_QUESTION {
            return Err(invalid(format!(
                "correct index {} out of range",
                self.correct
            )));
        }
        Ok(())
    }
}

/// A read-only, validated list of questions.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank, rejecting it if empty or if any question is malformed.
    pub fn new(questions: Vec<Question>) -> QuizResult<Self> {
        if questions.is_empty() {
            return Err(QuizError::EmptyBank);
        }
        for (index, question) in questions.iter().enumerate() {
            question.validate(index)?;
        }
        Ok(Self { questions })
    }

    /// Parse a JSON array of question records.
    pub fn from_json(json: &str) -> QuizResult<Self> {
        let questions: Vec<Question> = serde_json::from_str(json)?;
        Self::new(questions)
    }

    /// Load a bank from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> QuizResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let bank = Self::from_json(&json)?;
        info!(path = %path.display(), count = bank.len(), "question bank loaded");
        Ok(bank)
    }

    /// The bank compiled into the binary.
    pub fn builtin() -> QuizResult<Self> {
        Self::from_json(BUILTIN_BANK)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Up to `count` distinct questions in uniformly random order.
    pub fn draw<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Question> {
        let mut drawn = self.questions.clone();
        drawn.shuffle(rng);
        drawn.truncate(count);
        debug!(requested = count, drawn = drawn.len(), "questions drawn");
        drawn
    }

    pub fn by_difficulty(&self, difficulty: Difficulty) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.difficulty == difficulty)
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.category == category)
            .collect()
    }
}

// ── tests ────────────────────────────────────────────────────────────
