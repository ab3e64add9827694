//! The quiz state machine.
//!
//! ```text
//! Loading ──start──▶ InProgress ──select_answer──▶ AnswerRevealed
//!    ▲                   ▲                               │
//!    │                   └───────next_question───────────┤
//!    │                                                   ▼
//!    └──────────────restart────────────────────────── Completed
//! ```
//!
//! The engine knows nothing about sessions. When a round completes the host
//! takes the [`GameSummary`] and hands its [`GameResult`] to the account
//! service.

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use earthsaver_store::GameResult;

use crate::config::QuizConfig;
use crate::question::{Question, QuestionBank};

/// Planet health at the start of every round.
pub const FULL_HEALTH: u32 = 100;

const BASE_POINTS: u64 = 100;
const STREAK_3_BONUS: u64 = 25;
const STREAK_5_BONUS: u64 = 50;
const HEALTH_GAIN: u32 = 2;
const HEALTH_LOSS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizState {
    Loading,
    InProgress,
    AnswerRevealed,
    Completed,
}

/// Coarse health indicator for rendering a health bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthBand {
    Healthy,
    Warning,
    Critical,
}

impl HealthBand {
    pub fn for_health(health: u32) -> Self {
        match health {
            80.. => Self::Healthy,
            50.. => Self::Warning,
            _ => Self::Critical,
        }
    }
}

/// How the round ended for the planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    EarthSaved,
    EarthRecovering,
    EarthNeedsHelp,
}

impl Outcome {
    pub fn for_health(health: u32) -> Self {
        match HealthBand::for_health(health) {
            HealthBand::Healthy => Self::EarthSaved,
            HealthBand::Warning => Self::EarthRecovering,
            HealthBand::Critical => Self::EarthNeedsHelp,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Self::EarthSaved => "Earth Saved",
            Self::EarthRecovering => "Earth Recovering",
            Self::EarthNeedsHelp => "Earth Needs Help",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::EarthSaved => {
                "Congratulations! Your environmental knowledge helped save our planet!"
            }
            Self::EarthRecovering => {
                "Good effort! Earth is on the path to recovery. Keep learning to make an even bigger impact!"
            }
            Self::EarthNeedsHelp => {
                "Earth needs more help! Every expert was once a beginner. Try again!"
            }
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.headline())
    }
}

/// What the host shows after an answer is picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_index: usize,
    /// Points awarded for this answer.
    pub points: u64,
    pub explanation: String,
    /// Streak after this answer.
    pub streak: u32,
    /// Health after this answer.
    pub health: u32,
}

/// Final numbers of a completed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub result: GameResult,
    pub outcome: Outcome,
}

impl GameSummary {
    /// Percentage of questions answered correctly, 0 for an empty round.
    pub fn accuracy(&self) -> f64 {
        if self.result.questions_answered == 0 {
            return 0.0;
        }
        f64::from(self.result.correct_answers) * 100.0
            / f64::from(self.result.questions_answered)
    }
}

pub struct QuizEngine {
    bank: QuestionBank,
    config: QuizConfig,
    state: QuizState,
    questions: Vec<Question>,
    index: usize,
    score: u64,
    health: u32,
    streak: u32,
    max_streak: u32,
    correct_answers: u32,
}

impl QuizEngine {
    pub fn new(bank: QuestionBank, config: QuizConfig) -> Self {
        Self {
            bank,
            config,
            state: QuizState::Loading,
            questions: Vec::new(),
            index: 0,
            score: 0,
            health: FULL_HEALTH,
            streak: 0,
            max_streak: 0,
            correct_answers: 0,
        }
    }

    /// Draw a fresh round and begin it. Any round in flight is discarded.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.reset();
        self.questions = self.bank.draw(self.config.questions_per_game, rng);
        self.state = if self.questions.is_empty() {
            QuizState::Completed
        } else {
            QuizState::InProgress
        };
        info!(questions = self.questions.len(), "round started");
    }

    /// Back to `Loading` with every counter cleared.
    pub fn restart(&mut self) {
        self.reset();
        debug!("round reset");
    }

    fn reset(&mut self) {
        self.state = QuizState::Loading;
        self.questions.clear();
        self.index = 0;
        self.score = 0;
        self.health = FULL_HEALTH;
        self.streak = 0;
        self.max_streak = 0;
        self.correct_answers = 0;
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// The question on screen, if a round is underway.
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            QuizState::InProgress | QuizState::AnswerRevealed => self.questions.get(self.index),
            QuizState::Loading | QuizState::Completed => None,
        }
    }

    /// 1-based position of the current question.
    pub fn question_number(&self) -> usize {
        self.index + 1
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn health_band(&self) -> HealthBand {
        HealthBand::for_health(self.health)
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Answer the current question.
    ///
    /// Returns `None` and changes nothing unless a question is awaiting an
    /// answer.
    pub fn select_answer(&mut self, answer: usize) -> Option<AnswerFeedback> {
        if self.state != QuizState::InProgress {
            return None;
        }
        let question = self.questions.get(self.index)?;
        let correct = question.is_correct(answer);
        let correct_index = question.correct;
        let explanation = question.explanation.clone();

        let points = if correct {
            self.correct_answers += 1;
            self.streak += 1;
            self.max_streak = self.max_streak.max(self.streak);
            self.health = (self.health + HEALTH_GAIN).min(FULL_HEALTH);
            self.points_for_streak()
        } else {
            self.streak = 0;
            self.health = self.health.saturating_sub(HEALTH_LOSS);
            0
        };
        self.score += points;
        self.state = QuizState::AnswerRevealed;

        debug!(
            question = self.index,
            correct,
            points,
            streak = self.streak,
            health = self.health,
            "answer selected"
        );

        Some(AnswerFeedback {
            correct,
            correct_index,
            points,
            explanation,
            streak: self.streak,
            health: self.health,
        })
    }

    fn points_for_streak(&self) -> u64 {
        let mut points = BASE_POINTS;
        if self.streak >= 3 {
            points += STREAK_3_BONUS;
        }
        if self.streak >= 5 {
            points += STREAK_5_BONUS;
        }
        points
    }

    /// Move past a revealed answer.
    ///
    /// Returns the summary when that was the last question. Does nothing
    /// unless an answer is revealed.
    pub fn next_question(&mut self) -> Option<GameSummary> {
        if self.state != QuizState::AnswerRevealed {
            return None;
        }
        self.index += 1;
        if self.index < self.questions.len() {
            self.state = QuizState::InProgress;
            return None;
        }
        self.state = QuizState::Completed;
        let summary = self.summary();
        if let Some(summary) = &summary {
            info!(
                score = summary.result.score,
                health = summary.result.earth_health,
                outcome = %summary.outcome,
                "round completed"
            );
        }
        summary
    }

    /// Final numbers, available once the round is completed.
    pub fn summary(&self) -> Option<GameSummary> {
        if self.state != QuizState::Completed {
            return None;
        }
        let result = GameResult {
            score: self.score,
            earth_health: self.health,
            correct_answers: self.correct_answers,
            questions_answered: u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
            max_streak: self.max_streak,
            final_streak: self.streak,
        };
        Some(GameSummary {
            result,
            outcome: Outcome::for_health(self.health),
        })
    }
}

// ── tests ────────────────────────────────────────────────────────────
