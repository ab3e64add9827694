//! # earthsaver-quiz
//!
//! Question bank and round state machine for Earth Saver.
//!
//! A [`QuizEngine`] draws a round from a [`QuestionBank`], scores answers
//! with streak bonuses, tracks the planet's health and yields a
//! [`GameSummary`] when the last question is done. Pacing (the loading
//! screen) and persistence of the result are left to the host.

pub mod config;
pub mod engine;
pub mod error;
pub mod question;

pub use config::QuizConfig;
pub use engine::{AnswerFeedback, GameSummary, HealthBand, Outcome, QuizEngine, QuizState};
pub use error::{QuizError, QuizResult};
pub use question::{Difficulty, Question, QuestionBank};
