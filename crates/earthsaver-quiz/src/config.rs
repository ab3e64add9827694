//! Quiz tuning knobs.

use serde::{Deserialize, Serialize};

/// Round length and host pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Questions drawn per round. Capped by the bank size.
    pub questions_per_game: usize,
    /// How long the host shows its loading screen before a round starts.
    pub loading_delay_ms: u64,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            questions_per_game: 10,
            loading_delay_ms: 1500,
        }
    }
}
