//! Account records and the game result that feeds them.
//!
//! Field names serialize in camelCase, the record layout the browser version
//! of the game wrote, so its records deserialize without conversion. Which
//! slot they are read from is configured separately in
//! [`AuthConfig`](crate::config::AuthConfig).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Experience points needed per level.
pub const XP_PER_LEVEL: u64 = 1_000;

/// Final health at or above which a round counts as "Earth saved".
pub const EARTH_SAVED_HEALTH: u32 = 80;

/// A player account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Display form of the username; lookups use its lowercase form.
    pub username: String,
    pub email: String,
    /// Stored hash, see [`crate::password`].
    #[serde(rename = "password")]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub stats: Stats,
    /// Unlocked achievements in unlock order.
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    pub level: u32,
    pub experience: u64,
}

impl User {
    /// A fresh account: zeroed stats, level 1, no achievements.
    pub fn new(username: &str, email: &str, password_hash: String) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            created_at: Utc::now(),
            stats: Stats::default(),
            achievements: Vec::new(),
            level: 1,
            experience: 0,
        }
    }

    /// The key this user is stored under.
    pub fn key(&self) -> String {
        self.username.to_lowercase()
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a.id == id)
    }
}

/// Lifetime statistics. All counters only grow except `current_streak`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub games_played: u64,
    pub total_score: u64,
    pub best_score: u64,
    pub questions_answered: u64,
    pub correct_answers: u64,
    /// Streak at the end of the most recent game.
    pub current_streak: u32,
    pub best_streak: u32,
    pub earth_saved: u64,
}

impl Stats {
    /// Fold one completed game into the counters.
    pub fn record(&mut self, result: &GameResult) {
        self.games_played += 1;
        self.total_score += result.score;
        self.best_score = self.best_score.max(result.score);
        self.questions_answered += u64::from(result.questions_answered);
        self.correct_answers += u64::from(result.correct_answers);
        self.current_streak = result.final_streak;
        self.best_streak = self.best_streak.max(result.max_streak);
        if result.earth_health >= EARTH_SAVED_HEALTH {
            self.earth_saved += 1;
        }
    }
}

/// An unlocked milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    /// First unlock time. Never refreshed.
    pub unlocked_at: DateTime<Utc>,
}

/// Summary of one completed quiz round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub score: u64,
    /// Final health, 0-100.
    pub earth_health: u32,
    pub correct_answers: u32,
    pub questions_answered: u32,
    pub max_streak: u32,
    pub final_streak: u32,
}

impl GameResult {
    /// Experience awarded for this round.
    pub fn experience(&self) -> u64 {
        self.score / 10
    }

    pub fn is_perfect(&self) -> bool {
        self.questions_answered > 0 && self.correct_answers == self.questions_answered
    }
}

/// Level reached at a given experience total.
pub fn level_for(experience: u64) -> u32 {
    u32::try_from(experience / XP_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: u64, health: u32) -> GameResult {
        GameResult {
            score,
            earth_health: health,
            correct_answers: 7,
            questions_answered: 10,
            max_streak: 4,
            final_streak: 2,
        }
    }

    #[test]
    fn record_accumulates_and_overwrites_streak() {
        let mut stats = Stats::default();
        stats.record(&result(900, 80));
        stats.record(&GameResult {
            max_streak: 2,
            final_streak: 0,
            ..result(400, 79)
        });

        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.total_score, 1300);
        assert_eq!(stats.best_score, 900);
        assert_eq!(stats.questions_answered, 20);
        assert_eq!(stats.correct_answers, 14);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.best_streak, 4);
        assert_eq!(stats.earth_saved, 1);
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(999), 1);
        assert_eq!(level_for(1_000), 2);
        assert_eq!(level_for(4_250), 5);
    }

    #[test]
    fn perfect_requires_answered_questions() {
        assert!(!GameResult::default().is_perfect());
        let all = GameResult {
            correct_answers: 3,
            questions_answered: 3,
            ..GameResult::default()
        };
        assert!(all.is_perfect());
    }

    #[test]
    fn deserializes_browser_document() {
        let json = r#"{
            "username": "Alice",
            "email": "alice@example.com",
            "password": "1970177921",
            "createdAt": "2024-05-01T12:00:00.000Z",
            "stats": {
                "gamesPlayed": 1, "totalScore": 700, "bestScore": 700,
                "questionsAnswered": 10, "correctAnswers": 6,
                "currentStreak": 0, "bestStreak": 5, "earthSaved": 0
            },
            "achievements": [{
                "id": "first_game", "name": "Eco Rookie",
                "description": "Played your first game!", "icon": "🌱",
                "unlockedAt": "2024-05-01T12:05:00.000Z"
            }],
            "level": 1,
            "experience": 70
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.key(), "alice");
        assert_eq!(user.stats.best_streak, 5);
        assert!(user.has_achievement("first_game"));

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["password"], "1970177921");
        assert_eq!(back["stats"]["gamesPlayed"], 1);
    }
}
