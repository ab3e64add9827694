//! Achievement rules and unlocking.
//!
//! A fixed table of rules is checked after every stat update. Each rule
//! yields at most one candidate; a candidate is appended to the user's list
//! only if its id is not there yet, and every appended achievement is
//! reported once to the [`AchievementSink`].

use chrono::Utc;
use tracing::info;

use crate::user::{Achievement, GameResult, Stats, User};

/// What triggered an evaluation.
#[derive(Debug, Clone, Copy)]
pub enum AchievementEvent<'a> {
    /// A quiz round was folded into the stats.
    GameComplete(&'a GameResult),
    /// The user reached a new level.
    LevelUp(u32),
}

/// Receives each newly unlocked achievement.
pub trait AchievementSink: Send + Sync {
    fn achievement_unlocked(&self, achievement: &Achievement);
}

impl<F> AchievementSink for F
where
    F: Fn(&Achievement) + Send + Sync,
{
    fn achievement_unlocked(&self, achievement: &Achievement) {
        self(achievement)
    }
}

/// Sink that drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl AchievementSink for NoopSink {
    fn achievement_unlocked(&self, _achievement: &Achievement) {}
}

/// One entry of the rule table.
pub struct Rule {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    applies: fn(&AchievementEvent<'_>, &Stats) -> bool,
}

impl Rule {
    fn achievement(&self) -> Achievement {
        Achievement {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            icon: self.icon.to_string(),
            unlocked_at: Utc::now(),
        }
    }
}

fn on_game(event: &AchievementEvent<'_>, pred: impl Fn(&GameResult) -> bool) -> bool {
    match *event {
        AchievementEvent::GameComplete(result) => pred(result),
        AchievementEvent::LevelUp(_) => false,
    }
}

/// Evaluated in this order on every call.
pub static RULES: &[Rule] = &[
    Rule {
        id: "first_game",
        name: "Eco Rookie",
        description: "Played your first game!",
        icon: "🌱",
        applies: |event, stats| on_game(event, |_| stats.games_played == 1),
    },
    Rule {
        id: "perfect_score",
        name: "Eco Expert",
        description: "Got 100% correct answers!",
        icon: "🏆",
        applies: |event, _| on_game(event, GameResult::is_perfect),
    },
    Rule {
        id: "earth_saver",
        name: "Planet Protector",
        description: "Saved Earth with 90%+ health!",
        icon: "🌍",
        applies: |event, _| on_game(event, |r| r.earth_health >= 90),
    },
    Rule {
        id: "streak_5",
        name: "Knowledge Streak",
        description: "Got 5 answers correct in a row!",
        icon: "🔥",
        applies: |event, _| on_game(event, |r| r.max_streak >= 5),
    },
    Rule {
        id: "level_5",
        name: "Eco Warrior",
        description: "Reached level 5!",
        icon: "⚔️",
        applies: |event, _| matches!(event, AchievementEvent::LevelUp(5)),
    },
    Rule {
        id: "games_10",
        name: "Dedicated Player",
        description: "Played 10 games!",
        icon: "🎮",
        applies: |_, stats| stats.games_played == 10,
    },
    Rule {
        id: "earth_saved_5",
        name: "Earth Guardian",
        description: "Saved Earth 5 times!",
        icon: "🛡️",
        applies: |_, stats| stats.earth_saved == 5,
    },
];

/// Check every rule against `user` and append the ones not yet unlocked.
///
/// Returns the number of achievements appended.
pub fn evaluate(
    user: &mut User,
    event: AchievementEvent<'_>,
    sink: &dyn AchievementSink,
) -> usize {
    let candidates: Vec<&Rule> = RULES
        .iter()
        .filter(|rule| (rule.applies)(&event, &user.stats))
        .collect();

    let mut unlocked = 0;
    for rule in candidates {
        if user.has_achievement(rule.id) {
            continue;
        }
        let achievement = rule.achievement();
        info!(username = %user.username, achievement = rule.id, "achievement unlocked");
        user.achievements.push(achievement);
        if let Some(added) = user.achievements.last() {
            sink.achievement_unlocked(added);
        }
        unlocked += 1;
    }
    unlocked
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Collects unlocked ids in notification order.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl AchievementSink for Recorder {
        fn achievement_unlocked(&self, achievement: &Achievement) {
            self.0.lock().unwrap().push(achievement.id.clone());
        }
    }

    impl Recorder {
        fn ids(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    fn user() -> User {
        User::new("alice", "alice@example.com", "0".into())
    }

    fn perfect_round() -> GameResult {
        GameResult {
            score: 1_450,
            earth_health: 100,
            correct_answers: 10,
            questions_answered: 10,
            max_streak: 10,
            final_streak: 10,
        }
    }

    #[test]
    fn rule_ids_are_unique() {
        let mut ids: Vec<&str> = RULES.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), RULES.len());
    }

    #[test]
    fn game_complete_rules_fire_in_table_order() {
        let mut user = user();
        user.stats.games_played = 1;
        let sink = Recorder::default();
        let round = perfect_round();

        let added = evaluate(&mut user, AchievementEvent::GameComplete(&round), &sink);

        assert_eq!(added, 4);
        assert_eq!(
            sink.ids(),
            ["first_game", "perfect_score", "earth_saver", "streak_5"]
        );
    }

    #[test]
    fn repeated_trigger_unlocks_once() {
        let mut user = user();
        user.stats.games_played = 1;
        let sink = Recorder::default();
        let round = perfect_round();

        evaluate(&mut user, AchievementEvent::GameComplete(&round), &sink);
        let first_unlock = user.achievements[0].unlocked_at;
        let added = evaluate(&mut user, AchievementEvent::GameComplete(&round), &sink);

        assert_eq!(added, 0);
        assert_eq!(sink.ids().len(), 4);
        assert_eq!(
            user.achievements
                .iter()
                .filter(|a| a.id == "first_game")
                .count(),
            1
        );
        assert_eq!(user.achievements[0].unlocked_at, first_unlock);
    }

    #[test]
    fn empty_round_is_not_perfect() {
        let mut user = user();
        user.stats.games_played = 2;
        let round = GameResult::default();

        evaluate(&mut user, AchievementEvent::GameComplete(&round), &NoopSink);
        assert!(!user.has_achievement("perfect_score"));
    }

    #[test]
    fn level_up_only_unlocks_at_five() {
        let mut user = user();
        evaluate(&mut user, AchievementEvent::LevelUp(4), &NoopSink);
        assert!(!user.has_achievement("level_5"));

        evaluate(&mut user, AchievementEvent::LevelUp(5), &NoopSink);
        assert!(user.has_achievement("level_5"));
    }

    #[test]
    fn milestones_apply_to_any_event() {
        let mut user = user();
        user.stats.games_played = 10;
        user.stats.earth_saved = 5;

        evaluate(&mut user, AchievementEvent::LevelUp(3), &NoopSink);

        assert!(user.has_achievement("games_10"));
        assert!(user.has_achievement("earth_saved_5"));
    }

    #[test]
    fn closures_act_as_sinks() {
        let seen = Mutex::new(0);
        let sink = |_: &Achievement| *seen.lock().unwrap() += 1;
        let mut user = user();
        user.stats.games_played = 10;

        evaluate(&mut user, AchievementEvent::LevelUp(2), &sink);
        assert_eq!(*seen.lock().unwrap(), 1);
    }
}
