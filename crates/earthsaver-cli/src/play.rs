//! The `play` subcommand: one quiz round in the terminal.

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use tracing::{info, warn};

use earthsaver_quiz::{AnswerFeedback, GameSummary, HealthBand, QuizEngine};
use earthsaver_store::AuthService;

use crate::config::AppConfig;
use crate::helpers::{achievement_banner, load_bank, prompt};

/// Keys that select answers 1-4.
const ANSWER_KEYS: [&str; 4] = ["1", "2", "3", "4"];

pub async fn cmd_play(
    auth: &mut AuthService,
    config: &AppConfig,
    stdin: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<()> {
    let bank = load_bank(config)?;
    let mut engine = QuizEngine::new(bank, config.quiz.clone());

    match auth.current_user() {
        Some(user) => writeln!(out, "  Playing as {} (level {}).", user.username, user.level)?,
        None => writeln!(out, "  Playing as guest. Log in to save your progress.")?,
    }
    writeln!(out, "  Loading questions...")?;
    out.flush()?;
    tokio::time::sleep(Duration::from_millis(config.quiz.loading_delay_ms)).await;

    let Some(summary) = play_round(&mut engine, &mut rand::thread_rng(), stdin, out)? else {
        writeln!(out, "  Round abandoned.")?;
        return Ok(());
    };
    write_summary(&summary, out)?;
    record(auth, &summary, out).await
}

/// Run a round to completion. Returns `None` if the player quits.
pub fn play_round<R: Rng + ?Sized>(
    engine: &mut QuizEngine,
    rng: &mut R,
    stdin: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<Option<GameSummary>> {
    engine.start(rng);

    loop {
        if let Some(summary) = engine.summary() {
            return Ok(Some(summary));
        }
        let Some(question) = engine.current_question() else {
            return Ok(None);
        };

        writeln!(out)?;
        writeln!(
            out,
            "  Question {}/{}   Score {}   Streak {}   {}",
            engine.question_number(),
            engine.total_questions(),
            engine.score(),
            engine.streak(),
            health_bar(engine.health(), engine.health_band())
        )?;
        writeln!(out)?;
        writeln!(out, "  {}", question.question)?;
        for (key, answer) in ANSWER_KEYS.iter().zip(&question.answers) {
            writeln!(out, "    ({key}) {answer}")?;
        }
        let answers = question.answers.clone();

        let choice = loop {
            let line = prompt(stdin, out, "Your answer (1-4, q to quit)")?;
            let line = line.trim();
            if line.eq_ignore_ascii_case("q") {
                info!("round abandoned");
                return Ok(None);
            }
            match ANSWER_KEYS.iter().position(|k| *k == line) {
                Some(index) => break index,
                None => writeln!(out, "  Please enter a number from 1 to 4.")?,
            }
        };

        let Some(feedback) = engine.select_answer(choice) else {
            warn!(choice, "answer not accepted");
            continue;
        };
        write_feedback(&feedback, &answers, out)?;

        if engine.next_question().is_none() {
            prompt(stdin, out, "Press Enter for the next question")?;
        }
    }
}

fn health_bar(health: u32, band: HealthBand) -> String {
    let filled = (health / 10) as usize;
    let label = match band {
        HealthBand::Healthy => "healthy",
        HealthBand::Warning => "warning",
        HealthBand::Critical => "critical",
    };
    format!(
        "Earth [{}{}] {health}% {label}",
        "#".repeat(filled),
        "-".repeat(10 - filled)
    )
}

fn write_feedback(
    feedback: &AnswerFeedback,
    answers: &[String],
    out: &mut dyn Write,
) -> Result<()> {
    writeln!(out)?;
    if feedback.correct {
        writeln!(out, "  Correct! +{} points", feedback.points)?;
    } else {
        let right = answers
            .get(feedback.correct_index)
            .map(String::as_str)
            .unwrap_or_default();
        writeln!(out, "  Incorrect. The answer was: {right}")?;
    }
    writeln!(out, "  Did you know? {}", feedback.explanation)?;
    Ok(())
}

fn write_summary(summary: &GameSummary, out: &mut dyn Write) -> Result<()> {
    let result = &summary.result;
    writeln!(out)?;
    writeln!(out, "  {}!", summary.outcome)?;
    writeln!(out, "  {}", summary.outcome.message())?;
    writeln!(out)?;
    writeln!(out, "  Final score:   {}", result.score)?;
    writeln!(out, "  Earth health:  {}%", result.earth_health)?;
    writeln!(
        out,
        "  Correct:       {} / {} ({:.0}%)",
        result.correct_answers,
        result.questions_answered,
        summary.accuracy()
    )?;
    writeln!(out, "  Best streak:   {}", result.max_streak)?;
    writeln!(out)?;
    Ok(())
}

/// Fold the round into the logged-in account, if any.
async fn record(
    auth: &mut AuthService,
    summary: &GameSummary,
    out: &mut dyn Write,
) -> Result<()> {
    let Some(update) = auth
        .update_user_stats(&summary.result)
        .await
        .context("failed to save game stats")?
    else {
        writeln!(out, "  Not logged in: this round was not saved.")?;
        return Ok(());
    };

    writeln!(out, "  +{} XP", update.experience_gained)?;
    if let Some(level) = update.new_level {
        writeln!(out, "  Level up! You are now level {level}.")?;
    }
    for achievement in &update.unlocked {
        writeln!(out, "{}", achievement_banner(achievement))?;
    }
    Ok(())
}
