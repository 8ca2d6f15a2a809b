//! Scoring and life economy
//!
//! Pure point arithmetic plus the single life-loss rule both schedulers
//! share. Game over, score submission and high-score bookkeeping all hang
//! off `apply_life_loss`.

use serde::{Deserialize, Serialize};

use super::effects::PowerUpState;
use super::powerup::CATALOG;
use super::state::{Cue, Effect, GameMode, GamePhase, Session};
use crate::consts::MAX_WHACK_LIGHTS;
use crate::settings::GameConfig;
use crate::settlement::ScoreSubmission;

/// Streak needed before the long-streak power-up bonus applies
pub const LONG_STREAK: u32 = 15;

/// Breakdown of one scoring tap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapScore {
    pub base: u64,
    pub streak_bonus: u64,
    pub power_up_bonus: u64,
    pub multiplier: f64,
    pub total: u64,
}

/// `floor(streak / 2)` once the streak reaches the threshold
pub fn streak_bonus(streak: u32, config: &GameConfig) -> u64 {
    if streak >= config.bonus_points_threshold {
        (streak / 2) as u64
    } else {
        0
    }
}

fn fraction_of(base: u64, fraction: f64) -> u64 {
    (base as f64 * fraction).floor() as u64
}

/// Additive bonus from the active power-up set
pub fn power_up_bonus(base: u64, streak: u32, power_ups: &PowerUpState) -> u64 {
    let active = power_ups.active.iter().filter(|a| a.is_active);
    let count = active.clone().count();
    let mut bonus = 0;

    // Only reachable if activation ever stacks
    if count >= 2 {
        bonus += fraction_of(base, 0.5);
    }
    if streak >= LONG_STREAK && count >= 1 {
        bonus += fraction_of(base, 0.3);
    }
    bonus += active.map(|a| a.power_up.rarity.bonus_points()).sum::<u64>();
    bonus
}

/// Points for a green tap at `streak` (already counting this tap)
pub fn score_green_tap(streak: u32, config: &GameConfig, power_ups: &PowerUpState) -> TapScore {
    let base = config.points_per_round;
    let streak_bonus = streak_bonus(streak, config);
    let power_up_bonus = power_up_bonus(base, streak, power_ups);
    let multiplier = power_ups.active_multiplier();
    let total = ((base + streak_bonus + power_up_bonus) as f64 * multiplier).floor() as u64;
    TapScore {
        base,
        streak_bonus,
        power_up_bonus,
        multiplier,
        total,
    }
}

/// What a violation cost the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeOutcome {
    /// Shield took the hit
    Absorbed,
    LifeLost { remaining: u32 },
    GameOver,
}

/// Apply a tap-on-red or a missed green
pub fn apply_life_loss(session: &mut Session, now: u64, out: &mut Vec<Effect>) -> LifeOutcome {
    if session.power_ups.consume_shield() {
        out.push(Effect::Cue(Cue::ShieldAbsorbed));
        log::debug!("Shield absorbed a violation at round {}", session.stats.round);
        return LifeOutcome::Absorbed;
    }

    session.stats.lives = session.stats.lives.saturating_sub(1);
    session.stats.streak = 0;
    out.push(Effect::Cue(Cue::LifeLost));

    if session.stats.lives > 0 {
        return LifeOutcome::LifeLost {
            remaining: session.stats.lives,
        };
    }

    finish_game(session, now, out);
    LifeOutcome::GameOver
}

/// Enter `GameOver` and queue settlement and high-score effects. A score
/// no legitimate run could reach gets neither.
fn finish_game(session: &mut Session, now: u64, out: &mut Vec<Effect>) {
    if session.phase == GamePhase::GameOver {
        return;
    }
    session.phase = GamePhase::GameOver;
    session.paused_at = None;

    let score = session.stats.current_score;
    let round = session.stats.round;
    log::info!(
        "Game over ({}) score={} round={} accuracy={:.2} after {}ms",
        session.mode.as_str(),
        score,
        round,
        session.stats.accuracy(),
        crate::elapsed_ms(session.start_time, now)
    );
    out.push(Effect::Cue(Cue::GameOver));

    let ceiling = score_ceiling(session.mode, round, &session.config);
    if score > ceiling {
        log::warn!(
            "Score {} above ceiling {} at round {}, not recording",
            score,
            ceiling,
            round
        );
        return;
    }

    if score > 0 {
        out.push(Effect::SubmitScore(ScoreSubmission {
            score,
            round,
            mode: session.mode,
            ceiling,
        }));
    }

    if score > session.stats.high_score {
        session.stats.high_score = score;
        out.push(Effect::PersistHighScore {
            mode: session.mode,
            score,
            round,
        });
        out.push(Effect::Cue(Cue::NewHighScore));
    }
}

/// Best possible single tap at `streak`, picking the most lucrative power-up
fn best_tap(streak: u32, config: &GameConfig) -> u64 {
    let base = config.points_per_round;
    let plain = base + streak_bonus(streak, config);
    let long_streak = if streak >= LONG_STREAK {
        fraction_of(base, 0.3)
    } else {
        0
    };

    CATALOG
        .iter()
        .map(|t| {
            let bonus = long_streak + t.rarity.bonus_points();
            ((plain + bonus) as f64 * t.multiplier.unwrap_or(1.0)).floor() as u64
        })
        .fold(plain, u64::max)
}

/// Highest score reachable by the time the session sits at `round`
pub fn score_ceiling(mode: GameMode, round: u32, config: &GameConfig) -> u64 {
    match mode {
        GameMode::Whack => (1..=round as u64)
            .map(|r| r.min(MAX_WHACK_LIGHTS as u64) * config.whack_points_per_round)
            .sum(),
        // Each scoring tap advances the round, so round - 1 taps have scored
        GameMode::Classic | GameMode::Arcade => (1..round)
            .map(|streak| best_tap(streak, config))
            .sum(),
    }
}
