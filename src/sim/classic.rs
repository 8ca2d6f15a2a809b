//! Light-state scheduler for Classic and Arcade
//!
//! One light alternates between red and green windows. Rounds advance on
//! scoring taps, never on the clock.

use super::scoring::{apply_life_loss, score_green_tap};
use super::state::{Cue, Effect, LightColor, Session};
use super::timing::{light_interval, transition_window};

/// Whether the current window's deadline has passed at `now`
fn window_over(session: &Session, now: u64) -> bool {
    !session.power_ups.is_time_frozen() && now >= session.next_light_change
}

/// Per-frame scheduler step
pub fn advance(session: &mut Session, now: u64, out: &mut Vec<Effect>) {
    if !session.is_playing() || session.mode.is_whack() {
        return;
    }
    if !window_over(session, now) {
        return;
    }

    let speed = session.power_ups.game_speed_multiplier();
    let interval = light_interval(session.stats.round, &session.config, speed);
    let current = session.light.color;
    let next = session.rng.next_light_state(current);

    if current == LightColor::Green && !session.light.tapped_during_green {
        // The green window just ended untouched
        let _ = apply_life_loss(session, now, out);
        if !session.is_playing() {
            return;
        }
    }

    let window = transition_window(current, next, interval);
    let consecutive = current == next;
    if next == LightColor::Green {
        session.light.tapped_during_green = false;
    }
    session.light.color = next;
    session.last_light_change = now;
    session.next_light_change = now + window;
    out.push(Effect::Cue(Cue::LightChanged {
        color: next,
        consecutive,
    }));
    log::debug!(
        "Light {:?} -> {:?} for {}ms (round {})",
        current,
        next,
        window,
        session.stats.round
    );

    if current == LightColor::Red && next == LightColor::Green && session.mode.power_ups_enabled() {
        session.power_ups.update_power_ups(now);
        let _ = session.power_ups.spawn_power_up(&mut session.rng, now, out);
    }
}

/// Handle a tap on the single light.
///
/// A tap landing after the deadline of the window on screen is late: the
/// scheduler settles that window first (an untouched green is a miss) and
/// the tap itself neither scores nor costs a life.
pub fn handle_tap(session: &mut Session, now: u64, out: &mut Vec<Effect>) {
    if !session.is_playing() || session.mode.is_whack() {
        return;
    }
    if window_over(session, now) {
        advance(session, now, out);
        if session.is_playing() {
            session.stats.total_taps += 1;
        }
        return;
    }
    session.stats.total_taps += 1;

    match session.light.color {
        LightColor::Red => {
            out.push(Effect::Cue(Cue::IncorrectTap));
            let _ = apply_life_loss(session, now, out);
        }
        // Already scored this window
        LightColor::Green if session.light.tapped_during_green => {}
        LightColor::Green => {
            session.stats.streak += 1;
            session.stats.correct_taps += 1;
            let score = score_green_tap(session.stats.streak, &session.config, &session.power_ups);
            session.stats.current_score += score.total;
            session.light.tapped_during_green = true;
            session.stats.round += 1;
            session.round_start_time = now;
            out.push(Effect::Cue(Cue::CorrectTap));
            out.push(Effect::Cue(Cue::RoundAdvanced {
                round: session.stats.round,
            }));
            if session.stats.round % 10 == 0 {
                log::info!(
                    "Round {} reached, score {}",
                    session.stats.round,
                    session.stats.current_score
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{GameConfig, PowerUpFlow};
    use crate::sim::effects::ActivePowerUp;
    use crate::sim::powerup::{PowerUp, PowerUpKind};
    use crate::sim::rng::LightRng;
    use crate::sim::state::{GameMode, GamePhase};

    fn session(mode: GameMode) -> Session {
        Session::new(
            mode,
            GameConfig::default(),
            PowerUpFlow::TapToActivate,
            0,
            LightRng::from_seed(21),
            0,
        )
    }

    fn green(session: &mut Session) {
        session.light.color = LightColor::Green;
        session.light.tapped_during_green = false;
    }

    fn give(session: &mut Session, kind: PowerUpKind) {
        session.power_ups.active = vec![ActivePowerUp {
            power_up: PowerUp::from_template(1, kind.template(), 0),
            start_time: 0,
            end_time: 60_000,
            is_active: true,
        }];
    }

    #[test]
    fn test_first_green_tap_scores_base() {
        let mut s = session(GameMode::Classic);
        green(&mut s);
        let mut out = Vec::new();
        handle_tap(&mut s, 100, &mut out);
        assert_eq!(s.stats.current_score, 10);
        assert_eq!(s.stats.streak, 1);
        assert_eq!(s.stats.round, 2);
        assert!(s.light.tapped_during_green);
        assert_eq!(out[0], Effect::Cue(Cue::CorrectTap));
    }

    #[test]
    fn test_streak_bonus_tap() {
        let mut s = session(GameMode::Classic);
        s.stats.streak = 6;
        green(&mut s);
        let mut out = Vec::new();
        handle_tap(&mut s, 100, &mut out);
        assert_eq!(s.stats.current_score, 13);
    }

    #[test]
    fn test_double_tap_scores_once() {
        let mut s = session(GameMode::Classic);
        green(&mut s);
        let mut out = Vec::new();
        handle_tap(&mut s, 100, &mut out);
        handle_tap(&mut s, 120, &mut out);
        assert_eq!(s.stats.current_score, 10);
        assert_eq!(s.stats.round, 2);
        assert_eq!(s.stats.total_taps, 2);
        assert_eq!(s.stats.lives, 3);
    }

    #[test]
    fn test_red_tap_costs_a_life_and_keeps_color() {
        let mut s = session(GameMode::Classic);
        s.stats.streak = 3;
        let change_at = s.next_light_change;
        let mut out = Vec::new();
        handle_tap(&mut s, 100, &mut out);
        assert_eq!(s.stats.lives, 2);
        assert_eq!(s.stats.streak, 0);
        assert_eq!(s.light.color, LightColor::Red);
        assert_eq!(s.next_light_change, change_at);
        assert_eq!(
            out,
            vec![Effect::Cue(Cue::IncorrectTap), Effect::Cue(Cue::LifeLost)]
        );
    }

    #[test]
    fn test_shield_absorbs_red_tap() {
        let mut s = session(GameMode::Arcade);
        give(&mut s, PowerUpKind::Shield);
        s.stats.streak = 3;
        let mut out = Vec::new();
        handle_tap(&mut s, 100, &mut out);
        assert_eq!(s.stats.lives, 3);
        assert_eq!(s.stats.streak, 3);
        assert!(!s.power_ups.has_active_shield());
    }

    #[test]
    fn test_taps_ignored_in_whack_mode() {
        let mut s = session(GameMode::Whack);
        let mut out = Vec::new();
        handle_tap(&mut s, 100, &mut out);
        advance(&mut s, 1_000_000, &mut out);
        assert!(out.is_empty());
        assert_eq!(s.stats.total_taps, 0);
    }

    #[test]
    fn test_no_transition_before_deadline() {
        let mut s = session(GameMode::Classic);
        let mut out = Vec::new();
        let t = s.next_light_change - 1;
        advance(&mut s, t, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_untapped_green_is_a_miss() {
        let mut s = session(GameMode::Classic);
        green(&mut s);
        let mut out = Vec::new();
        let at = s.next_light_change;
        advance(&mut s, at, &mut out);
        assert_eq!(s.stats.lives, 2);
        assert!(out.contains(&Effect::Cue(Cue::LifeLost)));
        assert_eq!(s.last_light_change, at);
        assert!(s.next_light_change > at);
    }

    #[test]
    fn test_tapped_green_transitions_cleanly() {
        let mut s = session(GameMode::Classic);
        green(&mut s);
        let mut out = Vec::new();
        handle_tap(&mut s, 10, &mut out);
        out.clear();
        let at = s.next_light_change;
        advance(&mut s, at, &mut out);
        assert_eq!(s.stats.lives, 3);
        assert!(matches!(out[0], Effect::Cue(Cue::LightChanged { .. })));
    }

    #[test]
    fn test_windows_follow_transition_kind() {
        let mut s = session(GameMode::Classic);
        let mut out = Vec::new();
        for _ in 0..200 {
            let before = s.light.color;
            if before == LightColor::Green {
                s.light.tapped_during_green = true;
            }
            let at = s.next_light_change;
            advance(&mut s, at, &mut out);
            let window = s.next_light_change - at;
            let expected = transition_window(before, s.light.color, 2000.0);
            assert_eq!(window, expected);
        }
        assert_eq!(s.stats.lives, 3);
    }

    #[test]
    fn test_late_tap_on_green_is_a_miss() {
        let mut s = session(GameMode::Classic);
        green(&mut s);
        s.next_light_change = 500;
        let mut out = Vec::new();
        handle_tap(&mut s, 5_000, &mut out);
        assert_eq!(s.stats.current_score, 0);
        assert_eq!(s.stats.round, 1);
        assert_eq!(s.stats.lives, 2);
        assert_eq!(s.stats.total_taps, 1);
        assert!(!out.contains(&Effect::Cue(Cue::CorrectTap)));
        assert!(!out.contains(&Effect::Cue(Cue::IncorrectTap)));
        assert_eq!(s.last_light_change, 5_000);
        assert!(s.next_light_change > 5_000);
    }

    #[test]
    fn test_tap_on_deadline_is_late() {
        let mut s = session(GameMode::Classic);
        green(&mut s);
        let at = s.next_light_change;
        let mut out = Vec::new();
        handle_tap(&mut s, at - 1, &mut out);
        assert_eq!(s.stats.current_score, 10);

        let mut late = session(GameMode::Classic);
        green(&mut late);
        let at = late.next_light_change;
        handle_tap(&mut late, at, &mut out);
        assert_eq!(late.stats.current_score, 0);
        assert_eq!(late.stats.lives, 2);
    }

    #[test]
    fn test_late_tap_after_red_costs_nothing() {
        let mut s = session(GameMode::Classic);
        let at = s.next_light_change;
        let mut out = Vec::new();
        handle_tap(&mut s, at + 10, &mut out);
        assert_eq!(s.stats.lives, 3);
        assert_eq!(s.stats.current_score, 0);
        assert_eq!(s.last_light_change, at + 10);
    }

    #[test]
    fn test_frozen_tap_is_judged_on_screen_state() {
        let mut s = session(GameMode::Arcade);
        give(&mut s, PowerUpKind::FreezeTime);
        green(&mut s);
        let at = s.next_light_change;
        let mut out = Vec::new();
        handle_tap(&mut s, at + 1_000, &mut out);
        assert_eq!(s.stats.current_score, 15);
        assert_eq!(s.stats.lives, 3);
    }

    #[test]
    fn test_arcade_spawns_on_red_to_green() {
        let mut s = session(GameMode::Arcade);
        let mut out = Vec::new();
        let mut spawned = false;
        for _ in 0..500 {
            s.light.tapped_during_green = true;
            let before = s.light.color;
            let at = s.next_light_change;
            out.clear();
            advance(&mut s, at, &mut out);
            if out.contains(&Effect::Cue(Cue::PowerUpSpawned)) {
                assert_eq!(before, LightColor::Red);
                assert_eq!(s.light.color, LightColor::Green);
                assert_eq!(s.power_ups.available.len(), 1);
                assert_eq!(s.power_ups.last_spawn_time, Some(at));
                spawned = true;
                break;
            }
        }
        assert!(spawned);
    }

    #[test]
    fn test_classic_never_spawns() {
        let mut s = session(GameMode::Classic);
        let mut out = Vec::new();
        for _ in 0..500 {
            s.light.tapped_during_green = true;
            let at = s.next_light_change;
            advance(&mut s, at, &mut out);
        }
        assert!(!out.contains(&Effect::Cue(Cue::PowerUpSpawned)));
        assert!(s.power_ups.available.is_empty());
    }

    #[test]
    fn test_slow_motion_doubles_windows() {
        let mut normal = session(GameMode::Classic);
        let mut slow = session(GameMode::Classic);
        give(&mut slow, PowerUpKind::SlowMotion);
        let mut out = Vec::new();
        for _ in 0..20 {
            normal.light.tapped_during_green = true;
            slow.light.tapped_during_green = true;
            // Same seed, same transitions
            let before = normal.light.color;
            let (a, b) = (normal.next_light_change, slow.next_light_change);
            advance(&mut normal, a, &mut out);
            advance(&mut slow, b, &mut out);
            assert_eq!(normal.light.color, slow.light.color);
            let expected = transition_window(before, slow.light.color, 4000.0);
            assert_eq!(slow.next_light_change - b, expected);
            assert_eq!(
                slow.next_light_change - b,
                2 * (normal.next_light_change - a)
            );
        }
    }

    #[test]
    fn test_frozen_time_blocks_transitions() {
        let mut s = session(GameMode::Arcade);
        give(&mut s, PowerUpKind::FreezeTime);
        let mut out = Vec::new();
        let t = s.next_light_change + 5_000;
        advance(&mut s, t, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_last_miss_ends_game() {
        let mut s = session(GameMode::Classic);
        s.stats.lives = 1;
        s.stats.current_score = 40;
        green(&mut s);
        let mut out = Vec::new();
        let t = s.next_light_change;
        advance(&mut s, t, &mut out);
        assert_eq!(s.phase, GamePhase::GameOver);
        assert_eq!(
            out.iter()
                .filter(|e| matches!(e, Effect::SubmitScore(_)))
                .count(),
            1
        );
        // Nothing moves after game over
        out.clear();
        let t = s.next_light_change + 10_000;
        advance(&mut s, t, &mut out);
        let t = s.next_light_change + 10_000;
        handle_tap(&mut s, t, &mut out);
        assert!(out.is_empty());
    }
}
