//! Frame tick
//!
//! Core game loop. The host calls `tick` once per frame with the current
//! wall-clock time; everything the session does happens from here.

use super::classic;
use super::powerup::{PowerUp, PowerUpKind};
use super::state::{Cue, Effect, GamePhase, Session};
use super::whack;
use crate::elapsed_ms;
use crate::settings::PowerUpFlow;

/// Input commands for a single frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Tap on the single light (Classic/Arcade)
    pub tap: bool,
    /// Tap on a whack light by id
    pub tap_light: Option<u32>,
    /// Tap on a field power-up by id
    pub tap_power_up: Option<u32>,
    /// Activate a collected power-up by id
    pub activate_collected: Option<u32>,
    /// Pause toggle
    pub pause: bool,
}

impl TickInput {
    pub fn tap() -> Self {
        Self {
            tap: true,
            ..Default::default()
        }
    }

    pub fn tap_light(id: u32) -> Self {
        Self {
            tap_light: Some(id),
            ..Default::default()
        }
    }

    pub fn pause() -> Self {
        Self {
            pause: true,
            ..Default::default()
        }
    }
}

/// Advance the session to `now`, appending side effects to `out`
pub fn tick(session: &mut Session, input: &TickInput, now: u64, out: &mut Vec<Effect>) {
    if input.pause {
        toggle_pause(session, now);
    }
    if !session.is_playing() {
        return;
    }

    // Frozen frames don't count against any light deadline
    let delta = elapsed_ms(session.last_tick, now);
    if session.power_ups.is_time_frozen() {
        session.shift_light_schedule(delta);
    }
    session.last_tick = now;
    session.power_ups.update_power_ups(now);

    if session.mode.power_ups_enabled() {
        if let Some(id) = input.tap_power_up {
            tap_power_up(session, id, now, out);
        }
        if let Some(id) = input.activate_collected {
            let activated = session.power_ups.activate_power_up(id, now, out);
            apply_instant(session, activated.as_ref(), out);
        }
    }

    if session.mode.is_whack() {
        if let Some(id) = input.tap_light {
            whack::handle_tap(session, id, now, out);
        }
        whack::advance(session, now, out);
    } else {
        if input.tap {
            classic::handle_tap(session, now, out);
        }
        classic::advance(session, now, out);
    }
}

/// Playing <-> Paused. Resuming shifts the whole schedule by the time spent paused.
pub fn toggle_pause(session: &mut Session, now: u64) {
    match session.phase {
        GamePhase::Playing => {
            session.phase = GamePhase::Paused;
            session.paused_at = Some(now);
            log::debug!("Paused at {}", now);
        }
        GamePhase::Paused => {
            let paused_for = session
                .paused_at
                .take()
                .map_or(0, |at| elapsed_ms(at, now));
            session.shift_schedule(paused_for);
            session.last_tick = now;
            session.phase = GamePhase::Playing;
            log::debug!("Resumed after {}ms", paused_for);
        }
        GamePhase::Menu | GamePhase::GameOver => {}
    }
}

fn tap_power_up(session: &mut Session, id: u32, now: u64, out: &mut Vec<Effect>) {
    match session.power_up_flow {
        PowerUpFlow::TapToActivate => {
            let activated = session.power_ups.tap_to_activate(id, now, out);
            apply_instant(session, activated.as_ref(), out);
        }
        PowerUpFlow::CollectThenActivate => {
            let _ = session.power_ups.collect_power_up(id, out);
        }
    }
}

/// Instant power-ups take effect on activation
fn apply_instant(session: &mut Session, activated: Option<&PowerUp>, out: &mut Vec<Effect>) {
    if activated.is_some_and(|p| p.kind == PowerUpKind::ExtraLife) && session.gain_life() {
        out.push(Effect::Cue(Cue::LifeGained));
    }
}
