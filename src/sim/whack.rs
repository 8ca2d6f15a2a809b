//! Whack-a-Light scheduler
//!
//! Each light runs its own red/green timer on one of nine grid slots. A
//! round ends when every light in it has been tapped while green.

use super::rng::LightRng;
use super::scoring::apply_life_loss;
use super::state::{Cue, Effect, LightColor, Session, WhackLight};
use super::timing::{WhackIntervals, whack_intervals};
use crate::consts::{MAX_WHACK_LIGHTS, WHACK_SLOT_COUNT};

/// Build a batch of red lights on distinct random slots.
///
/// First greens are staggered across half a red window so the batch does not
/// light up all at once.
pub fn create_whack_lights(
    count: usize,
    intervals: &WhackIntervals,
    now: u64,
    first_id: u32,
    rng: &mut LightRng,
) -> Vec<WhackLight> {
    let count = count.clamp(1, MAX_WHACK_LIGHTS);
    let mut slots: Vec<usize> = (0..WHACK_SLOT_COUNT).collect();
    rng.shuffle(&mut slots);

    let half = intervals.red_window / 2;
    let step = half / count as u64;
    slots
        .into_iter()
        .take(count)
        .enumerate()
        .map(|(i, slot)| {
            let stagger = half + step * i as u64 + rng.range_ms(0, step / 2);
            WhackLight {
                id: first_id + i as u32,
                slot,
                color: LightColor::Red,
                next_change: now + stagger,
                green_expiry: None,
                cleared: false,
            }
        })
        .collect()
}

/// Random slot not held by any other non-cleared light
fn free_slot(lights: &[WhackLight], moving: usize, rng: &mut LightRng) -> Option<usize> {
    let free: Vec<usize> = (0..WHACK_SLOT_COUNT)
        .filter(|slot| {
            !lights
                .iter()
                .enumerate()
                .any(|(i, l)| i != moving && !l.cleared && l.slot == *slot)
        })
        .collect();
    rng.pick(&free).copied()
}

/// Whether the light's current window has ended at `now`
fn window_over(light: &WhackLight, now: u64) -> bool {
    match light.color {
        LightColor::Green => light.green_expiry.is_none_or(|expiry| now > expiry),
        LightColor::Red => now >= light.next_change,
    }
}

/// Per-frame scheduler step
pub fn advance(session: &mut Session, now: u64, out: &mut Vec<Effect>) {
    if !session.is_playing() || !session.mode.is_whack() {
        return;
    }
    if session.power_ups.is_time_frozen() {
        return;
    }

    let speed = session.power_ups.game_speed_multiplier();
    let intervals = whack_intervals(session.stats.round, &session.config, speed);
    let mut turned_green = false;

    for index in 0..session.whack_lights.len() {
        if !session.is_playing() {
            break;
        }
        let light = &session.whack_lights[index];
        if light.cleared || !window_over(light, now) {
            continue;
        }

        match light.color {
            LightColor::Green => {
                // Missed: back to red on the same slot
                let light = &mut session.whack_lights[index];
                light.color = LightColor::Red;
                light.green_expiry = None;
                light.next_change = now + intervals.red_window;
                out.push(Effect::Cue(Cue::LightChanged {
                    color: LightColor::Red,
                    consecutive: false,
                }));
                let _ = apply_life_loss(session, now, out);
            }
            LightColor::Red => {
                let slot = free_slot(&session.whack_lights, index, &mut session.rng);
                let light = &mut session.whack_lights[index];
                if let Some(slot) = slot {
                    light.slot = slot;
                }
                light.color = LightColor::Green;
                light.green_expiry = Some(now + intervals.green_window);
                light.next_change = now + intervals.green_window;
                turned_green = true;
                out.push(Effect::Cue(Cue::LightChanged {
                    color: LightColor::Green,
                    consecutive: false,
                }));
            }
        }
    }

    if turned_green && session.is_playing() && session.mode.power_ups_enabled() {
        session.power_ups.update_power_ups(now);
        let _ = session.power_ups.spawn_power_up(&mut session.rng, now, out);
    }
}

/// Handle a tap on one light.
///
/// A tap on a light whose window has already ended is late: the scheduler
/// settles it first (an expired green is a miss) and the tap neither clears
/// the light nor costs a life.
pub fn handle_tap(session: &mut Session, light_id: u32, now: u64, out: &mut Vec<Effect>) {
    if !session.is_playing() || !session.mode.is_whack() {
        return;
    }
    let Some(index) = session
        .whack_lights
        .iter()
        .position(|l| l.id == light_id && !l.cleared)
    else {
        return;
    };
    if !session.power_ups.is_time_frozen() && window_over(&session.whack_lights[index], now) {
        advance(session, now, out);
        if session.is_playing() {
            session.stats.total_taps += 1;
        }
        return;
    }
    session.stats.total_taps += 1;

    match session.whack_lights[index].color {
        LightColor::Red => {
            out.push(Effect::Cue(Cue::IncorrectTap));
            let _ = apply_life_loss(session, now, out);
        }
        LightColor::Green => {
            let light = &mut session.whack_lights[index];
            light.cleared = true;
            light.green_expiry = None;
            session.stats.correct_taps += 1;
            session.stats.streak += 1;
            session.stats.current_score += session.config.whack_points_per_round;
            out.push(Effect::Cue(Cue::CorrectTap));

            if session.whack_lights.iter().all(|l| l.cleared) {
                advance_round(session, now, out);
            }
        }
    }
}

fn advance_round(session: &mut Session, now: u64, out: &mut Vec<Effect>) {
    session.stats.round += 1;
    session.round_start_time = now;
    session.whack_light_count = (session.whack_light_count + 1).min(MAX_WHACK_LIGHTS);
    session.seed_whack_round(now);
    out.push(Effect::Cue(Cue::RoundAdvanced {
        round: session.stats.round,
    }));
    log::debug!(
        "Whack round {} with {} lights",
        session.stats.round,
        session.whack_light_count
    );
}
