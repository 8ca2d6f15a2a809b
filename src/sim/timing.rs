//! Interval shaping shared by both schedulers
//!
//! All windows are whole milliseconds. Intervals shrink geometrically with
//! the round down to a floor, then stretch under slow motion.

use super::state::LightColor;
use crate::settings::GameConfig;

/// Whack mode runs this much slower than Classic at the same round
pub const WHACK_SLOWDOWN: f64 = 1.6;

/// Round-decayed interval before speed modifiers (ms)
pub fn classic_interval(round: u32, config: &GameConfig) -> f64 {
    let exponent = round.saturating_sub(1).min(10_000) as i32;
    let decayed = config.base_interval_ms as f64 * config.speed_decay_rate.powi(exponent);
    decayed.max(config.min_interval_ms as f64)
}

/// Interval after applying the game speed multiplier (ms)
pub fn light_interval(round: u32, config: &GameConfig, speed: f64) -> f64 {
    classic_interval(round, config) / speed.max(0.1)
}

fn window(interval: f64, factor: f64, floor_ms: u64) -> u64 {
    ((interval * factor).round() as u64).max(floor_ms)
}

pub fn green_window_after_red(interval: f64) -> u64 {
    window(interval, 0.3, 400)
}

/// Consecutive red: longer, to bait impatient taps
pub fn red_window_after_red(interval: f64) -> u64 {
    window(interval, 0.6, 600)
}

pub fn red_window_after_green(interval: f64) -> u64 {
    window(interval, 0.7, 800)
}

pub fn green_window_after_green(interval: f64) -> u64 {
    window(interval, 0.35, 450)
}

/// Duration of the window entered by a `from -> to` transition
pub fn transition_window(from: LightColor, to: LightColor, interval: f64) -> u64 {
    match (from, to) {
        (LightColor::Red, LightColor::Green) => green_window_after_red(interval),
        (LightColor::Red, LightColor::Red) => red_window_after_red(interval),
        (LightColor::Green, LightColor::Red) => red_window_after_green(interval),
        (LightColor::Green, LightColor::Green) => green_window_after_green(interval),
    }
}

/// Per-light timing for Whack-a-Light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhackIntervals {
    pub interval: f64,
    pub green_window: u64,
    pub red_window: u64,
}

pub fn whack_intervals(round: u32, config: &GameConfig, speed: f64) -> WhackIntervals {
    let interval = classic_interval(round, config) * WHACK_SLOWDOWN / speed.max(0.1);
    WhackIntervals {
        interval,
        green_window: window(interval, 0.65, 600),
        red_window: window(interval, 0.95, 900),
    }
}
