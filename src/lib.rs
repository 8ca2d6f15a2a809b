//! Red Light Rush - real-time engine for a red light / green light arcade game
//!
//! Core modules:
//! - `sim`: Frame-driven game rules (light schedulers, power-ups, scoring)
//! - `session`: Session controller wiring the sim to its collaborators
//! - `settlement`: Contract for the external score/turn settlement layer
//! - `feedback`: Audio/haptic cue sinks
//! - `persistence`: Key/value storage backends
//! - `highscores`: Best score per mode
//! - `settings`: Tuning and player preferences
//! - `platform`: Clock, visibility and wasm entry points

pub mod feedback;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod settlement;
pub mod sim;

pub use highscores::HighScores;
pub use session::{GameController, StartError};
pub use settings::{GameConfig, PowerUpFlow, Settings};

/// Game configuration constants
pub mod consts {
    /// Lives at the start of a session
    pub const INITIAL_LIVES: u32 = 3;
    /// Upper bound on lives (extra-life power-ups stop here)
    pub const MAX_LIVES: u32 = 5;

    /// Light interval at round 1 (ms)
    pub const BASE_INTERVAL_MS: u64 = 2000;
    /// Floor for the decayed interval (ms)
    pub const MIN_INTERVAL_MS: u64 = 600;
    /// Per-round interval decay factor
    pub const SPEED_DECAY_RATE: f64 = 0.95;

    /// Base points for a green tap
    pub const POINTS_PER_ROUND: u64 = 10;
    /// Streak at which the streak bonus kicks in
    pub const BONUS_POINTS_THRESHOLD: u32 = 5;
    /// Flat points for a cleared whack light
    pub const WHACK_POINTS_PER_ROUND: u64 = 10;

    /// Spatial slots in Whack-a-Light mode (3x3 grid)
    pub const WHACK_SLOT_COUNT: usize = 9;
    /// Most lights active at once in Whack-a-Light mode
    pub const MAX_WHACK_LIGHTS: usize = 5;
}

/// Milliseconds between two timestamps, zero if `later` precedes `earlier`
#[inline]
pub fn elapsed_ms(earlier: u64, later: u64) -> u64 {
    later.saturating_sub(earlier)
}

