//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Time comes in as host-supplied millisecond timestamps
//! - Randomness only through the session's `LightRng`
//! - Side effects are returned as `Effect`s, never performed
//! - No rendering or platform dependencies

pub mod classic;
pub mod effects;
pub mod powerup;
pub mod rng;
pub mod scoring;
pub mod state;
pub mod tick;
pub mod timing;
pub mod whack;

pub use effects::{ActivePowerUp, PowerUpState};
pub use powerup::{CATALOG, PowerUp, PowerUpKind, PowerUpTemplate, Rarity};
pub use rng::LightRng;
pub use scoring::{LifeOutcome, TapScore, score_ceiling};
pub use state::{
    Cue, Effect, GameMode, GamePhase, Light, LightColor, Session, SessionSnapshot, Stats,
    WhackLight,
};
pub use tick::{TickInput, tick};
