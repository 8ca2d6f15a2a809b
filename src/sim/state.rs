//! Session state and core simulation types
//!
//! A `Session` is owned by whoever drives the frame loop and is passed by
//! `&mut` into the tick functions. Nothing in here touches the platform.

use serde::{Deserialize, Serialize};

use super::effects::{ActivePowerUp, PowerUpState};
use super::powerup::PowerUp;
use super::rng::LightRng;
use super::timing;
use super::whack::create_whack_lights;
use crate::settings::{GameConfig, PowerUpFlow};
use crate::settlement::{ScoreSubmission, TokenReward};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No session running
    Menu,
    /// Active gameplay
    Playing,
    /// Clock stopped; nothing advances
    Paused,
    /// Lives exhausted
    GameOver,
}

/// Game mode, fixed for a session's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// Single light, no power-ups
    Classic,
    /// Single light with power-ups
    Arcade,
    /// Several lights spread over a 3x3 grid
    Whack,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [GameMode::Classic, GameMode::Arcade, GameMode::Whack];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Arcade => "arcade",
            GameMode::Whack => "whack",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(GameMode::Classic),
            "arcade" => Some(GameMode::Arcade),
            "whack" | "whack-a-light" => Some(GameMode::Whack),
            _ => None,
        }
    }

    pub fn is_whack(&self) -> bool {
        *self == GameMode::Whack
    }

    /// Whether power-ups spawn in this mode.
    ///
    /// Classic shares the Arcade scheduler but is the plain game: no spawns
    /// on red to green and power-up input is ignored. That is the only rule
    /// separating the two modes.
    pub fn power_ups_enabled(&self) -> bool {
        !matches!(self, GameMode::Classic)
    }
}

/// Signal color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightColor {
    Red,
    Green,
}

/// The single light of Classic/Arcade mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    pub color: LightColor,
    /// A scoring tap landed in the current green window
    pub tapped_during_green: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: LightColor::Red,
            tapped_during_green: false,
        }
    }
}

/// One spatial light in Whack-a-Light mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhackLight {
    pub id: u32,
    /// Grid slot 0..9, unique among non-cleared lights
    pub slot: usize,
    pub color: LightColor,
    pub next_change: u64,
    /// Deadline for tapping, only while green
    pub green_expiry: Option<u64>,
    /// Tapped successfully this round
    pub cleared: bool,
}

/// Mutable per-session counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub current_score: u64,
    pub high_score: u64,
    pub lives: u32,
    /// 1-based
    pub round: u32,
    pub streak: u32,
    pub total_taps: u32,
    pub correct_taps: u32,
}

impl Stats {
    /// Fraction of taps that scored (1.0 before any tap)
    pub fn accuracy(&self) -> f64 {
        if self.total_taps == 0 {
            1.0
        } else {
            self.correct_taps as f64 / self.total_taps as f64
        }
    }
}

/// Fire-and-forget presentation cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cue {
    LightChanged { color: LightColor, consecutive: bool },
    RoundAdvanced { round: u32 },
    CorrectTap,
    IncorrectTap,
    ShieldAbsorbed,
    LifeLost,
    LifeGained,
    GameOver,
    NewHighScore,
    PowerUpSpawned,
    PowerUpCollected,
    PowerUpActivated,
}

/// Side effects produced by a tick, executed by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Cue(Cue),
    /// Hand the final score to the settlement layer
    SubmitScore(ScoreSubmission),
    /// A stored best score was beaten
    PersistHighScore { mode: GameMode, score: u64, round: u32 },
}

/// The live game instance
#[derive(Debug, Clone)]
pub struct Session {
    pub mode: GameMode,
    pub config: GameConfig,
    pub power_up_flow: PowerUpFlow,
    pub phase: GamePhase,
    pub stats: Stats,
    /// Classic/Arcade light
    pub light: Light,
    /// Whack-a-Light lights for the current round
    pub whack_lights: Vec<WhackLight>,
    /// Lights per whack round (grows by one per cleared round)
    pub whack_light_count: usize,
    pub power_ups: PowerUpState,
    pub start_time: u64,
    pub round_start_time: u64,
    pub last_light_change: u64,
    pub next_light_change: u64,
    /// Timestamp of the previous tick
    pub last_tick: u64,
    /// Set while paused
    pub paused_at: Option<u64>,
    /// Merged in once settlement resolves
    pub token_reward: Option<TokenReward>,
    pub(crate) rng: LightRng,
    next_light_id: u32,
}

impl Session {
    /// Start a fresh session in the `Playing` phase
    pub fn new(
        mode: GameMode,
        config: GameConfig,
        power_up_flow: PowerUpFlow,
        high_score: u64,
        rng: LightRng,
        now: u64,
    ) -> Self {
        let mut session = Self {
            mode,
            config,
            power_up_flow,
            phase: GamePhase::Playing,
            stats: Stats {
                current_score: 0,
                high_score,
                lives: config.initial_lives,
                round: 1,
                streak: 0,
                total_taps: 0,
                correct_taps: 0,
            },
            light: Light::default(),
            whack_lights: Vec::new(),
            whack_light_count: 1,
            power_ups: PowerUpState::default(),
            start_time: now,
            round_start_time: now,
            last_light_change: now,
            next_light_change: now,
            last_tick: now,
            paused_at: None,
            token_reward: None,
            rng,
            next_light_id: 1,
        };

        if mode.is_whack() {
            session.seed_whack_round(now);
        } else {
            // Open on a red window so the first tap is never a freebie
            let interval = timing::light_interval(1, &config, 1.0);
            session.next_light_change = now + timing::red_window_after_green(interval);
        }

        session
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Replace the whack lights with a fresh batch for the current round
    pub fn seed_whack_round(&mut self, now: u64) {
        let speed = self.power_ups.game_speed_multiplier();
        let intervals = timing::whack_intervals(self.stats.round, &self.config, speed);
        let first_id = self.next_light_id;
        let lights = create_whack_lights(
            self.whack_light_count,
            &intervals,
            now,
            first_id,
            &mut self.rng,
        );
        self.next_light_id = first_id + lights.len() as u32;
        self.whack_lights = lights;
    }

    /// Add a life, capped at the configured maximum
    pub fn gain_life(&mut self) -> bool {
        if self.stats.lives >= self.config.max_lives {
            return false;
        }
        self.stats.lives += 1;
        true
    }

    /// Push every light deadline forward (freeze-time)
    pub fn shift_light_schedule(&mut self, by: u64) {
        if by == 0 {
            return;
        }
        self.next_light_change += by;
        for light in &mut self.whack_lights {
            light.next_change += by;
            if let Some(expiry) = light.green_expiry.as_mut() {
                *expiry += by;
            }
        }
    }

    /// Push every timestamp forward by the paused duration
    pub fn shift_schedule(&mut self, by: u64) {
        self.shift_light_schedule(by);
        self.last_light_change += by;
        self.round_start_time += by;
        self.power_ups.shift_schedule(by);
    }

    /// Non-cleared whack light slots, in light order
    pub fn occupied_slots(&self) -> Vec<usize> {
        self.whack_lights
            .iter()
            .filter(|l| !l.cleared)
            .map(|l| l.slot)
            .collect()
    }

    /// Serializable view for hosts and HUDs
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            phase: self.phase,
            stats: self.stats,
            light: self.light,
            whack_lights: self.whack_lights.clone(),
            field_power_ups: self.power_ups.available.clone(),
            collected_power_ups: self.power_ups.collected.clone(),
            active_power_ups: self.power_ups.active.clone(),
            next_light_change: self.next_light_change,
            token_reward: self.token_reward.clone(),
        }
    }
}

/// Read-only copy of what a HUD needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: GameMode,
    pub phase: GamePhase,
    pub stats: Stats,
    pub light: Light,
    pub whack_lights: Vec<WhackLight>,
    pub field_power_ups: Vec<PowerUp>,
    pub collected_power_ups: Vec<PowerUp>,
    pub active_power_ups: Vec<ActivePowerUp>,
    pub next_light_change: u64,
    pub token_reward: Option<TokenReward>,
}
