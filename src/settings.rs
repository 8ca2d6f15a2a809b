//! Game settings and preferences
//!
//! Tuning constants travel with the session; preferences are persisted
//! through the key/value store as JSON.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence::KeyValueStore;

/// How a tapped field power-up reaches the active set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PowerUpFlow {
    /// Tapping a field power-up activates it immediately
    #[default]
    TapToActivate,
    /// Tapping stores it; the player activates it later from the tray
    CollectThenActivate,
}

impl PowerUpFlow {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpFlow::TapToActivate => "Tap to activate",
            PowerUpFlow::CollectThenActivate => "Collect then activate",
        }
    }
}

/// Immutable tuning for one session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub initial_lives: u32,
    pub max_lives: u32,
    /// Interval at round 1 (ms)
    pub base_interval_ms: u64,
    /// Floor for the decayed interval (ms)
    pub min_interval_ms: u64,
    /// Interval multiplier applied once per round
    pub speed_decay_rate: f64,
    pub points_per_round: u64,
    pub bonus_points_threshold: u32,
    pub whack_points_per_round: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_lives: INITIAL_LIVES,
            max_lives: MAX_LIVES,
            base_interval_ms: BASE_INTERVAL_MS,
            min_interval_ms: MIN_INTERVAL_MS,
            speed_decay_rate: SPEED_DECAY_RATE,
            points_per_round: POINTS_PER_ROUND,
            bonus_points_threshold: BONUS_POINTS_THRESHOLD,
            whack_points_per_round: WHACK_POINTS_PER_ROUND,
        }
    }
}

impl GameConfig {
    /// Clamp nonsense values loaded from storage back into a playable range
    pub fn sanitized(mut self) -> Self {
        self.initial_lives = self.initial_lives.max(1);
        self.max_lives = self.max_lives.max(self.initial_lives);
        self.min_interval_ms = self.min_interval_ms.max(1);
        self.base_interval_ms = self.base_interval_ms.max(self.min_interval_ms);
        if !self.speed_decay_rate.is_finite() || self.speed_decay_rate <= 0.0 {
            self.speed_decay_rate = SPEED_DECAY_RATE;
        }
        self.speed_decay_rate = self.speed_decay_rate.min(1.0);
        self
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Session tuning
    pub tuning: GameConfig,
    /// Field power-up interaction style
    pub power_up_flow: PowerUpFlow,

    // === Feedback ===
    /// Play audio cues
    pub sound: bool,
    /// Fire haptic cues
    pub haptics: bool,

    // === Safety ===
    /// Pause automatically when the app is backgrounded
    pub pause_on_hidden: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tuning: GameConfig::default(),
            power_up_flow: PowerUpFlow::TapToActivate,
            sound: true,
            haptics: true,
            pause_on_hidden: true,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "red_light_rush_settings";

    /// Load settings, falling back to defaults when missing or corrupt
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Settings>(&json) {
                Ok(mut settings) => {
                    settings.tuning = settings.tuning.sanitized();
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Discarding corrupt settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Settings unavailable: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings (best effort)
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match serde_json::to_string(self) {
            Ok(json) => match store.set(Self::STORAGE_KEY, &json) {
                Ok(()) => log::info!("Settings saved"),
                Err(e) => log::warn!("Failed to save settings: {}", e),
            },
            Err(e) => log::warn!("Failed to encode settings: {}", e),
        }
    }
}
