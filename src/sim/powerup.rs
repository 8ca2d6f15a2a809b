//! Power-up catalog and spawn policy

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::rng::LightRng;
use crate::elapsed_ms;

/// Chance that a spawn opportunity produces anything at all
pub const SPAWN_CHANCE: f64 = 0.35;
/// Minimum time between any two spawns (ms)
pub const MIN_SPAWN_INTERVAL_MS: u64 = 5000;
/// Uncollected power-ups allowed on the field at once
pub const MAX_FIELD_POWER_UPS: usize = 1;
/// How long an uncollected power-up stays on the field (ms)
pub const FIELD_LIFETIME_MS: u64 = 8000;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Halves game speed
    SlowMotion,
    /// Absorbs one violation
    Shield,
    /// Multiplies tap score
    ScoreMultiplier,
    /// Instant +1 life
    ExtraLife,
    /// Stops the light clock
    FreezeTime,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 5] = [
        PowerUpKind::SlowMotion,
        PowerUpKind::Shield,
        PowerUpKind::ScoreMultiplier,
        PowerUpKind::ExtraLife,
        PowerUpKind::FreezeTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::SlowMotion => "Slow Motion",
            PowerUpKind::Shield => "Shield",
            PowerUpKind::ScoreMultiplier => "Score Multiplier",
            PowerUpKind::ExtraLife => "Extra Life",
            PowerUpKind::FreezeTime => "Freeze Time",
        }
    }

    /// Minimum time before this kind may spawn again (ms)
    pub fn cooldown_ms(&self) -> u64 {
        match self {
            PowerUpKind::SlowMotion => 10_000,
            PowerUpKind::Shield => 15_000,
            PowerUpKind::ScoreMultiplier => 12_000,
            PowerUpKind::ExtraLife => 30_000,
            PowerUpKind::FreezeTime => 20_000,
        }
    }

    /// Catalog entry for this kind
    pub fn template(&self) -> PowerUpTemplate {
        CATALOG
            .iter()
            .copied()
            .find(|t| t.kind == *self)
            .unwrap_or(PowerUpTemplate {
                kind: *self,
                rarity: Rarity::Common,
                duration_ms: 0,
                multiplier: None,
            })
    }
}

/// Rarity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [Rarity::Common, Rarity::Rare, Rarity::Epic, Rarity::Legendary];

    /// Relative spawn weight
    pub fn spawn_weight(&self) -> u32 {
        match self {
            Rarity::Common => 50,
            Rarity::Rare => 30,
            Rarity::Epic => 15,
            Rarity::Legendary => 5,
        }
    }

    /// Flat points added per tap while a power-up of this rarity is active
    pub fn bonus_points(&self) -> u64 {
        match self {
            Rarity::Common => 0,
            Rarity::Rare => 2,
            Rarity::Epic => 5,
            Rarity::Legendary => 10,
        }
    }
}

/// Static catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerUpTemplate {
    pub kind: PowerUpKind,
    pub rarity: Rarity,
    /// 0 for instant effects
    pub duration_ms: u64,
    /// Set for `ScoreMultiplier`
    pub multiplier: Option<f64>,
}

pub const CATALOG: [PowerUpTemplate; 5] = [
    PowerUpTemplate {
        kind: PowerUpKind::SlowMotion,
        rarity: Rarity::Common,
        duration_ms: 5000,
        multiplier: None,
    },
    PowerUpTemplate {
        kind: PowerUpKind::Shield,
        rarity: Rarity::Rare,
        duration_ms: 10_000,
        multiplier: None,
    },
    PowerUpTemplate {
        kind: PowerUpKind::ScoreMultiplier,
        rarity: Rarity::Rare,
        duration_ms: 8000,
        multiplier: Some(2.0),
    },
    PowerUpTemplate {
        kind: PowerUpKind::FreezeTime,
        rarity: Rarity::Epic,
        duration_ms: 3000,
        multiplier: None,
    },
    PowerUpTemplate {
        kind: PowerUpKind::ExtraLife,
        rarity: Rarity::Legendary,
        duration_ms: 0,
        multiplier: None,
    },
];

/// A spawned power-up instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub rarity: Rarity,
    pub duration_ms: u64,
    pub multiplier: Option<f64>,
    /// When it appeared on the field
    pub spawned_at: u64,
}

impl PowerUp {
    pub fn from_template(id: u32, template: PowerUpTemplate, spawned_at: u64) -> Self {
        Self {
            id,
            kind: template.kind,
            rarity: template.rarity,
            duration_ms: template.duration_ms,
            multiplier: template.multiplier,
            spawned_at,
        }
    }

    pub fn is_instant(&self) -> bool {
        self.duration_ms == 0
    }
}

/// Roll for a power-up: spawn chance, then rarity by weight, then a kind of
/// that rarity
pub fn random_power_up(rng: &mut LightRng) -> Option<PowerUpTemplate> {
    if !rng.chance(SPAWN_CHANCE) {
        return None;
    }

    let total: u32 = Rarity::ALL.iter().map(Rarity::spawn_weight).sum();
    let mut roll = rng.roll(total);
    let mut rarity = Rarity::Common;
    for candidate in Rarity::ALL {
        let weight = candidate.spawn_weight();
        if roll < weight {
            rarity = candidate;
            break;
        }
        roll -= weight;
    }

    let pool: Vec<PowerUpTemplate> = CATALOG
        .iter()
        .copied()
        .filter(|t| t.rarity == rarity)
        .collect();
    rng.pick(&pool).copied()
}

/// Whether `kind` has rearmed since it last spawned
pub fn can_spawn(kind: PowerUpKind, cooldowns: &BTreeMap<PowerUpKind, u64>, now: u64) -> bool {
    match cooldowns.get(&kind) {
        Some(&last) => elapsed_ms(last, now) >= kind.cooldown_ms(),
        None => true,
    }
}
