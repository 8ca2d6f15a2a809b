//! Power-up runtime: field, tray, active set and the queries the
//! schedulers read every tick.
//!
//! Everything here is polled once per tick. Ineligible requests are silent
//! no-ops that return `None`; a missed opportunity is retried next tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::powerup::{
    FIELD_LIFETIME_MS, MAX_FIELD_POWER_UPS, MIN_SPAWN_INTERVAL_MS, PowerUp, PowerUpKind, can_spawn,
    random_power_up,
};
use super::rng::LightRng;
use super::state::{Cue, Effect};
use crate::elapsed_ms;

/// Feedback window given to instant power-ups (ms)
pub const INSTANT_FEEDBACK_MS: u64 = 1000;
/// How long an ended effect stays listed before it is pruned. It stops
/// applying at `end_time`.
pub const EXPIRY_GRACE_MS: u64 = 100;
/// Slow motion halves game speed
pub const SLOW_MOTION_SPEED: f64 = 0.5;

/// A power-up in effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePowerUp {
    pub power_up: PowerUp,
    pub start_time: u64,
    pub end_time: u64,
    /// Cleared when a shield is spent or the effect runs past `end_time`
    pub is_active: bool,
}

impl ActivePowerUp {
    fn applies(&self, kind: PowerUpKind) -> bool {
        self.is_active && self.power_up.kind == kind
    }
}

/// Aggregate power-up state for a session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PowerUpState {
    /// Spawned, uncollected
    pub available: Vec<PowerUp>,
    /// In effect (at most one)
    pub active: Vec<ActivePowerUp>,
    /// Collected, waiting for activation
    pub collected: Vec<PowerUp>,
    pub last_spawn_time: Option<u64>,
    /// Last spawn timestamp per kind
    pub spawn_cooldowns: BTreeMap<PowerUpKind, u64>,
    next_id: u32,
}

impl PowerUpState {
    /// Try to place a new power-up on the field
    pub fn spawn_power_up(
        &mut self,
        rng: &mut LightRng,
        now: u64,
        out: &mut Vec<Effect>,
    ) -> Option<PowerUp> {
        let too_soon = self
            .last_spawn_time
            .is_some_and(|last| elapsed_ms(last, now) < MIN_SPAWN_INTERVAL_MS);
        if too_soon || self.available.len() >= MAX_FIELD_POWER_UPS {
            return None;
        }

        let template = random_power_up(rng)?;
        if !can_spawn(template.kind, &self.spawn_cooldowns, now) {
            return None;
        }

        self.next_id += 1;
        let power_up = PowerUp::from_template(self.next_id, template, now);
        self.available = vec![power_up.clone()];
        self.last_spawn_time = Some(now);
        let _ = self.spawn_cooldowns.insert(power_up.kind, now);
        out.push(Effect::Cue(Cue::PowerUpSpawned));
        log::debug!(
            "Spawned {} ({:?}) id={}",
            power_up.kind.as_str(),
            power_up.rarity,
            power_up.id
        );
        Some(power_up)
    }

    /// Move a field power-up into the tray
    pub fn collect_power_up(&mut self, id: u32, out: &mut Vec<Effect>) -> Option<PowerUp> {
        let index = self.available.iter().position(|p| p.id == id)?;
        let power_up = self.available.remove(index);
        self.collected.push(power_up.clone());
        out.push(Effect::Cue(Cue::PowerUpCollected));
        Some(power_up)
    }

    /// Activate a power-up from the tray
    pub fn activate_power_up(
        &mut self,
        id: u32,
        now: u64,
        out: &mut Vec<Effect>,
    ) -> Option<PowerUp> {
        let index = self.collected.iter().position(|p| p.id == id)?;
        let power_up = self.collected.remove(index);
        Some(self.activate(power_up, now, out))
    }

    /// Activate a field power-up straight from a tap
    pub fn tap_to_activate(&mut self, id: u32, now: u64, out: &mut Vec<Effect>) -> Option<PowerUp> {
        let index = self.available.iter().position(|p| p.id == id)?;
        let power_up = self.available.remove(index);
        Some(self.activate(power_up, now, out))
    }

    fn activate(&mut self, power_up: PowerUp, now: u64, out: &mut Vec<Effect>) -> PowerUp {
        let duration = if power_up.is_instant() {
            INSTANT_FEEDBACK_MS
        } else {
            power_up.duration_ms
        };
        // Replaces, never stacks
        self.active = vec![ActivePowerUp {
            power_up: power_up.clone(),
            start_time: now,
            end_time: now + duration,
            is_active: true,
        }];
        out.push(Effect::Cue(Cue::PowerUpActivated));
        log::debug!("Activated {} until {}", power_up.kind.as_str(), now + duration);
        power_up
    }

    /// Prune expired effects and stale field power-ups
    pub fn update_power_ups(&mut self, now: u64) {
        for active in &mut self.active {
            if now > active.end_time {
                active.is_active = false;
            }
        }
        self.active.retain(|a| now <= a.end_time + EXPIRY_GRACE_MS);
        self.available
            .retain(|p| elapsed_ms(p.spawned_at, now) <= FIELD_LIFETIME_MS);
    }

    /// Product of active score multipliers
    pub fn active_multiplier(&self) -> f64 {
        self.active
            .iter()
            .filter(|a| a.applies(PowerUpKind::ScoreMultiplier))
            .map(|a| a.power_up.multiplier.unwrap_or(1.0))
            .product()
    }

    pub fn has_active_shield(&self) -> bool {
        self.active.iter().any(|a| a.applies(PowerUpKind::Shield))
    }

    /// Spend the active shield; false when there is none
    pub fn consume_shield(&mut self) -> bool {
        match self
            .active
            .iter_mut()
            .find(|a| a.applies(PowerUpKind::Shield))
        {
            Some(shield) => {
                shield.is_active = false;
                true
            }
            None => false,
        }
    }

    pub fn game_speed_multiplier(&self) -> f64 {
        if self.active.iter().any(|a| a.applies(PowerUpKind::SlowMotion)) {
            SLOW_MOTION_SPEED
        } else {
            1.0
        }
    }

    pub fn is_time_frozen(&self) -> bool {
        self.active.iter().any(|a| a.applies(PowerUpKind::FreezeTime))
    }

    /// Entries of the active set still flagged active
    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|a| a.is_active).count()
    }

    /// Move every timestamp forward (pause/resume)
    pub fn shift_schedule(&mut self, by: u64) {
        for active in &mut self.active {
            active.start_time += by;
            active.end_time += by;
        }
        for power_up in &mut self.available {
            power_up.spawned_at += by;
        }
        if let Some(last) = self.last_spawn_time.as_mut() {
            *last += by;
        }
        for last in self.spawn_cooldowns.values_mut() {
            *last += by;
        }
    }
}
