//! Randomness policy
//!
//! Every random decision in a session (light colors, power-up rolls, whack
//! slot shuffles) comes from one ChaCha20 stream seeded from the OS, so the
//! transition odds cannot be predicted from observed history.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::state::LightColor;

/// Chance that a red light turns green on its next transition
pub const RED_TO_GREEN_CHANCE: f64 = 0.75;
/// Chance that a green light turns red on its next transition
pub const GREEN_TO_RED_CHANCE: f64 = 0.70;

/// CSPRNG-backed sampler owned by a session
#[derive(Clone)]
pub struct LightRng {
    inner: ChaCha20Rng,
}

impl std::fmt::Debug for LightRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never leak stream state into logs
        f.write_str("LightRng { .. }")
    }
}

impl LightRng {
    /// Seed from the operating system entropy source
    pub fn from_os() -> Self {
        Self {
            inner: ChaCha20Rng::from_os_rng(),
        }
    }

    /// Fixed seed (replays and tests)
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Pick the color following `current`
    pub fn next_light_state(&mut self, current: LightColor) -> LightColor {
        let roll: f64 = self.inner.random();
        match current {
            LightColor::Red if roll < RED_TO_GREEN_CHANCE => LightColor::Green,
            LightColor::Red => LightColor::Red,
            LightColor::Green if roll < GREEN_TO_RED_CHANCE => LightColor::Red,
            LightColor::Green => LightColor::Green,
        }
    }

    /// True with probability `p` (clamped to [0, 1])
    pub fn chance(&mut self, p: f64) -> bool {
        let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
        self.inner.random_bool(p)
    }

    /// Uniform integer in `0..upper` (0 when `upper` is 0)
    pub fn roll(&mut self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        self.inner.random_range(0..upper)
    }

    /// Uniform milliseconds in `lo..=hi`
    pub fn range_ms(&mut self, lo: u64, hi: u64) -> u64 {
        if hi <= lo {
            return lo;
        }
        self.inner.random_range(lo..=hi)
    }

    /// Pick one element uniformly
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.roll(items.len() as u32) as usize)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition_rate(from: LightColor, to: LightColor, samples: u32) -> f64 {
        let mut rng = LightRng::from_seed(0x5eed_1234);
        let hits = (0..samples)
            .filter(|_| rng.next_light_state(from) == to)
            .count();
        hits as f64 / samples as f64
    }

    #[test]
    fn test_red_transitions_favor_green() {
        let rate = transition_rate(LightColor::Red, LightColor::Green, 10_000);
        assert!((rate - 0.75).abs() <= 0.02, "red->green rate {rate}");
    }

    #[test]
    fn test_green_transitions_favor_red() {
        let rate = transition_rate(LightColor::Green, LightColor::Red, 10_000);
        assert!((rate - 0.70).abs() <= 0.02, "green->red rate {rate}");
    }

    #[test]
    fn test_os_seeded_streams_differ() {
        let mut a = LightRng::from_os();
        let mut b = LightRng::from_os();
        let a_rolls: Vec<u32> = (0..16).map(|_| a.roll(u32::MAX)).collect();
        let b_rolls: Vec<u32> = (0..16).map(|_| b.roll(u32::MAX)).collect();
        assert_ne!(a_rolls, b_rolls);
    }

    #[test]
    fn test_degenerate_ranges() {
        let mut rng = LightRng::from_seed(1);
        assert_eq!(rng.roll(0), 0);
        assert_eq!(rng.range_ms(500, 500), 500);
        assert_eq!(rng.range_ms(900, 100), 900);
        assert!(rng.pick::<u8>(&[]).is_none());
        assert!(!rng.chance(f64::NAN));
    }
}
