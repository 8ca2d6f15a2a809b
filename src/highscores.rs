//! High score tracking
//!
//! Best score per mode plus a top-10 leaderboard, persisted through a
//! `KeyValueStore`. Corrupt stored data reads as empty.

use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;
use crate::sim::state::GameMode;

/// Maximum number of leaderboard entries to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Round reached
    pub round: u32,
    pub mode: GameMode,
    /// Host timestamp (ms) when achieved
    pub timestamp: u64,
}

/// Where the controller reads and writes best scores
pub trait HighScoreStore {
    /// Stored best for `mode`; 0 when absent or unreadable
    fn read_high_score(&self, mode: GameMode) -> u64;
    fn persist_high_score(&mut self, mode: GameMode, score: u64);
    /// Offer a finished run to the leaderboard
    fn record_run(&mut self, _entry: HighScoreEntry) {}
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    const STORAGE_KEY: &'static str = "red_light_rush_highscores";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Add a run if it qualifies.
    /// Returns the rank achieved (1-indexed)
    pub fn add_score(&mut self, entry: HighScoreEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }

        // Sorted descending; ties keep the older run first
        let pos = self.entries.iter().position(|e| entry.score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Best leaderboard entry for one mode
    pub fn best_for(&self, mode: GameMode) -> Option<&HighScoreEntry> {
        self.entries.iter().find(|e| e.mode == mode)
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<HighScores>(&json) {
                Ok(scores) => {
                    log::info!("Loaded {} high scores", scores.entries.len());
                    return scores;
                }
                Err(e) => log::warn!("Discarding corrupt leaderboard: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Leaderboard unavailable: {}", e),
        }

        log::info!("No high scores found, starting fresh");
        Self::new()
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match serde_json::to_string(self) {
            Ok(json) => match store.set(Self::STORAGE_KEY, &json) {
                Ok(()) => log::info!("High scores saved ({} entries)", self.entries.len()),
                Err(e) => log::warn!("Failed to save high scores: {}", e),
            },
            Err(e) => log::warn!("Failed to encode high scores: {}", e),
        }
    }
}

/// `HighScoreStore` over any key/value backend
#[derive(Debug)]
pub struct StoredHighScores<K: KeyValueStore> {
    store: K,
    board: HighScores,
}

impl<K: KeyValueStore> StoredHighScores<K> {
    pub fn new(store: K) -> Self {
        let board = HighScores::load(&store);
        Self { store, board }
    }

    pub fn board(&self) -> &HighScores {
        &self.board
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    fn key(mode: GameMode) -> String {
        format!("red_light_rush_high_score_{}", mode.as_str())
    }
}

impl<K: KeyValueStore> HighScoreStore for StoredHighScores<K> {
    fn read_high_score(&self, mode: GameMode) -> u64 {
        match self.store.get(&Self::key(mode)) {
            Ok(Some(raw)) => match raw.trim().parse::<u64>() {
                Ok(score) => score,
                Err(e) => {
                    log::warn!("Corrupt {} high score {:?}: {}", mode.as_str(), raw, e);
                    0
                }
            },
            Ok(None) => 0,
            Err(e) => {
                log::warn!("High score unavailable: {}", e);
                0
            }
        }
    }

    fn persist_high_score(&mut self, mode: GameMode, score: u64) {
        match self.store.set(&Self::key(mode), &score.to_string()) {
            Ok(()) => log::info!("New {} high score {}", mode.as_str(), score),
            Err(e) => log::warn!("Failed to persist high score: {}", e),
        }
    }

    fn record_run(&mut self, entry: HighScoreEntry) {
        if self.board.add_score(entry).is_some() {
            self.board.save(&mut self.store);
        }
    }
}
