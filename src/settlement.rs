//! Settlement contract
//!
//! Turn consumption and score submission belong to an external service.
//! Submission is fire-and-forget: the service hands back a `PendingReward`
//! that the controller polls once per frame.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::state::GameMode;

/// Final result handed to settlement at game over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub score: u64,
    pub round: u32,
    pub mode: GameMode,
    /// Highest score reachable at `round`; anything above it is rejected
    pub ceiling: u64,
}

impl ScoreSubmission {
    pub fn is_plausible(&self) -> bool {
        self.score <= self.ceiling
    }
}

/// Reward granted for a settled score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenReward {
    /// Decimal string, never parsed by the engine
    pub tokens_earned: String,
    pub transaction_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("settlement rejected the score: {0}")]
    Rejected(String),
    #[error("settlement service unavailable")]
    Unavailable,
    #[error("settlement dropped the request without answering")]
    Dropped,
}

pub type RewardResult = Result<TokenReward, SettlementError>;

/// Receiving half of a one-shot settlement answer
#[derive(Debug)]
pub struct PendingReward {
    rx: Receiver<RewardResult>,
}

/// Sending half, owned by the settlement implementation
#[derive(Debug)]
pub struct RewardSender {
    tx: Sender<RewardResult>,
}

impl RewardSender {
    /// Deliver the answer; a receiver that already went away is ignored
    pub fn resolve(self, result: RewardResult) {
        let _ = self.tx.send(result);
    }
}

impl PendingReward {
    pub fn channel() -> (RewardSender, PendingReward) {
        let (tx, rx) = mpsc::channel();
        (RewardSender { tx }, PendingReward { rx })
    }

    /// Already resolved
    pub fn ready(result: RewardResult) -> Self {
        let (tx, pending) = Self::channel();
        tx.resolve(result);
        pending
    }

    /// Non-blocking check. `None` while still in flight.
    pub fn poll(&self) -> Option<RewardResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SettlementError::Dropped)),
        }
    }
}

/// External turn and score service
pub trait Settlement {
    /// Spend one play; false when the player has none left
    fn consume_turn(&mut self) -> bool;
    fn submit_score(&mut self, submission: ScoreSubmission) -> PendingReward;
}

/// In-process settlement for headless runs and tests
///
/// Grants a fixed number of turns and pays one token per ten points.
#[derive(Debug, Clone, Default)]
pub struct OfflineSettlement {
    turns: Option<u32>,
    pub submissions: Vec<ScoreSubmission>,
    /// Answer every submission with this error instead of a reward
    pub fail_with: Option<SettlementError>,
}

impl OfflineSettlement {
    /// Unlimited turns
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_turns(turns: u32) -> Self {
        Self {
            turns: Some(turns),
            ..Self::default()
        }
    }

    pub fn turns_left(&self) -> Option<u32> {
        self.turns
    }
}

impl Settlement for OfflineSettlement {
    fn consume_turn(&mut self) -> bool {
        match self.turns.as_mut() {
            None => true,
            Some(0) => false,
            Some(turns) => {
                *turns -= 1;
                true
            }
        }
    }

    fn submit_score(&mut self, submission: ScoreSubmission) -> PendingReward {
        let result = match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(TokenReward {
                tokens_earned: format!("{}.{}", submission.score / 10, submission.score % 10),
                transaction_ref: format!("offline-{}", self.submissions.len() + 1),
            }),
        };
        self.submissions.push(submission);
        PendingReward::ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(score: u64) -> ScoreSubmission {
        ScoreSubmission {
            score,
            round: 4,
            mode: GameMode::Arcade,
            ceiling: 100,
        }
    }

    #[test]
    fn test_pending_reward_resolves_once() {
        let (tx, pending) = PendingReward::channel();
        assert_eq!(pending.poll(), None);
        tx.resolve(Err(SettlementError::Unavailable));
        assert_eq!(pending.poll(), Some(Err(SettlementError::Unavailable)));
        // Sender is gone now
        assert_eq!(pending.poll(), Some(Err(SettlementError::Dropped)));
    }

    #[test]
    fn test_dropped_sender_reports_dropped() {
        let (tx, pending) = PendingReward::channel();
        drop(tx);
        assert_eq!(pending.poll(), Some(Err(SettlementError::Dropped)));
    }

    #[test]
    fn test_offline_turns() {
        let mut settlement = OfflineSettlement::with_turns(2);
        assert!(settlement.consume_turn());
        assert!(settlement.consume_turn());
        assert!(!settlement.consume_turn());
        assert_eq!(settlement.turns_left(), Some(0));

        let mut unlimited = OfflineSettlement::new();
        for _ in 0..100 {
            assert!(unlimited.consume_turn());
        }
    }

    #[test]
    fn test_offline_submission() {
        let mut settlement = OfflineSettlement::new();
        let pending = settlement.submit_score(submission(57));
        let reward = pending.poll().unwrap().unwrap();
        assert_eq!(reward.tokens_earned, "5.7");
        assert_eq!(reward.transaction_ref, "offline-1");
        assert_eq!(settlement.submissions, vec![submission(57)]);

        settlement.fail_with = Some(SettlementError::Rejected("nope".into()));
        let pending = settlement.submit_score(submission(10));
        assert!(matches!(pending.poll(), Some(Err(SettlementError::Rejected(_)))));
    }

    #[test]
    fn test_plausibility() {
        assert!(submission(100).is_plausible());
        assert!(!submission(101).is_plausible());
    }
}
