//! Game session controller
//!
//! Owns the live `Session` and its collaborators. The host calls `frame`
//! once per animation frame; inputs are routed through the same path so
//! every mutation happens inside one tick.

use thiserror::Error;

use crate::feedback::{self, FeedbackSink};
use crate::highscores::{HighScoreEntry, HighScoreStore};
use crate::settings::Settings;
use crate::settlement::{PendingReward, Settlement};
use crate::sim::rng::LightRng;
use crate::sim::state::{Effect, GameMode, GamePhase, Session, SessionSnapshot};
use crate::sim::tick::{TickInput, tick};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("no turns available")]
    NoTurns,
    #[error("a game is already in progress")]
    AlreadyPlaying,
}

/// Top-level orchestrator
pub struct GameController<S, H, F>
where
    S: Settlement,
    H: HighScoreStore,
    F: FeedbackSink,
{
    pub settings: Settings,
    pub settlement: S,
    pub high_scores: H,
    pub feedback: F,
    session: Option<Session>,
    pending: Option<PendingReward>,
    effects: Vec<Effect>,
    seed: Option<u64>,
}

impl<S, H, F> GameController<S, H, F>
where
    S: Settlement,
    H: HighScoreStore,
    F: FeedbackSink,
{
    pub fn new(settings: Settings, settlement: S, high_scores: H, feedback: F) -> Self {
        Self {
            settings,
            settlement,
            high_scores,
            feedback,
            session: None,
            pending: None,
            effects: Vec::new(),
            seed: None,
        }
    }

    /// Seed every session's RNG instead of drawing from the OS
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Spend a turn and begin a session in `mode`
    pub fn start_game(&mut self, mode: GameMode, now: u64) -> Result<(), StartError> {
        if matches!(self.phase(), GamePhase::Playing | GamePhase::Paused) {
            return Err(StartError::AlreadyPlaying);
        }
        if !self.settlement.consume_turn() {
            log::warn!("Cannot start {} game: no turns left", mode.as_str());
            return Err(StartError::NoTurns);
        }

        let high_score = self.high_scores.read_high_score(mode);
        let rng = match self.seed {
            Some(seed) => LightRng::from_seed(seed),
            None => LightRng::from_os(),
        };
        self.pending = None;
        self.session = Some(Session::new(
            mode,
            self.settings.tuning,
            self.settings.power_up_flow,
            high_score,
            rng,
            now,
        ));
        log::info!(
            "Starting {} game (power-ups: {}, best {})",
            mode.as_str(),
            self.settings.power_up_flow.as_str(),
            high_score
        );
        Ok(())
    }

    /// Run one frame: settle rewards, tick, then execute effects
    pub fn frame(&mut self, input: &TickInput, now: u64) {
        self.poll_settlement();

        let Some(session) = self.session.as_mut() else {
            return;
        };
        tick(session, input, now, &mut self.effects);
        self.flush_effects(now);
    }

    pub fn tap(&mut self, now: u64) {
        self.frame(&TickInput::tap(), now);
    }

    pub fn tap_light(&mut self, id: u32, now: u64) {
        self.frame(&TickInput::tap_light(id), now);
    }

    pub fn tap_power_up(&mut self, id: u32, now: u64) {
        let input = TickInput {
            tap_power_up: Some(id),
            ..Default::default()
        };
        self.frame(&input, now);
    }

    pub fn activate_collected(&mut self, id: u32, now: u64) {
        let input = TickInput {
            activate_collected: Some(id),
            ..Default::default()
        };
        self.frame(&input, now);
    }

    pub fn toggle_pause(&mut self, now: u64) {
        self.frame(&TickInput::pause(), now);
    }

    /// Host visibility changed. Hiding pauses; showing again leaves the
    /// session paused until the player resumes.
    pub fn visibility_changed(&mut self, hidden: bool, now: u64) {
        if hidden && self.settings.pause_on_hidden && self.phase() == GamePhase::Playing {
            log::info!("Hidden, pausing");
            self.toggle_pause(now);
        }
    }

    /// Drop the session and return to the menu
    pub fn reset_game(&mut self) {
        self.session = None;
        self.pending = None;
        self.effects.clear();
    }

    pub fn phase(&self) -> GamePhase {
        self.session.as_ref().map_or(GamePhase::Menu, |s| s.phase)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(Session::snapshot)
    }

    /// A submitted score is still waiting on settlement
    pub fn settlement_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn poll_settlement(&mut self) {
        let Some(result) = self.pending.as_ref().and_then(PendingReward::poll) else {
            return;
        };
        self.pending = None;

        match result {
            Ok(reward) => {
                log::info!(
                    "Settled: {} tokens ({})",
                    reward.tokens_earned,
                    reward.transaction_ref
                );
                if let Some(session) = self.session.as_mut() {
                    session.token_reward = Some(reward);
                }
            }
            Err(e) => log::warn!("Score settlement failed: {}", e),
        }
    }

    fn flush_effects(&mut self, now: u64) {
        let mut effects = std::mem::take(&mut self.effects);
        for effect in effects.drain(..) {
            match effect {
                Effect::Cue(cue) => feedback::dispatch(&mut self.feedback, cue),
                Effect::SubmitScore(submission) => {
                    if !submission.is_plausible() {
                        log::warn!(
                            "Refusing to submit score {} above ceiling {} at round {}",
                            submission.score,
                            submission.ceiling,
                            submission.round
                        );
                        continue;
                    }
                    self.high_scores.record_run(HighScoreEntry {
                        score: submission.score,
                        round: submission.round,
                        mode: submission.mode,
                        timestamp: now,
                    });
                    self.pending = Some(self.settlement.submit_score(submission));
                }
                Effect::PersistHighScore { mode, score, .. } => {
                    self.high_scores.persist_high_score(mode, score);
                }
            }
        }
        // Hand the allocation back
        self.effects = effects;
    }
}
