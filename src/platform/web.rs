//! Browser host
//!
//! `WebGame` is the JS-facing handle. The page drives it from
//! `requestAnimationFrame`; settlement is delegated to two JS callbacks.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::{is_hidden, now_ms};
use crate::feedback::{CueSink, WebAudioOutput};
use crate::highscores::StoredHighScores;
use crate::persistence::LocalStore;
use crate::session::GameController;
use crate::settings::Settings;
use crate::settlement::{
    PendingReward, RewardSender, ScoreSubmission, Settlement, SettlementError, TokenReward,
};
use crate::sim::state::GameMode;

#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Red Light Rush starting...");
}

/// Settlement backed by page-provided callbacks.
///
/// `consume_turn()` must return a truthy value synchronously. `submit(json)`
/// starts the request; the page answers later through `WebGame::settle` or
/// `WebGame::settle_failed`.
struct JsSettlement {
    consume_turn: Function,
    submit: Function,
    outstanding: Rc<RefCell<Option<RewardSender>>>,
}

impl Settlement for JsSettlement {
    fn consume_turn(&mut self) -> bool {
        match self.consume_turn.call0(&JsValue::NULL) {
            Ok(value) => value.is_truthy(),
            Err(e) => {
                log::warn!("consume_turn threw: {:?}", e);
                false
            }
        }
    }

    fn submit_score(&mut self, submission: ScoreSubmission) -> PendingReward {
        let json = match serde_json::to_string(&submission) {
            Ok(json) => json,
            Err(e) => {
                return PendingReward::ready(Err(SettlementError::Rejected(e.to_string())));
            }
        };
        if let Err(e) = self.submit.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            log::warn!("submit threw: {:?}", e);
            return PendingReward::ready(Err(SettlementError::Unavailable));
        }
        let (tx, pending) = PendingReward::channel();
        *self.outstanding.borrow_mut() = Some(tx);
        pending
    }
}

type WebController = GameController<JsSettlement, StoredHighScores<LocalStore>, CueSink<WebAudioOutput>>;

#[wasm_bindgen]
pub struct WebGame {
    controller: Rc<RefCell<WebController>>,
    outstanding: Rc<RefCell<Option<RewardSender>>>,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new(consume_turn: Function, submit: Function) -> WebGame {
        let settings = Settings::load(&LocalStore);
        let outstanding = Rc::new(RefCell::new(None));
        let settlement = JsSettlement {
            consume_turn,
            submit,
            outstanding: outstanding.clone(),
        };
        let feedback = CueSink::new(WebAudioOutput::new(), &settings);
        let controller = GameController::new(
            settings,
            settlement,
            StoredHighScores::new(LocalStore),
            feedback,
        );
        let game = WebGame {
            controller: Rc::new(RefCell::new(controller)),
            outstanding,
        };
        game.install_auto_pause();
        game
    }

    /// Returns false when the mode is unknown or no turn was available
    pub fn start(&self, mode: &str) -> bool {
        let Some(mode) = GameMode::from_str(mode) else {
            log::warn!("Unknown mode {:?}", mode);
            return false;
        };
        let mut controller = self.controller.borrow_mut();
        controller.feedback.output.resume();
        match controller.start_game(mode, now_ms()) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Start failed: {}", e);
                false
            }
        }
    }

    pub fn frame(&self) {
        self.controller.borrow_mut().frame(&Default::default(), now_ms());
    }

    pub fn tap(&self) {
        self.controller.borrow_mut().tap(now_ms());
    }

    pub fn tap_light(&self, id: u32) {
        self.controller.borrow_mut().tap_light(id, now_ms());
    }

    pub fn tap_power_up(&self, id: u32) {
        self.controller.borrow_mut().tap_power_up(id, now_ms());
    }

    pub fn activate_collected(&self, id: u32) {
        self.controller.borrow_mut().activate_collected(id, now_ms());
    }

    pub fn toggle_pause(&self) {
        self.controller.borrow_mut().toggle_pause(now_ms());
    }

    pub fn reset(&self) {
        self.controller.borrow_mut().reset_game();
    }

    /// Session snapshot as JSON, or an empty string in the menu
    pub fn snapshot_json(&self) -> String {
        self.controller
            .borrow()
            .snapshot()
            .and_then(|s| serde_json::to_string(&s).ok())
            .unwrap_or_default()
    }

    pub fn settle(&self, tokens_earned: String, transaction_ref: String) {
        if let Some(tx) = self.outstanding.borrow_mut().take() {
            tx.resolve(Ok(TokenReward {
                tokens_earned,
                transaction_ref,
            }));
        }
    }

    pub fn settle_failed(&self, reason: String) {
        if let Some(tx) = self.outstanding.borrow_mut().take() {
            tx.resolve(Err(SettlementError::Rejected(reason)));
        }
    }
}

impl WebGame {
    fn install_auto_pause(&self) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let controller = self.controller.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            // Skip if the controller is mid-call; the next change catches up
            if let Ok(mut c) = controller.try_borrow_mut() {
                c.visibility_changed(is_hidden(), now_ms());
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}
