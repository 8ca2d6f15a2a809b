//! Red Light Rush entry point
//!
//! Native: headless autoplay. A bot with a human-ish reaction delay plays
//! one session against the offline settlement and prints the final
//! snapshot as JSON. wasm32: the library's start hook does the work.
//!
//! Usage: `red-light-rush [classic|arcade|whack] [seed] [reaction_ms]`

#[cfg(not(target_arch = "wasm32"))]
mod autoplay {
    use std::collections::HashMap;

    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    use red_light_rush::feedback::LogSink;
    use red_light_rush::highscores::{HighScoreStore, StoredHighScores};
    use red_light_rush::persistence::FileStore;
    use red_light_rush::platform::Clock;
    use red_light_rush::settlement::OfflineSettlement;
    use red_light_rush::sim::{GameMode, GamePhase, LightColor, TickInput};
    use red_light_rush::{GameController, Settings};

    /// Virtual frame length (ms)
    const FRAME_MS: u64 = 16;
    /// Give up after ten virtual minutes
    const MAX_RUN_MS: u64 = 10 * 60 * 1000;
    /// Chance the bot actually reacts to a green it has noticed
    const HIT_CHANCE: f64 = 0.93;

    struct Options {
        mode: GameMode,
        seed: u64,
        reaction_ms: u64,
    }

    fn parse_args() -> Options {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mode = args
            .first()
            .and_then(|m| GameMode::from_str(m))
            .unwrap_or(GameMode::Arcade);
        let seed = args
            .get(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(rand::random);
        let reaction_ms = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(250);
        Options {
            mode,
            seed,
            reaction_ms,
        }
    }

    pub fn run() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let options = parse_args();
        let clock = Clock::new();

        let dir = std::env::temp_dir().join("red-light-rush");
        let mut settings_store = FileStore::new(&dir);
        let settings = Settings::load(&settings_store);
        // Leave an editable copy behind
        settings.save(&mut settings_store);
        let feedback = LogSink::from_settings(&settings);
        let mut game = GameController::new(
            settings,
            OfflineSettlement::new(),
            StoredHighScores::new(FileStore::new(&dir)),
            feedback,
        )
        .with_seed(options.seed);

        log::info!(
            "Autoplay {} seed={} reaction={}ms (best so far {})",
            options.mode.as_str(),
            options.seed,
            options.reaction_ms,
            game.high_scores.read_high_score(options.mode)
        );

        if let Err(e) = game.start_game(options.mode, 0) {
            log::error!("Could not start: {}", e);
            return;
        }

        let mut bot = ChaCha20Rng::seed_from_u64(options.seed ^ 0x5eed);
        // Light id (0 for the single light) -> when the bot noticed it green
        let mut noticed: HashMap<u32, u64> = HashMap::new();
        let mut now = 0;

        while game.phase() == GamePhase::Playing && now < MAX_RUN_MS {
            now += FRAME_MS;
            let Some(session) = game.session() else {
                break;
            };
            let mut input = TickInput::default();

            if let Some(power_up) = session.power_ups.available.first() {
                input.tap_power_up = Some(power_up.id);
            } else if session.power_ups.active.is_empty() {
                input.activate_collected = session.power_ups.collected.first().map(|p| p.id);
            }

            if session.mode.is_whack() {
                noticed.retain(|id, _| {
                    session
                        .whack_lights
                        .iter()
                        .any(|l| l.id == *id && l.color == LightColor::Green && !l.cleared)
                });
                for light in &session.whack_lights {
                    if light.cleared || light.color != LightColor::Green {
                        continue;
                    }
                    let seen = *noticed.entry(light.id).or_insert(now);
                    if input.tap_light.is_none() && now - seen >= options.reaction_ms {
                        if bot.random_bool(HIT_CHANCE) {
                            input.tap_light = Some(light.id);
                        } else {
                            // Hesitated; try again after another reaction
                            let _ = noticed.insert(light.id, now);
                        }
                    }
                }
            } else if session.light.color == LightColor::Green && !session.light.tapped_during_green {
                let seen = *noticed.entry(0).or_insert(now);
                if now - seen >= options.reaction_ms {
                    input.tap = bot.random_bool(HIT_CHANCE);
                    let _ = noticed.remove(&0);
                }
            } else {
                let _ = noticed.remove(&0);
            }

            game.frame(&input, now);
        }

        // One more frame to pick up the settlement answer
        game.frame(&TickInput::default(), now + FRAME_MS);
        if game.settlement_pending() {
            log::warn!("Settlement still pending at exit");
        }
        if let Some(best) = game.high_scores.board().best_for(options.mode) {
            log::info!(
                "Leaderboard best for {}: {} (round {})",
                options.mode.as_str(),
                best.score,
                best.round
            );
        }

        match game.snapshot() {
            Some(snapshot) => {
                log::info!(
                    "Finished in {}ms of game time ({}ms wall)",
                    now,
                    clock.now_ms()
                );
                match serde_json::to_string_pretty(&snapshot) {
                    Ok(json) => println!("{}", json),
                    Err(e) => log::error!("Could not encode snapshot: {}", e),
                }
            }
            None => log::warn!("No session to report"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    autoplay::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_main
}
