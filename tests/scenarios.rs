use red_light_rush::feedback::NullSink;
use red_light_rush::highscores::{HighScoreStore, StoredHighScores};
use red_light_rush::persistence::MemoryStore;
use red_light_rush::settlement::OfflineSettlement;
use red_light_rush::sim::effects::ActivePowerUp;
use red_light_rush::sim::scoring::power_up_bonus;
use red_light_rush::sim::{
    Cue, Effect, GameMode, GamePhase, LightColor, LightRng, PowerUp, PowerUpKind, Session,
    TickInput, classic, tick, whack,
};
use red_light_rush::{GameConfig, GameController, PowerUpFlow, Settings};

fn session(mode: GameMode, seed: u64) -> Session {
    Session::new(
        mode,
        GameConfig::default(),
        PowerUpFlow::TapToActivate,
        0,
        LightRng::from_seed(seed),
        0,
    )
}

fn force_green(s: &mut Session) {
    s.light.color = LightColor::Green;
    s.light.tapped_during_green = false;
}

fn shield(s: &mut Session) {
    s.power_ups.active = vec![ActivePowerUp {
        power_up: PowerUp::from_template(1, PowerUpKind::Shield.template(), 0),
        start_time: 0,
        end_time: 10_000,
        is_active: true,
    }];
}

// ── scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn scenario_a_first_green_tap() {
    let mut s = session(GameMode::Arcade, 1);
    force_green(&mut s);
    let mut out = Vec::new();
    classic::handle_tap(&mut s, 50, &mut out);
    assert_eq!(s.stats.current_score, 10);
    assert_eq!(s.stats.streak, 1);
    assert_eq!(s.stats.round, 2);
}

#[test]
fn scenario_b_streak_bonus() {
    let mut s = session(GameMode::Classic, 2);
    // Streak reaches 6 with this tap
    s.stats.streak = 5;
    force_green(&mut s);
    let mut out = Vec::new();
    classic::handle_tap(&mut s, 50, &mut out);
    assert_eq!(s.stats.streak, 6);
    assert_eq!(s.stats.current_score, 13);
}

#[test]
fn scenario_c_shield_absorbs_red_tap() {
    let mut s = session(GameMode::Arcade, 3);
    shield(&mut s);
    s.stats.streak = 4;
    let mut out = Vec::new();
    tick(&mut s, &TickInput::tap(), 20, &mut out);
    assert_eq!(s.stats.lives, 3);
    assert_eq!(s.stats.streak, 4);
    assert!(!s.power_ups.has_active_shield());
    assert!(out.contains(&Effect::Cue(Cue::ShieldAbsorbed)));
    assert!(!out.contains(&Effect::Cue(Cue::LifeLost)));
}

#[test]
fn scenario_d_last_life_submits_once() {
    let mut game = GameController::new(
        Settings::default(),
        OfflineSettlement::new(),
        StoredHighScores::new(MemoryStore::new()),
        NullSink,
    )
    .with_seed(4);
    game.start_game(GameMode::Classic, 0).unwrap();

    // Score once, then burn lives down to one
    let session = game.session().unwrap();
    let deadline = session.next_light_change;
    assert_eq!(session.light.color, LightColor::Red);
    game.tap(10);
    game.tap(20);
    assert_eq!(game.session().unwrap().stats.lives, 1);

    // Ride the schedule until the light has been green and gone untouched
    let mut now = deadline;
    let mut scored = false;
    while game.phase() == GamePhase::Playing {
        let s = game.session().unwrap();
        if !scored && s.light.color == LightColor::Green {
            game.tap(now);
            scored = true;
        }
        now += 16;
        game.frame(&TickInput::default(), now);
        assert!(now < 600_000, "never missed a green");
    }

    assert_eq!(game.phase(), GamePhase::GameOver);
    let round = game.session().unwrap().stats.round;
    assert_eq!(game.settlement.submissions.len(), 1);
    assert_eq!(game.settlement.submissions[0].score, 10);
    assert_eq!(game.settlement.submissions[0].round, round);

    // Further frames never resubmit
    for i in 1..10 {
        game.frame(&TickInput::default(), now + i * 16);
    }
    assert_eq!(game.settlement.submissions.len(), 1);
    assert_eq!(game.high_scores.read_high_score(GameMode::Classic), 10);
}

#[test]
fn scenario_e_whack_round_two() {
    let mut s = session(GameMode::Whack, 5);
    assert_eq!(s.whack_lights.len(), 1);
    let at = s.whack_lights[0].next_change;
    let mut out = Vec::new();
    whack::advance(&mut s, at, &mut out);
    assert_eq!(s.whack_lights[0].color, LightColor::Green);

    let id = s.whack_lights[0].id;
    whack::handle_tap(&mut s, id, at + 100, &mut out);
    assert_eq!(s.stats.round, 2);
    assert_eq!(s.whack_light_count, 2);
    assert_eq!(s.whack_lights.len(), 2);
    assert_ne!(s.whack_lights[0].slot, s.whack_lights[1].slot);
}

// ── design notes ──────────────────────────────────────────────────────────────

#[test]
fn multi_power_up_bonus_is_unreachable() {
    let mut s = session(GameMode::Arcade, 6);
    let mut out = Vec::new();
    for (i, kind) in PowerUpKind::ALL.iter().enumerate() {
        let id = 100 + i as u32;
        s.power_ups
            .available
            .push(PowerUp::from_template(id, kind.template(), 0));
        let input = TickInput {
            tap_power_up: Some(id),
            ..Default::default()
        };
        tick(&mut s, &input, 10 + i as u64, &mut out);
        assert!(s.power_ups.active.len() <= 1);
        assert!(s.power_ups.active_count() < 2);
    }
    // With one active entry the +50% term never fires
    let rarity_only = s.power_ups.active[0].power_up.rarity.bonus_points();
    assert_eq!(power_up_bonus(10, 0, &s.power_ups), rarity_only);
}

#[test]
fn resume_never_causes_instant_miss() {
    let mut s = session(GameMode::Classic, 7);
    force_green(&mut s);
    s.next_light_change = 500;
    let mut out = Vec::new();
    tick(&mut s, &TickInput::pause(), 100, &mut out);
    // Away for a minute
    tick(&mut s, &TickInput::pause(), 60_100, &mut out);
    tick(&mut s, &TickInput::default(), 60_116, &mut out);
    assert_eq!(s.stats.lives, 3);
    assert_eq!(s.light.color, LightColor::Green);
    assert_eq!(s.next_light_change, 60_500);
}

#[test]
fn late_tap_after_green_ends_is_a_miss() {
    let mut s = session(GameMode::Classic, 9);
    force_green(&mut s);
    s.next_light_change = 500;
    let mut out = Vec::new();
    // The frame carrying the tap arrives long after the deadline
    tick(&mut s, &TickInput::tap(), 5_000, &mut out);
    assert_eq!(s.stats.current_score, 0);
    assert_eq!(s.stats.lives, 2);
    assert_eq!(s.stats.round, 1);

    let mut w = session(GameMode::Whack, 9);
    let at = w.whack_lights[0].next_change;
    tick(&mut w, &TickInput::default(), at, &mut out);
    assert_eq!(w.whack_lights[0].color, LightColor::Green);
    let id = w.whack_lights[0].id;
    let expiry = w.whack_lights[0].green_expiry.unwrap();
    tick(&mut w, &TickInput::tap_light(id), expiry + 3_000, &mut out);
    assert_eq!(w.stats.current_score, 0);
    assert_eq!(w.stats.lives, 2);
    assert_eq!(w.stats.round, 1);
    assert!(!w.whack_lights[0].cleared);
}

#[test]
fn scheduler_transition_frequencies() {
    let mut s = session(GameMode::Classic, 8);
    let mut out = Vec::new();
    let (mut from_red, mut red_to_green) = (0u32, 0u32);
    let (mut from_green, mut green_to_red) = (0u32, 0u32);

    while from_red < 10_000 || from_green < 10_000 {
        let before = s.light.color;
        // Keep the session alive
        s.light.tapped_during_green = true;
        let at = s.next_light_change;
        advance_and_clear(&mut s, at, &mut out);
        match (before, s.light.color) {
            (LightColor::Red, next) => {
                from_red += 1;
                red_to_green += (next == LightColor::Green) as u32;
            }
            (LightColor::Green, next) => {
                from_green += 1;
                green_to_red += (next == LightColor::Red) as u32;
            }
        }
    }

    let green_rate = red_to_green as f64 / from_red as f64;
    let red_rate = green_to_red as f64 / from_green as f64;
    assert!((green_rate - 0.75).abs() <= 0.02, "red->green {}", green_rate);
    assert!((red_rate - 0.70).abs() <= 0.02, "green->red {}", red_rate);
    assert_eq!(s.stats.lives, 3);
}

fn advance_and_clear(s: &mut Session, at: u64, out: &mut Vec<Effect>) {
    classic::advance(s, at, out);
    out.clear();
}
