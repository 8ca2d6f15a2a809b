//! Audio/haptic feedback
//!
//! The sim only emits `Cue`s. A `FeedbackSink` turns them into sounds,
//! vibrations or log lines. Every hook is fire-and-forget.

#[cfg(target_arch = "wasm32")]
mod web_audio;

#[cfg(target_arch = "wasm32")]
pub use web_audio::WebAudioOutput;

use crate::settings::Settings;
use crate::sim::state::{Cue, LightColor};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Light turned green
    Go,
    /// Light turned red
    Stop,
    /// Same color again
    Repeat,
    CorrectTap,
    IncorrectTap,
    /// Shield ate a violation
    ShieldBlock,
    LifeLost,
    LifeGained,
    RoundUp,
    PowerUpSpawn,
    PowerUpCollect,
    PowerUpActivate,
    GameOver,
    HighScore,
}

/// Vibration patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Haptic {
    Tick,
    Success,
    Warning,
    Error,
    Heavy,
}

impl Haptic {
    /// On/off pattern in ms
    pub fn pattern_ms(&self) -> &'static [u32] {
        match self {
            Haptic::Tick => &[10],
            Haptic::Success => &[20, 40, 20],
            Haptic::Warning => &[60],
            Haptic::Error => &[80, 50, 80],
            Haptic::Heavy => &[200, 100, 300],
        }
    }
}

/// Sound for a cue
pub fn sound_for(cue: Cue) -> SoundEffect {
    match cue {
        Cue::LightChanged {
            consecutive: true, ..
        } => SoundEffect::Repeat,
        Cue::LightChanged {
            color: LightColor::Green,
            ..
        } => SoundEffect::Go,
        Cue::LightChanged {
            color: LightColor::Red,
            ..
        } => SoundEffect::Stop,
        Cue::RoundAdvanced { .. } => SoundEffect::RoundUp,
        Cue::CorrectTap => SoundEffect::CorrectTap,
        Cue::IncorrectTap => SoundEffect::IncorrectTap,
        Cue::ShieldAbsorbed => SoundEffect::ShieldBlock,
        Cue::LifeLost => SoundEffect::LifeLost,
        Cue::LifeGained => SoundEffect::LifeGained,
        Cue::GameOver => SoundEffect::GameOver,
        Cue::NewHighScore => SoundEffect::HighScore,
        Cue::PowerUpSpawned => SoundEffect::PowerUpSpawn,
        Cue::PowerUpCollected => SoundEffect::PowerUpCollect,
        Cue::PowerUpActivated => SoundEffect::PowerUpActivate,
    }
}

/// Vibration for a cue, if any
pub fn haptic_for(cue: Cue) -> Option<Haptic> {
    match cue {
        Cue::CorrectTap | Cue::PowerUpCollected => Some(Haptic::Tick),
        Cue::PowerUpActivated | Cue::LifeGained | Cue::NewHighScore => Some(Haptic::Success),
        Cue::ShieldAbsorbed => Some(Haptic::Warning),
        Cue::IncorrectTap | Cue::LifeLost => Some(Haptic::Error),
        Cue::GameOver => Some(Haptic::Heavy),
        Cue::LightChanged { .. } | Cue::RoundAdvanced { .. } | Cue::PowerUpSpawned => None,
    }
}

/// Presentation hooks called by the controller
pub trait FeedbackSink {
    fn on_light_change(&mut self, _color: LightColor, _consecutive: bool) {}
    fn on_round_advanced(&mut self, _round: u32) {}
    fn on_correct_tap(&mut self) {}
    fn on_incorrect_tap(&mut self) {}
    fn on_shield_absorbed(&mut self) {
        self.on_incorrect_tap();
    }
    fn on_life_lost(&mut self) {}
    fn on_life_gained(&mut self) {}
    fn on_game_over(&mut self) {}
    fn on_new_high_score(&mut self) {}
    fn on_power_up_spawn(&mut self) {}
    fn on_power_up_collect(&mut self) {}
    fn on_power_up_activate(&mut self) {}
}

/// Route one cue to the matching hook
pub fn dispatch<F: FeedbackSink + ?Sized>(sink: &mut F, cue: Cue) {
    match cue {
        Cue::LightChanged { color, consecutive } => sink.on_light_change(color, consecutive),
        Cue::RoundAdvanced { round } => sink.on_round_advanced(round),
        Cue::CorrectTap => sink.on_correct_tap(),
        Cue::IncorrectTap => sink.on_incorrect_tap(),
        Cue::ShieldAbsorbed => sink.on_shield_absorbed(),
        Cue::LifeLost => sink.on_life_lost(),
        Cue::LifeGained => sink.on_life_gained(),
        Cue::GameOver => sink.on_game_over(),
        Cue::NewHighScore => sink.on_new_high_score(),
        Cue::PowerUpSpawned => sink.on_power_up_spawn(),
        Cue::PowerUpCollected => sink.on_power_up_collect(),
        Cue::PowerUpActivated => sink.on_power_up_activate(),
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FeedbackSink for NullSink {}

/// Device that can actually make noise or buzz
pub trait CueOutput {
    fn play(&mut self, effect: SoundEffect);
    fn vibrate(&mut self, haptic: Haptic);
}

/// Writes cues to the log instead of a device
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOutput;

impl CueOutput for LogOutput {
    fn play(&mut self, effect: SoundEffect) {
        log::debug!("sound {:?}", effect);
    }

    fn vibrate(&mut self, haptic: Haptic) {
        log::debug!("haptic {:?} {:?}", haptic, haptic.pattern_ms());
    }
}

/// Maps cues onto a `CueOutput`, honouring the sound/haptics toggles
#[derive(Debug, Clone)]
pub struct CueSink<O: CueOutput> {
    pub output: O,
    pub sound: bool,
    pub haptics: bool,
}

pub type LogSink = CueSink<LogOutput>;

impl<O: CueOutput> CueSink<O> {
    pub fn new(output: O, settings: &Settings) -> Self {
        Self {
            output,
            sound: settings.sound,
            haptics: settings.haptics,
        }
    }

    fn emit(&mut self, cue: Cue) {
        if self.sound {
            self.output.play(sound_for(cue));
        }
        if self.haptics {
            if let Some(haptic) = haptic_for(cue) {
                self.output.vibrate(haptic);
            }
        }
    }
}

impl LogSink {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(LogOutput, settings)
    }
}

impl<O: CueOutput> FeedbackSink for CueSink<O> {
    fn on_light_change(&mut self, color: LightColor, consecutive: bool) {
        self.emit(Cue::LightChanged { color, consecutive });
    }

    fn on_round_advanced(&mut self, round: u32) {
        self.emit(Cue::RoundAdvanced { round });
    }

    fn on_correct_tap(&mut self) {
        self.emit(Cue::CorrectTap);
    }

    fn on_incorrect_tap(&mut self) {
        self.emit(Cue::IncorrectTap);
    }

    fn on_shield_absorbed(&mut self) {
        self.emit(Cue::ShieldAbsorbed);
    }

    fn on_life_lost(&mut self) {
        self.emit(Cue::LifeLost);
    }

    fn on_life_gained(&mut self) {
        self.emit(Cue::LifeGained);
    }

    fn on_game_over(&mut self) {
        self.emit(Cue::GameOver);
    }

    fn on_new_high_score(&mut self) {
        self.emit(Cue::NewHighScore);
    }

    fn on_power_up_spawn(&mut self) {
        self.emit(Cue::PowerUpSpawned);
    }

    fn on_power_up_collect(&mut self) {
        self.emit(Cue::PowerUpCollected);
    }

    fn on_power_up_activate(&mut self) {
        self.emit(Cue::PowerUpActivated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        sounds: Vec<SoundEffect>,
        haptics: Vec<Haptic>,
    }

    impl CueOutput for Recorder {
        fn play(&mut self, effect: SoundEffect) {
            self.sounds.push(effect);
        }

        fn vibrate(&mut self, haptic: Haptic) {
            self.haptics.push(haptic);
        }
    }

    #[derive(Default)]
    struct Counter {
        incorrect: u32,
    }

    impl FeedbackSink for Counter {
        fn on_incorrect_tap(&mut self) {
            self.incorrect += 1;
        }
    }

    #[test]
    fn test_shield_defaults_to_incorrect_tap() {
        let mut sink = Counter::default();
        dispatch(&mut sink, Cue::ShieldAbsorbed);
        dispatch(&mut sink, Cue::IncorrectTap);
        dispatch(&mut sink, Cue::CorrectTap);
        assert_eq!(sink.incorrect, 2);
    }

    #[test]
    fn test_cue_sink_maps_and_gates() {
        let mut settings = Settings::default();
        let mut sink = CueSink::new(Recorder::default(), &settings);
        dispatch(&mut sink, Cue::GameOver);
        dispatch(
            &mut sink,
            Cue::LightChanged {
                color: LightColor::Green,
                consecutive: false,
            },
        );
        assert_eq!(
            sink.output.sounds,
            vec![SoundEffect::GameOver, SoundEffect::Go]
        );
        assert_eq!(sink.output.haptics, vec![Haptic::Heavy]);

        settings.sound = false;
        let mut muted = CueSink::new(Recorder::default(), &settings);
        dispatch(&mut muted, Cue::LifeLost);
        assert!(muted.output.sounds.is_empty());
        assert_eq!(muted.output.haptics, vec![Haptic::Error]);
    }

    #[test]
    fn test_consecutive_light_has_its_own_sound() {
        let cue = Cue::LightChanged {
            color: LightColor::Red,
            consecutive: true,
        };
        assert_eq!(sound_for(cue), SoundEffect::Repeat);
        assert_eq!(haptic_for(cue), None);
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let mut sink = NullSink;
        dispatch(&mut sink, Cue::NewHighScore);
        dispatch(&mut sink, Cue::RoundAdvanced { round: 3 });
    }
}
