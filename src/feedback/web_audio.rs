//! Browser output using the Web Audio API and `navigator.vibrate`
//!
//! Procedurally generated tones - no external files needed.

use js_sys::Array;
use wasm_bindgen::JsValue;
use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use super::{CueOutput, Haptic, SoundEffect};

/// A short run of notes played back to back
struct Tone {
    notes: &'static [f32],
    wave: OscillatorType,
    /// Gap between note starts (s)
    step: f64,
    /// Length of each note (s)
    length: f64,
    gain: f32,
}

fn tone_for(effect: SoundEffect) -> Tone {
    use OscillatorType::{Sawtooth, Sine, Square, Triangle};
    let (notes, wave, step, length, gain): (&'static [f32], _, _, _, _) = match effect {
        SoundEffect::Go => (&[660.0, 880.0], Sine, 0.06, 0.12, 0.3),
        SoundEffect::Stop => (&[330.0], Square, 0.0, 0.15, 0.15),
        SoundEffect::Repeat => (&[520.0, 520.0], Triangle, 0.08, 0.06, 0.2),
        SoundEffect::CorrectTap => (&[1000.0], Sine, 0.0, 0.08, 0.3),
        SoundEffect::IncorrectTap => (&[140.0], Sawtooth, 0.0, 0.25, 0.25),
        SoundEffect::ShieldBlock => (&[300.0, 600.0], Triangle, 0.05, 0.15, 0.25),
        SoundEffect::LifeLost => (&[300.0, 200.0], Sawtooth, 0.12, 0.2, 0.2),
        SoundEffect::LifeGained => (&[500.0, 750.0, 1000.0], Sine, 0.07, 0.15, 0.25),
        SoundEffect::RoundUp => (&[700.0, 900.0], Triangle, 0.05, 0.08, 0.15),
        SoundEffect::PowerUpSpawn => (&[1200.0], Sine, 0.0, 0.1, 0.12),
        SoundEffect::PowerUpCollect => (&[600.0, 800.0, 1000.0], Sine, 0.08, 0.15, 0.25),
        SoundEffect::PowerUpActivate => (&[400.0, 800.0, 1200.0], Triangle, 0.05, 0.2, 0.25),
        SoundEffect::GameOver => (&[400.0, 350.0, 300.0, 200.0], Sine, 0.2, 0.3, 0.3),
        SoundEffect::HighScore => (&[500.0, 600.0, 700.0, 800.0, 1000.0], Triangle, 0.08, 0.25, 0.25),
    };
    Tone {
        notes,
        wave,
        step,
        length,
        gain,
    }
}

/// Web Audio + vibration output
pub struct WebAudioOutput {
    ctx: Option<AudioContext>,
    master_volume: f32,
}

impl Default for WebAudioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl WebAudioOutput {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: 0.8,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    fn create_osc(
        ctx: &AudioContext,
        freq: f32,
        wave: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(wave);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }
}

impl CueOutput for WebAudioOutput {
    fn play(&mut self, effect: SoundEffect) {
        let vol = self.master_volume;
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        // Browsers suspend the context until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        let tone = tone_for(effect);
        for (i, freq) in tone.notes.iter().enumerate() {
            let Some((osc, gain)) = Self::create_osc(ctx, *freq, tone.wave) else {
                continue;
            };
            let t = ctx.current_time() + i as f64 * tone.step;
            gain.gain().set_value_at_time(vol * tone.gain, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + tone.length)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + tone.length + 0.05).ok();
        }
    }

    fn vibrate(&mut self, haptic: Haptic) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let pattern: Array = haptic
            .pattern_ms()
            .iter()
            .map(|ms| JsValue::from_f64(*ms as f64))
            .collect();
        let _ = window.navigator().vibrate_with_pattern(&pattern);
    }
}
