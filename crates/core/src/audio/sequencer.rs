//! The background loop: a sixteenth-note step counter driving a kick, a
//! snare, a hi-hat and a bass line from fixed patterns.

use std::time::Duration;

use super::tone::{GainEnvelope, PitchSweep, ToneRequest, VoiceSpec, Waveform, GAIN_FLOOR};

pub const DEFAULT_BPM: f32 = 130.0;

/// Bass frequencies in Hz per step; zero is a rest.
pub const BASS_PATTERN: [f32; 16] = [
    110.0, 0.0, 110.0, 0.0, 110.0, 0.0, 110.0, 0.0, //
    130.0, 0.0, 130.0, 0.0, 98.0, 0.0, 98.0, 0.0,
];

const HAT_FREQUENCY: f32 = 3_000.0;
const HAT_DURATION: f32 = 0.03;

/// Time between two steps: one sixteenth note at `bpm`.
pub fn tick_interval(bpm: f32) -> Duration {
    let bpm = if bpm.is_finite() && bpm > 0.0 {
        bpm
    } else {
        DEFAULT_BPM
    };
    Duration::from_secs_f64(60.0 / bpm as f64 / 4.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HatAccent {
    /// Off-beat eighth (`step % 4 == 2`).
    Accent,
    Ghost,
}

impl HatAccent {
    pub fn gain(self) -> f32 {
        match self {
            HatAccent::Accent => 0.05,
            HatAccent::Ghost => 0.02,
        }
    }
}

/// What one step triggers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEvents {
    pub kick: bool,
    pub snare: bool,
    pub hat: Option<HatAccent>,
    pub bass: Option<f32>,
}

impl StepEvents {
    pub fn at(step: u64) -> Self {
        let hat = if step % 2 == 0 {
            Some(if step % 4 == 2 {
                HatAccent::Accent
            } else {
                HatAccent::Ghost
            })
        } else {
            None
        };
        let bass = BASS_PATTERN[(step % 16) as usize];

        Self {
            kick: step % 4 == 0,
            snare: step % 8 == 4,
            hat,
            bass: (bass > 0.0).then_some(bass),
        }
    }

    pub fn is_silent(&self) -> bool {
        !self.kick && !self.snare && self.hat.is_none() && self.bass.is_none()
    }
}

pub fn kick() -> VoiceSpec {
    VoiceSpec {
        waveform: Waveform::Sine,
        pitch: PitchSweep::Exponential {
            from: 150.0,
            to: 0.01,
        },
        gain: GainEnvelope::Exponential {
            start: 0.5,
            floor: GAIN_FLOOR,
        },
        duration_seconds: 0.2,
    }
}

pub fn snare() -> VoiceSpec {
    VoiceSpec {
        waveform: Waveform::Triangle,
        pitch: PitchSweep::Linear {
            from: 800.0,
            to: 100.0,
        },
        gain: GainEnvelope::Exponential {
            start: 0.2,
            floor: GAIN_FLOOR,
        },
        duration_seconds: 0.1,
    }
}

/// The hat is an ordinary tone, so it goes through the mute check like any
/// other one-shot.
pub fn hat(accent: HatAccent) -> ToneRequest {
    ToneRequest::new(HAT_FREQUENCY, Waveform::Square, HAT_DURATION, accent.gain())
}

pub fn bass(frequency: f32) -> VoiceSpec {
    VoiceSpec {
        waveform: Waveform::Sawtooth,
        pitch: PitchSweep::Fixed(frequency),
        gain: GainEnvelope::Linear {
            start: 0.15,
            end: 0.0,
        },
        duration_seconds: 0.1,
    }
}
