use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

/// Exponential ramps decay toward this level instead of zero.
pub const GAIN_FLOOR: f32 = 0.001;

pub const DEFAULT_TONE_GAIN: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Evaluates one period of the waveform; `phase` is in `[0, 1)`.
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                }
            }
        }
    }
}

/// One fire-and-forget oscillator burst.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneRequest {
    pub frequency: f32,
    pub waveform: Waveform,
    pub duration_seconds: f32,
    pub gain: f32,
}

impl ToneRequest {
    pub fn new(frequency: f32, waveform: Waveform, duration_seconds: f32, gain: f32) -> Self {
        Self {
            frequency,
            waveform,
            duration_seconds,
            gain: if gain.is_finite() {
                gain.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    /// A tone at the default gain of 0.1.
    pub fn with_default_gain(frequency: f32, waveform: Waveform, duration_seconds: f32) -> Self {
        Self::new(frequency, waveform, duration_seconds, DEFAULT_TONE_GAIN)
    }

    pub fn is_playable(&self) -> bool {
        self.frequency.is_finite()
            && self.frequency > 0.0
            && self.duration_seconds.is_finite()
            && self.duration_seconds > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PitchSweep {
    Fixed(f32),
    Exponential { from: f32, to: f32 },
    Linear { from: f32, to: f32 },
}

impl PitchSweep {
    /// Frequency at normalised time `t` in `[0, 1]`.
    pub fn at(&self, t: f32) -> f32 {
        match *self {
            PitchSweep::Fixed(freq) => freq,
            PitchSweep::Exponential { from, to } if from > 0.0 && to > 0.0 => {
                from * (to / from).powf(t)
            }
            PitchSweep::Exponential { from, to } | PitchSweep::Linear { from, to } => {
                from + (to - from) * t
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainEnvelope {
    Exponential { start: f32, floor: f32 },
    Linear { start: f32, end: f32 },
}

impl GainEnvelope {
    pub fn decay_from(start: f32) -> Self {
        GainEnvelope::Exponential {
            start,
            floor: GAIN_FLOOR,
        }
    }

    /// Gain at normalised time `t` in `[0, 1]`.
    pub fn at(&self, t: f32) -> f32 {
        match *self {
            GainEnvelope::Exponential { start, .. } if start <= 0.0 => 0.0,
            GainEnvelope::Exponential { start, floor } => {
                let floor = floor.max(f32::MIN_POSITIVE);
                start * (floor / start).powf(t)
            }
            GainEnvelope::Linear { start, end } => start + (end - start) * t,
        }
    }
}

/// Everything needed to start one oscillator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSpec {
    pub waveform: Waveform,
    pub pitch: PitchSweep,
    pub gain: GainEnvelope,
    pub duration_seconds: f32,
}

impl From<ToneRequest> for VoiceSpec {
    fn from(request: ToneRequest) -> Self {
        Self {
            waveform: request.waveform,
            pitch: PitchSweep::Fixed(request.frequency),
            gain: GainEnvelope::decay_from(request.gain),
            duration_seconds: request.duration_seconds,
        }
    }
}

/// A running oscillator. It renders additively and stops by itself once its
/// duration has elapsed.
#[derive(Debug, Clone)]
pub struct Voice {
    spec: VoiceSpec,
    sample_rate: f32,
    total_samples: usize,
    position: usize,
    phase: f32,
}

impl Voice {
    pub fn new(spec: VoiceSpec, sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1) as f32;
        let total_samples = ((spec.duration_seconds.max(0.0) * sample_rate).round() as usize).max(1);
        Self {
            spec,
            sample_rate,
            total_samples,
            position: 0,
            phase: 0.0,
        }
    }

    pub fn spec(&self) -> &VoiceSpec {
        &self.spec
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.total_samples
    }

    pub fn remaining_samples(&self) -> usize {
        self.total_samples - self.position.min(self.total_samples)
    }

    /// Adds this voice into `out`, scaled by `master`. Returns the number of
    /// samples written.
    pub fn render_add(&mut self, out: &mut [f32], master: f32) -> usize {
        let count = out.len().min(self.remaining_samples());
        let span = self.total_samples as f32;
        for slot in out.iter_mut().take(count) {
            let t = self.position as f32 / span;
            let frequency = self.spec.pitch.at(t).max(0.0);
            let gain = self.spec.gain.at(t);
            *slot += self.spec.waveform.sample(self.phase) * gain * master;

            self.phase += frequency / self.sample_rate;
            self.phase -= self.phase.floor();
            self.position += 1;
        }
        count
    }
}
