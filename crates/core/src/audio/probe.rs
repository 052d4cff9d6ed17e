//! Spectral summary of rendered audio. The `music` command prints one per
//! bar, and tests use it to check that synthesized voices land on pitch.

use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{ArcadeError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub rms: f32,
    pub peak: f32,
    /// Frequency of the strongest bin, excluding DC.
    pub dominant_hz: f32,
    pub centroid_hz: f32,
}

/// Reuses one FFT plan across blocks of the same length.
pub struct SpectralProbe {
    sample_rate: u32,
    planner: RealFftPlanner<f32>,
    fft: Option<FftResources>,
}

impl SpectralProbe {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            planner: RealFftPlanner::new(),
            fft: None,
        }
    }

    pub fn summarize(&mut self, samples: &[f32]) -> Result<BlockSummary> {
        if samples.len() < 2 {
            return Err(ArcadeError::InvalidInput(
                "spectral probe requires at least two samples",
            ));
        }

        let len = samples.len();
        let bin_hz = self.sample_rate as f32 / len as f32;
        let fft = self.prepare(len);
        for (index, value) in samples.iter().enumerate() {
            fft.input[index] = *value * hann_value(index, len);
        }
        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)
            .map_err(|err| ArcadeError::msg(err.to_string()))?;

        let mut magnitude_sum = 0.0;
        let mut weighted_sum = 0.0;
        let mut strongest = (0usize, 0.0f32);
        for (i, bin) in fft.spectrum.iter().enumerate() {
            let magnitude = bin.norm();
            magnitude_sum += magnitude;
            weighted_sum += magnitude * (i as f32 * bin_hz);
            if i > 0 && magnitude > strongest.1 {
                strongest = (i, magnitude);
            }
        }

        let centroid_hz = if magnitude_sum <= f32::EPSILON {
            0.0
        } else {
            weighted_sum / magnitude_sum
        };
        let dominant_hz = if strongest.1 <= f32::EPSILON {
            0.0
        } else {
            strongest.0 as f32 * bin_hz
        };

        Ok(BlockSummary {
            rms: compute_rms(samples),
            peak: samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs())),
            dominant_hz,
            centroid_hz,
        })
    }

    fn prepare(&mut self, size: usize) -> &mut FftResources {
        if self.fft.as_ref().is_some_and(|fft| fft.size != size) {
            self.fft = None;
        }

        let planner = &mut self.planner;
        self.fft.get_or_insert_with(|| {
            let plan = planner.plan_fft_forward(size);
            FftResources {
                size,
                scratch: plan.make_scratch_vec(),
                spectrum: plan.make_output_vec(),
                input: plan.make_input_vec(),
                plan,
            }
        })
    }
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl fmt::Debug for SpectralProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralProbe")
            .field("sample_rate", &self.sample_rate)
            .field("fft_size", &self.fft.as_ref().map(|fft| fft.size))
            .finish()
    }
}

pub fn summarize(samples: &[f32], sample_rate: u32) -> Result<BlockSummary> {
    SpectralProbe::new(sample_rate).summarize(samples)
}

fn compute_rms(samples: &[f32]) -> f32 {
    let sum: f32 = samples.iter().map(|sample| sample * sample).sum();
    (sum / samples.len() as f32).sqrt()
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tone::{ToneRequest, Voice, Waveform};

    #[test]
    fn silence_has_no_dominant_frequency() {
        let summary = summarize(&[0.0; 256], 8_000).unwrap();
        assert_eq!(summary.rms, 0.0);
        assert_eq!(summary.dominant_hz, 0.0);
        assert_eq!(summary.centroid_hz, 0.0);
    }

    #[test]
    fn finds_the_pitch_of_a_sine_voice() {
        let tone = ToneRequest::new(1_000.0, Waveform::Sine, 1.0, 0.5);
        let mut voice = Voice::new(tone.into(), 8_000);
        let mut block = vec![0.0; 1_024];
        voice.render_add(&mut block, 1.0);

        let summary = summarize(&block, 8_000).unwrap();
        let bin_hz = 8_000.0 / 1_024.0;
        assert!((summary.dominant_hz - 1_000.0).abs() <= bin_hz);
        assert!(summary.peak <= 0.5 + 1e-6);
        assert!(summary.rms > 0.0);
    }

    #[test]
    fn rejects_tiny_blocks() {
        assert!(summarize(&[0.5], 8_000).is_err());
    }

    #[test]
    fn reuses_plan_for_same_size() {
        let mut probe = SpectralProbe::new(8_000);
        probe.summarize(&[0.0; 64]).unwrap();
        probe.summarize(&[0.1; 64]).unwrap();
        probe.summarize(&[0.1; 32]).unwrap();
        assert_eq!(probe.fft.as_ref().map(|fft| fft.size), Some(32));
    }
}
