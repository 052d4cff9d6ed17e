use super::tone::{Voice, VoiceSpec};

/// The single output stage every tone and the sequencer feed into.
#[derive(Debug, Clone)]
pub struct Mixer {
    sample_rate: u32,
    master_gain: f32,
    voices: Vec<Voice>,
}

impl Mixer {
    pub fn new(sample_rate: u32, master_gain: f32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            master_gain: master_gain.max(0.0),
            voices: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    pub fn add_voice(&mut self, spec: VoiceSpec) {
        self.voices.push(Voice::new(spec, self.sample_rate));
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Overwrites `out` with the sum of all voices and retires the ones that
    /// ran out.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        for voice in &mut self.voices {
            voice.render_add(out, self.master_gain);
        }
        self.voices.retain(|voice| !voice.is_finished());
    }

    pub fn clear(&mut self) {
        self.voices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tone::{ToneRequest, Waveform};

    #[test]
    fn sums_overlapping_voices() {
        let tone = ToneRequest::new(100.0, Waveform::Square, 1.0, 0.25);
        let mut single = Mixer::new(1_000, 1.0);
        single.add_voice(tone.into());
        let mut double = Mixer::new(1_000, 1.0);
        double.add_voice(tone.into());
        double.add_voice(tone.into());

        let mut a = vec![0.0; 16];
        let mut b = vec![0.0; 16];
        single.render(&mut a);
        double.render(&mut b);

        for (x, y) in a.iter().zip(&b) {
            assert!((2.0 * x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn retires_finished_voices() {
        let mut mixer = Mixer::new(1_000, 1.0);
        mixer.add_voice(ToneRequest::new(100.0, Waveform::Sine, 0.005, 0.1).into());
        assert_eq!(mixer.active_voices(), 1);

        let mut block = vec![1.0; 8];
        mixer.render(&mut block);
        assert_eq!(mixer.active_voices(), 0);

        mixer.render(&mut block);
        assert!(block.iter().all(|sample| *sample == 0.0));
    }

    #[test]
    fn master_gain_scales_output() {
        let tone = ToneRequest::new(100.0, Waveform::Square, 1.0, 0.5);
        let mut mixer = Mixer::new(1_000, 0.5);
        mixer.add_voice(tone.into());

        let mut block = vec![0.0; 1];
        mixer.render(&mut block);
        assert!((block[0] - 0.25).abs() < 1e-6);
    }
}
