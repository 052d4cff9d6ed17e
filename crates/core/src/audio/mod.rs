//! Synthesized sound: one-shot tones, short jingles and the background loop.
//! Nothing is loaded from disk; every sound is an oscillator feeding the
//! shared [`mixer::Mixer`].

pub mod device;
pub mod mixer;
pub mod probe;
pub mod sequencer;
pub mod tone;

use std::time::Duration;

use crate::{
    config::AudioConfig,
    timeline::{FiredTimer, PlaybackClock, TimerId, TimerQueue},
    Result,
};

use self::{
    device::{open_sink, AudioSink},
    mixer::Mixer,
    sequencer::StepEvents,
    tone::{ToneRequest, VoiceSpec, Waveform},
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum AudioEvent {
    Tone(ToneRequest),
    MusicTick,
}

#[derive(Debug, Clone, Copy)]
struct MusicLoop {
    timer: TimerId,
    step: u64,
}

struct OutputStage {
    mixer: Mixer,
    sink: Box<dyn AudioSink>,
    block: Vec<f32>,
    rendered_samples: u64,
}

/// Owner of the audio output. Created with [`AudioEngine::init`]; if the
/// output cannot be opened the engine stays usable and silently ignores
/// every request.
pub struct AudioEngine {
    output: Option<OutputStage>,
    sample_rate: u32,
    bpm: f32,
    muted: bool,
    clock: PlaybackClock,
    timers: TimerQueue<AudioEvent>,
    music: Option<MusicLoop>,
}

impl AudioEngine {
    /// Opens the output configured in `config`.
    pub fn init(config: &AudioConfig) -> Self {
        match open_sink(&config.output, config.sample_rate) {
            Ok(sink) => Self::with_sink(config, sink),
            Err(err) => {
                tracing::warn!(%err, "audio output unavailable, continuing without sound");
                Self::build(config, None)
            }
        }
    }

    /// Renders into `sink`. A sink bound to a device clock overrides the
    /// configured sample rate.
    pub fn with_sink(config: &AudioConfig, sink: Box<dyn AudioSink>) -> Self {
        let mut config = config.clone();
        if let Some(rate) = sink.native_sample_rate() {
            config.sample_rate = rate;
        }
        let stage = OutputStage {
            mixer: Mixer::new(config.sample_rate, config.master_gain),
            sink,
            block: vec![0.0; config.block_size.max(1)],
            rendered_samples: 0,
        };
        Self::build(&config, Some(stage))
    }

    /// An engine with no output at all.
    pub fn disabled() -> Self {
        Self::build(&AudioConfig::default(), None)
    }

    fn build(config: &AudioConfig, output: Option<OutputStage>) -> Self {
        Self {
            output,
            sample_rate: config.sample_rate.max(1),
            bpm: config.bpm,
            muted: config.muted,
            clock: PlaybackClock::start(),
            timers: TimerQueue::new(),
            music: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.output.is_some()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_music_playing(&self) -> bool {
        self.music.is_some()
    }

    /// The step the next music tick will play.
    pub fn music_step(&self) -> Option<u64> {
        self.music.map(|music| music.step)
    }

    pub fn active_voices(&self) -> usize {
        self.output
            .as_ref()
            .map(|stage| stage.mixer.active_voices())
            .unwrap_or(0)
    }

    /// Timers still waiting to fire: delayed jingle notes and the music tick.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn play_tone(&mut self, frequency: f32, waveform: Waveform, duration_seconds: f32, gain: f32) {
        self.play(ToneRequest::new(frequency, waveform, duration_seconds, gain));
    }

    /// Starts `request` now. Ignored while muted, without output, or when the
    /// request has no positive frequency and duration.
    pub fn play(&mut self, request: ToneRequest) {
        if self.muted || !request.is_playable() {
            return;
        }
        self.start_voice(request.into());
    }

    pub fn play_click(&mut self) {
        self.play(ToneRequest::new(800.0, Waveform::Sine, 0.1, 0.05));
    }

    pub fn play_success(&mut self) {
        self.play(ToneRequest::new(600.0, Waveform::Sine, 0.1, 0.1));
        self.play_after(
            Duration::from_millis(100),
            ToneRequest::new(800.0, Waveform::Sine, 0.2, 0.1),
        );
    }

    pub fn play_failure(&mut self) {
        self.play(ToneRequest::new(300.0, Waveform::Sawtooth, 0.3, 0.1));
        self.play_after(
            Duration::from_millis(150),
            ToneRequest::new(200.0, Waveform::Sawtooth, 0.4, 0.1),
        );
    }

    /// Stops the background loop and plays a rising five-note arpeggio.
    pub fn play_win(&mut self) {
        self.stop_music();
        for (index, frequency) in [400.0, 500.0, 600.0, 800.0, 1_000.0].into_iter().enumerate() {
            self.play_after(
                Duration::from_millis(120 * index as u64),
                ToneRequest::new(frequency, Waveform::Square, 0.2, 0.1),
            );
        }
    }

    /// Muting stops the loop; unmuting leaves it stopped.
    pub fn toggle_mute(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.stop_music();
        }
        tracing::debug!(muted, "audio mute toggled");
    }

    /// Starts the background loop unless muted, without output, or already
    /// running.
    pub fn play_bg_music_start(&mut self) {
        if self.muted || self.music.is_some() || self.output.is_none() {
            return;
        }

        let interval = sequencer::tick_interval(self.bpm);
        match self
            .timers
            .schedule_repeating(self.clock.now(), interval, AudioEvent::MusicTick)
        {
            Ok(timer) => {
                self.music = Some(MusicLoop { timer, step: 0 });
                tracing::info!(bpm = self.bpm, ?interval, "background music started");
            }
            Err(err) => tracing::warn!(%err, "could not schedule background music"),
        }
    }

    pub fn stop_music(&mut self) {
        if let Some(music) = self.music.take() {
            self.timers.cancel(music.timer);
            tracing::info!(steps = music.step, "background music stopped");
        }
    }

    /// Moves engine time forward by `elapsed`, firing due timers in order and
    /// rendering every sample in between into the sink.
    pub fn advance(&mut self, elapsed: Duration) {
        let target = self.clock.now() + elapsed;
        while let Some(fired) = self.timers.pop_due(target) {
            self.render_until(fired.due);
            self.clock.advance_to(fired.due);
            self.dispatch(fired);
        }
        self.render_until(target);
        self.clock.advance_to(target);
    }

    /// Cancels all timers, drops sounding voices and finalizes the sink.
    /// The engine is silent afterwards.
    pub fn shutdown(&mut self) -> Result<()> {
        self.stop_music();
        self.timers.clear();
        match self.output.take() {
            Some(mut stage) => {
                stage.mixer.clear();
                stage.sink.finish()
            }
            None => Ok(()),
        }
    }

    fn play_after(&mut self, delay: Duration, request: ToneRequest) {
        if self.output.is_none() {
            return;
        }
        if delay.is_zero() {
            self.play(request);
        } else {
            self.timers
                .schedule_once(self.clock.now(), delay, AudioEvent::Tone(request));
        }
    }

    fn dispatch(&mut self, fired: FiredTimer<AudioEvent>) {
        match fired.event {
            AudioEvent::Tone(request) => self.play(request),
            AudioEvent::MusicTick => {
                if self.music.is_some_and(|music| music.timer == fired.id) {
                    self.music_tick();
                }
            }
        }
    }

    fn music_tick(&mut self) {
        let Some(music) = self.music.as_mut() else {
            return;
        };
        let step = music.step;
        music.step += 1;

        let events = StepEvents::at(step);
        if events.kick {
            self.start_voice(sequencer::kick());
        }
        if events.snare {
            self.start_voice(sequencer::snare());
        }
        if let Some(accent) = events.hat {
            self.play(sequencer::hat(accent));
        }
        if let Some(frequency) = events.bass {
            self.start_voice(sequencer::bass(frequency));
        }
    }

    fn start_voice(&mut self, spec: VoiceSpec) {
        if let Some(stage) = self.output.as_mut() {
            stage.mixer.add_voice(spec);
        }
    }

    fn render_until(&mut self, at: Duration) {
        let Some(stage) = self.output.as_mut() else {
            return;
        };
        let target = (at.as_secs_f64() * self.sample_rate as f64).round() as u64;

        while stage.rendered_samples < target {
            let remaining = (target - stage.rendered_samples) as usize;
            let len = remaining.min(stage.block.len());
            let block = &mut stage.block[..len];
            stage.mixer.render(block);
            if let Err(err) = stage.sink.write(block) {
                tracing::warn!(%err, "audio output failed, disabling sound");
                self.output = None;
                self.music = None;
                self.timers.clear();
                return;
            }
            stage.rendered_samples += len as u64;
        }
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("available", &self.output.is_some())
            .field("sample_rate", &self.sample_rate)
            .field("bpm", &self.bpm)
            .field("muted", &self.muted)
            .field("now", &self.clock.now())
            .field("music_step", &self.music_step())
            .field("pending_timers", &self.timers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audio::device::MemorySink, ArcadeError};

    fn config() -> AudioConfig {
        AudioConfig {
            sample_rate: 8_000,
            block_size: 256,
            ..AudioConfig::default()
        }
    }

    fn capturing_engine() -> (AudioEngine, device::CaptureHandle) {
        let (sink, capture) = MemorySink::new();
        (AudioEngine::with_sink(&config(), Box::new(sink)), capture)
    }

    fn tick() -> Duration {
        sequencer::tick_interval(sequencer::DEFAULT_BPM)
    }

    struct BrokenSink;

    impl AudioSink for BrokenSink {
        fn write(&mut self, _block: &[f32]) -> Result<()> {
            Err(ArcadeError::msg("device unplugged"))
        }
    }

    #[test]
    fn starting_music_while_muted_never_starts_a_loop() {
        let (mut audio, _) = capturing_engine();
        audio.toggle_mute(true);
        audio.play_bg_music_start();
        audio.advance(tick() * 4);

        assert!(!audio.is_music_playing());
        assert_eq!(audio.pending_timers(), 0);
    }

    #[test]
    fn muting_stops_the_running_loop() {
        let (mut audio, _) = capturing_engine();
        audio.play_bg_music_start();
        audio.advance(tick() * 3);
        assert_eq!(audio.music_step(), Some(3));

        audio.toggle_mute(true);
        assert!(!audio.is_music_playing());
        audio.advance(tick() * 3);
        assert_eq!(audio.pending_timers(), 0);

        audio.toggle_mute(false);
        assert!(!audio.is_music_playing());
    }

    #[test]
    fn second_start_is_a_no_op() {
        let (mut audio, _) = capturing_engine();
        audio.play_bg_music_start();
        audio.play_bg_music_start();

        assert_eq!(audio.pending_timers(), 1);
        audio.advance(tick() * 8);
        assert_eq!(audio.music_step(), Some(8));
    }

    #[test]
    fn stopping_twice_matches_stopping_once() {
        let (mut audio, _) = capturing_engine();
        audio.play_bg_music_start();
        audio.stop_music();
        audio.stop_music();

        assert!(!audio.is_music_playing());
        assert_eq!(audio.pending_timers(), 0);
    }

    #[test]
    fn fresh_start_resets_the_step_counter() {
        let (mut audio, _) = capturing_engine();
        audio.play_bg_music_start();
        audio.advance(tick() * 5);
        audio.stop_music();
        audio.play_bg_music_start();
        assert_eq!(audio.music_step(), Some(0));
    }

    #[test]
    fn downbeat_triggers_kick_hat_and_bass() {
        let (mut audio, _) = capturing_engine();
        audio.play_bg_music_start();
        audio.advance(tick());

        // step 0: kick, ghost hat, 110 Hz bass
        assert_eq!(audio.active_voices(), 3);
    }

    #[test]
    fn renders_one_sample_per_tick_of_time() {
        let (mut audio, capture) = capturing_engine();
        audio.play_bg_music_start();
        audio.advance(Duration::from_millis(500));
        audio.advance(Duration::from_millis(500));

        let samples = capture.samples().unwrap();
        assert_eq!(samples.len(), 8_000);
        assert!(samples.iter().any(|sample| sample.abs() > 0.01));
    }

    #[test]
    fn muted_engine_renders_silence() {
        let (mut audio, capture) = capturing_engine();
        audio.toggle_mute(true);
        audio.play_success();
        audio.play_click();
        audio.advance(Duration::from_millis(300));

        let samples = capture.samples().unwrap();
        assert_eq!(samples.len(), 2_400);
        assert!(samples.iter().all(|sample| *sample == 0.0));
    }

    #[test]
    fn jingle_notes_are_spaced_in_time() {
        let (mut audio, _) = capturing_engine();
        audio.play_success();
        assert_eq!(audio.active_voices(), 1);
        assert_eq!(audio.pending_timers(), 1);

        audio.advance(Duration::from_millis(99));
        assert_eq!(audio.pending_timers(), 1);
        audio.advance(Duration::from_millis(1));
        assert_eq!(audio.pending_timers(), 0);
        assert_eq!(audio.active_voices(), 1);
    }

    #[test]
    fn delayed_notes_respect_mute_at_fire_time() {
        let (mut audio, _) = capturing_engine();
        audio.play_failure();
        audio.toggle_mute(true);
        audio.advance(Duration::from_millis(200));

        assert_eq!(audio.pending_timers(), 0);
        assert_eq!(audio.active_voices(), 1);
    }

    #[test]
    fn win_jingle_stops_music() {
        let (mut audio, _) = capturing_engine();
        audio.play_bg_music_start();
        audio.advance(tick() * 2);
        audio.play_win();

        assert!(!audio.is_music_playing());
        assert_eq!(audio.pending_timers(), 4);
        audio.advance(Duration::from_millis(480));
        assert_eq!(audio.pending_timers(), 0);
    }

    #[test]
    fn unavailable_engine_is_inert() {
        let mut audio = AudioEngine::disabled();
        audio.play_bg_music_start();
        audio.play_win();
        audio.play_tone(440.0, Waveform::Sine, 0.5, 0.1);
        audio.advance(Duration::from_secs(1));

        assert!(!audio.is_available());
        assert!(!audio.is_music_playing());
        assert_eq!(audio.pending_timers(), 0);
        assert_eq!(audio.active_voices(), 0);
        assert!(audio.shutdown().is_ok());
    }

    #[test]
    fn failing_output_degrades_to_silence() {
        let mut audio = AudioEngine::with_sink(&config(), Box::new(BrokenSink));
        audio.play_bg_music_start();
        audio.advance(tick() * 2);

        assert!(!audio.is_available());
        assert!(!audio.is_music_playing());
        audio.play_click();
        assert_eq!(audio.active_voices(), 0);
    }

    /// Stands in for a device sink locked to its own clock.
    struct FixedRateSink(u32);

    impl AudioSink for FixedRateSink {
        fn write(&mut self, _block: &[f32]) -> Result<()> {
            Ok(())
        }

        fn native_sample_rate(&self) -> Option<u32> {
            Some(self.0)
        }
    }

    #[test]
    fn device_rate_overrides_configured_rate() {
        let mut audio = AudioEngine::with_sink(&config(), Box::new(FixedRateSink(44_100)));
        assert_eq!(audio.sample_rate(), 44_100);
        audio.play_click();
        audio.advance(Duration::from_millis(50));
        assert_eq!(audio.active_voices(), 1);
    }

    #[test]
    fn unopenable_output_falls_back_to_disabled() {
        let config = AudioConfig {
            output: crate::config::OutputTarget::Wav {
                path: "/no/such/dir/music.wav".into(),
            },
            ..AudioConfig::default()
        };
        let audio = AudioEngine::init(&config);
        assert!(!audio.is_available());
    }

    #[test]
    fn shutdown_cancels_everything() {
        let (mut audio, _) = capturing_engine();
        audio.play_bg_music_start();
        audio.play_win();
        audio.play_bg_music_start();
        audio.shutdown().unwrap();

        assert!(!audio.is_music_playing());
        assert_eq!(audio.pending_timers(), 0);
        assert!(!audio.is_available());
    }

    /// Captured samples from `from_ms` to `to_ms` after `step` fired. Step n
    /// fires n + 1 ticks after the loop starts.
    fn step_window(samples: &[f32], step: u32, from_ms: f64, to_ms: f64) -> &[f32] {
        let fired = tick().as_secs_f64() * f64::from(step + 1);
        let at = |offset_ms: f64| ((fired + offset_ms / 1_000.0) * 8_000.0).round() as usize;
        &samples[at(from_ms)..at(to_ms)]
    }

    #[test]
    fn bass_line_sounds_at_the_pattern_pitch() {
        let (mut audio, capture) = capturing_engine();
        audio.play_bg_music_start();
        audio.advance(tick() * 17);
        let samples = capture.samples().unwrap();

        // Steps whose kick, snare and hat have died away by 35 ms, leaving
        // only the bass.
        for step in [2, 10, 14] {
            let window = step_window(&samples, step, 35.0, 100.0);
            let summary = probe::summarize(window, 8_000).unwrap();
            let expected = sequencer::BASS_PATTERN[step as usize % 16];
            let bin_hz = 8_000.0 / window.len() as f32;
            assert!(
                (summary.dominant_hz - expected).abs() <= bin_hz,
                "step {step}: expected {expected} Hz, got {summary:?}"
            );
        }
    }

    #[test]
    fn kick_and_snare_shape_their_steps() {
        let (mut audio, capture) = capturing_engine();
        audio.play_bg_music_start();
        audio.advance(tick() * 12);
        let samples = capture.samples().unwrap();

        let summary = |step| probe::summarize(step_window(&samples, step, 0.0, 50.0), 8_000).unwrap();
        // Step 8 has the kick, step 10 only the accented hat and bass.
        let kick = summary(8);
        let plain = summary(10);
        assert!(kick.rms > plain.rms * 1.5, "{kick:?} vs {plain:?}");
        assert!(kick.dominant_hz < 160.0, "{kick:?}");

        // Step 4 is step 8 plus the snare's falling triangle.
        let snare = summary(4);
        assert!(snare.centroid_hz > kick.centroid_hz, "{snare:?} vs {kick:?}");
    }
}
