use std::{
    fs::File,
    io::BufWriter,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::{SampleFormat, WavSpec, WavWriter};
use ringbuf::{
    traits::{Consumer, Producer, Split},
    HeapProd, HeapRb,
};

use crate::{config::OutputTarget, ArcadeError, Result};

/// Buffered audio ahead of the device callback.
const DEVICE_LATENCY: Duration = Duration::from_millis(250);

/// Destination for rendered mono blocks.
pub trait AudioSink {
    fn write(&mut self, block: &[f32]) -> Result<()>;

    /// Rate the sink plays at regardless of configuration, for sinks driven
    /// by a hardware clock.
    fn native_sample_rate(&self) -> Option<u32> {
        None
    }

    /// Flushes whatever the sink buffers. Called once on engine shutdown.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Accepts and drops everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn write(&mut self, _block: &[f32]) -> Result<()> {
        Ok(())
    }
}

/// 16-bit mono PCM file output.
pub struct WavSink {
    writer: Option<WavWriter<BufWriter<File>>>,
}

impl WavSink {
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec)?;
        Ok(Self {
            writer: Some(writer),
        })
    }
}

impl AudioSink for WavSink {
    fn write(&mut self, block: &[f32]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ArcadeError::msg("wav sink already finalized"))?;
        for &sample in block {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(value)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for WavSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavSink")
            .field("open", &self.writer.is_some())
            .finish()
    }
}

/// Keeps every rendered sample in memory. The paired [`CaptureHandle`]
/// reads them back while the engine owns the sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    shared: Arc<Mutex<Vec<f32>>>,
}

impl MemorySink {
    pub fn new() -> (Self, CaptureHandle) {
        let shared = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                shared: shared.clone(),
            },
            CaptureHandle { shared },
        )
    }
}

impl AudioSink for MemorySink {
    fn write(&mut self, block: &[f32]) -> Result<()> {
        self.shared
            .lock()
            .map_err(|_| ArcadeError::msg("capture buffer has been poisoned"))?
            .extend_from_slice(block);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CaptureHandle {
    shared: Arc<Mutex<Vec<f32>>>,
}

impl CaptureHandle {
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    pub fn samples(&self) -> Result<Vec<f32>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<f32>>> {
        self.shared
            .lock()
            .map_err(|_| ArcadeError::msg("capture buffer has been poisoned"))
    }
}

/// Live playback on the default output device.
///
/// The engine pushes mono blocks into a ring buffer and the device callback
/// copies each sample to every channel. When the engine runs ahead of the
/// device the overflow is dropped instead of blocking the caller.
pub struct DeviceSink {
    stream: Option<cpal::Stream>,
    producer: HeapProd<f32>,
    sample_rate: u32,
    channels: u16,
    dropped: u64,
}

impl DeviceSink {
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(ArcadeError::NoOutputDevice)?;
        let supported = device.default_output_config()?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();
        let config: cpal::StreamConfig = supported.config();

        let capacity = ((sample_rate as f64 * DEVICE_LATENCY.as_secs_f64()) as usize).max(1_024);
        let (producer, mut consumer) = HeapRb::<f32>::new(capacity).split();
        let frame = usize::from(channels.max(1));

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    fill_interleaved(data, frame, &mut consumer, |sample| sample)
                },
                report_stream_error,
                None,
            )?,
            cpal::SampleFormat::I16 => device.build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    fill_interleaved(data, frame, &mut consumer, sample_to_i16)
                },
                report_stream_error,
                None,
            )?,
            cpal::SampleFormat::U16 => device.build_output_stream(
                &config,
                move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                    fill_interleaved(data, frame, &mut consumer, sample_to_u16)
                },
                report_stream_error,
                None,
            )?,
            other => {
                return Err(ArcadeError::msg(format!(
                    "unsupported output sample format {other:?}"
                )))
            }
        };
        stream.play()?;

        tracing::info!(
            device = device.name().unwrap_or_default(),
            sample_rate,
            channels,
            "audio device opened"
        );
        Ok(Self {
            stream: Some(stream),
            producer,
            sample_rate,
            channels,
            dropped: 0,
        })
    }
}

impl AudioSink for DeviceSink {
    fn write(&mut self, block: &[f32]) -> Result<()> {
        if self.stream.is_none() {
            return Err(ArcadeError::msg("audio device already closed"));
        }
        let pushed = self.producer.push_slice(block);
        self.dropped += (block.len() - pushed) as u64;
        Ok(())
    }

    fn native_sample_rate(&self) -> Option<u32> {
        Some(self.sample_rate)
    }

    fn finish(&mut self) -> Result<()> {
        if self.stream.take().is_some() {
            tracing::debug!(dropped = self.dropped, "audio device closed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for DeviceSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSink")
            .field("open", &self.stream.is_some())
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("dropped", &self.dropped)
            .finish()
    }
}

/// Fills an interleaved device buffer from mono samples, padding with
/// silence once the ring runs dry.
fn fill_interleaved<T: Copy>(
    data: &mut [T],
    channels: usize,
    consumer: &mut impl Consumer<Item = f32>,
    convert: impl Fn(f32) -> T,
) {
    for frame in data.chunks_mut(channels.max(1)) {
        let value = convert(consumer.try_pop().unwrap_or(0.0));
        frame.fill(value);
    }
}

fn sample_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn sample_to_u16(sample: f32) -> u16 {
    ((sample.clamp(-1.0, 1.0) + 1.0) * 0.5 * u16::MAX as f32) as u16
}

fn report_stream_error(err: cpal::StreamError) {
    tracing::warn!(%err, "audio stream error");
}

pub fn open_sink(target: &OutputTarget, sample_rate: u32) -> Result<Box<dyn AudioSink>> {
    match target {
        OutputTarget::Null => Ok(Box::new(NullSink)),
        OutputTarget::Device => Ok(Box::new(DeviceSink::open_default()?)),
        OutputTarget::Wav { path } => Ok(Box::new(WavSink::create(path, sample_rate)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_shares_samples_with_handle() {
        let (mut sink, handle) = MemorySink::new();
        sink.write(&[0.1, 0.2]).unwrap();
        sink.write(&[0.3]).unwrap();

        assert_eq!(handle.len().unwrap(), 3);
        assert_eq!(handle.samples().unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn wav_sink_writes_a_readable_file() {
        let path = std::env::temp_dir().join(format!("arcade-wav-{}.wav", std::process::id()));
        let mut sink = WavSink::create(&path, 8_000).unwrap();
        sink.write(&[0.0, 0.5, -2.0]).unwrap();
        sink.finish().unwrap();
        assert!(sink.write(&[0.0]).is_err());

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, i16::MAX / 2, -i16::MAX]);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn device_frames_repeat_mono_samples_on_every_channel() {
        let (mut producer, mut consumer) = HeapRb::<f32>::new(8).split();
        producer.push_slice(&[0.5, -0.25]);

        let mut data = [9.0f32; 6];
        fill_interleaved(&mut data, 2, &mut consumer, |sample| sample);
        assert_eq!(data, [0.5, 0.5, -0.25, -0.25, 0.0, 0.0]);
    }

    #[test]
    fn device_sample_conversion_clamps() {
        assert_eq!(sample_to_i16(2.0), i16::MAX);
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_u16(-3.0), 0);
        assert_eq!(sample_to_u16(1.0), u16::MAX);

        let (mut producer, mut consumer) = HeapRb::<f32>::new(4).split();
        producer.push_slice(&[1.0]);
        let mut data = [7u16; 3];
        fill_interleaved(&mut data, 1, &mut consumer, sample_to_u16);
        assert_eq!(data, [u16::MAX, u16::MAX / 2, u16::MAX / 2]);
    }

    #[test]
    fn opening_wav_in_missing_directory_fails() {
        let target = OutputTarget::Wav {
            path: "/no/such/dir/out.wav".into(),
        };
        assert!(open_sink(&target, 48_000).is_err());
    }
}
