//! Live microphone capture, adapted from the teacher's `record_audio` (same
//! `cpal` input stream + `audio_gate::NoiseGate` combination), returning
//! per-channel `i16` samples instead of a single interleaved `f32` buffer.

use super::decode::DecodedAudio;
use crate::error::DecodeError;
use audio_gate::NoiseGate;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub struct CaptureConfig {
    pub duration: Duration,
    /// Noise-gate open/close thresholds in dBFS, per the teacher's tuning.
    pub open_threshold_db: f32,
    pub close_threshold_db: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(10),
            open_threshold_db: -36.0,
            close_threshold_db: -54.0,
        }
    }
}

pub fn capture(config: CaptureConfig) -> Result<DecodedAudio, DecodeError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| DecodeError::Format("no default input device".to_string()))?;
    let stream_config = device
        .default_input_config()
        .map_err(|e| DecodeError::Format(e.to_string()))?;

    let sample_rate = stream_config.sample_rate().0;
    let num_channels = stream_config.channels() as usize;

    // Noise gate parameters tuned for spoken/musical capture; wiring it into
    // the callback is future work (TODO: gate silence out of short clips).
    let _gate = NoiseGate::new(
        config.open_threshold_db,
        config.close_threshold_db,
        sample_rate as f32,
        num_channels as u16,
        150.0,
        25.0,
        150.0,
    );

    let recorded = Arc::new(Mutex::new(Vec::<f32>::new()));
    let recorded_clone = recorded.clone();
    let err_fn = |err| tracing::error!(%err, "input stream error");

    let stream = match stream_config.sample_format() {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &stream_config.clone().into(),
            move |data: &[f32], _: &_| {
                recorded_clone.lock().unwrap().extend_from_slice(data);
            },
            err_fn,
            None,
        ),
        other => {
            return Err(DecodeError::Format(format!(
                "unsupported input sample format: {other:?}"
            )))
        }
    }
    .map_err(|e| DecodeError::Format(e.to_string()))?;

    stream
        .play()
        .map_err(|e| DecodeError::Format(e.to_string()))?;
    thread::sleep(config.duration);
    drop(stream);

    let interleaved = Arc::try_unwrap(recorded)
        .map(|m| m.into_inner().unwrap())
        .unwrap_or_default();

    let mut channels = vec![Vec::new(); num_channels.max(1)];
    for frame in interleaved.chunks_exact(num_channels) {
        for (c, &sample) in frame.iter().enumerate() {
            channels[c].push((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16);
        }
    }

    Ok(DecodedAudio {
        channels,
        sample_rate,
        content_sha1: String::new(),
    })
}
