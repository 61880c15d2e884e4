//! Audio file decoding via `symphonia`, generalizing the teacher's
//! `AudioProcessor::generate_audio_samples` to keep channels separate
//! (spec.md §2.2 requires per-channel fingerprinting) and to compute the
//! file's content hash alongside the decode.

use crate::error::DecodeError;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Block size for the streaming content hash: large enough to amortize
/// syscall overhead, small enough to never load a whole file into memory.
const HASH_BLOCK_SIZE: usize = 1 << 20;

pub struct DecodedAudio {
    /// One sample vector per channel, each independently fingerprintable.
    pub channels: Vec<Vec<i16>>,
    pub sample_rate: u32,
    /// Uppercase hex SHA-1 of the raw file bytes, used to detect
    /// already-ingested files (spec.md §9.1).
    pub content_sha1: String,
}

/// Decode the full track. Equivalent to `decode_file_limited(path, None)`.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, DecodeError> {
    decode_file_limited(path, None)
}

/// Decode at most `limit_seconds` of audio from `path` (spec.md §6
/// `fingerprint_limit`; `None` decodes the full track). Decoding stops as
/// soon as every channel has enough samples, rather than truncating after
/// decoding the whole file, so a limit actually bounds the work done.
pub fn decode_file_limited(
    path: &Path,
    limit_seconds: Option<u32>,
) -> Result<DecodedAudio, DecodeError> {
    let content_sha1 = hash_file_contents(path)?;

    let file = File::open(path)?;
    let source: Box<dyn MediaSource> = Box::new(file);
    let stream = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Format(e.to_string()))?;
    let mut format = probed.format;

    let track = format.tracks().first().ok_or(DecodeError::NoTrack)?;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params.sample_rate.ok_or(DecodeError::UnsupportedCodec)?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|_| DecodeError::UnsupportedCodec)?;

    let mut channels: Vec<Vec<i16>> = Vec::new();
    let sample_limit = limit_seconds.map(|secs| secs as usize * sample_rate as usize);

    'decode: loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(DecodeError::Format(e.to_string())),
        };

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(DecodeError::Format(e.to_string())),
        };

        let spec = *decoded.spec();
        let num_channels = spec.channels.count();
        if channels.is_empty() {
            channels = vec![Vec::new(); num_channels];
        }

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        for frame in sample_buf.samples().chunks_exact(num_channels) {
            for (c, &sample) in frame.iter().enumerate() {
                channels[c].push(to_i16(sample));
            }
            if let Some(limit) = sample_limit {
                if channels[0].len() >= limit {
                    break 'decode;
                }
            }
        }
    }

    if let Some(limit) = sample_limit {
        for channel in &mut channels {
            channel.truncate(limit);
        }
    }

    Ok(DecodedAudio {
        channels,
        sample_rate,
        content_sha1,
    })
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Block-wise content hash (spec.md §4.5), exposed so callers can
/// short-circuit already-known files before paying for a full decode.
pub fn hash_file_contents(path: &Path) -> Result<String, DecodeError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; HASH_BLOCK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode_upper(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn write_sine_wav(path: &Path, fs: u32, seconds: f32, channels: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: fs,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let n = (fs as f32 * seconds) as usize;
        for i in 0..n {
            let t = i as f32 / fs as f32;
            let sample = (8000.0 * (2.0 * PI * 440.0 * t).sin()) as i16;
            for _ in 0..channels {
                writer.write_sample(sample).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn decodes_sample_rate_and_channel_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_sine_wav(&path, 44100, 1.0, 2);

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.channels.len(), 2);
        assert!(decoded.channels[0].len() >= 44000);
        assert_eq!(decoded.content_sha1.len(), 40);
        assert!(decoded.content_sha1.chars().all(|c| !c.is_ascii_lowercase()));
    }

    #[test]
    fn content_hash_is_deterministic_across_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_sine_wav(&path, 44100, 0.5, 1);

        let first = decode_file(&path).unwrap();
        let second = decode_file(&path).unwrap();
        assert_eq!(first.content_sha1, second.content_sha1);
    }

    #[test]
    fn limit_seconds_truncates_every_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_sine_wav(&path, 44100, 3.0, 2);

        let decoded = decode_file_limited(&path, Some(1)).unwrap();
        for channel in &decoded.channels {
            assert!(channel.len() <= 44100);
            assert!(channel.len() > 40000);
        }
    }
}
