//! The signal-processing core: spectrogram, peak extraction and landmark
//! hashing. This module is total for well-formed PCM input — any finite
//! sample sequence produces a (possibly empty) finite hash set.

pub mod complex;
pub mod fft;
pub mod hashing;
pub mod peaks;
pub mod spectrogram;

/// FFT window size. Fixed: part of the on-disk hash contract (spec.md §4.1/§6).
pub const NFFT: usize = 4096;
/// Overlap ratio between successive windows.
pub const OVERLAP_RATIO: f64 = 0.5;
/// Minimum log-power amplitude (dB) for a candidate peak to be kept.
pub const AMP_MIN: f32 = 10.0;
/// Number of single-step dilations/erosions defining the peak neighborhood.
pub const PEAK_NEIGHBORHOOD_SIZE: usize = 20;
/// Forward fan-out: each anchor peak pairs with up to `FAN_VALUE - 1` targets.
pub const FAN_VALUE: usize = 15;
/// Inclusive bounds on the time delta (in frames) between a paired anchor/target.
pub const MIN_HASH_TIME_DELTA: i64 = 0;
pub const MAX_HASH_TIME_DELTA: i64 = 200;
/// Hex characters kept from the SHA-1 digest of a landmark pair.
pub const FINGERPRINT_REDUCTION: usize = 20;

pub use hashing::{generate_hashes, HashRecord};
pub use peaks::{find_peaks, Peak};
pub use spectrogram::spectrogram;

/// Frame-index lag, converted to seconds using the window stride.
///
/// `round(delta * NFFT * overlap_ratio / fs, 5)`, per spec.md §4.4.
pub fn offset_seconds(delta: i64, fs: u32) -> f64 {
    let raw = delta as f64 * NFFT as f64 * OVERLAP_RATIO / fs as f64;
    (raw * 1e5).round() / 1e5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_seconds_matches_reference_formula() {
        // delta=0.5s worth of frames at NFFT=4096, overlap=0.5, fs=44100
        let hop = (NFFT as f64 * OVERLAP_RATIO) as i64; // 2048 frames per hop
        let one_second_delta = (44100_f64 / hop as f64).round() as i64;
        let secs = offset_seconds(one_second_delta, 44100);
        assert!((secs - 1.0).abs() < 0.05);
    }

    #[test]
    fn offset_seconds_handles_negative_delta() {
        assert!(offset_seconds(-100, 44100) < 0.0);
    }
}
