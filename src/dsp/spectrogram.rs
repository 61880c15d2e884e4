//! Short-time Fourier spectrogram, scaled to match MATLAB/matplotlib's
//! `specgram` power-spectral-density convention (spec.md §4.1).

use super::complex::Complex;
use super::fft::{fft_forward, hann_window};
use super::NFFT;

/// `spectrogram(samples, fs) -> matrix[freq_bin][time_bin]` of `10*log10(power)`,
/// with `-inf` (from zero bins) replaced by `0`.
///
/// Returns an empty matrix if `samples.len() < NFFT` (spec.md §4.1 failure
/// clause): the peak extractor then naturally yields no peaks.
pub fn spectrogram(samples: &[i16], fs: u32) -> Vec<Vec<f32>> {
    if samples.len() < NFFT {
        return Vec::new();
    }

    let overlap = (NFFT as f64 * 0.5) as usize;
    let hop = NFFT - overlap;
    let num_frames = (samples.len() - NFFT) / hop + 1;
    let num_bins = NFFT / 2 + 1;

    let window = hann_window(NFFT);
    let window_energy: f64 = window.iter().map(|&w| (w as f64) * (w as f64)).sum();
    let scale = 1.0 / (fs as f64 * window_energy);

    let mut bins: Vec<Vec<f32>> = vec![Vec::with_capacity(num_frames); num_bins];
    let mut buf = vec![Complex::new(0.0, 0.0); NFFT];

    for frame in 0..num_frames {
        let start = frame * hop;
        for i in 0..NFFT {
            buf[i] = Complex::new(samples[start + i] as f32 * window[i], 0.0);
        }

        fft_forward(&mut buf);

        for (bin, slot) in bins.iter_mut().enumerate().take(num_bins) {
            let power = buf[bin].norm_sqr() as f64 * scale;
            // One-sided spectrum: double all bins except DC and Nyquist.
            let power = if bin == 0 || bin == NFFT / 2 {
                power
            } else {
                power * 2.0
            };
            let db = if power <= 0.0 {
                0.0
            } else {
                10.0 * power.log10()
            };
            slot.push(db as f32);
        }
    }

    bins
}
