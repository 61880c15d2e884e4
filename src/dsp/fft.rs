//! Radix-2 Cooley-Tukey FFT and Hann windowing.
//!
//! Hand-rolled rather than pulled from `rustfft`, following the teacher's own
//! `fft/fft.rs` convention of carrying a small in-tree transform.

use super::complex::Complex;
use std::f32::consts::PI;

/// In-place radix-2 decimation-in-time FFT. `buf.len()` must be a power of two.
pub fn fft_forward(buf: &mut [Complex]) {
    let n = buf.len();
    if n <= 1 {
        return;
    }
    debug_assert!(n.is_power_of_two(), "FFT size must be a power of two");

    let mut even: Vec<Complex> = Vec::with_capacity(n / 2);
    let mut odd: Vec<Complex> = Vec::with_capacity(n / 2);
    for (i, &sample) in buf.iter().enumerate() {
        if i % 2 == 0 {
            even.push(sample);
        } else {
            odd.push(sample);
        }
    }

    fft_forward(&mut even);
    fft_forward(&mut odd);

    // P(omega) = Pe(omega^2) + omega * Po(omega^2), P(-omega) = Pe(omega^2) - omega * Po(omega^2)
    for j in 0..n / 2 {
        let theta = (2.0 * PI * j as f32) / n as f32;
        let twiddle = Complex::from_polar(1.0, -theta);
        let odd_term = twiddle * odd[j];
        buf[j] = even[j] + odd_term;
        buf[j + n / 2] = even[j] - odd_term;
    }
}

/// Symmetric Hann window of the given length.
pub fn hann_window(len: usize) -> Vec<f32> {
    if len == 0 {
        return Vec::new();
    }
    if len == 1 {
        return vec![1.0];
    }
    (0..len)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / (len - 1) as f32).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_signal_has_energy_only_in_bin_zero() {
        let mut buf: Vec<Complex> = (0..64).map(|_| Complex::new(1.0, 0.0)).collect();
        fft_forward(&mut buf);
        assert!((buf[0].re - 64.0).abs() < 1e-3);
        for bin in &buf[1..] {
            assert!(bin.norm_sqr() < 1e-3);
        }
    }

    #[test]
    fn single_tone_peaks_at_expected_bin() {
        let n = 256;
        let bin = 10;
        let mut buf: Vec<Complex> = (0..n)
            .map(|i| {
                let theta = 2.0 * PI * bin as f32 * i as f32 / n as f32;
                Complex::new(theta.cos(), 0.0)
            })
            .collect();
        fft_forward(&mut buf);
        let magnitudes: Vec<f32> = buf.iter().map(|c| c.norm_sqr()).collect();
        let (peak_bin, _) = magnitudes
            .iter()
            .enumerate()
            .take(n / 2)
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert_eq!(peak_bin, bin);
    }

    #[test]
    fn hann_window_is_zero_at_edges_and_one_at_center() {
        let w = hann_window(5);
        assert!(w[0].abs() < 1e-6);
        assert!(w[4].abs() < 1e-6);
        assert!((w[2] - 1.0).abs() < 1e-6);
    }
}
