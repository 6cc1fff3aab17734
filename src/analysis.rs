//! Offline signal measurements.
//!
//! Level and pitch estimates used by the tests, the benchmarks and the CLI
//! render report. None of this is realtime-safe: the FFT analyzer allocates
//! its plan and scratch space up front and is meant to run on rendered audio.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Root-mean-square level of a block.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}

/// Largest absolute sample value.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}

/// Largest jump between two consecutive samples.
///
/// A discontinuity in an otherwise smooth signal shows up here; this is the
/// click detector used for retrigger and parameter-change checks.
pub fn max_step(samples: &[f32]) -> f32 {
    samples
        .windows(2)
        .fold(0.0f32, |acc, pair| acc.max((pair[1] - pair[0]).abs()))
}

/// Estimate the fundamental from rising zero crossings.
///
/// Crossing instants are linearly interpolated between samples, so the
/// estimate is far finer than one sample period. Returns `None` when fewer
/// than two crossings are found.
pub fn zero_crossing_frequency(samples: &[f32], sample_rate: f32) -> Option<f32> {
    let mut first: Option<f64> = None;
    let mut last = 0.0f64;
    let mut crossings = 0usize;

    for (i, pair) in samples.windows(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);
        if a < 0.0 && b >= 0.0 {
            let fraction = (-a / (b - a)) as f64;
            let instant = i as f64 + fraction;
            first.get_or_insert(instant);
            last = instant;
            crossings += 1;
        }
    }

    let first = first?;
    if crossings < 2 || last <= first {
        return None;
    }
    let periods = (crossings - 1) as f64;
    Some((periods * sample_rate as f64 / (last - first)) as f32)
}

/// FFT peak-picking pitch estimator.
pub struct PitchAnalyzer {
    /// Hann window coefficients
    window: Vec<f32>,
    /// FFT processor
    fft: Arc<dyn Fft<f32>>,
    /// Scratch buffer for FFT computation
    scratch: Vec<Complex<f32>>,
    sample_rate: f32,
}

impl PitchAnalyzer {
    /// # Arguments
    /// * `fft_len` - FFT size; longer windows give finer frequency bins
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn new(fft_len: usize, sample_rate: f32) -> Self {
        let fft_len = fft_len.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_len);

        // Hann window - reduces spectral leakage
        let denom = (fft_len - 1) as f32;
        let window = (0..fft_len)
            .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos()))
            .collect();

        Self {
            window,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); fft_len],
            sample_rate,
        }
    }

    pub fn fft_len(&self) -> usize {
        self.window.len()
    }

    /// Frequency (Hz) of the strongest spectral peak in the first
    /// `fft_len` samples, refined by parabolic interpolation over the
    /// log-magnitude of the neighbouring bins.
    ///
    /// Shorter input is zero-padded. Returns `None` for silence.
    pub fn dominant_frequency(&mut self, samples: &[f32]) -> Option<f32> {
        let len = self.window.len();
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let sample = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let half = len / 2;
        let magnitude = |bin: usize| self.scratch[bin].norm();

        let (peak_bin, peak_mag) = (1..half)
            .map(|bin| (bin, magnitude(bin)))
            .fold((0, 0.0f32), |best, cur| if cur.1 > best.1 { cur } else { best });

        if peak_bin == 0 || peak_mag <= f32::EPSILON {
            return None;
        }

        let mut offset = 0.0;
        if peak_bin + 1 < half {
            let a = magnitude(peak_bin - 1).max(1e-12).ln();
            let b = peak_mag.ln();
            let c = magnitude(peak_bin + 1).max(1e-12).ln();
            let denom = a - 2.0 * b + c;
            if denom.abs() > f32::EPSILON {
                offset = (0.5 * (a - c) / denom).clamp(-0.5, 0.5);
            }
        }

        Some((peak_bin as f32 + offset) * self.sample_rate / len as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn sine(frequency: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| (TAU * frequency * n as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn rms_of_full_scale_sine() {
        let signal = sine(100.0, 48_000.0, 48_000);
        assert!((rms(&signal) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-3);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn peak_and_step() {
        let signal = [0.0, 0.5, -0.25, 0.1];
        assert_eq!(peak(&signal), 0.5);
        assert_eq!(max_step(&signal), 0.75);
    }

    #[test]
    fn zero_crossings_find_the_fundamental() {
        let signal = sine(440.0, 48_000.0, 48_000);
        let estimate = zero_crossing_frequency(&signal, 48_000.0).expect("no crossings");
        assert!((estimate - 440.0).abs() < 0.1, "estimated {estimate}");
        assert_eq!(zero_crossing_frequency(&[0.0; 64], 48_000.0), None);
    }

    #[test]
    fn fft_finds_the_fundamental() {
        let signal = sine(440.0, 48_000.0, 16_384);
        let mut analyzer = PitchAnalyzer::new(16_384, 48_000.0);
        let estimate = analyzer.dominant_frequency(&signal).expect("silent");
        assert!((estimate - 440.0).abs() < 2.2, "estimated {estimate}");
    }

    #[test]
    fn fft_reports_silence() {
        let mut analyzer = PitchAnalyzer::new(1024, 48_000.0);
        assert_eq!(analyzer.fft_len(), 1024);
        assert_eq!(analyzer.dominant_frequency(&[0.0; 1024]), None);
        assert_eq!(PitchAnalyzer::new(0, 48_000.0).fft_len(), 2);
    }
}
