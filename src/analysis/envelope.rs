//! Oscillation envelope derived from the deflation waveform.
//!
//! The cuff pressure during deflation is a slow descent with small arterial
//! oscillations superposed. A short trailing average tracks the descent;
//! the per-sample deviation from that baseline, plus a fixed positive bias,
//! is the oscillation magnitude. The running maximum of the magnitudes
//! anchors the amplitude-ratio bands used for crossing detection.

/// Trailing mean over the last `window` samples (inclusive of the current
/// one), O(1) per step.
///
/// The first `window` entries are bootstrap values: with too few prior
/// samples for a full window, the average is defined as the raw sample
/// itself.
pub fn rolling_average(samples: &[f64], window: usize) -> Vec<f64> {
    let mut averages = Vec::with_capacity(samples.len());
    let mut sum = 0.0;

    for (i, &sample) in samples.iter().enumerate() {
        if i < window {
            sum += sample;
            averages.push(sample);
        } else {
            sum += sample - samples[i - window];
            averages.push(sum / window as f64);
        }
    }

    averages
}

/// Read-only oscillation magnitudes aligned to the sample series, with the
/// envelope maximum. Computed once per session, never mutated afterward.
#[derive(Debug, Clone)]
pub struct Envelope {
    window: usize,
    magnitudes: Vec<f64>,
    max_oscillation: f64,
}

impl Envelope {
    /// Derive the envelope from a completed sample series.
    ///
    /// Returns `None` when the series is too short to hold even one full
    /// averaging window plus a sample to measure against it.
    pub fn from_samples(samples: &[f64], window: usize, bias: f64) -> Option<Self> {
        if window == 0 || samples.len() <= window {
            return None;
        }

        let averages = rolling_average(samples, window);
        let mut magnitudes = vec![0.0; samples.len()];
        // Maximum starts from the first real magnitude, not from zero, so a
        // uniformly negative-deviation envelope still has a meaningful peak.
        let mut max_oscillation = bias + samples[window] - averages[window];

        for i in window..samples.len() {
            let magnitude = bias + samples[i] - averages[i];
            magnitudes[i] = magnitude;
            if magnitude > max_oscillation {
                max_oscillation = magnitude;
            }
        }

        Some(Self {
            window,
            magnitudes,
            max_oscillation,
        })
    }

    /// Assemble an envelope from precomputed parts (test support).
    #[cfg(test)]
    pub(crate) fn from_parts(window: usize, magnitudes: Vec<f64>, max_oscillation: f64) -> Self {
        Self {
            window,
            magnitudes,
            max_oscillation,
        }
    }

    /// Index of the first sample with a defined magnitude.
    pub fn start(&self) -> usize {
        self.window
    }

    /// Magnitudes aligned to the sample series; entries below
    /// [`Self::start`] are bootstrap padding.
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    /// Largest oscillation magnitude in the series.
    pub fn max_oscillation(&self) -> f64 {
        self.max_oscillation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_entries_equal_raw_samples() {
        let avg = rolling_average(&[3.0, 7.0, 9.0], 5);
        assert_eq!(avg, vec![3.0, 7.0, 9.0]);
    }

    #[test]
    fn window_mean_after_bootstrap() {
        // Window of 5 including the current sample: (10+10+10+10+20)/5.
        let avg = rolling_average(&[10.0, 10.0, 10.0, 10.0, 10.0, 20.0], 5);
        assert_eq!(avg[5], 12.0);
    }

    #[test]
    fn sliding_window_tracks_a_ramp() {
        let samples: Vec<f64> = (0..10).map(f64::from).collect();
        let avg = rolling_average(&samples, 5);
        // At i=7 the window is [3,4,5,6,7].
        assert_eq!(avg[7], 5.0);
    }

    #[test]
    fn magnitude_is_biased_deviation_from_baseline() {
        let samples = [10.0, 10.0, 10.0, 10.0, 10.0, 20.0];
        let env = Envelope::from_samples(&samples, 5, 0.7).unwrap();
        // 0.7 + 20 - 12.
        assert!((env.magnitudes()[5] - 8.7).abs() < 1e-12);
        assert!((env.max_oscillation() - 8.7).abs() < 1e-12);
    }

    #[test]
    fn max_tracks_the_largest_deviation() {
        let mut samples = vec![100.0; 20];
        samples[10] = 103.0;
        samples[15] = 106.0;
        let env = Envelope::from_samples(&samples, 5, 0.7).unwrap();
        let peak = env
            .magnitudes()
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(env.max_oscillation(), peak);
        assert!(env.max_oscillation() > 0.7 + 4.0);
    }

    #[test]
    fn too_short_series_yields_no_envelope() {
        assert!(Envelope::from_samples(&[1.0, 2.0, 3.0], 5, 0.7).is_none());
        assert!(Envelope::from_samples(&[1.0; 5], 5, 0.7).is_none());
    }
}
