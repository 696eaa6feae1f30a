//! Systolic/diastolic crossing detection and heart-rate estimation.
//!
//! The detection algorithm classifies each sample's oscillation magnitude
//! against the envelope maximum:
//!
//! - **Systolic** is the pressure at the FIRST sample whose magnitude falls
//!   inside the lower ratio band (0.48 to 0.53 of the maximum by default):
//!   the rising envelope passes through that band on the way up, so the
//!   first match brackets systolic pressure. A found-flag freezes it.
//! - **Diastolic** is the pressure at the LAST sample inside the upper ratio
//!   band (0.78 to 0.83): later matches overwrite earlier ones, so the final
//!   qualifying sample on the envelope decay wins.
//!
//! The band bounds and first/last tie-break carry clinical meaning; swapping
//! them inverts the interpretation, which is why they are validated as
//! disjoint at config load.
//!
//! Heart rate counts samples whose magnitude exceeds a fixed threshold,
//! divides by an empirical correction for the same oscillation being counted
//! across consecutive samples, and scales beats-per-sample-interval to
//! beats-per-minute via the assumed sampling rate. It is a coarse estimate,
//! not a device-grade measurement.

use crate::analysis::envelope::Envelope;
use crate::config::AnalysisConfig;
use crate::measurement::BpEstimate;

/// Estimate blood pressure and heart rate from a completed, reliable sample
/// series.
///
/// Fields of the result default to zero when no sample qualified (series too
/// short, no band crossing, no oscillation above threshold).
pub fn estimate(samples: &[f64], config: &AnalysisConfig) -> BpEstimate {
    match Envelope::from_samples(samples, config.avg_window, config.magnitude_bias) {
        Some(envelope) => estimate_from_envelope(samples, &envelope, config),
        None => BpEstimate::default(),
    }
}

/// Estimate from a precomputed envelope. Split out so crossing behavior can
/// be pinned down against synthetic magnitude arrays.
pub(crate) fn estimate_from_envelope(
    samples: &[f64],
    envelope: &Envelope,
    config: &AnalysisConfig,
) -> BpEstimate {
    let (systolic, diastolic) = find_crossings(samples, envelope, config);
    let heart_rate_bpm = heart_rate(envelope, config);

    BpEstimate {
        systolic,
        diastolic,
        heart_rate_bpm,
    }
}

/// Locate the systolic (first-match) and diastolic (last-match) band
/// crossings in one scan. Returns integer mmHg, zero when not found.
fn find_crossings(samples: &[f64], envelope: &Envelope, config: &AnalysisConfig) -> (i32, i32) {
    let max = envelope.max_oscillation();
    let dia_lo = config.diastolic_band.0 * max;
    let dia_hi = config.diastolic_band.1 * max;
    let sys_lo = config.systolic_band.0 * max;
    let sys_hi = config.systolic_band.1 * max;

    let mut systolic = 0i32;
    let mut diastolic = 0i32;
    let mut found_systolic = false;

    for i in envelope.start()..samples.len() {
        let magnitude = envelope.magnitudes()[i];
        if magnitude > dia_lo && magnitude < dia_hi {
            diastolic = samples[i] as i32;
        } else if magnitude > sys_lo && magnitude < sys_hi && !found_systolic {
            systolic = samples[i] as i32;
            found_systolic = true;
        }
    }

    (systolic, diastolic)
}

/// Count above-threshold oscillation samples between the first and last such
/// sample and scale to beats per minute. Zero when fewer than two qualifying
/// samples exist.
fn heart_rate(envelope: &Envelope, config: &AnalysisConfig) -> i32 {
    let mut count = 0u32;
    let mut first_index = 0usize;
    let mut last_index = 0usize;
    let mut found_first = false;

    for (i, &magnitude) in envelope
        .magnitudes()
        .iter()
        .enumerate()
        .skip(envelope.start())
    {
        if magnitude > config.beat_threshold {
            if !found_first {
                first_index = i;
                found_first = true;
            }
            last_index = i;
            count += 1;
        }
    }

    if last_index <= first_index {
        return 0;
    }

    // The raw tally counts the same oscillation across several consecutive
    // samples; the empirical correction compensates.
    let beats = f64::from(count) / config.beat_correction;
    let span_samples = (last_index - first_index) as f64;
    let beats_per_second = beats / span_samples * config.sample_rate_hz;

    (beats_per_second * 60.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    /// Build an envelope with handpicked magnitudes (window 0 so every
    /// index participates) and sample values equal to 1000 + index, making
    /// selected indices recognizable in the output.
    fn synthetic(magnitudes: Vec<f64>, max: f64) -> (Vec<f64>, Envelope) {
        let samples: Vec<f64> = (0..magnitudes.len()).map(|i| 1000.0 + i as f64).collect();
        let envelope = Envelope::from_parts(0, magnitudes, max);
        (samples, envelope)
    }

    #[test]
    fn diastolic_takes_last_match_systolic_takes_first() {
        // Max 10: diastolic band is (7.8, 8.3), systolic band (4.8, 5.3).
        let (samples, envelope) = synthetic(
            vec![0.5, 8.0, 5.0, 0.5, 5.0, 8.0, 0.5],
            10.0,
        );
        let est = estimate_from_envelope(&samples, &envelope, &analysis());
        // First 5.0 at index 2 wins systolic; the duplicate at index 4 must not
        // overwrite it. The 8.0 at index 5 must overwrite the one at index 1.
        assert_eq!(est.systolic, 1002);
        assert_eq!(est.diastolic, 1005);
    }

    #[test]
    fn values_outside_the_open_bands_do_not_qualify() {
        // Just below the diastolic band and just above the systolic band.
        let (samples, envelope) = synthetic(vec![7.79, 5.31, 0.0], 10.0);
        let est = estimate_from_envelope(&samples, &envelope, &analysis());
        assert_eq!(est.systolic, 0);
        assert_eq!(est.diastolic, 0);
    }

    #[test]
    fn no_crossing_yields_zero_fields() {
        let (samples, envelope) = synthetic(vec![0.1, 0.2, 0.1], 10.0);
        let est = estimate_from_envelope(&samples, &envelope, &analysis());
        assert_eq!(est, BpEstimate::default());
        assert!(!est.detected());
    }

    #[test]
    fn heart_rate_scales_counted_oscillations() {
        // 26 above-threshold samples spread over a 500-sample span:
        // (26 / 2.6) / 500 * 50 * 60 = 60 BPM.
        let mut magnitudes = vec![0.0; 510];
        for k in 0..26 {
            magnitudes[k * 20] = 2.0; // indices 0, 20, ..., 500
        }
        let (samples, envelope) = synthetic(magnitudes, 10.0);
        let est = estimate_from_envelope(&samples, &envelope, &analysis());
        assert_eq!(est.heart_rate_bpm, 60);
    }

    #[test]
    fn single_oscillation_sample_gives_no_heart_rate() {
        let (samples, envelope) = synthetic(vec![0.0, 2.0, 0.0, 0.0], 10.0);
        let est = estimate_from_envelope(&samples, &envelope, &analysis());
        assert_eq!(est.heart_rate_bpm, 0);
    }

    #[test]
    fn short_series_estimates_nothing() {
        let est = estimate(&[120.0, 119.0], &analysis());
        assert_eq!(est, BpEstimate::default());
    }
}
