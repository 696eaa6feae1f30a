//! Session data model.
//!
//! Everything here is scoped to one measurement cycle: created when the
//! operator starts pumping, discarded when the result (or failure) is
//! reported. No cross-session state persists.

use serde::{Deserialize, Serialize};

/// Ordered, append-only pressure samples collected while the cuff deflates
/// through the measurement band.
///
/// Capacity is fixed up front. Once full, further samples are dropped and
/// `push` reports whether the sample was stored, while the caller keeps
/// sampling for rate-quality accounting.
#[derive(Debug, Clone)]
pub struct SampleSeries {
    samples: Vec<f64>,
    capacity: usize,
}

impl SampleSeries {
    /// Create an empty series bounded to `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a pressure sample if capacity remains.
    ///
    /// Returns `true` when the sample was stored, `false` when the series is
    /// full and the sample was dropped.
    pub fn push(&mut self, mmhg: f64) -> bool {
        if self.samples.len() < self.capacity {
            self.samples.push(mmhg);
            true
        } else {
            false
        }
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples have been stored.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether the series has reached capacity.
    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    /// Stored samples in arrival order.
    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }
}

/// Final output of one measurement session.
///
/// Fields are zero when the corresponding feature was not detected in the
/// envelope. Callers must treat zero as "undetected", never as a
/// physiological reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpEstimate {
    /// Systolic pressure in mmHg (0 = undetected).
    pub systolic: i32,
    /// Diastolic pressure in mmHg (0 = undetected).
    pub diastolic: i32,
    /// Approximate heart rate in beats per minute (0 = undetected). A coarse
    /// estimator, not a device-grade measurement.
    pub heart_rate_bpm: i32,
}

impl BpEstimate {
    /// Whether both pressure crossings were located.
    pub fn detected(&self) -> bool {
        self.systolic != 0 && self.diastolic != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_truncates_at_capacity() {
        let mut series = SampleSeries::with_capacity(3);
        assert!(series.push(1.0));
        assert!(series.push(2.0));
        assert!(series.push(3.0));
        assert!(series.is_full());
        // Dropped, but the caller is free to keep sampling.
        assert!(!series.push(4.0));
        assert_eq!(series.len(), 3);
        assert_eq!(series.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn zero_fields_mean_undetected() {
        let estimate = BpEstimate::default();
        assert!(!estimate.detected());
        let found = BpEstimate {
            systolic: 121,
            diastolic: 78,
            heart_rate_bpm: 64,
        };
        assert!(found.detected());
    }
}
