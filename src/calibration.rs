//! Pressure calibration.
//!
//! The transducer outputs a 24-bit code spanning 10%–90% of its counts;
//! the datasheet transfer function maps that span linearly onto the cuff's
//! 0-300 mmHg range. The constants are fixed inputs; this crate performs no
//! calibration discovery.
//!
//! Faults propagate through conversion as tags, never as numeric sentinels:
//! [`CalibratedPressure`] forces callers to branch before doing arithmetic
//! with a pressure.

use serde::{Deserialize, Serialize};

use crate::config::CalibrationConfig;
use crate::error::BusFault;
use crate::hardware::sensor::SensorReading;

/// Either a propagated fault or a calibrated pressure in mmHg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibratedPressure {
    /// Fault carried through unchanged from the sensor transaction.
    Fault(BusFault),
    /// Calibrated pressure in mmHg.
    Reading(f64),
}

impl CalibratedPressure {
    /// Unpack into a `Result`, the branch every consumer must take before
    /// treating the value as a pressure.
    pub fn into_result(self) -> Result<f64, BusFault> {
        match self {
            CalibratedPressure::Fault(fault) => Err(fault),
            CalibratedPressure::Reading(mmhg) => Ok(mmhg),
        }
    }
}

/// Linear transfer function between raw sensor codes and mmHg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferFunction {
    pressure_min: f64,
    pressure_max: f64,
    output_min: f64,
    output_max: f64,
}

impl TransferFunction {
    /// Build the transfer function from calibration constants.
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            pressure_min: config.pressure_min,
            pressure_max: config.pressure_max,
            output_min: f64::from(config.output_min),
            output_max: f64::from(config.output_max),
        }
    }

    /// Convert a sensor reading to calibrated pressure.
    ///
    /// Faults propagate unchanged. Evaluated in f64 throughout so no
    /// intermediate truncation occurs.
    pub fn convert(&self, reading: SensorReading) -> CalibratedPressure {
        match reading {
            SensorReading::Fault(fault) => CalibratedPressure::Fault(fault),
            SensorReading::Value(raw) => CalibratedPressure::Reading(self.to_mmhg(raw)),
        }
    }

    /// Map a raw code to mmHg with the datasheet transfer function.
    pub fn to_mmhg(&self, raw: u32) -> f64 {
        (f64::from(raw) - self.output_min) * (self.pressure_max - self.pressure_min)
            / (self.output_max - self.output_min)
            + self.pressure_min
    }

    /// Inverse mapping: mmHg back to the nearest raw code. Used by the
    /// simulator to encode scripted pressures onto the wire.
    pub fn to_code(&self, mmhg: f64) -> u32 {
        let raw = (mmhg - self.pressure_min) * (self.output_max - self.output_min)
            / (self.pressure_max - self.pressure_min)
            + self.output_min;
        raw.round().clamp(0.0, f64::from(u32::MAX)) as u32
    }
}

impl Default for TransferFunction {
    fn default() -> Self {
        Self::new(&CalibrationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_output_range_endpoints() {
        let tf = TransferFunction::default();
        assert!((tf.to_mmhg(419_430) - 0.0).abs() < 1e-9);
        assert!((tf.to_mmhg(3_774_873) - 300.0).abs() < 1e-9);
    }

    #[test]
    fn monotonically_non_decreasing_over_output_range() {
        let tf = TransferFunction::default();
        let mut last = f64::NEG_INFINITY;
        for raw in (419_430..=3_774_873).step_by(104_858) {
            let mmhg = tf.to_mmhg(raw);
            assert!(mmhg >= last, "not monotonic at raw={raw}");
            last = mmhg;
        }
    }

    #[test]
    fn faults_propagate_as_tags() {
        let tf = TransferFunction::default();
        let converted = tf.convert(SensorReading::Fault(BusFault::Saturated));
        assert_eq!(converted.into_result(), Err(BusFault::Saturated));
    }

    #[test]
    fn value_converts_to_reading() {
        let tf = TransferFunction::default();
        let converted = tf.convert(SensorReading::Value(419_430));
        match converted {
            CalibratedPressure::Reading(mmhg) => assert!(mmhg.abs() < 1e-9),
            CalibratedPressure::Fault(f) => panic!("unexpected fault: {f}"),
        }
    }

    #[test]
    fn inverse_round_trips_within_code_resolution() {
        let tf = TransferFunction::default();
        // One code step is ~0.0000894 mmHg; round-tripping through the
        // nearest code must come back well inside a millimeter of mercury.
        for mmhg in [0.0, 41.7, 120.0, 170.0, 299.5] {
            let back = tf.to_mmhg(tf.to_code(mmhg));
            assert!((back - mmhg).abs() < 1e-3, "round trip drifted at {mmhg}");
        }
    }
}
