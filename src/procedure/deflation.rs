//! Deflation monitoring.
//!
//! Once the cuff is at target pressure the operator opens the release valve
//! and the monitor samples the descent at a fixed cadence down to the
//! measurement floor. Two things happen per pass:
//!
//! - the sample is appended to the series while capacity remains (appends
//!   stop at capacity, sampling does not), and
//! - every anchor window the short-horizon slope is classified against the
//!   acceptable release band, accumulating warnings for the operator.
//!
//! The sample pause plus bus latency approximates the 50 Hz rate the
//! analysis constants assume; it is a design approximation, not an exact
//! guarantee. If the warning count ends above the configured maximum the
//! session is declared unreliable and no estimate is computed; the operator
//! is asked to start over instead.

use crate::config::DeflationConfig;
use crate::display::StatusSink;
use crate::error::{CuffError, CuffResult};
use crate::hardware::bus::RegisterBus;
use crate::measurement::SampleSeries;
use crate::procedure::MeasurementSession;

/// Classification of the deflation slope over one anchor window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeClass {
    /// Pressure dropping faster than the acceptable band.
    TooFast,
    /// Pressure dropping slower than the acceptable band.
    TooSlow,
    /// Within the acceptable band.
    Steady,
}

/// Running rate-quality state for one deflation: the warning tally.
/// Mutated only by the deflation monitor during the active session.
#[derive(Debug, Default)]
pub struct DeflationQuality {
    warnings: u32,
}

impl DeflationQuality {
    /// Classify one window slope, counting a warning for either out-of-band
    /// direction.
    pub fn classify(&mut self, slope: f64, config: &DeflationConfig) -> SlopeClass {
        if slope > config.slope_fast {
            self.warnings += 1;
            SlopeClass::TooFast
        } else if slope < config.slope_slow {
            self.warnings += 1;
            SlopeClass::TooSlow
        } else {
            SlopeClass::Steady
        }
    }

    /// Warnings accumulated so far.
    pub fn warnings(&self) -> u32 {
        self.warnings
    }
}

impl<B: RegisterBus, S: StatusSink> MeasurementSession<B, S> {
    /// Sample the deflation from `start_mmhg` down to the configured floor.
    ///
    /// Returns the completed sample series, or `DeflationUnreliable` when
    /// the release-rate warnings exceeded the configured maximum.
    pub(crate) async fn monitor_deflation(&self, start_mmhg: f64) -> CuffResult<SampleSeries> {
        let cfg = &self.config().deflation;

        self.sink().status("Required pressure reached. Stop pumping!");
        self.sink().status(
            "Use the release valve to let the cuff deflate at a slow and steady rate (about 4 mmHg/s).",
        );

        let mut anchor = start_mmhg;
        self.pause(cfg.handoff_delay).await;
        let mut pressure = self.read_mmhg().await?;
        let mut slope = anchor - pressure;

        let mut quality = DeflationQuality::default();
        let mut series = SampleSeries::with_capacity(cfg.max_samples);

        while pressure > cfg.floor_mmhg {
            if series.len() % cfg.anchor_window == 0 {
                self.report_slope(quality.classify(slope, cfg), slope);
            }

            // Appends stop once the series is full; the anchor freezes with
            // them, so post-capacity classification keeps charging the last
            // computed slope. Warning accounting continues either way.
            if series.push(pressure) && series.len() % cfg.anchor_window == 0 {
                slope = anchor - pressure;
                anchor = pressure;
            }

            self.pause(cfg.sample_interval).await;
            pressure = self.read_mmhg().await?;
        }

        if quality.warnings() > cfg.max_warnings {
            return Err(CuffError::DeflationUnreliable {
                warnings: quality.warnings(),
            });
        }

        Ok(series)
    }

    fn report_slope(&self, class: SlopeClass, slope: f64) {
        match class {
            SlopeClass::TooFast => {
                tracing::warn!(slope, "deflation too fast");
                self.sink().status("Pressure being released too fast!");
            }
            SlopeClass::TooSlow => {
                tracing::warn!(slope, "deflation too slow");
                self.sink().status("Pressure being released too slow!");
            }
            SlopeClass::Steady => {
                tracing::debug!(slope, "deflation steady");
                self.sink().status("Keep it steady at this rate.");
            }
        }
    }
}
