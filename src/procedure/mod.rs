//! Measurement procedure: one full cuff cycle.
//!
//! A [`MeasurementSession`] owns the transducer driver, the transfer
//! function, the operator sink and the configuration, and drives one cycle
//! end to end:
//!
//! 1. welcome/instruction lines
//! 2. pump-up supervision ([`pump_up`]): wait for pumping to start, then
//!    for the inflation target
//! 3. deflation monitoring ([`deflation`]): sample the descent, classify
//!    the release rate, fill the sample series
//! 4. envelope analysis and the final result lines
//!
//! Execution is one sequential task. Suspension happens only at the fixed
//! pauses between bus transactions and samples; there is no way to abort a
//! cycle once pumping has started. Every failure returns control to the
//! caller, which restarts the whole cycle; nothing here retries.

pub mod deflation;
pub mod pump_up;

pub use deflation::{DeflationQuality, SlopeClass};

use std::time::Duration;

use crate::analysis;
use crate::calibration::TransferFunction;
use crate::config::MonitorConfig;
use crate::display::StatusSink;
use crate::error::{BusFault, CuffError, CuffResult};
use crate::hardware::bus::RegisterBus;
use crate::hardware::sensor::CuffSensor;
use crate::measurement::BpEstimate;

/// One measurement session over a cuff transducer.
///
/// All session-scoped state (sample series, rate-quality counters, envelope,
/// estimate) is created inside [`run`](Self::run) and discarded when it
/// returns; a session value can be reused for the next cycle.
pub struct MeasurementSession<B, S> {
    sensor: CuffSensor<B>,
    transfer: TransferFunction,
    sink: S,
    config: MonitorConfig,
}

impl<B: RegisterBus, S: StatusSink> MeasurementSession<B, S> {
    /// Build a session from a bus, an operator sink and configuration.
    pub fn new(bus: B, sink: S, config: MonitorConfig) -> Self {
        let sensor = CuffSensor::new(bus, config.sensor.settle);
        let transfer = TransferFunction::new(&config.calibration);
        Self {
            sensor,
            transfer,
            sink,
            config,
        }
    }

    /// Run one full measurement cycle.
    ///
    /// On any fault or an unreliable deflation the operator message is
    /// emitted here and the error returned; the caller decides whether to
    /// start another cycle.
    pub async fn run(&self) -> CuffResult<BpEstimate> {
        self.sink.status(&format!(
            "Welcome to {}, an oscillometric blood pressure monitor.",
            self.config.application.name
        ));
        self.sink.status(&format!(
            "To start, please apply the cuff and pump the pressure up to about {:.0} mmHg.",
            self.config.pump_up.target_mmhg
        ));

        match self.run_cycle().await {
            Ok(estimate) => Ok(estimate),
            Err(err) => {
                match &err {
                    CuffError::Sensor(fault) => self.sink.status(fault_status_line(*fault)),
                    CuffError::DeflationUnreliable { .. } => self
                        .sink
                        .status("Pressure was released too fast or slow. Start over."),
                    _ => {}
                }
                Err(err)
            }
        }
    }

    async fn run_cycle(&self) -> CuffResult<BpEstimate> {
        let start_pressure = self.await_inflation().await?;
        let series = self.monitor_deflation(start_pressure).await?;

        tracing::info!(samples = series.len(), "deflation complete, analyzing");
        let estimate = analysis::estimate(series.as_slice(), &self.config.analysis);

        if estimate.detected() {
            self.sink.status(&format!(
                "Your blood pressure is {}/{}.",
                estimate.systolic, estimate.diastolic
            ));
            self.sink.status(&format!(
                "Your heart rate is about {} BPM.",
                estimate.heart_rate_bpm
            ));
        } else {
            self.sink
                .status("Could not locate the pressure crossings in this recording. Please start over.");
        }

        Ok(estimate)
    }

    /// Take one sensor transaction and convert it, turning any fault into a
    /// session-aborting error. This is the single place a fault tag crosses
    /// into the error channel; no numeric sentinel ever exists.
    pub(crate) async fn read_mmhg(&self) -> CuffResult<f64> {
        let reading = self.sensor.read_code().await?;
        self.transfer
            .convert(reading)
            .into_result()
            .map_err(CuffError::from)
    }

    pub(crate) fn sink(&self) -> &S {
        &self.sink
    }

    pub(crate) fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub(crate) async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Operator-facing message for a bus fault.
pub fn fault_status_line(fault: BusFault) -> &'static str {
    match fault {
        BusFault::Busy => "Device is busy, please try again soon.",
        BusFault::NoPower => "No power, please check wires or power source.",
        BusFault::MemoryError => "A memory error has occurred.",
        BusFault::Saturated => "Math saturation has occurred.",
        BusFault::Unavailable => "Sensor did not respond, please try again.",
    }
}
