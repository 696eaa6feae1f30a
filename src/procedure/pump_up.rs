//! Pump-up supervision.
//!
//! The operator inflates the cuff by hand, so this phase is a guard, not a
//! controller. It moves through three states:
//!
//! - **AwaitingPumpStart**: take a baseline reading, then re-read at a slow
//!   cadence until a reading rises at least the configured threshold above
//!   the baseline. The threshold filters sensor noise and idle readings; a
//!   parked cuff never trips it.
//! - **AwaitingTargetPressure**: re-read at the progress cadence, echoing the
//!   live value to the operator, until the inflation target is reached. Each
//!   iteration takes a fresh reading; a stale value here would leave the
//!   loop spinning forever.
//! - **Done**: hand the final pressure to the deflation monitor as its first
//!   anchor.
//!
//! Any fault aborts the entire cycle; this phase never touches the sample
//! series.

use crate::display::StatusSink;
use crate::error::CuffResult;
use crate::hardware::bus::RegisterBus;
use crate::procedure::MeasurementSession;

impl<B: RegisterBus, S: StatusSink> MeasurementSession<B, S> {
    /// Wait for the operator to pump the cuff to the inflation target.
    ///
    /// Returns the pressure at which the target was reached; it seeds the
    /// deflation monitor's first slope anchor.
    pub(crate) async fn await_inflation(&self) -> CuffResult<f64> {
        let cfg = &self.config().pump_up;

        // AwaitingPumpStart
        let baseline = self.read_mmhg().await?;
        self.pause(cfg.initial_gap).await;
        let mut current = self.read_mmhg().await?;

        while current - baseline < cfg.rise_threshold_mmhg {
            self.pause(cfg.start_poll).await;
            current = self.read_mmhg().await?;
        }
        tracing::info!(baseline, current, "pump start detected");

        // AwaitingTargetPressure
        while current < cfg.target_mmhg {
            self.sink()
                .status(&format!("You're at {current:.0} mmHg. Keep pumping!"));
            self.pause(cfg.progress_interval).await;
            current = self.read_mmhg().await?;
        }
        tracing::info!(pressure = current, "inflation target reached");

        Ok(current)
    }
}
