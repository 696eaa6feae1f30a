//! cuffmon binary: run measurement cycles against the mock cuff.
//!
//! The binary wires the library together the way a deployment would, with
//! the scripted mock standing in for the transducer: load configuration,
//! initialize logging, then run measurement cycles, restarting fresh after
//! any fault or unreliable deflation.

use anyhow::Result;
use clap::Parser;

use cuffmon::calibration::TransferFunction;
use cuffmon::config::MonitorConfig;
use cuffmon::display::ConsoleSink;
use cuffmon::hardware::MockCuff;
use cuffmon::logging;
use cuffmon::procedure::MeasurementSession;

#[derive(Parser, Debug)]
#[command(name = "cuffmon", about = "Oscillometric blood pressure monitor (mock cuff)")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config/cuffmon.toml")]
    config: String,

    /// Number of measurement cycles to run (0 runs until interrupted).
    #[arg(long, default_value_t = 1)]
    cycles: u32,

    /// Uniform jitter half-width added to the simulated pressure, in mmHg.
    #[arg(long, default_value_t = 0.02)]
    noise: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = MonitorConfig::load_from(&cli.config)?;
    logging::init_from_config(&config)?;
    tracing::info!(config = %cli.config, "configuration loaded");

    let mut completed = 0u32;
    loop {
        let transfer = TransferFunction::new(&config.calibration);
        let cuff = MockCuff::healthy_session(transfer, cli.noise);
        let session = MeasurementSession::new(cuff, ConsoleSink, config.clone());

        match session.run().await {
            Ok(estimate) => {
                tracing::info!(
                    systolic = estimate.systolic,
                    diastolic = estimate.diastolic,
                    heart_rate_bpm = estimate.heart_rate_bpm,
                    "cycle complete"
                );
            }
            Err(err) => {
                tracing::warn!(error = %err, "cycle aborted, restarting");
            }
        }

        completed += 1;
        if cli.cycles != 0 && completed >= cli.cycles {
            break;
        }
    }

    Ok(())
}
