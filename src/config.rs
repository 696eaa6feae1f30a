//! Configuration system using Figment.
//!
//! Strongly-typed configuration for the monitor, loaded from:
//! 1. a TOML file (base configuration)
//! 2. environment variables (prefixed with `CUFFMON_`)
//!
//! Every tuning constant of the measurement pipeline lives here with its
//! datasheet/empirical default, so a deployment can adjust cadences and
//! thresholds without touching the algorithm. `validate()` catches
//! semantically broken overrides (inverted bands, zero windows) before a
//! session starts.
//!
//! # Example
//! ```no_run
//! use cuffmon::config::MonitorConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MonitorConfig::load()?;
//! println!("inflation target: {} mmHg", config.pump_up.target_mmhg);
//! # Ok(())
//! # }
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{CuffError, CuffResult};

/// Top-level monitor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Application settings.
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Transducer bus transaction settings.
    #[serde(default)]
    pub sensor: SensorConfig,
    /// Linear transfer-function calibration constants.
    #[serde(default)]
    pub calibration: CalibrationConfig,
    /// Pump-up supervision settings.
    #[serde(default)]
    pub pump_up: PumpUpConfig,
    /// Deflation sampling and rate-quality settings.
    #[serde(default)]
    pub deflation: DeflationConfig,
    /// Envelope analysis tuning constants.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name used in the welcome banner.
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Bus transaction settings for the pressure transducer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Settle time between issuing the read command and requesting the
    /// 4-byte response. The datasheet requires at least 5 ms.
    #[serde(with = "humantime_serde", default = "default_settle")]
    pub settle: Duration,
}

/// Calibration constants for the linear transfer function mapping raw
/// 24-bit sensor codes to mmHg. Fixed inputs from the transducer datasheet;
/// this crate does not discover them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Pressure at the low end of the output range, in mmHg.
    #[serde(default = "default_pressure_min")]
    pub pressure_min: f64,
    /// Pressure at the high end of the output range, in mmHg.
    #[serde(default = "default_pressure_max")]
    pub pressure_max: f64,
    /// Raw sensor code corresponding to `pressure_min`.
    #[serde(default = "default_output_min")]
    pub output_min: u32,
    /// Raw sensor code corresponding to `pressure_max`.
    #[serde(default = "default_output_max")]
    pub output_max: u32,
}

/// Pump-up supervision settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PumpUpConfig {
    /// Rise over the initial reading that confirms the operator has started
    /// pumping (filters idle noise).
    #[serde(default = "default_rise_threshold")]
    pub rise_threshold_mmhg: f64,
    /// Inflation target; deflation begins once pressure reaches this.
    #[serde(default = "default_target")]
    pub target_mmhg: f64,
    /// Gap between the initial reading and the first comparison reading.
    #[serde(with = "humantime_serde", default = "default_initial_gap")]
    pub initial_gap: Duration,
    /// Re-read cadence while waiting for pumping to start.
    #[serde(with = "humantime_serde", default = "default_start_poll")]
    pub start_poll: Duration,
    /// Cadence of the live pressure readout while pumping toward the target.
    #[serde(with = "humantime_serde", default = "default_progress_interval")]
    pub progress_interval: Duration,
}

/// Deflation sampling and rate-quality settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeflationConfig {
    /// Pressure floor ending the sampling loop, in mmHg.
    #[serde(default = "default_floor")]
    pub floor_mmhg: f64,
    /// Pause between samples. Together with bus latency this approximates
    /// the 50 Hz sampling rate the analysis constants assume.
    #[serde(with = "humantime_serde", default = "default_sample_interval")]
    pub sample_interval: Duration,
    /// Pause between reaching the target pressure and the first deflation
    /// sample, giving the operator time to open the release valve.
    #[serde(with = "humantime_serde", default = "default_handoff_delay")]
    pub handoff_delay: Duration,
    /// Maximum number of samples retained for analysis; sampling and rate
    /// classification continue after the buffer fills, appends stop.
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    /// Samples between anchor-pressure re-bases / slope classifications.
    #[serde(default = "default_anchor_window")]
    pub anchor_window: usize,
    /// Slope above this (mmHg per anchor window) is "too fast".
    #[serde(default = "default_slope_fast")]
    pub slope_fast: f64,
    /// Slope below this (mmHg per anchor window) is "too slow".
    #[serde(default = "default_slope_slow")]
    pub slope_slow: f64,
    /// Warning count beyond which the session is declared unreliable.
    #[serde(default = "default_max_warnings")]
    pub max_warnings: u32,
}

/// Envelope analysis tuning constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Rolling-average window length in samples.
    #[serde(default = "default_avg_window")]
    pub avg_window: usize,
    /// Bias added to each oscillation magnitude to keep the envelope
    /// positive so the ratio bands behave.
    #[serde(default = "default_magnitude_bias")]
    pub magnitude_bias: f64,
    /// Amplitude-ratio band (of the envelope maximum) marking systolic
    /// pressure; the FIRST sample inside the open interval wins.
    #[serde(default = "default_systolic_band")]
    pub systolic_band: (f64, f64),
    /// Amplitude-ratio band marking diastolic pressure; the LAST sample
    /// inside the open interval wins.
    #[serde(default = "default_diastolic_band")]
    pub diastolic_band: (f64, f64),
    /// Magnitude above which a sample counts toward the heartbeat tally.
    /// Empirical constant; no derivation exists, do not re-tune casually.
    #[serde(default = "default_beat_threshold")]
    pub beat_threshold: f64,
    /// Divisor compensating for the same oscillation being counted across
    /// several consecutive samples. Empirical constant.
    #[serde(default = "default_beat_correction")]
    pub beat_correction: f64,
    /// Sampling rate the heart-rate scaling assumes, in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: f64,
}

// Default value functions
fn default_app_name() -> String {
    "cuffmon".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_settle() -> Duration {
    Duration::from_millis(5)
}
fn default_pressure_min() -> f64 {
    0.0
}
fn default_pressure_max() -> f64 {
    300.0
}
fn default_output_min() -> u32 {
    419_430
}
fn default_output_max() -> u32 {
    3_774_873
}
fn default_rise_threshold() -> f64 {
    5.0
}
fn default_target() -> f64 {
    170.0
}
fn default_initial_gap() -> Duration {
    Duration::from_millis(50)
}
fn default_start_poll() -> Duration {
    Duration::from_millis(750)
}
fn default_progress_interval() -> Duration {
    Duration::from_millis(1000)
}
fn default_floor() -> f64 {
    40.0
}
fn default_sample_interval() -> Duration {
    Duration::from_millis(15)
}
fn default_handoff_delay() -> Duration {
    Duration::from_millis(1000)
}
fn default_max_samples() -> usize {
    1500
}
fn default_anchor_window() -> usize {
    50
}
fn default_slope_fast() -> f64 {
    6.0
}
fn default_slope_slow() -> f64 {
    2.0
}
fn default_max_warnings() -> u32 {
    5
}
fn default_avg_window() -> usize {
    5
}
fn default_magnitude_bias() -> f64 {
    0.7
}
fn default_systolic_band() -> (f64, f64) {
    (0.48, 0.53)
}
fn default_diastolic_band() -> (f64, f64) {
    (0.78, 0.83)
}
fn default_beat_threshold() -> f64 {
    1.0
}
fn default_beat_correction() -> f64 {
    2.6
}
fn default_sample_rate() -> f64 {
    50.0
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            settle: default_settle(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            pressure_min: default_pressure_min(),
            pressure_max: default_pressure_max(),
            output_min: default_output_min(),
            output_max: default_output_max(),
        }
    }
}

impl Default for PumpUpConfig {
    fn default() -> Self {
        Self {
            rise_threshold_mmhg: default_rise_threshold(),
            target_mmhg: default_target(),
            initial_gap: default_initial_gap(),
            start_poll: default_start_poll(),
            progress_interval: default_progress_interval(),
        }
    }
}

impl Default for DeflationConfig {
    fn default() -> Self {
        Self {
            floor_mmhg: default_floor(),
            sample_interval: default_sample_interval(),
            handoff_delay: default_handoff_delay(),
            max_samples: default_max_samples(),
            anchor_window: default_anchor_window(),
            slope_fast: default_slope_fast(),
            slope_slow: default_slope_slow(),
            max_warnings: default_max_warnings(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            avg_window: default_avg_window(),
            magnitude_bias: default_magnitude_bias(),
            systolic_band: default_systolic_band(),
            diastolic_band: default_diastolic_band(),
            beat_threshold: default_beat_threshold(),
            beat_correction: default_beat_correction(),
            sample_rate_hz: default_sample_rate(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from `config/cuffmon.toml` and environment
    /// variables.
    ///
    /// Environment variables override configuration with prefix `CUFFMON_`.
    /// Example: `CUFFMON_APPLICATION_LOG_LEVEL=debug`.
    pub fn load() -> CuffResult<Self> {
        Self::load_from("config/cuffmon.toml")
    }

    /// Load configuration from a specific file path. A missing file yields
    /// the built-in defaults (every field has one).
    pub fn load_from<P: AsRef<Path>>(path: P) -> CuffResult<Self> {
        let config: Self = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("CUFFMON_").split("_"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> CuffResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(CuffError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.calibration.output_max <= self.calibration.output_min {
            return Err(CuffError::Configuration(
                "calibration output_max must exceed output_min".into(),
            ));
        }
        if self.calibration.pressure_max <= self.calibration.pressure_min {
            return Err(CuffError::Configuration(
                "calibration pressure_max must exceed pressure_min".into(),
            ));
        }
        if self.calibration.output_max > 0x00FF_FFFF {
            return Err(CuffError::Configuration(
                "calibration output_max exceeds the sensor's 24-bit range".into(),
            ));
        }

        if self.pump_up.target_mmhg <= self.deflation.floor_mmhg {
            return Err(CuffError::Configuration(format!(
                "pump-up target ({} mmHg) must exceed the deflation floor ({} mmHg)",
                self.pump_up.target_mmhg, self.deflation.floor_mmhg
            )));
        }

        if self.deflation.anchor_window == 0 {
            return Err(CuffError::Configuration(
                "deflation anchor_window must be at least 1".into(),
            ));
        }
        if self.deflation.slope_fast <= self.deflation.slope_slow {
            return Err(CuffError::Configuration(
                "deflation slope_fast must exceed slope_slow".into(),
            ));
        }

        if self.analysis.avg_window == 0 {
            return Err(CuffError::Configuration(
                "analysis avg_window must be at least 1".into(),
            ));
        }
        if self.deflation.max_samples <= self.analysis.avg_window {
            return Err(CuffError::Configuration(
                "deflation max_samples must exceed the rolling-average window".into(),
            ));
        }
        for (name, band) in [
            ("systolic_band", self.analysis.systolic_band),
            ("diastolic_band", self.analysis.diastolic_band),
        ] {
            if band.0 >= band.1 {
                return Err(CuffError::Configuration(format!(
                    "analysis {name} lower bound must be below its upper bound"
                )));
            }
        }
        // Swapping the bands changes clinical meaning: systolic must be the
        // lower ratio band, found on the rising envelope.
        if self.analysis.systolic_band.1 > self.analysis.diastolic_band.0 {
            return Err(CuffError::Configuration(
                "analysis systolic_band must lie entirely below diastolic_band".into(),
            ));
        }
        if self.analysis.beat_correction <= 0.0 {
            return Err(CuffError::Configuration(
                "analysis beat_correction must be positive".into(),
            ));
        }
        if self.analysis.sample_rate_hz <= 0.0 {
            return Err(CuffError::Configuration(
                "analysis sample_rate_hz must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_datasheet_and_tuning_constants() {
        let config = MonitorConfig::default();
        assert_eq!(config.calibration.output_min, 419_430);
        assert_eq!(config.calibration.output_max, 3_774_873);
        assert_eq!(config.pump_up.target_mmhg, 170.0);
        assert_eq!(config.deflation.floor_mmhg, 40.0);
        assert_eq!(config.deflation.max_samples, 1500);
        assert_eq!(config.deflation.anchor_window, 50);
        assert_eq!(config.analysis.systolic_band, (0.48, 0.53));
        assert_eq!(config.analysis.diastolic_band, (0.78, 0.83));
        assert_eq!(config.analysis.beat_correction, 2.6);
        config.validate().unwrap();
    }

    #[test]
    fn loads_overrides_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[pump_up]\ntarget_mmhg = 160.0\n\n[deflation]\nmax_warnings = 3\n"
        )
        .unwrap();

        let config = MonitorConfig::load_from(file.path()).unwrap();
        assert_eq!(config.pump_up.target_mmhg, 160.0);
        assert_eq!(config.deflation.max_warnings, 3);
        // Untouched sections keep their defaults.
        assert_eq!(config.deflation.floor_mmhg, 40.0);
    }

    #[test]
    fn rejects_overlapping_bands() {
        let mut config = MonitorConfig::default();
        config.analysis.systolic_band = (0.48, 0.80);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("systolic_band"));
    }

    #[test]
    fn rejects_inverted_targets() {
        let mut config = MonitorConfig::default();
        config.pump_up.target_mmhg = 30.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_log_level() {
        let mut config = MonitorConfig::default();
        config.application.log_level = "loud".into();
        assert!(config.validate().is_err());
    }
}
