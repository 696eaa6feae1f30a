//! Custom error types for the application.
//!
//! This module defines the fault taxonomy for the measurement stack. There are
//! two layers:
//!
//! - **`BusFault`**: conditions the transducer reports through its status byte
//!   (or by returning nothing at all). These are transient/environmental; the
//!   operator is told what happened and the whole measurement cycle is
//!   abandoned and restarted. The driver never encodes these as numeric
//!   sentinel values; they travel as explicit tags so a fault can never be
//!   mistaken for a pressure.
//! - **`CuffError`**: the application-level error consolidating bus faults,
//!   transport failures, configuration problems, and the one algorithmic
//!   failure mode (`DeflationUnreliable`, raised when the operator released
//!   the cuff too erratically for the envelope analysis to be trusted).
//!
//! No variant is fatal: every failure path returns control to the top-level
//! cycle for the operator to retry.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type CuffResult<T> = std::result::Result<T, CuffError>;

/// Fault conditions decoded from the transducer's status byte, in the order
/// the driver checks them (Busy > NoPower > MemoryError > Saturated), plus
/// `Unavailable` for a transaction that produced no bytes at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusFault {
    /// Status bit 5 set: the device is mid-conversion.
    #[error("device is busy")]
    Busy,

    /// Status bit 6 clear: the device reports no power.
    #[error("no power")]
    NoPower,

    /// Status bit 2 set: integrity check of the device memory failed.
    #[error("memory error")]
    MemoryError,

    /// Status bit 0 set: internal math saturation, the reading is invalid.
    #[error("math saturation")]
    Saturated,

    /// The device returned no bytes when a response was requested.
    #[error("no bytes available to read")]
    Unavailable,
}

/// Application error for the measurement stack.
#[derive(Error, Debug)]
pub enum CuffError {
    /// The sensor reported a fault through its status byte.
    #[error("sensor fault: {0}")]
    Sensor(#[from] BusFault),

    /// The underlying bus transport failed (I/O level, below the protocol).
    #[error("bus transport error: {0}")]
    Bus(#[source] anyhow::Error),

    /// The cuff was released too fast or too slow for too much of the
    /// deflation; the sample series cannot support a trustworthy estimate.
    #[error("deflation rate unreliable: {warnings} rate warnings")]
    DeflationUnreliable {
        /// Number of rate warnings accumulated during the deflation loop.
        warnings: u32,
    },

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration parsed but failed semantic validation.
    #[error("configuration validation error: {0}")]
    Configuration(String),

    /// File or terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_fault_propagates_into_cuff_error() {
        let err: CuffError = BusFault::Busy.into();
        match err {
            CuffError::Sensor(BusFault::Busy) => {}
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn deflation_unreliable_reports_warning_count() {
        let err = CuffError::DeflationUnreliable { warnings: 6 };
        assert!(err.to_string().contains("6 rate warnings"));
    }
}
