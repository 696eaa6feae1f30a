//! cuffmon: a non-invasive oscillometric blood pressure monitor.
//!
//! The monitor drives a 24-bit digital pressure transducer over a register
//! bus, supervises a manually pumped cuff through inflation and controlled
//! deflation, and extracts systolic pressure, diastolic pressure and heart
//! rate from the oscillation envelope riding on the deflation curve.
//!
//! # Architecture
//!
//! - [`hardware`]: the [`hardware::RegisterBus`] trait, the transducer
//!   driver with status-bit decoding, and a scripted mock cuff
//! - [`calibration`]: the linear transfer function between raw sensor codes
//!   and mmHg
//! - [`procedure`]: the measurement session driving pump-up supervision and
//!   deflation monitoring
//! - [`analysis`]: rolling-average envelope extraction and the crossing
//!   detector producing the final estimate
//! - [`measurement`]: the bounded sample series and the estimate type
//! - [`config`], [`error`], [`logging`], [`display`]: the ambient layer
//!
//! Hardware access goes through [`hardware::RegisterBus`], so the whole
//! pipeline runs identically against real transducers and the mock.

pub mod analysis;
pub mod calibration;
pub mod config;
pub mod display;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod measurement;
pub mod procedure;

pub use error::{BusFault, CuffError, CuffResult};
pub use measurement::BpEstimate;
pub use procedure::MeasurementSession;
