//! Hardware layer: the bus seam, the transducer driver, and the simulator.
//!
//! The only path to physical hardware is the [`bus::RegisterBus`] capability
//! trait; everything above it (driver, calibration, procedure, analysis) is
//! hardware-agnostic and fully exercised against [`mock::MockCuff`].

pub mod bus;
pub mod mock;
pub mod sensor;

pub use bus::RegisterBus;
pub use mock::MockCuff;
pub use sensor::{CuffSensor, SensorReading};
