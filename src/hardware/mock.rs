//! Mock cuff hardware.
//!
//! `MockCuff` simulates the transducer plus the human on the pump: it
//! replays a scripted pressure profile, advancing one value per bus
//! transaction and encoding each mmHg value back onto the wire with the
//! inverse transfer function. Profiles cover the whole cycle (idle cuff,
//! pump-up, deflation with arterial oscillations), so the full session runs
//! without physical hardware.
//!
//! Fault injection replaces the response of a chosen transaction with the
//! corresponding status byte (or with silence, for `Unavailable`), which is
//! how the driver's abandon-the-cycle policy is exercised end to end.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;

use crate::calibration::TransferFunction;
use crate::error::BusFault;
use crate::hardware::bus::RegisterBus;
use crate::hardware::sensor::READ_COMMAND;

/// Simulated cuff transducer replaying a pressure profile.
pub struct MockCuff {
    transfer: TransferFunction,
    state: Mutex<MockState>,
}

struct MockState {
    profile: Vec<f64>,
    cursor: usize,
    transaction: usize,
    pending: Option<Response>,
    fault_at: Option<(usize, BusFault)>,
}

enum Response {
    Bytes([u8; 4]),
    Silence,
}

/// Status byte for a clean reading: powered, nothing else flagged.
const STATUS_OK: u8 = 0b0100_0000;

fn fault_response(fault: BusFault) -> Response {
    match fault {
        BusFault::Busy => Response::Bytes([0b0110_0000, 0, 0, 0]),
        BusFault::NoPower => Response::Bytes([0b0000_0000, 0, 0, 0]),
        BusFault::MemoryError => Response::Bytes([0b0100_0100, 0, 0, 0]),
        BusFault::Saturated => Response::Bytes([0b0100_0001, 0, 0, 0]),
        BusFault::Unavailable => Response::Silence,
    }
}

impl MockCuff {
    /// Create a mock replaying `profile` (mmHg, one value per transaction).
    /// Once the profile is exhausted the last value repeats.
    pub fn new(transfer: TransferFunction, profile: Vec<f64>) -> Self {
        Self {
            transfer,
            state: Mutex::new(MockState {
                profile,
                cursor: 0,
                transaction: 0,
                pending: None,
                fault_at: None,
            }),
        }
    }

    /// A complete healthy cycle: idle, prompt pump-up, then a steady
    /// ~4.5 mmHg/s deflation carrying an oscillation envelope that rises and
    /// decays through the detection bands.
    ///
    /// `noise` adds uniform jitter of that half-width (mmHg) from a seeded
    /// generator; pass `0.0` for a bit-reproducible profile.
    pub fn healthy_session(transfer: TransferFunction, noise: f64) -> Self {
        Self::new(transfer, healthy_profile(noise))
    }

    /// Replace the response of 0-based `transaction` with `fault`.
    pub fn fail_at(self, transaction: usize, fault: BusFault) -> Self {
        if let Ok(mut state) = self.state.try_lock() {
            state.fault_at = Some((transaction, fault));
        }
        self
    }
}

#[async_trait]
impl RegisterBus for MockCuff {
    async fn write(&self, bytes: &[u8]) -> Result<()> {
        if bytes != READ_COMMAND {
            return Err(anyhow!("unexpected command bytes: {bytes:02X?}"));
        }

        let mut state = self.state.lock().await;

        let injected = match state.fault_at {
            Some((at, fault)) if at == state.transaction => Some(fault),
            _ => None,
        };
        state.transaction += 1;

        if let Some(fault) = injected {
            state.pending = Some(fault_response(fault));
            return Ok(());
        }

        let mmhg = state
            .profile
            .get(state.cursor)
            .or_else(|| state.profile.last())
            .copied()
            .unwrap_or(0.0);
        if state.cursor < state.profile.len() {
            state.cursor += 1;
        }

        let code = self.transfer.to_code(mmhg);
        state.pending = Some(Response::Bytes([
            STATUS_OK,
            (code >> 16) as u8,
            (code >> 8) as u8,
            code as u8,
        ]));
        Ok(())
    }

    async fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.state.lock().await;
        match state.pending.take() {
            Some(Response::Bytes(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Response::Silence) | None => Ok(0),
        }
    }
}

/// Pump-up portion shared by the profile builders: an idle reading, a clear
/// pump-start rise, then fast inflation past the 170 mmHg target.
fn pump_up_profile() -> Vec<f64> {
    vec![12.0, 20.0, 60.0, 100.0, 140.0, 174.0]
}

/// Full healthy-cycle profile. See [`MockCuff::healthy_session`].
pub fn healthy_profile(noise: f64) -> Vec<f64> {
    let mut profile = pump_up_profile();
    profile.extend(oscillating_deflation(noise));
    profile
}

/// A cycle where the operator opens the valve too far: the deflation runs
/// near 8 mmHg per anchor window, tripping a rate warning at every
/// classification.
pub fn rapid_release_profile() -> Vec<f64> {
    let mut profile = pump_up_profile();
    let mut mmhg = 166.0;
    while mmhg > 39.0 {
        profile.push(mmhg);
        mmhg -= 0.16;
    }
    profile
}

/// Deflation from 172 mmHg to the 40 mmHg floor, with a short oscillation
/// bump every 40 samples whose amplitude ramps up to 2.4 mmHg mid-descent
/// and back down, the classic oscillometric envelope.
///
/// The slope-quality window spanning the valve handoff charges the whole
/// drop from the pump-up peak, so the first 49 samples descend slightly
/// slower (0.07 mmHg per sample) before settling at 0.09 mmHg per sample
/// (4.5 mmHg/s at the nominal 50 Hz).
fn oscillating_deflation(noise: f64) -> Vec<f64> {
    const START: f64 = 172.0;
    const FLOOR: f64 = 39.0;
    const EARLY_RATE: f64 = 0.07;
    const EARLY_SAMPLES: usize = 49;
    const RATE: f64 = 0.09;
    const BUMP_PERIOD: usize = 40;
    // Offset keeps bump samples clear of the 50-sample anchor points, so the
    // slope classification sees the underlying release rate.
    const BUMP_OFFSET: usize = 13;
    const BUMP_SHAPE: [f64; 5] = [0.35, 0.8, 1.0, 0.8, 0.35];
    const BUMP_COUNT: usize = 37;
    const PEAK_AMPLITUDE: f64 = 2.4;
    const EDGE_AMPLITUDE: f64 = 0.2;

    let mut rng = StdRng::seed_from_u64(0x43_55_46_46); // "CUFF"
    let mut profile = Vec::new();
    let mut i = 0usize;

    loop {
        let early = i.min(EARLY_SAMPLES) as f64;
        let late = i.saturating_sub(EARLY_SAMPLES) as f64;
        let base = START - EARLY_RATE * early - RATE * late;
        if base <= FLOOR {
            break;
        }

        let mut mmhg = base;
        if i >= BUMP_OFFSET {
            let since = i - BUMP_OFFSET;
            let bump = since / BUMP_PERIOD;
            let phase = since % BUMP_PERIOD;
            if phase < BUMP_SHAPE.len() && bump < BUMP_COUNT {
                let ramp = 1.0 - (bump as f64 - 18.0).abs() / 18.0;
                let amplitude =
                    EDGE_AMPLITUDE + (PEAK_AMPLITUDE - EDGE_AMPLITUDE) * ramp;
                mmhg += BUMP_SHAPE[phase] * amplitude;
            }
        }
        if noise > 0.0 {
            mmhg += noise * (rng.gen::<f64>() - 0.5);
        }

        profile.push(mmhg);
        i += 1;
    }

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BusFault;
    use crate::hardware::sensor::{CuffSensor, SensorReading};
    use std::time::Duration;

    fn sensor(mock: MockCuff) -> CuffSensor<MockCuff> {
        CuffSensor::new(mock, Duration::ZERO)
    }

    #[tokio::test]
    async fn replays_profile_through_the_wire_format() {
        let transfer = TransferFunction::default();
        let s = sensor(MockCuff::new(transfer.clone(), vec![120.0, 80.0]));

        for expected in [120.0, 80.0, 80.0] {
            match s.read_code().await.unwrap() {
                SensorReading::Value(raw) => {
                    assert!((transfer.to_mmhg(raw) - expected).abs() < 1e-3);
                }
                SensorReading::Fault(f) => panic!("unexpected fault: {f}"),
            }
        }
    }

    #[tokio::test]
    async fn injects_fault_at_requested_transaction() {
        let transfer = TransferFunction::default();
        let s = sensor(
            MockCuff::new(transfer, vec![120.0, 120.0, 120.0]).fail_at(1, BusFault::Busy),
        );

        assert!(matches!(
            s.read_code().await.unwrap(),
            SensorReading::Value(_)
        ));
        assert_eq!(
            s.read_code().await.unwrap(),
            SensorReading::Fault(BusFault::Busy)
        );
        assert!(matches!(
            s.read_code().await.unwrap(),
            SensorReading::Value(_)
        ));
    }

    #[tokio::test]
    async fn silence_injection_reads_zero_bytes() {
        let transfer = TransferFunction::default();
        let s = sensor(
            MockCuff::new(transfer, vec![120.0]).fail_at(0, BusFault::Unavailable),
        );
        assert_eq!(
            s.read_code().await.unwrap(),
            SensorReading::Fault(BusFault::Unavailable)
        );
    }

    #[test]
    fn healthy_profile_covers_the_whole_cycle() {
        let profile = healthy_profile(0.0);
        // Climbs past the inflation target...
        assert!(profile.iter().any(|&p| p >= 170.0));
        // ...and descends to the measurement floor.
        assert!(profile.last().copied().unwrap_or(f64::MAX) <= 40.0);
        // Stays inside the transducer's calibrated range throughout.
        assert!(profile.iter().all(|&p| (0.0..=300.0).contains(&p)));
    }
}
