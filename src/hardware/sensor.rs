//! Cuff pressure transducer driver.
//!
//! Protocol Overview:
//! - Command: 3 bytes `{0xAA, 0x00, 0x00}` (start conversion + read)
//! - Settle: >= 5 ms between command and response request
//! - Response: 4 bytes, a status byte then the 24-bit pressure code MSB first
//!
//! Status byte decode, in priority order:
//! - bit 5 set   → device busy
//! - bit 6 clear → no power
//! - bit 2 set   → memory integrity fault
//! - bit 0 set   → math saturation
//!
//! One bus write + one bus read per call, no retries at this layer. Fault
//! classification is returned to the caller, which decides whether the cycle
//! restarts.

use std::time::Duration;

use crate::error::{BusFault, CuffError, CuffResult};
use crate::hardware::bus::RegisterBus;

/// Conversion-and-read command transmitted before every sample.
pub const READ_COMMAND: [u8; 3] = [0xAA, 0x00, 0x00];

/// Response length: status byte + 24-bit pressure code.
const RESPONSE_LEN: usize = 4;

const STATUS_BUSY: u8 = 1 << 5;
const STATUS_POWERED: u8 = 1 << 6;
const STATUS_MEMORY_FAULT: u8 = 1 << 2;
const STATUS_SATURATED: u8 = 1 << 0;

/// Outcome of one bus transaction: either a fault condition decoded from the
/// status byte, or a raw 24-bit pressure code. Consumed immediately by the
/// transfer function; never compared numerically against pressures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorReading {
    /// The device reported a fault (or nothing at all).
    Fault(BusFault),
    /// Raw 24-bit pressure code, MSB-first as transmitted.
    Value(u32),
}

/// Driver for the cuff pressure transducer.
///
/// Generic over the bus so the same driver runs against physical hardware
/// and [`crate::hardware::MockCuff`].
pub struct CuffSensor<B> {
    bus: B,
    settle: Duration,
}

impl<B: RegisterBus> CuffSensor<B> {
    /// Create a driver over `bus` with the given command-to-response settle
    /// time (the datasheet requires at least 5 ms).
    pub fn new(bus: B, settle: Duration) -> Self {
        Self { bus, settle }
    }

    /// Perform one pressure transaction.
    ///
    /// Transport failures surface as `Err`; device-reported conditions come
    /// back as `Ok(SensorReading::Fault(..))` so callers can distinguish a
    /// broken bus from a busy sensor.
    pub async fn read_code(&self) -> CuffResult<SensorReading> {
        self.bus
            .write(&READ_COMMAND)
            .await
            .map_err(CuffError::Bus)?;

        tokio::time::sleep(self.settle).await;

        let mut response = [0u8; RESPONSE_LEN];
        let available = self.bus.read(&mut response).await.map_err(CuffError::Bus)?;

        if available == 0 {
            return Ok(SensorReading::Fault(BusFault::Unavailable));
        }

        if let Some(fault) = decode_status(response[0]) {
            return Ok(SensorReading::Fault(fault));
        }

        if available < RESPONSE_LEN {
            // Status byte was clean but the pressure bytes never arrived.
            return Ok(SensorReading::Fault(BusFault::Unavailable));
        }

        Ok(SensorReading::Value(assemble_code(
            response[1],
            response[2],
            response[3],
        )))
    }
}

/// Decode the status byte. Returns the highest-priority fault, or `None`
/// when a pressure code follows.
fn decode_status(status: u8) -> Option<BusFault> {
    if status & STATUS_BUSY != 0 {
        Some(BusFault::Busy)
    } else if status & STATUS_POWERED == 0 {
        Some(BusFault::NoPower)
    } else if status & STATUS_MEMORY_FAULT != 0 {
        Some(BusFault::MemoryError)
    } else if status & STATUS_SATURATED != 0 {
        Some(BusFault::Saturated)
    } else {
        None
    }
}

/// Assemble the 24-bit code from the three pressure bytes, MSB first.
///
/// Widening to `u32` before the shift matters: a narrower intermediate would
/// silently truncate the high byte when shifted left by 16.
fn assemble_code(msb: u8, mid: u8, lsb: u8) -> u32 {
    (u32::from(msb) << 16) | (u32::from(mid) << 8) | u32::from(lsb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    /// Replays canned 4-byte responses, one per transaction.
    struct ScriptedBus {
        responses: Mutex<VecDeque<Vec<u8>>>,
    }

    impl ScriptedBus {
        fn new(responses: Vec<Vec<u8>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait::async_trait]
    impl RegisterBus for ScriptedBus {
        async fn write(&self, bytes: &[u8]) -> anyhow::Result<()> {
            assert_eq!(bytes, READ_COMMAND);
            Ok(())
        }

        async fn read(&self, buf: &mut [u8]) -> anyhow::Result<usize> {
            let mut responses = self.responses.lock().await;
            match responses.pop_front() {
                Some(bytes) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                None => Ok(0),
            }
        }
    }

    fn sensor(responses: Vec<Vec<u8>>) -> CuffSensor<ScriptedBus> {
        CuffSensor::new(ScriptedBus::new(responses), Duration::ZERO)
    }

    const STATUS_OK: u8 = STATUS_POWERED;

    #[tokio::test]
    async fn assembles_24_bit_code_msb_first() {
        let s = sensor(vec![vec![STATUS_OK, 0x01, 0x02, 0x03]]);
        assert_eq!(
            s.read_code().await.unwrap(),
            SensorReading::Value(0x010203)
        );
    }

    #[tokio::test]
    async fn maximum_code_survives_assembly() {
        let s = sensor(vec![vec![STATUS_OK, 0xFF, 0xFF, 0xFF]]);
        assert_eq!(
            s.read_code().await.unwrap(),
            SensorReading::Value(0xFF_FFFF)
        );
    }

    #[tokio::test]
    async fn busy_bit_wins_regardless_of_other_bits() {
        // Busy set along with power, memory fault and saturation: busy wins.
        let status = STATUS_BUSY | STATUS_POWERED | STATUS_MEMORY_FAULT | STATUS_SATURATED;
        let s = sensor(vec![vec![status, 0, 0, 0]]);
        assert_eq!(
            s.read_code().await.unwrap(),
            SensorReading::Fault(BusFault::Busy)
        );
    }

    #[tokio::test]
    async fn status_priority_order() {
        // No power outranks memory fault and saturation.
        assert_eq!(
            decode_status(STATUS_MEMORY_FAULT | STATUS_SATURATED),
            Some(BusFault::NoPower)
        );
        // Memory fault outranks saturation once powered.
        assert_eq!(
            decode_status(STATUS_POWERED | STATUS_MEMORY_FAULT | STATUS_SATURATED),
            Some(BusFault::MemoryError)
        );
        assert_eq!(
            decode_status(STATUS_POWERED | STATUS_SATURATED),
            Some(BusFault::Saturated)
        );
        assert_eq!(decode_status(STATUS_POWERED), None);
    }

    #[tokio::test]
    async fn no_bytes_is_unavailable() {
        let s = sensor(vec![]);
        assert_eq!(
            s.read_code().await.unwrap(),
            SensorReading::Fault(BusFault::Unavailable)
        );
    }

    #[tokio::test]
    async fn short_response_is_unavailable() {
        let s = sensor(vec![vec![STATUS_OK, 0x12]]);
        assert_eq!(
            s.read_code().await.unwrap(),
            SensorReading::Fault(BusFault::Unavailable)
        );
    }
}
