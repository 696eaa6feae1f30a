//! Bus capability trait.
//!
//! The pressure transducer sits on a register-style bus (I2C on real
//! hardware) at a fixed address. A bus implementation is bound to that one
//! device; the driver issues raw transactions without addressing.
//!
//! # Contract
//! - `write` transmits the given bytes as a single transaction
//! - `read` requests up to `buf.len()` bytes and returns how many the device
//!   actually produced; `0` means the device had nothing to say, which the
//!   driver maps to a fault rather than an error
//! - Transport-level failures (the bus itself broke, not the device
//!   reporting a condition) surface as `Err`
//! - The bus is a single shared resource; callers serialize transactions
//!   through one driver, so implementations need no locking discipline
//!   beyond `Send + Sync`
#[async_trait::async_trait]
pub trait RegisterBus: Send + Sync {
    /// Write `bytes` to the device as one transaction.
    async fn write(&self, bytes: &[u8]) -> anyhow::Result<()>;

    /// Request up to `buf.len()` bytes from the device.
    ///
    /// Returns the number of bytes the device made available, which may be
    /// zero.
    async fn read(&self, buf: &mut [u8]) -> anyhow::Result<usize>;
}

#[async_trait::async_trait]
impl<T: RegisterBus + ?Sized> RegisterBus for std::sync::Arc<T> {
    async fn write(&self, bytes: &[u8]) -> anyhow::Result<()> {
        (**self).write(bytes).await
    }

    async fn read(&self, buf: &mut [u8]) -> anyhow::Result<usize> {
        (**self).read(buf).await
    }
}
