//! The boundary between the transaction layer and the platform's SPI driver.

use embassy_time::Duration;

use crate::types::{BusConfig, DeviceConfig};

/// Transport-assigned identity of a registered device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId(pub usize);

/// Completion token for one queued transaction.
///
/// Returned by [`SpiTransport::queue_transaction`] and reported back by
/// [`SpiTransport::poll_completion`]; the transaction layer compares the two
/// to detect a result that belongs to a different descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ticket(pub u32);

/// How a transaction is handed to the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubmitMode {
    /// Place the transfer in the device's bounded FIFO; completion is
    /// observed later.
    Queued,
    /// Busy-sample the hardware from the calling task for minimum latency.
    Polling,
}

/// Outcome of one completion poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitOutcome {
    /// The transaction identified by the ticket finished.
    Complete(Ticket),
    /// Nothing finished within the timeout.
    TimedOut,
}

/// Platform SPI master driver as seen by the transaction layer.
///
/// Implementations own pin claiming, the per-device transfer FIFO, and the
/// completion signal. All methods take `&self`; the transport is shared by
/// every device handle on the bus.
///
/// Transfers are full duplex: a transaction clocks `tx.len()` bytes out and
/// the same number in. The transport must buffer the received bytes until
/// [`take_result`](Self::take_result) collects them, exactly once per ticket.
pub trait SpiTransport {
    /// Platform error carrying the native numeric error code.
    type Error: core::fmt::Debug;

    /// Claim pins and DMA for the bus. Must fail if the bus is already
    /// initialized and has not been freed since.
    fn init_bus(&self, config: &BusConfig) -> Result<(), Self::Error>;

    /// Release the bus hardware. Pairs with [`init_bus`](Self::init_bus).
    fn free_bus(&self) -> Result<(), Self::Error>;

    /// Register a device. Must reject a chip select already present on the
    /// bus and a frequency above the bus capability.
    fn add_device(&self, config: &DeviceConfig)
        -> Result<DeviceId, Self::Error>;

    /// Deregister a device. The caller guarantees it has no transaction in
    /// flight.
    fn remove_device(&self, device: DeviceId);

    /// Take exclusive ownership of the bus for `device`. Waits without bound;
    /// an error means an unrecoverable transport fault, never a timeout.
    async fn acquire_bus(&self, device: DeviceId) -> Result<(), Self::Error>;

    /// Give up exclusive ownership taken by
    /// [`acquire_bus`](Self::acquire_bus).
    fn release_bus(&self, device: DeviceId);

    /// Hand one transfer to the hardware. Fails when the device's FIFO is
    /// full or the transport rejects the submission. The caller holds the
    /// bus.
    fn queue_transaction(
        &self,
        device: DeviceId,
        mode: SubmitMode,
        tx: &[u8],
    ) -> Result<Ticket, Self::Error>;

    /// Wait up to `timeout` for the oldest outstanding transaction of
    /// `device` to finish. `TimedOut` is a normal outcome and leaves the
    /// transaction in flight.
    async fn poll_completion(
        &self,
        device: DeviceId,
        timeout: Duration,
    ) -> Result<WaitOutcome, Self::Error>;

    /// Copy the received bytes of a completed transaction into `rx` and
    /// retire the ticket. Returns the number of bytes written.
    fn take_result(
        &self,
        device: DeviceId,
        ticket: Ticket,
        rx: &mut [u8],
    ) -> Result<usize, Self::Error>;
}
