use embassy_sync::blocking_mutex::raw::RawMutex;
use portable_atomic::{AtomicBool, Ordering};

use crate::device::SpiDevice;
use crate::error::Error;
use crate::transport::SpiTransport;
use crate::types::{
    BusConfig, BusIndex, ChipSelect, DmaChannel, Frequency, PinAssignment,
    QueueDepth, TransferSize,
};

/// Owner of one shared SPI bus for exactly one init/teardown cycle.
///
/// Construction claims the bus pins and DMA through the transport; the bus
/// is freed by [`shutdown`](Self::shutdown), or on drop if `shutdown` was
/// never called. Teardown happens exactly once either way.
///
/// `shutdown` (and drop) must not happen while any device on this bus has a
/// transaction in flight; that ordering is the caller's responsibility and
/// is not detected here.
pub struct BusController<T: SpiTransport> {
    transport: T,
    config: BusConfig,
    torn_down: AtomicBool,
}

impl<T: SpiTransport> BusController<T> {
    /// Bring the bus up: claim the pin assignment and DMA channel and set
    /// the per-transfer size ceiling.
    pub fn initialize(
        transport: T,
        index: BusIndex,
        pins: PinAssignment,
        transfer_size: TransferSize,
        dma: DmaChannel,
    ) -> Result<Self, Error<T::Error>> {
        let config = BusConfig { index, pins, transfer_size, dma };
        transport.init_bus(&config).map_err(Error::Initialization)?;
        Ok(Self { transport, config, torn_down: AtomicBool::new(false) })
    }

    /// Release the bus hardware.
    pub fn shutdown(self) -> Result<(), Error<T::Error>> {
        self.torn_down.store(true, Ordering::Release);
        self.transport.free_bus().map_err(Error::Initialization)
    }

    /// Register a device handle on this bus.
    pub fn device<M: RawMutex>(
        &self,
        cs: ChipSelect,
        frequency: Frequency,
        queue_depth: QueueDepth,
    ) -> Result<SpiDevice<'_, M, T>, Error<T::Error>> {
        SpiDevice::attach(self, cs, frequency, queue_depth)
    }

    pub fn index(&self) -> BusIndex {
        self.config.index
    }

    /// Byte-size ceiling for a single transfer on this bus.
    pub fn max_transfer_size(&self) -> usize {
        self.config.transfer_size.get()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: SpiTransport> Drop for BusController<T> {
    fn drop(&mut self) {
        if !self.torn_down.swap(true, Ordering::AcqRel) {
            // Teardown error on the implicit path has no one to report to.
            let _ = self.transport.free_bus();
        }
    }
}
