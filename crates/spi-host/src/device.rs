use alloc::sync::Arc;

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::bus::BusController;
use crate::error::Error;
use crate::future::TransferFuture;
use crate::transaction::{Transaction, TransferRequest, SHORT_PAYLOAD_MAX};
use crate::transport::{DeviceId, SpiTransport, SubmitMode};
use crate::types::{ChipSelect, DeviceConfig, Frequency, QueueDepth};

/// One logical peripheral on a shared bus.
///
/// A handle registers its chip select, clock frequency, and queue depth with
/// the transport on attach and deregisters on drop. It must outlive every
/// transaction it issues; dropping it with a transfer still in flight leaves
/// the transport pointing at a dead registration.
pub struct SpiDevice<'a, M: RawMutex, T: SpiTransport> {
    bus: &'a BusController<T>,
    id: DeviceId,
    config: DeviceConfig,
    prepared: Option<Arc<Transaction<'a, M, T>>>,
}

impl<'a, M: RawMutex, T: SpiTransport> SpiDevice<'a, M, T> {
    /// Register a device on `bus`. The transport rejects a chip select that
    /// is already attached and a frequency beyond the bus capability.
    pub fn attach(
        bus: &'a BusController<T>,
        cs: ChipSelect,
        frequency: Frequency,
        queue_depth: QueueDepth,
    ) -> Result<Self, Error<T::Error>> {
        let config = DeviceConfig { cs, frequency, queue_depth };
        let id =
            bus.transport().add_device(&config).map_err(Error::DeviceSetup)?;
        Ok(Self { bus, id, config, prepared: None })
    }

    /// Queue a full-duplex transfer of a copy of `tx` and return the future
    /// for its result.
    pub async fn transfer(
        &mut self,
        tx: &[u8],
    ) -> Result<TransferFuture<'a, M, T>, Error<T::Error>> {
        self.submit(TransferRequest::write(tx)).await
    }

    /// Queue a transfer whose payload of up to [`SHORT_PAYLOAD_MAX`] bytes
    /// rides inline in the descriptor.
    pub async fn transfer_short(
        &mut self,
        word: [u8; SHORT_PAYLOAD_MAX],
        len: usize,
    ) -> Result<TransferFuture<'a, M, T>, Error<T::Error>> {
        self.submit(TransferRequest::short(word, len)).await
    }

    /// Queue a fully specified transfer: borrowed buffers and pre/post
    /// hooks.
    pub async fn transfer_with(
        &mut self,
        request: TransferRequest<'a>,
    ) -> Result<TransferFuture<'a, M, T>, Error<T::Error>> {
        self.submit(request).await
    }

    /// Build the descriptor now, without touching the bus, so a later
    /// [`start_prepared`](Self::start_prepared) only has to submit it.
    /// Replaces any previously prepared, not yet started descriptor.
    pub fn prepare(
        &mut self,
        request: TransferRequest<'a>,
    ) -> Result<(), Error<T::Error>> {
        self.prepared = Some(Arc::new(Transaction::new(self, request)?));
        Ok(())
    }

    /// Submit the prepared descriptor to the queued path.
    pub async fn start_prepared(
        &mut self,
    ) -> Result<TransferFuture<'a, M, T>, Error<T::Error>> {
        self.start_pending(SubmitMode::Queued).await
    }

    /// Submit the prepared descriptor in polling mode: the calling task
    /// busy-samples completion instead of yielding to the queue, trading
    /// throughput for latency. The exclusive bus acquisition discipline is
    /// unchanged.
    pub async fn start_polling(
        &mut self,
    ) -> Result<TransferFuture<'a, M, T>, Error<T::Error>> {
        self.start_pending(SubmitMode::Polling).await
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn chip_select(&self) -> ChipSelect {
        self.config.cs
    }

    pub fn frequency(&self) -> Frequency {
        self.config.frequency
    }

    pub fn queue_depth(&self) -> QueueDepth {
        self.config.queue_depth
    }

    pub(crate) fn bus(&self) -> &'a BusController<T> {
        self.bus
    }

    async fn submit(
        &mut self,
        request: TransferRequest<'a>,
    ) -> Result<TransferFuture<'a, M, T>, Error<T::Error>> {
        let transaction = Arc::new(Transaction::new(self, request)?);
        transaction.start(SubmitMode::Queued).await?;
        Ok(TransferFuture::new(transaction))
    }

    async fn start_pending(
        &mut self,
        mode: SubmitMode,
    ) -> Result<TransferFuture<'a, M, T>, Error<T::Error>> {
        let transaction = self
            .prepared
            .take()
            .ok_or(Error::InvalidState("no prepared transaction"))?;
        transaction.start(mode).await?;
        Ok(TransferFuture::new(transaction))
    }
}

impl<M: RawMutex, T: SpiTransport> Drop for SpiDevice<'_, M, T> {
    fn drop(&mut self) {
        self.bus.transport().remove_device(self.id);
    }
}
