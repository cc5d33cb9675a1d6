//! Transaction descriptors: one in-flight or completed transfer each.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Duration;

use crate::bus::BusController;
use crate::device::SpiDevice;
use crate::error::Error;
use crate::transport::{
    DeviceId, SpiTransport, SubmitMode, Ticket, WaitOutcome,
};

/// Byte capacity of the short inline transmit payload.
pub const SHORT_PAYLOAD_MAX: usize = 4;

/// Lifecycle of a transaction descriptor.
///
/// `Faulted` is terminal: the hardware reported an error mid-transfer, the
/// bus lock has been released, and the descriptor is inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lifecycle {
    NotStarted,
    Started,
    Completed,
    Faulted,
}

/// Outcome of a timed wait. A timeout is not an error; the transaction stays
/// in flight and the wait may simply be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitStatus {
    Ready,
    TimedOut,
}

/// Callback run in the caller's context immediately before submission or on
/// completion. Context travels in the closure's captures.
pub type TransferHook<'a> = Box<dyn FnMut() + Send + 'a>;

/// Buffer ownership for one transfer. Exactly one variant holds for the
/// descriptor's whole lifetime.
enum Buffers<'a> {
    /// Descriptor owns both sides.
    Owned { tx: Vec<u8>, rx: Vec<u8> },
    /// Caller supplied both sides; the exclusive borrow keeps the caller
    /// away from the buffers while the transfer is in flight.
    Borrowed { tx: &'a [u8], rx: &'a mut [u8] },
    /// Transmit payload small enough to ride inline, no separate tx
    /// allocation.
    Short { word: heapless::Vec<u8, SHORT_PAYLOAD_MAX>, len: usize, rx: Vec<u8> },
}

impl Buffers<'_> {
    fn len(&self) -> usize {
        match self {
            Buffers::Owned { tx, .. } => tx.len(),
            Buffers::Borrowed { tx, .. } => tx.len(),
            Buffers::Short { len, .. } => *len,
        }
    }

    fn tx(&self) -> &[u8] {
        match self {
            Buffers::Owned { tx, .. } => tx,
            Buffers::Borrowed { tx, .. } => tx,
            Buffers::Short { word, .. } => word,
        }
    }

    fn rx(&self) -> &[u8] {
        match self {
            Buffers::Owned { rx, .. } => rx,
            Buffers::Borrowed { rx, .. } => rx,
            Buffers::Short { rx, .. } => rx,
        }
    }

    fn rx_mut(&mut self) -> &mut [u8] {
        match self {
            Buffers::Owned { rx, .. } => rx,
            Buffers::Borrowed { rx, .. } => rx,
            Buffers::Short { rx, .. } => rx,
        }
    }
}

/// Description of one transfer, handed to a device to become a
/// [`Transaction`]. Buffer and length validation happens at submission.
pub struct TransferRequest<'a> {
    buffers: Buffers<'a>,
    pre_hook: Option<TransferHook<'a>>,
    post_hook: Option<TransferHook<'a>>,
}

impl<'a> TransferRequest<'a> {
    /// Full-duplex transfer of a copy of `tx`; the descriptor owns both
    /// buffers.
    pub fn write(tx: &[u8]) -> Self {
        Self {
            buffers: Buffers::Owned { tx: tx.to_vec(), rx: vec![0; tx.len()] },
            pre_hook: None,
            post_hook: None,
        }
    }

    /// Read `len` bytes by clocking out zeros.
    pub fn read(len: usize) -> Self {
        Self {
            buffers: Buffers::Owned { tx: vec![0; len], rx: vec![0; len] },
            pre_hook: None,
            post_hook: None,
        }
    }

    /// Transfer of up to [`SHORT_PAYLOAD_MAX`] bytes carried inline in the
    /// descriptor.
    pub fn short(word: [u8; SHORT_PAYLOAD_MAX], len: usize) -> Self {
        let mut inline = heapless::Vec::new();
        let _ = inline.extend_from_slice(&word[..len.min(SHORT_PAYLOAD_MAX)]);
        Self {
            buffers: Buffers::Short { word: inline, len, rx: vec![0; len] },
            pre_hook: None,
            post_hook: None,
        }
    }

    /// Full-duplex transfer over caller-supplied buffers. `tx` and `rx` must
    /// be the same length; they are inaccessible to the caller until every
    /// future over the transaction is gone.
    pub fn with_buffers(tx: &'a [u8], rx: &'a mut [u8]) -> Self {
        Self {
            buffers: Buffers::Borrowed { tx, rx },
            pre_hook: None,
            post_hook: None,
        }
    }

    /// Run `hook` in the submitting task just before the transfer is handed
    /// to the hardware.
    pub fn before_transfer(mut self, hook: impl FnMut() + Send + 'a) -> Self {
        self.pre_hook = Some(Box::new(hook));
        self
    }

    /// Run `hook` when completion is first observed.
    pub fn after_transfer(mut self, hook: impl FnMut() + Send + 'a) -> Self {
        self.post_hook = Some(Box::new(hook));
        self
    }
}

struct Inner<'a> {
    buffers: Buffers<'a>,
    pre_hook: Option<TransferHook<'a>>,
    post_hook: Option<TransferHook<'a>>,
    lifecycle: Lifecycle,
    ticket: Option<Ticket>,
    result_len: usize,
}

/// One in-flight or completed transfer.
///
/// The descriptor drives a `NotStarted → Started → Completed` state machine.
/// [`start`](Self::start) acquires the bus and hands the buffers to the
/// hardware; the bus is held until the result has been retrieved, so no two
/// devices interleave on the wire. Once completed, the result is immutable
/// and may be read repeatedly.
///
/// Dropping a descriptor that was started but never completed is a
/// programming-contract violation and panics: the transport may still be
/// writing into the receive buffer.
pub struct Transaction<'a, M: RawMutex, T: SpiTransport> {
    bus: &'a BusController<T>,
    device: DeviceId,
    inner: Mutex<M, RefCell<Inner<'a>>>,
}

impl<'a, M: RawMutex, T: SpiTransport> Transaction<'a, M, T> {
    /// Build a descriptor for `device`, validating the request's buffers
    /// against the bus transfer-size ceiling.
    pub fn new(
        device: &SpiDevice<'a, M, T>,
        request: TransferRequest<'a>,
    ) -> Result<Self, Error<T::Error>> {
        let len = request.buffers.len();
        if len == 0 {
            return Err(Error::InvalidArgument("zero-length transfer"));
        }
        if let Buffers::Borrowed { tx, rx } = &request.buffers {
            if tx.len() != rx.len() {
                return Err(Error::InvalidArgument(
                    "tx/rx buffer lengths differ",
                ));
            }
        }
        if let Buffers::Short { len, .. } = &request.buffers {
            if *len > SHORT_PAYLOAD_MAX {
                return Err(Error::InvalidArgument(
                    "short payload exceeds inline capacity",
                ));
            }
        }
        if len > device.bus().max_transfer_size() {
            return Err(Error::InvalidArgument(
                "transfer exceeds bus size ceiling",
            ));
        }

        Ok(Self {
            bus: device.bus(),
            device: device.id(),
            inner: Mutex::new(RefCell::new(Inner {
                buffers: request.buffers,
                pre_hook: request.pre_hook,
                post_hook: request.post_hook,
                lifecycle: Lifecycle::NotStarted,
                ticket: None,
                result_len: 0,
            })),
        })
    }

    /// Acquire the bus and submit the transfer. A descriptor starts at most
    /// once.
    pub async fn start(
        &self,
        mode: SubmitMode,
    ) -> Result<(), Error<T::Error>> {
        self.inner.lock(|cell| match cell.borrow().lifecycle {
            Lifecycle::NotStarted => Ok(()),
            _ => Err(Error::InvalidState("transaction already started")),
        })?;

        let transport = self.bus.transport();
        transport
            .acquire_bus(self.device)
            .await
            .map_err(Error::Transfer)?;

        let submitted = self.inner.lock(|cell| {
            let inner = &mut *cell.borrow_mut();
            if inner.lifecycle != Lifecycle::NotStarted {
                return Err(Error::InvalidState(
                    "transaction already started",
                ));
            }
            if let Some(hook) = inner.pre_hook.as_mut() {
                hook();
            }
            let ticket = transport
                .queue_transaction(self.device, mode, inner.buffers.tx())
                .map_err(Error::Transfer)?;
            inner.ticket = Some(ticket);
            inner.lifecycle = Lifecycle::Started;
            Ok(())
        });

        if let Err(e) = submitted {
            if matches!(e, Error::Transfer(_)) {
                // The transfer never reached the hardware; the descriptor
                // is dead but safe to drop.
                self.inner.lock(|cell| {
                    cell.borrow_mut().lifecycle = Lifecycle::Faulted;
                });
            }
            transport.release_bus(self.device);
            return Err(e);
        }
        Ok(())
    }

    /// Wait up to `timeout` for completion.
    ///
    /// Returns `Ready` immediately if already completed. A `TimedOut`
    /// outcome leaves the transaction in flight; the call may be retried
    /// with any timeout. On success the result is cached and the bus lock
    /// taken at [`start`](Self::start) is released.
    pub async fn wait_for(
        &self,
        timeout: Duration,
    ) -> Result<WaitStatus, Error<T::Error>> {
        match self.state() {
            Lifecycle::Completed => return Ok(WaitStatus::Ready),
            Lifecycle::NotStarted => {
                return Err(Error::InvalidState("transaction never started"))
            }
            Lifecycle::Faulted => {
                return Err(Error::InvalidState("transaction faulted"))
            }
            Lifecycle::Started => {}
        }

        let transport = self.bus.transport();
        let outcome = match transport
            .poll_completion(self.device, timeout)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.fault_and_release();
                return Err(Error::Transfer(e));
            }
        };
        let ticket = match outcome {
            WaitOutcome::TimedOut => return Ok(WaitStatus::TimedOut),
            WaitOutcome::Complete(ticket) => ticket,
        };

        let collected = self.inner.lock(|cell| {
            let inner = &mut *cell.borrow_mut();
            if inner.ticket != Some(ticket) {
                // The transport completed a descriptor that is not ours.
                return Err(Error::InvalidState(
                    "completion does not match this transaction",
                ));
            }
            let n = transport
                .take_result(self.device, ticket, inner.buffers.rx_mut())
                .map_err(Error::Transfer)?;
            inner.result_len = n;
            if let Some(hook) = inner.post_hook.as_mut() {
                hook();
            }
            inner.lifecycle = Lifecycle::Completed;
            Ok(())
        });

        match collected {
            Ok(()) => {
                transport.release_bus(self.device);
                Ok(WaitStatus::Ready)
            }
            Err(e @ Error::Transfer(_)) => {
                self.fault_and_release();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Wait without bound until the transfer completes or the hardware
    /// faults.
    pub async fn wait(&self) -> Result<(), Error<T::Error>> {
        let unbounded = Duration::from_ticks(u64::MAX);
        while self.wait_for(unbounded).await? != WaitStatus::Ready {}
        Ok(())
    }

    /// Retrieve the received bytes, waiting for completion first if needed.
    /// Repeated calls return the identical cached result.
    pub async fn get(&self) -> Result<Vec<u8>, Error<T::Error>> {
        if self.state() != Lifecycle::Completed {
            self.wait().await?;
        }
        Ok(self.inner.lock(|cell| {
            let inner = cell.borrow();
            inner.buffers.rx()[..inner.result_len].to_vec()
        }))
    }

    pub fn state(&self) -> Lifecycle {
        self.inner.lock(|cell| cell.borrow().lifecycle)
    }

    fn fault_and_release(&self) {
        self.inner.lock(|cell| {
            cell.borrow_mut().lifecycle = Lifecycle::Faulted;
        });
        self.bus.transport().release_bus(self.device);
    }
}

impl<M: RawMutex, T: SpiTransport> Drop for Transaction<'_, M, T> {
    fn drop(&mut self) {
        // A started transaction must be waited to completion before it can
        // go away: the transport still holds the buffers.
        let lifecycle = self.inner.lock(|cell| cell.borrow().lifecycle);
        if lifecycle == Lifecycle::Started {
            panic!("SPI transaction dropped while in flight");
        }
    }
}
