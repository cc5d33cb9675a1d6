use alloc::sync::Arc;
use alloc::vec::Vec;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Duration;

use crate::error::Error;
use crate::transaction::{Lifecycle, Transaction, WaitStatus};
use crate::transport::SpiTransport;

/// Caller-facing handle for one pending transfer result.
///
/// Wraps a shared reference to a [`Transaction`]. The handle is movable and
/// deliberately not cloneable: one future is the authoritative owner of the
/// pending result. Moving out with [`core::mem::take`] leaves the source
/// invalid, and a default-constructed future is never valid; every operation
/// on an invalid future fails with [`Error::NoState`].
pub struct TransferFuture<'a, M: RawMutex, T: SpiTransport> {
    transaction: Option<Arc<Transaction<'a, M, T>>>,
}

impl<M: RawMutex, T: SpiTransport> Default for TransferFuture<'_, M, T> {
    fn default() -> Self {
        Self { transaction: None }
    }
}

impl<'a, M: RawMutex, T: SpiTransport> TransferFuture<'a, M, T> {
    pub(crate) fn new(transaction: Arc<Transaction<'a, M, T>>) -> Self {
        Self { transaction: Some(transaction) }
    }

    /// Whether this future is backed by a transaction.
    pub fn valid(&self) -> bool {
        self.transaction.is_some()
    }

    /// Lifecycle of the backing transaction, if any.
    pub fn state(&self) -> Option<Lifecycle> {
        self.transaction.as_ref().map(|t| t.state())
    }

    /// Retrieve the received bytes, waiting for completion first if needed.
    pub async fn get(&self) -> Result<Vec<u8>, Error<T::Error>> {
        self.backing()?.get().await
    }

    /// Block until the transfer completes or the hardware faults.
    pub async fn wait(&self) -> Result<(), Error<T::Error>> {
        self.backing()?.wait().await
    }

    /// Wait up to `timeout`; `TimedOut` is retryable.
    pub async fn wait_for(
        &self,
        timeout: Duration,
    ) -> Result<WaitStatus, Error<T::Error>> {
        self.backing()?.wait_for(timeout).await
    }

    fn backing(&self) -> Result<&Transaction<'a, M, T>, Error<T::Error>> {
        match &self.transaction {
            Some(transaction) => Ok(transaction),
            None => Err(Error::NoState),
        }
    }
}
