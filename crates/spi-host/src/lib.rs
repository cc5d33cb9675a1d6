#![no_std]
#![allow(async_fn_in_trait)]
//! Transaction-oriented SPI master layer over an opaque platform transport.
//!
//! A [`BusController`] owns the shared bus for exactly one init/teardown
//! cycle. [`SpiDevice`] handles register logical peripherals (chip select,
//! clock, queue depth) on that bus and issue transfers, each of which becomes
//! a shared [`Transaction`] descriptor observed through a movable
//! [`TransferFuture`]. The bus is exclusively held from submission until the
//! result has been retrieved, so transactions from different devices never
//! interleave on the wire.
//!
//! The hardware itself sits behind the [`SpiTransport`] trait; platform
//! crates (or a test stub) provide the pin claiming, queueing, and completion
//! signalling.

extern crate alloc;

mod bus;
mod device;
mod error;
mod future;
mod transaction;
mod transport;
mod types;

pub use bus::BusController;
pub use device::SpiDevice;
pub use error::{ConfigError, Error};
pub use future::TransferFuture;
pub use transaction::{
    Lifecycle, Transaction, TransferHook, TransferRequest, WaitStatus,
    SHORT_PAYLOAD_MAX,
};
pub use transport::{DeviceId, SpiTransport, SubmitMode, Ticket, WaitOutcome};
pub use types::{
    BusConfig, BusIndex, ChipSelect, DeviceConfig, DmaChannel, Frequency,
    GpioNum, MisoPin, MosiPin, PinAssignment, QspiHdPin, QspiWpPin,
    QueueDepth, SclkPin, TransferSize, MAX_FREQUENCY_HZ, MAX_GPIO_NUM,
};
