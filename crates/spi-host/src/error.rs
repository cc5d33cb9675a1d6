use core::fmt;

/// Errors surfaced by the transaction layer.
///
/// `E` is the transport's error type and carries the platform's numeric
/// error code; callers distinguish failures by variant, not by message.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The transport could not claim the requested pins or DMA resource, or
    /// the bus was initialized twice without an intervening teardown.
    Initialization(E),
    /// A configuration value was rejected before reaching the hardware.
    Configuration(ConfigError),
    /// The transport refused to register the device (duplicate chip select,
    /// frequency above bus capability, device table full).
    DeviceSetup(E),
    /// Empty, mismatched, or oversized transfer buffers.
    InvalidArgument(&'static str),
    /// Operation invoked out of lifecycle order (wait before start, second
    /// start, start-prepared without a prepare).
    InvalidState(&'static str),
    /// The hardware reported a transfer failure. The transaction that
    /// produced this is dead and must be discarded.
    Transfer(E),
    /// The future has no backing transaction (default-constructed or
    /// moved-from).
    NoState,
}

impl<E: fmt::Display> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Initialization(err) => {
                write!(f, "bus initialization failed: {}", err)
            }
            Error::Configuration(err) => {
                write!(f, "invalid configuration: {}", err)
            }
            Error::DeviceSetup(err) => {
                write!(f, "device registration rejected: {}", err)
            }
            Error::InvalidArgument(what) => {
                write!(f, "invalid argument: {}", what)
            }
            Error::InvalidState(what) => {
                write!(f, "invalid state: {}", what)
            }
            Error::Transfer(err) => {
                write!(f, "transfer failed: {}", err)
            }
            Error::NoState => {
                write!(f, "future has no associated transaction")
            }
        }
    }
}

/// Construct-time validation failures for the strong value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pin number outside the valid GPIO range.
    PinOutOfRange(u32),
    /// Clock frequency outside the supported range.
    FrequencyOutOfRange(u32),
    /// A transaction queue must hold at least one entry.
    ZeroQueueDepth,
    /// The per-transfer size ceiling must be non-zero.
    ZeroTransferSize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::PinOutOfRange(pin) => {
                write!(f, "pin number {} out of range", pin)
            }
            ConfigError::FrequencyOutOfRange(hz) => {
                write!(f, "frequency {} Hz out of range", hz)
            }
            ConfigError::ZeroQueueDepth => {
                write!(f, "queue depth must be non-zero")
            }
            ConfigError::ZeroTransferSize => {
                write!(f, "transfer size ceiling must be non-zero")
            }
        }
    }
}

impl<E> From<ConfigError> for Error<E> {
    fn from(e: ConfigError) -> Self {
        Error::Configuration(e)
    }
}
