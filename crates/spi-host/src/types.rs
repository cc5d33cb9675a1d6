//! Strong value types for bus and device configuration.
//!
//! Raw pin and frequency numbers are validated once, at construction; every
//! instance of these types is guaranteed to hold a hardware-valid value.
//! They compare by underlying value and deliberately offer no arithmetic.

use crate::error::ConfigError;

/// Highest pin number accepted by [`GpioNum`]. A transport may reject
/// further pins that this conservative ceiling still admits.
pub const MAX_GPIO_NUM: u32 = 63;

/// Highest clock frequency accepted by [`Frequency`], in Hz.
pub const MAX_FREQUENCY_HZ: u32 = 80_000_000;

/// A validated GPIO pin number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioNum(u32);

impl GpioNum {
    pub fn new(pin: u32) -> Result<Self, ConfigError> {
        if pin > MAX_GPIO_NUM {
            return Err(ConfigError::PinOutOfRange(pin));
        }
        Ok(Self(pin))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

macro_rules! pin_role {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name(GpioNum);

        impl $name {
            pub fn new(pin: u32) -> Result<Self, ConfigError> {
                Ok(Self(GpioNum::new(pin)?))
            }

            pub fn gpio(&self) -> GpioNum {
                self.0
            }
        }
    };
}

pin_role!(
    /// Serial clock line of the bus.
    SclkPin
);
pin_role!(
    /// Master-out line of the bus.
    MosiPin
);
pin_role!(
    /// Master-in line of the bus.
    MisoPin
);
pin_role!(
    /// Write-protect line for quad-mode transfers.
    QspiWpPin
);
pin_role!(
    /// Hold line for quad-mode transfers.
    QspiHdPin
);
pin_role!(
    /// Chip-select line identifying one device on the bus.
    ChipSelect
);

/// A validated SPI clock frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frequency(u32);

impl Frequency {
    pub fn hz(hz: u32) -> Result<Self, ConfigError> {
        if hz == 0 || hz > MAX_FREQUENCY_HZ {
            return Err(ConfigError::FrequencyOutOfRange(hz));
        }
        Ok(Self(hz))
    }

    pub fn khz(khz: u32) -> Result<Self, ConfigError> {
        Self::hz(khz.saturating_mul(1_000))
    }

    pub fn mhz(mhz: u32) -> Result<Self, ConfigError> {
        Self::hz(mhz.saturating_mul(1_000_000))
    }

    pub fn as_hz(&self) -> u32 {
        self.0
    }
}

/// Maximum number of outstanding queued transactions for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueDepth(usize);

impl QueueDepth {
    pub fn new(depth: usize) -> Result<Self, ConfigError> {
        if depth == 0 {
            return Err(ConfigError::ZeroQueueDepth);
        }
        Ok(Self(depth))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

/// Per-transfer byte-size ceiling configured at bus initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferSize(usize);

impl TransferSize {
    pub fn new(bytes: usize) -> Result<Self, ConfigError> {
        if bytes == 0 {
            return Err(ConfigError::ZeroTransferSize);
        }
        Ok(Self(bytes))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

/// DMA channel selection for the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaChannel {
    /// No DMA; transfers are serviced by the CPU.
    Disabled,
    /// Let the transport pick a free channel.
    Auto,
    Channel1,
    Channel2,
}

/// Identity of one hardware bus instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusIndex(u8);

impl BusIndex {
    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

/// The full pin set claimed by one bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinAssignment {
    pub sclk: SclkPin,
    pub mosi: MosiPin,
    pub miso: MisoPin,
    pub qspi_wp: QspiWpPin,
    pub qspi_hd: QspiHdPin,
}

impl PinAssignment {
    pub fn new(
        sclk: SclkPin,
        mosi: MosiPin,
        miso: MisoPin,
        qspi_wp: QspiWpPin,
        qspi_hd: QspiHdPin,
    ) -> Self {
        Self { sclk, mosi, miso, qspi_wp, qspi_hd }
    }
}

/// Everything a transport needs to bring the bus up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    pub index: BusIndex,
    pub pins: PinAssignment,
    pub transfer_size: TransferSize,
    pub dma: DmaChannel,
}

/// Everything a transport needs to register one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    pub cs: ChipSelect,
    pub frequency: Frequency,
    pub queue_depth: QueueDepth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpio_num_rejects_out_of_range() {
        assert!(GpioNum::new(MAX_GPIO_NUM).is_ok());
        assert_eq!(
            GpioNum::new(MAX_GPIO_NUM + 1),
            Err(ConfigError::PinOutOfRange(MAX_GPIO_NUM + 1))
        );
    }

    #[test]
    fn pin_roles_are_distinct_types_over_one_check() {
        let sclk = SclkPin::new(6).unwrap();
        assert_eq!(sclk.gpio().get(), 6);
        assert!(ChipSelect::new(64).is_err());
    }

    #[test]
    fn frequency_bounds() {
        assert!(Frequency::hz(0).is_err());
        assert_eq!(Frequency::mhz(1).unwrap().as_hz(), 1_000_000);
        assert_eq!(
            Frequency::mhz(81),
            Err(ConfigError::FrequencyOutOfRange(81_000_000))
        );
    }

    #[test]
    fn frequency_compares_by_value() {
        assert_eq!(Frequency::khz(1_000).unwrap(), Frequency::mhz(1).unwrap());
        assert!(Frequency::mhz(4).unwrap() > Frequency::mhz(1).unwrap());
    }

    #[test]
    fn zero_sized_settings_rejected() {
        assert_eq!(QueueDepth::new(0), Err(ConfigError::ZeroQueueDepth));
        assert_eq!(TransferSize::new(0), Err(ConfigError::ZeroTransferSize));
        assert_eq!(QueueDepth::new(4).unwrap().get(), 4);
    }
}
