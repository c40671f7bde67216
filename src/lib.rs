#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod acquisition;
pub mod device;
pub mod interface;
pub mod registers;
pub mod sensors;

// Re-export main types
pub use acquisition::{AcquisitionState, MagAcquisition, MagPoller, PollStatus};
pub use device::{Config, DeviceAddress, IrqSamples, Mpu9150Driver, PowerMode};
pub use interface::{BusError, DeviceInterface, HalBus, I2cBus, Transport};
pub use sensors::{AccelRange, Axis, GyroRange, MagCorrection, RawSample, Vector3};

/// MPU-9150 I2C address when AD0 pin is low (default: 0x68)
pub const I2C_ADDRESS_AD0_LOW: u8 = 0x68;

/// MPU-9150 I2C address when AD0 pin is high (alternative: 0x69)
///
/// Lets two devices share one bus.
pub const I2C_ADDRESS_AD0_HIGH: u8 = 0x69;

/// Expected value of `WHO_AM_I` register
pub const WHO_AM_I_VALUE: u8 = 0x68;

/// Default bus transaction timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u32 = 10;

/// Driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Bus transaction failed (timeout, NACK or generic I/O)
    Transport(BusError),
    /// Range index outside 0-3 (contains the rejected index)
    InvalidRange(u8),
    /// Invalid `WHO_AM_I` register value (contains the actual value read)
    InvalidDevice(u8),
    /// Operation not allowed while the magnetometer acquisition is in this state
    InvalidState(AcquisitionState),
}

impl Error {
    /// True if the underlying bus transaction timed out
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(BusError::Timeout))
    }

    /// True for any bus-level failure
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<BusError> for Error {
    fn from(error: BusError) -> Self {
        Self::Transport(error)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport(BusError::Timeout) => f.write_str("bus transaction timed out"),
            Self::Transport(BusError::Nack) => f.write_str("device did not acknowledge"),
            Self::Transport(BusError::Other) => f.write_str("bus I/O failure"),
            Self::InvalidRange(index) => write!(f, "range index {index} outside 0-3"),
            Self::InvalidDevice(id) => write!(f, "unexpected WHO_AM_I value 0x{id:02X}"),
            Self::InvalidState(state) => {
                write!(f, "not allowed while magnetometer is {state:?}")
            }
        }
    }
}

impl core::error::Error for Error {}
