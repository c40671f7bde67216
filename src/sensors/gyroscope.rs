//! Gyroscope sensor types and configuration

use super::{RawSample, Vector3};
use crate::Error;

/// Gyroscope full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroRange {
    /// ±250 °/s
    Dps250 = 0,
    /// ±500 °/s
    Dps500 = 1,
    /// ±1000 °/s
    Dps1000 = 2,
    /// ±2000 °/s
    Dps2000 = 3,
}

impl GyroRange {
    /// Get the sensitivity in LSB/(°/s)
    #[must_use]
    pub const fn sensitivity(self) -> f32 {
        match self {
            Self::Dps250 => 131.0,
            Self::Dps500 => 65.5,
            Self::Dps1000 => 32.8,
            Self::Dps2000 => 16.4,
        }
    }

    /// Range index (0-3)
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Range for the two-bit `FS_SEL` field; only the low two bits are used
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Dps250,
            1 => Self::Dps500,
            2 => Self::Dps1000,
            _ => Self::Dps2000,
        }
    }

    /// Convert a big-endian raw sample to °/s
    #[must_use]
    pub fn convert(self, raw: &RawSample) -> Vector3 {
        let [x, y, z] = raw.axes_be();
        let scale = self.sensitivity();
        Vector3 {
            x: f32::from(x) / scale,
            y: f32::from(y) / scale,
            z: f32::from(z) / scale,
        }
    }
}

impl TryFrom<u8> for GyroRange {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        if index > 3 {
            return Err(Error::InvalidRange(index));
        }
        Ok(Self::from_bits(index))
    }
}

impl Default for GyroRange {
    fn default() -> Self {
        Self::Dps2000
    }
}
