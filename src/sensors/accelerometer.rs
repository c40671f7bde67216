//! Accelerometer sensor types and configuration
//!
//! Provides the full-scale range table and raw-to-g conversion for the
//! MPU-9150's 3-axis accelerometer.

use super::{RawSample, Vector3};
use crate::Error;

/// Accelerometer full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelRange {
    /// ±2g range (most sensitive, least range)
    G2 = 0,
    /// ±4g range
    G4 = 1,
    /// ±8g range
    G8 = 2,
    /// ±16g range (least sensitive, most range)
    G16 = 3,
}

impl AccelRange {
    /// Get the sensitivity in LSB/g (Least Significant Bit per g)
    ///
    /// This is used to convert raw sensor values to physical units.
    #[must_use]
    pub const fn sensitivity(self) -> f32 {
        match self {
            Self::G2 => 16384.0,
            Self::G4 => 8192.0,
            Self::G8 => 4096.0,
            Self::G16 => 2048.0,
        }
    }

    /// Range index (0-3)
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Range for the two-bit `AFS_SEL` field; only the low two bits are used
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::G2,
            1 => Self::G4,
            2 => Self::G8,
            _ => Self::G16,
        }
    }

    /// Convert a big-endian raw sample to g
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

impl TryFrom<u8> for AccelRange {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        if index > 3 {
            return Err(Error::InvalidRange(index));
        }
        Ok(Self::from_bits(index))
    }
}

impl Default for AccelRange {
    fn default() -> Self {
        Self::G16
    }
}
