//! Magnetometer sensor types and conversion
//!
//! The AK8975 reports little-endian axes in its own frame. Relative to the
//! accel/gyro frame its X and Y are swapped and Z points the other way, so
//! conversion remaps register axes (0, 1, 2) to output (Y, X, -Z).

use super::{Axis, RawSample, Vector3};

/// AK8975 sensitivity in LSB/µT
pub const MAG_SENSITIVITY: f32 = 3.33198;

/// Per-axis sensitivity correction from the AK8975 fuse ROM
///
/// Coefficients are indexed by output axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagCorrection {
    /// X-axis multiplier
    pub x: f32,
    /// Y-axis multiplier
    pub y: f32,
    /// Z-axis multiplier
    pub z: f32,
}

impl MagCorrection {
    /// No correction
    pub const NEUTRAL: Self = Self {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };

    /// Coefficient for one trim byte: `0.5 * (trim - 128) / 128 + 1`
    ///
    /// Always within `[0.5, 1.5)`.
    #[must_use]
    pub fn coefficient(trim: u8) -> f32 {
        0.5 * (f32::from(trim) - 128.0) / 128.0 + 1.0
    }

    /// Build from the three ASA bytes (ASAX, ASAY, ASAZ)
    #[must_use]
    pub fn from_trim(trim: [u8; 3]) -> Self {
        Self {
            x: Self::coefficient(trim[0]),
            y: Self::coefficient(trim[1]),
            z: Self::coefficient(trim[2]),
        }
    }

    /// Multiplier for one output axis
    #[must_use]
    pub const fn get(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Convert a little-endian raw sample to µT
    ///
    /// Register axis 0 becomes Y, axis 1 becomes X and axis 2 becomes -Z.
    #[must_use]
    pub fn convert(&self, raw: &RawSample) -> Vector3 {
        let [r0, r1, r2] = raw.axes_le();
        Vector3 {
            x: f32::from(r1) / MAG_SENSITIVITY * self.x,
            y: f32::from(r0) / MAG_SENSITIVITY * self.y,
            z: -f32::from(r2) / MAG_SENSITIVITY * self.z,
        }
    }
}

impl Default for MagCorrection {
    fn default() -> Self {
        Self::NEUTRAL
    }
}
