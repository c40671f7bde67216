//! Sensor modules for the MPU-9150
//!
//! This module provides the range tables, calibration types and raw-to-physical
//! conversions for each sensor in the MPU-9150:
//! - Accelerometer (3-axis, g)
//! - Gyroscope (3-axis, °/s)
//! - Magnetometer (3-axis AK8975, µT)
//!
//! All bus traffic is performed through methods on `Mpu9150Driver`; everything
//! here is pure.

pub mod accelerometer;
pub mod gyroscope;
pub mod magnetometer;

// Re-export main types
pub use accelerometer::AccelRange;
pub use gyroscope::GyroRange;
pub use magnetometer::{MAG_SENSITIVITY, MagCorrection};

/// Gyroscope output rate with the DLPF disabled (Hz)
pub const GYRO_OUTPUT_RATE_HZ: u32 = 8000;

/// Six raw data bytes: three 16-bit register pairs
///
/// Byte order depends on the sensor: big-endian for accel/gyro,
/// little-endian for the magnetometer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample(pub [u8; 6]);

impl RawSample {
    /// All-zero sample returned when a data read fails
    pub const ZERO: Self = Self([0; 6]);

    /// Decode as three big-endian signed values in register order
    #[must_use]
    pub const fn axes_be(&self) -> [i16; 3] {
        let b = &self.0;
        [
            i16::from_be_bytes([b[0], b[1]]),
            i16::from_be_bytes([b[2], b[3]]),
            i16::from_be_bytes([b[4], b[5]]),
        ]
    }

    /// Decode as three little-endian signed values in register order
    #[must_use]
    pub const fn axes_le(&self) -> [i16; 3] {
        let b = &self.0;
        [
            i16::from_le_bytes([b[0], b[1]]),
            i16::from_le_bytes([b[2], b[3]]),
            i16::from_le_bytes([b[4], b[5]]),
        ]
    }
}

/// Output axis selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// Parse `'x'`, `'y'` or `'z'` (either case)
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'x' | 'X' => Some(Self::X),
            'y' | 'Y' => Some(Self::Y),
            'z' | 'Z' => Some(Self::Z),
            _ => None,
        }
    }
}

/// Three-axis reading in physical units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vector3 {
    /// X axis
    pub x: f32,
    /// Y axis
    pub y: f32,
    /// Z axis
    pub z: f32,
}

impl Vector3 {
    /// Create a vector
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Value on one axis
    #[must_use]
    pub const fn get(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Values in a caller-chosen order
    ///
    /// Any subset or permutation is allowed; values are copied, never
    /// recomputed.
    ///
    /// ```
    /// use mpu9150::{Axis, Vector3};
    /// let v = Vector3::new(1.0, 2.0, 3.0);
    /// assert_eq!(v.select([Axis::Z, Axis::X]), [3.0, 1.0]);
    /// ```
    #[must_use]
    pub fn select<const N: usize>(&self, order: [Axis; N]) -> [f32; N] {
        order.map(|axis| self.get(axis))
    }

    /// Euclidean length
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y + self.z * self.z)
    }
}

/// Divider for a requested sample rate
///
/// `round(8000 / hz) - 1`, clamped to the register range 0-255. A request of
/// 0 Hz asks for the slowest rate.
#[must_use]
pub fn sample_rate_divider(hz: u32) -> u8 {
    if hz == 0 {
        return u8::MAX;
    }
    // Round half up in integer arithmetic
    let steps = (GYRO_OUTPUT_RATE_HZ + hz / 2) / hz;
    u8::try_from(steps.saturating_sub(1)).unwrap_or(u8::MAX)
}

/// Sample rate in Hz produced by a divider value
#[must_use]
pub fn divider_to_rate(divider: u8) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let base = GYRO_OUTPUT_RATE_HZ as f32;
    base / (1.0 + f32::from(divider))
}
