//! High-level driver API for the MPU-9150
//!
//! This module provides the device handle: bring-up, range and rate
//! configuration, raw and converted sensor reads, and the magnetometer
//! acquisition entry points.

use crate::acquisition::{AcquisitionState, MagAcquisition, MagPoller, PollStatus};
use crate::interface::{DeviceInterface, I2cBus, Transport};
use crate::registers::ak8975::{self, Ak8975};
use crate::registers::mpu::Mpu9150;
use crate::registers::{ACCEL_DATA, GYRO_DATA, TEMP_DATA};
use crate::sensors::{
    AccelRange, GyroRange, MagCorrection, RawSample, Vector3, divider_to_rate,
    sample_rate_divider,
};
use crate::{DEFAULT_TIMEOUT_MS, Error, I2C_ADDRESS_AD0_HIGH, I2C_ADDRESS_AD0_LOW, WHO_AM_I_VALUE};

/// Which of the two fixed bus addresses the device answers on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceAddress {
    /// AD0 low, 0x68
    #[default]
    Primary,
    /// AD0 high, 0x69
    Secondary,
}

impl DeviceAddress {
    /// 7-bit bus address
    #[must_use]
    pub const fn address(self) -> u8 {
        match self {
            Self::Primary => I2C_ADDRESS_AD0_LOW,
            Self::Secondary => I2C_ADDRESS_AD0_HIGH,
        }
    }
}

/// Power state selected through `PWR_MGMT_1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    /// Running, clocked from the X gyro PLL
    Awake,
    /// Sleep mode - minimum power consumption
    Asleep,
}

/// Driver configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Bus address of the accel/gyro die
    pub address: DeviceAddress,
    /// Per-transaction bus timeout in milliseconds
    pub timeout_ms: u32,
    /// Mask interrupts for the duration of every bus transaction
    ///
    /// Needed when an interrupt handler also talks to this bus.
    pub disable_interrupts: bool,
    /// Accelerometer range applied by [`Mpu9150Driver::init`]
    pub accel_range: AccelRange,
    /// Gyroscope range applied by [`Mpu9150Driver::init`]
    pub gyro_range: GyroRange,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DeviceAddress::Primary,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            disable_interrupts: true,
            accel_range: AccelRange::G16,
            gyro_range: GyroRange::Dps2000,
        }
    }
}

/// Raw readings captured by the `*_irq` methods
///
/// Integers only, so they can be filled from an interrupt handler and scaled
/// later from thread context. The magnetometer triple is in register order
/// (not remapped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqSamples {
    /// Accelerometer X, Y, Z
    pub accel: [i16; 3],
    /// Gyroscope X, Y, Z
    pub gyro: [i16; 3],
    /// Magnetometer register axes 0, 1, 2
    pub mag: [i16; 3],
}

/// Main driver for the MPU-9150
///
/// Owns the bus for its whole lifetime. Exactly one magnetometer acquisition
/// can be outstanding per driver.
pub struct Mpu9150Driver<B> {
    transport: Transport<B>,
    config: Config,
    accel_range: AccelRange,
    gyro_range: GyroRange,
    mag_correction: MagCorrection,
    acquisition: MagAcquisition,
    irq: IrqSamples,
}

impl<B: I2cBus> Mpu9150Driver<B> {
    /// Create a new MPU-9150 driver instance
    ///
    /// This will verify the `WHO_AM_I` register but will not initialize the device.
    /// Call `init()` after construction to configure the device.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Communication with the device fails
    /// - The `WHO_AM_I` register contains an unexpected value
    pub fn new(bus: B, config: Config) -> Result<Self, Error> {
        let mut driver = Self {
            transport: Transport::new(bus, config.timeout_ms, config.disable_interrupts),
            config,
            accel_range: config.accel_range,
            gyro_range: config.gyro_range,
            mag_correction: MagCorrection::NEUTRAL,
            acquisition: MagAcquisition::new(),
            irq: IrqSamples::default(),
        };

        let who_am_i = driver.chip_id()?;
        if who_am_i != WHO_AM_I_VALUE {
            return Err(Error::InvalidDevice(who_am_i));
        }

        Ok(driver)
    }

    /// Bring the device up with the configured settings
    ///
    /// Wakes the device, enables bypass so the magnetometer is reachable,
    /// applies the configured ranges and loads the magnetometer trim. A failed
    /// trim read is not an error: the driver falls back to
    /// [`MagCorrection::NEUTRAL`].
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration write or read-back fails.
    pub fn init(&mut self) -> Result<(), Error> {
        self.acquisition.reset();

        self.wake()?;
        self.set_passthrough(true)?;
        self.set_accel_range(self.config.accel_range)?;
        self.set_gyro_range(self.config.gyro_range)?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "MPU-9150 awake, accel {} gyro {}",
            self.accel_range,
            self.gyro_range
        );

        // Fallback to neutral coefficients is handled inside recalibrate()
        let _ = self.recalibrate();

        Ok(())
    }

    fn mpu(&mut self) -> Mpu9150<DeviceInterface<'_, B>> {
        let address = self.config.address.address();
        Mpu9150::new(DeviceInterface::new(&mut self.transport, address))
    }

    fn ak(&mut self) -> Ak8975<DeviceInterface<'_, B>> {
        Ak8975::new(DeviceInterface::new(&mut self.transport, ak8975::I2C_ADDRESS))
    }

    /// Read the `WHO_AM_I` register
    ///
    /// Should return 0x68 for a valid MPU-9150
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn chip_id(&mut self) -> Result<u8, Error> {
        Ok(self.mpu().who_am_i().read()?.who_am_i())
    }

    /// Read the magnetometer `WIA` register (0x48 for the AK8975)
    ///
    /// Requires passthrough to be enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the magnetometer fails.
    pub fn magnetometer_id(&mut self) -> Result<u8, Error> {
        Ok(self.ak().wia().read()?.wia())
    }

    // ==================== Power and bus mode ====================

    /// Set the power mode and report the mode read back
    ///
    /// # Errors
    ///
    /// Returns an error if the write or the read-back fails.
    pub fn set_power_mode(&mut self, mode: PowerMode) -> Result<PowerMode, Error> {
        self.mpu().pwr_mgmt_1().write(|w| match mode {
            PowerMode::Awake => w.set_clksel(1),
            PowerMode::Asleep => w.set_sleep(true),
        })?;
        self.power_mode()
    }

    /// Read the current power mode
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn power_mode(&mut self) -> Result<PowerMode, Error> {
        let reg = self.mpu().pwr_mgmt_1().read()?;
        Ok(if reg.sleep() {
            PowerMode::Asleep
        } else {
            PowerMode::Awake
        })
    }

    /// Wake the device
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn wake(&mut self) -> Result<PowerMode, Error> {
        self.set_power_mode(PowerMode::Awake)
    }

    /// Put the device to sleep
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn sleep(&mut self) -> Result<PowerMode, Error> {
        self.set_power_mode(PowerMode::Asleep)
    }

    /// Enable or disable I2C passthrough to the magnetometer
    ///
    /// The internal I2C master is always switched off; bypass and master
    /// mode are mutually exclusive. Returns the setting read back, decoded
    /// from the `I2C_BYPASS_EN` bit alone.
    ///
    /// # Errors
    ///
    /// Returns an error if a write or the read-back fails.
    pub fn set_passthrough(&mut self, enable: bool) -> Result<bool, Error> {
        self.mpu().int_pin_cfg().write(|w| {
            w.set_i_2_c_bypass_en(enable);
        })?;
        self.mpu().user_ctrl().write(|w| {
            w.set_i_2_c_mst_en(false);
        })?;
        self.passthrough()
    }

    /// Read whether passthrough is enabled
    ///
    /// Tests only the bypass bit, so other `INT_PIN_CFG` bits do not affect
    /// the answer.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn passthrough(&mut self) -> Result<bool, Error> {
        Ok(self.mpu().int_pin_cfg().read()?.i_2_c_bypass_en())
    }

    // ==================== Ranges and rate ====================

    /// Set the accelerometer range
    ///
    /// Returns the range read back and caches it for conversions.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or the read-back fails.
    pub fn set_accel_range(&mut self, range: AccelRange) -> Result<AccelRange, Error> {
        self.mpu().accel_config().write(|w| {
            w.set_afs_sel(range.index());
        })?;
        self.accel_range()
    }

    /// Read the accelerometer range from the device and refresh the cache
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn accel_range(&mut self) -> Result<AccelRange, Error> {
        let bits = self.mpu().accel_config().read()?.afs_sel();
        self.accel_range = AccelRange::from_bits(bits);
        Ok(self.accel_range)
    }

    /// Set the gyroscope range
    ///
    /// Returns the range read back and caches it for conversions.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or the read-back fails.
    pub fn set_gyro_range(&mut self, range: GyroRange) -> Result<GyroRange, Error> {
        self.mpu().gyro_config().write(|w| {
            w.set_fs_sel(range.index());
        })?;
        self.gyro_range()
    }

    /// Read the gyroscope range from the device and refresh the cache
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn gyro_range(&mut self) -> Result<GyroRange, Error> {
        let bits = self.mpu().gyro_config().read()?.fs_sel();
        self.gyro_range = GyroRange::from_bits(bits);
        Ok(self.gyro_range)
    }

    /// Accelerometer range used for conversions (no bus access)
    #[must_use]
    pub const fn cached_accel_range(&self) -> AccelRange {
        self.accel_range
    }

    /// Gyroscope range used for conversions (no bus access)
    #[must_use]
    pub const fn cached_gyro_range(&self) -> GyroRange {
        self.gyro_range
    }

    /// Request a sample rate in Hz
    ///
    /// Not every rate is reachable: the divider is
    /// `round(8000 / hz) - 1` clamped to 0-255. The returned rate is
    /// recomputed from the divider read back, so callers must use it rather
    /// than the requested value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or the read-back fails.
    pub fn set_sample_rate(&mut self, hz: u32) -> Result<f32, Error> {
        let divider = sample_rate_divider(hz);
        self.mpu().smplrt_div().write(|w| {
            w.set_divider(divider);
        })?;
        self.sample_rate()
    }

    /// Read the current sample rate in Hz
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn sample_rate(&mut self) -> Result<f32, Error> {
        let divider = self.mpu().smplrt_div().read()?.divider();
        Ok(divider_to_rate(divider))
    }

    // ==================== Magnetometer calibration ====================

    /// Read the factory sensitivity trim from the magnetometer fuse ROM
    ///
    /// Switches the AK8975 to fuse-ROM mode, reads `ASAX..ASAZ` and powers
    /// it back down. Does not change the coefficients in use; see
    /// [`recalibrate`](Self::recalibrate).
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] while an acquisition is outstanding
    /// - [`Error::Transport`] on any bus failure
    pub fn read_mag_corrections(&mut self) -> Result<MagCorrection, Error> {
        self.ensure_mag_idle()?;

        self.ak().cntl().write(|w| {
            w.set_mode(ak8975::MODE_FUSE_ROM);
        })?;
        let mut trim = [0u8; 3];
        let read = self
            .transport
            .read(ak8975::I2C_ADDRESS, ak8975::REG_ASAX, &mut trim);
        // Leave fuse-ROM mode even if the read failed
        let power_down = self.ak().cntl().write(|w| {
            w.set_mode(ak8975::MODE_POWER_DOWN);
        });
        read?;
        power_down?;

        Ok(MagCorrection::from_trim(trim))
    }

    /// Re-read the trim and install the resulting coefficients
    ///
    /// On failure the coefficients fall back to [`MagCorrection::NEUTRAL`],
    /// never to a stale or undefined value.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] while an acquisition is outstanding
    ///   (coefficients unchanged)
    /// - [`Error::Transport`] on any bus failure (coefficients neutral)
    pub fn recalibrate(&mut self) -> Result<MagCorrection, Error> {
        match self.read_mag_corrections() {
            Ok(correction) => {
                self.mag_correction = correction;
                Ok(correction)
            }
            Err(e @ Error::InvalidState(_)) => Err(e),
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Magnetometer trim read failed ({}), using neutral correction", e);
                self.mag_correction = MagCorrection::NEUTRAL;
                Err(e)
            }
        }
    }

    /// Coefficients currently applied to magnetometer readings
    #[must_use]
    pub const fn mag_correction(&self) -> MagCorrection {
        self.mag_correction
    }

    /// Override the magnetometer coefficients
    pub fn set_mag_correction(&mut self, correction: MagCorrection) {
        self.mag_correction = correction;
    }

    fn ensure_mag_idle(&self) -> Result<(), Error> {
        match self.acquisition.state() {
            state @ (AcquisitionState::Triggered | AcquisitionState::Ready) => {
                Err(Error::InvalidState(state))
            }
            AcquisitionState::Idle | AcquisitionState::Error => Ok(()),
        }
    }

    // ==================== Accelerometer / gyroscope / temperature ====================

    fn read_raw_or_zero(&mut self, register: u8) -> RawSample {
        let address = self.config.address.address();
        let mut buffer = [0u8; 6];
        match self.transport.read(address, register, &mut buffer) {
            Ok(()) => RawSample(buffer),
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Read at 0x{:02X} failed ({}), returning zero sample", register, _e);
                RawSample::ZERO
            }
        }
    }

    /// Read raw accelerometer bytes (`ACCEL_XOUT_H..ACCEL_ZOUT_L`)
    ///
    /// A bus failure yields [`RawSample::ZERO`] instead of an error.
    pub fn read_accel_raw(&mut self) -> RawSample {
        self.read_raw_or_zero(ACCEL_DATA)
    }

    /// Read raw gyroscope bytes (`GYRO_XOUT_H..GYRO_ZOUT_L`)
    ///
    /// A bus failure yields [`RawSample::ZERO`] instead of an error.
    pub fn read_gyro_raw(&mut self) -> RawSample {
        self.read_raw_or_zero(GYRO_DATA)
    }

    /// Read accelerometer data in g using the cached range
    pub fn read_accelerometer(&mut self) -> Vector3 {
        let raw = self.read_accel_raw();
        self.accel_range.convert(&raw)
    }

    /// Read gyroscope data in °/s using the cached range
    pub fn read_gyroscope(&mut self) -> Vector3 {
        let raw = self.read_gyro_raw();
        self.gyro_range.convert(&raw)
    }

    /// Read the raw temperature value
    ///
    /// A bus failure yields 0.
    pub fn read_temperature_raw(&mut self) -> i16 {
        let address = self.config.address.address();
        let mut buffer = [0u8; 2];
        match self.transport.read(address, TEMP_DATA, &mut buffer) {
            Ok(()) => i16::from_be_bytes(buffer),
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Temperature read failed ({}), returning zero", _e);
                0
            }
        }
    }

    /// Convert raw temperature to degrees Celsius
    #[must_use]
    pub fn temperature_to_celsius(raw: i16) -> f32 {
        // Temp_degC = TEMP_OUT / 340 + 35
        f32::from(raw) / 340.0 + 35.0
    }

    /// Read the die temperature in °C
    pub fn read_temperature(&mut self) -> f32 {
        Self::temperature_to_celsius(self.read_temperature_raw())
    }

    // ==================== Magnetometer acquisition ====================

    /// Borrow the driver as a scheduler-facing poller
    pub fn mag_poller(&mut self) -> MagPoller<'_, B> {
        MagPoller::new(self)
    }

    /// Advance the magnetometer acquisition by one non-blocking step
    pub fn poll_magnetometer(&mut self) -> PollStatus {
        self.acquisition.poll(&mut self.transport)
    }

    /// Current magnetometer acquisition state
    #[must_use]
    pub const fn acquisition_state(&self) -> AcquisitionState {
        self.acquisition.state()
    }

    /// Start a magnetometer conversion explicitly
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if a conversion is already outstanding
    /// - [`Error::Transport`] if the trigger write fails
    pub fn trigger_magnetometer(&mut self) -> Result<(), Error> {
        self.acquisition.trigger(&mut self.transport)
    }

    /// Abandon an outstanding magnetometer cycle
    pub fn reset_magnetometer(&mut self) {
        self.acquisition.reset();
    }

    /// Consume a ready conversion as raw bytes
    ///
    /// A bus failure during the burst read yields [`RawSample::ZERO`]; the
    /// acquisition returns to `Idle` either way.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless a poll has reported
    /// [`PollStatus::DataReady`].
    pub fn take_magnetometer_raw(&mut self) -> Result<RawSample, Error> {
        self.acquisition.read(&mut self.transport)
    }

    /// Read raw magnetometer bytes
    ///
    /// Consumes a ready conversion if there is one, otherwise triggers (or
    /// continues a triggered cycle) and spins until the sensor reports ready.
    /// Any bus failure yields [`RawSample::ZERO`].
    pub fn read_magnetometer_raw(&mut self) -> RawSample {
        if self.acquisition.state() == AcquisitionState::Ready {
            return self
                .acquisition
                .read(&mut self.transport)
                .unwrap_or(RawSample::ZERO);
        }
        self.acquisition.read_blocking(&mut self.transport)
    }

    /// Read the magnetic field in µT
    ///
    /// Fast when a poll has already reported [`PollStatus::DataReady`];
    /// blocks on the sensor otherwise.
    pub fn read_magnetometer(&mut self) -> Vector3 {
        let raw = self.read_magnetometer_raw();
        self.mag_correction.convert(&raw)
    }

    /// Check `ST1.DRDY` directly, outside the acquisition cycle
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the magnetometer fails.
    pub fn magnetometer_data_ready(&mut self) -> Result<bool, Error> {
        Ok(self.ak().st_1().read()?.drdy())
    }

    // ==================== Interrupt-context sampling ====================

    /// Capture raw accelerometer values into [`IrqSamples::accel`]
    ///
    /// No floating point and no blocking. A bus failure keeps the previous
    /// values.
    pub fn read_accel_irq(&mut self) {
        let address = self.config.address.address();
        let mut buffer = [0u8; 6];
        if self.transport.read(address, ACCEL_DATA, &mut buffer).is_ok() {
            self.irq.accel = RawSample(buffer).axes_be();
        }
    }

    /// Capture raw gyroscope values into [`IrqSamples::gyro`]
    ///
    /// No floating point and no blocking. A bus failure keeps the previous
    /// values.
    pub fn read_gyro_irq(&mut self) {
        let address = self.config.address.address();
        let mut buffer = [0u8; 6];
        if self.transport.read(address, GYRO_DATA, &mut buffer).is_ok() {
            self.irq.gyro = RawSample(buffer).axes_be();
        }
    }

    /// Advance the magnetometer one step, capturing into [`IrqSamples::mag`]
    ///
    /// The first call triggers, later calls test `DRDY`, and the call that
    /// sees it set reads the data. Values stay in register order.
    ///
    /// Returns [`PollStatus::DataReady`] only when a new triple was stored.
    /// A bus failure, including one on the data read after `DRDY` was seen,
    /// returns [`PollStatus::Failed`] and keeps the previous values.
    pub fn read_mag_irq(&mut self) -> PollStatus {
        match self.acquisition.poll(&mut self.transport) {
            PollStatus::DataReady => match self.acquisition.try_read(&mut self.transport) {
                Ok(raw) => {
                    self.irq.mag = raw.axes_le();
                    PollStatus::DataReady
                }
                Err(_) => PollStatus::Failed,
            },
            status => status,
        }
    }

    /// Latest values captured by the `*_irq` methods
    #[must_use]
    pub const fn irq_samples(&self) -> IrqSamples {
        self.irq
    }

    // ==================== Accessors ====================

    /// Configuration the driver was created with
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the driver and return the underlying bus
    pub fn release(self) -> B {
        self.transport.release()
    }
}
