//! Non-blocking magnetometer acquisition
//!
//! The AK8975 has one conversion slot: a `CNTL` write starts a single
//! measurement, `ST1.DRDY` goes high once it has integrated, and reading the
//! six data bytes clears it again. [`MagAcquisition`] walks that protocol one
//! bus transaction at a time so a cooperative scheduler can run other work
//! while the sensor integrates.
//!
//! ```text
//!          poll (trigger ok)          poll (DRDY set)
//!   Idle ─────────────────► Triggered ───────────────► Ready
//!    ▲  ◄──────┐               │                        │
//!    │  poll   │ poll (bus     │ poll (bus error)       │ read (always)
//!    │ (retry) │  error)       ▼                        │
//!    │         └─────────── Error                       │
//!    └──────────────────────────────────────────────────┘
//! ```
//!
//! There is no internal timeout. If the hardware never reports ready, `poll`
//! keeps returning [`PollStatus::Pending`]; a deadline, if wanted, belongs to
//! the caller.
//!
//! # Example
//!
//! ```ignore
//! let mut poller = imu.mag_poller();
//! loop {
//!     match poller.poll() {
//!         PollStatus::Pending => scheduler_yield().await,
//!         PollStatus::DataReady => break Some(poller.read()?),
//!         PollStatus::Failed => break None,
//!     }
//! }
//! ```

use crate::device::Mpu9150Driver;
use crate::interface::{DeviceInterface, I2cBus, Transport};
use crate::registers::ak8975::{self, Ak8975};
use crate::sensors::{RawSample, Vector3};
use crate::Error;

/// Where the magnetometer is in its trigger/poll/read cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionState {
    /// No conversion outstanding
    #[default]
    Idle,
    /// Conversion started, waiting for `DRDY`
    Triggered,
    /// Conversion complete, data not yet read
    Ready,
    /// Last trigger or status read failed on the bus
    Error,
}

/// Result of one [`MagAcquisition::poll`] step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollStatus {
    /// Conversion still running (or just started)
    Pending,
    /// Data can be read
    DataReady,
    /// Bus failure; polling again retriggers
    Failed,
}

/// Magnetometer acquisition state machine
///
/// Holds only the state; every step borrows the transport it should use.
#[derive(Debug, Clone, Default)]
pub struct MagAcquisition {
    state: AcquisitionState,
}

impl MagAcquisition {
    /// New state machine in [`AcquisitionState::Idle`]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AcquisitionState::Idle,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> AcquisitionState {
        self.state
    }

    /// Advance by exactly one non-blocking step
    ///
    /// - `Idle`/`Error`: issue the trigger write, move to `Triggered`
    /// - `Triggered`: read `ST1` once, move to `Ready` when `DRDY` is set
    /// - `Ready`: no bus traffic
    pub fn poll<B: I2cBus>(&mut self, transport: &mut Transport<B>) -> PollStatus {
        match self.state {
            AcquisitionState::Idle | AcquisitionState::Error => match self.start(transport) {
                Ok(()) => PollStatus::Pending,
                Err(_) => PollStatus::Failed,
            },
            AcquisitionState::Triggered => match data_ready(transport) {
                Ok(true) => {
                    self.transition(AcquisitionState::Ready);
                    PollStatus::DataReady
                }
                Ok(false) => PollStatus::Pending,
                Err(_) => {
                    self.transition(AcquisitionState::Error);
                    PollStatus::Failed
                }
            },
            AcquisitionState::Ready => PollStatus::DataReady,
        }
    }

    /// Start a conversion explicitly
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] while a conversion is `Triggered` or `Ready`
    ///   (the sensor has a single outstanding slot)
    /// - [`Error::Transport`] if the trigger write fails; the state becomes
    ///   `Error`
    pub fn trigger<B: I2cBus>(&mut self, transport: &mut Transport<B>) -> Result<(), Error> {
        match self.state {
            AcquisitionState::Triggered | AcquisitionState::Ready => {
                Err(Error::InvalidState(self.state))
            }
            AcquisitionState::Idle | AcquisitionState::Error => self.start(transport),
        }
    }

    /// Consume a completed conversion, propagating bus errors
    ///
    /// The state returns to `Idle` whether or not the burst read succeeds.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] unless the state is `Ready` (state unchanged)
    /// - [`Error::Transport`] if the burst read fails
    pub fn try_read<B: I2cBus>(&mut self, transport: &mut Transport<B>) -> Result<RawSample, Error> {
        if self.state != AcquisitionState::Ready {
            return Err(Error::InvalidState(self.state));
        }
        let mut buffer = [0u8; 6];
        let result = transport.read(ak8975::I2C_ADDRESS, ak8975::REG_HXL, &mut buffer);
        self.transition(AcquisitionState::Idle);
        result.map(|()| RawSample(buffer))
    }

    /// Consume a completed conversion
    ///
    /// A bus failure during the burst read yields [`RawSample::ZERO`] so a
    /// polling loop survives a single hiccup. The state returns to `Idle`
    /// either way.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the state is `Ready`.
    pub fn read<B: I2cBus>(&mut self, transport: &mut Transport<B>) -> Result<RawSample, Error> {
        match self.try_read(transport) {
            Err(Error::Transport(_e)) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Magnetometer burst read failed ({}), returning zero sample", _e);
                Ok(RawSample::ZERO)
            }
            other => other,
        }
    }

    /// Trigger (if needed), spin on `DRDY`, then read
    ///
    /// Blocks until the sensor reports ready or the bus fails; on failure the
    /// state is reset to `Idle` and [`RawSample::ZERO`] is returned.
    pub fn read_blocking<B: I2cBus>(&mut self, transport: &mut Transport<B>) -> RawSample {
        loop {
            match self.poll(transport) {
                PollStatus::Pending => core::hint::spin_loop(),
                PollStatus::DataReady => break,
                PollStatus::Failed => {
                    self.reset();
                    return RawSample::ZERO;
                }
            }
        }
        // State is Ready here, so only a bus failure can surface and `read`
        // already maps that to a zero sample.
        self.read(transport).unwrap_or(RawSample::ZERO)
    }

    /// Abandon any outstanding cycle and return to `Idle`
    pub fn reset(&mut self) {
        self.transition(AcquisitionState::Idle);
    }

    fn start<B: I2cBus>(&mut self, transport: &mut Transport<B>) -> Result<(), Error> {
        let result = Ak8975::new(DeviceInterface::new(transport, ak8975::I2C_ADDRESS))
            .cntl()
            .write(|w| {
                w.set_mode(ak8975::MODE_SINGLE);
            });
        match result {
            Ok(()) => {
                self.transition(AcquisitionState::Triggered);
                Ok(())
            }
            Err(e) => {
                self.transition(AcquisitionState::Error);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: AcquisitionState) {
        #[cfg(feature = "defmt")]
        {
            if self.state != next {
                defmt::trace!("Magnetometer acquisition {} -> {}", self.state, next);
            }
        }
        self.state = next;
    }
}

fn data_ready<B: I2cBus>(transport: &mut Transport<B>) -> Result<bool, Error> {
    let st1 = Ak8975::new(DeviceInterface::new(transport, ak8975::I2C_ADDRESS))
        .st_1()
        .read()?;
    Ok(st1.drdy())
}

/// Scheduler-facing poller bound to one driver
///
/// Obtained from [`Mpu9150Driver::mag_poller`]. Each [`poll`](Self::poll) is
/// one non-blocking step; dropping the poller leaves the cycle parked in the
/// driver to be resumed later.
pub struct MagPoller<'a, B> {
    driver: &'a mut Mpu9150Driver<B>,
}

impl<'a, B: I2cBus> MagPoller<'a, B> {
    pub(crate) fn new(driver: &'a mut Mpu9150Driver<B>) -> Self {
        Self { driver }
    }

    /// Advance the acquisition by one step
    pub fn poll(&mut self) -> PollStatus {
        self.driver.poll_magnetometer()
    }

    /// Current acquisition state
    #[must_use]
    pub fn state(&self) -> AcquisitionState {
        self.driver.acquisition_state()
    }

    /// Consume the ready conversion as raw bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the last poll reported
    /// [`PollStatus::DataReady`].
    pub fn read_raw(&mut self) -> Result<RawSample, Error> {
        self.driver.take_magnetometer_raw()
    }

    /// Consume the ready conversion in µT
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the last poll reported
    /// [`PollStatus::DataReady`].
    pub fn read(&mut self) -> Result<Vector3, Error> {
        let raw = self.driver.take_magnetometer_raw()?;
        Ok(self.driver.mag_correction().convert(&raw))
    }
}
