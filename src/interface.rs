//! Bus interface implementations for the MPU-9150
//!
//! Every register access in this crate goes through [`Transport`], which wraps
//! one bus transaction in a critical section when the interrupt policy asks for
//! it. Platforms plug in by implementing [`I2cBus`], or by handing any
//! `embedded-hal` I2C bus to [`HalBus`].

use crate::Error;
use device_driver::RegisterInterface;

/// Bus-level failure reported by an [`I2cBus`] implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The transaction did not finish within the timeout
    Timeout,
    /// The addressed device did not acknowledge
    Nack,
    /// Any other bus or peripheral failure
    Other,
}

/// Memory-style I2C bus primitive
///
/// Mirrors the register read/write calls offered by most microcontroller
/// HALs: address a device, name a register, move bytes.
///
/// # Safety Invariants
///
/// - Only one owner per bus instance
/// - Addresses are 7-bit (0x00..=0x7F)
pub trait I2cBus {
    /// Read `buffer.len()` bytes starting at `register` of the device at `address`
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] on NACK, timeout or any other bus failure.
    fn mem_read(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), BusError>;

    /// Write `data` starting at `register` of the device at `address`
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] on NACK, timeout or any other bus failure.
    fn mem_write(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
        timeout_ms: u32,
    ) -> Result<(), BusError>;
}

/// Adapter from an `embedded-hal` I2C bus to [`I2cBus`]
///
/// Timeouts are whatever the HAL peripheral was configured with; the
/// per-call timeout is not forwarded. Writes carry at most 8 data bytes;
/// longer payloads fail with [`BusError::Other`].
pub struct HalBus<I2C> {
    i2c: I2C,
}

impl<I2C> HalBus<I2C> {
    /// Wrap an I2C peripheral
    pub const fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Consume the adapter and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

fn map_hal_error<E: embedded_hal::i2c::Error>(error: &E) -> BusError {
    match error.kind() {
        embedded_hal::i2c::ErrorKind::NoAcknowledge(_) => BusError::Nack,
        _ => BusError::Other,
    }
}

impl<I2C> I2cBus for HalBus<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn mem_read(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), BusError> {
        let _ = timeout_ms; // Enforced by the HAL peripheral
        self.i2c
            .write_read(address, &[register], buffer)
            .map_err(|e| map_hal_error(&e))
    }

    fn mem_write(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
        timeout_ms: u32,
    ) -> Result<(), BusError> {
        let _ = timeout_ms; // Enforced by the HAL peripheral
        // Register address followed by data
        let mut buffer = [0u8; 9]; // Max: 1 address + 8 data bytes
        let len = data.len();
        if len > buffer.len() - 1 {
            return Err(BusError::Other);
        }
        buffer[0] = register;
        buffer[1..=len].copy_from_slice(data);

        self.i2c
            .write(address, &buffer[..=len])
            .map_err(|e| map_hal_error(&e))
    }
}

/// Interrupt-safe register transport
///
/// Owns the bus, the per-transaction timeout and the interrupt-disable policy.
/// With the policy enabled each transaction runs inside
/// [`critical_section::with`], so interrupts are masked for exactly one bus
/// transaction and the prior state is restored on every exit path.
pub struct Transport<B> {
    bus: B,
    timeout_ms: u32,
    disable_interrupts: bool,
}

impl<B: I2cBus> Transport<B> {
    /// Create a transport
    pub const fn new(bus: B, timeout_ms: u32, disable_interrupts: bool) -> Self {
        Self {
            bus,
            timeout_ms,
            disable_interrupts,
        }
    }

    /// Read `buffer.len()` bytes from `register` of device `address`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] on timeout, NACK or I/O failure.
    pub fn read(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<(), Error> {
        self.transaction(|bus, timeout_ms| bus.mem_read(address, register, buffer, timeout_ms))
    }

    /// Write one byte to `register` of device `address`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] on timeout, NACK or I/O failure.
    pub fn write(&mut self, address: u8, register: u8, value: u8) -> Result<(), Error> {
        self.transaction(|bus, timeout_ms| bus.mem_write(address, register, &[value], timeout_ms))
    }

    /// Read a single register
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] on timeout, NACK or I/O failure.
    pub fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, Error> {
        let mut buffer = [0u8; 1];
        self.read(address, register, &mut buffer)?;
        Ok(buffer[0])
    }

    fn transaction<F>(&mut self, op: F) -> Result<(), Error>
    where
        F: FnOnce(&mut B, u32) -> Result<(), BusError>,
    {
        let timeout_ms = self.timeout_ms;
        let bus = &mut self.bus;
        let result = if self.disable_interrupts {
            critical_section::with(|_cs| op(bus, timeout_ms))
        } else {
            op(bus, timeout_ms)
        };
        result.map_err(Error::from)
    }

    /// Per-transaction timeout in milliseconds
    #[must_use]
    pub const fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Whether transactions run with interrupts disabled
    #[must_use]
    pub const fn disables_interrupts(&self) -> bool {
        self.disable_interrupts
    }

    /// Consume the transport and return the bus
    pub fn release(self) -> B {
        self.bus
    }
}

/// A [`Transport`] bound to one device address
///
/// Implements `device-driver`'s [`RegisterInterface`] so the generated
/// register blocks in [`crate::registers`] share the critical-section path.
pub struct DeviceInterface<'a, B> {
    transport: &'a mut Transport<B>,
    address: u8,
}

impl<'a, B> DeviceInterface<'a, B> {
    /// Bind `transport` to the device at `address`
    pub fn new(transport: &'a mut Transport<B>, address: u8) -> Self {
        Self { transport, address }
    }
}

impl<B: I2cBus> RegisterInterface for DeviceInterface<'_, B> {
    type Error = Error;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // Size is implicit in read_data.len() for I2C
        self.transport.read(self.address, address, read_data)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // Size is implicit in write_data.len() for I2C
        for (offset, &byte) in write_data.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let register = address.wrapping_add(offset as u8);
            self.transport.write(self.address, register, byte)?;
        }
        Ok(())
    }
}
