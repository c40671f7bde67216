//! Unit tests for the embedded-hal adapter

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use mpu9150::{BusError, HalBus, I2cBus};

/// Minimal blocking I2C peripheral that records traffic
#[derive(Default)]
struct FakeI2c {
    writes: Vec<(u8, Vec<u8>)>,
    fill: u8,
    fail_with: Option<ErrorKind>,
}

impl ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c for FakeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if let Some(kind) = self.fail_with {
            return Err(kind);
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                Operation::Read(buffer) => buffer.fill(self.fill),
            }
        }
        Ok(())
    }
}

#[test]
fn test_mem_read_addresses_register_then_reads() {
    let mut bus = HalBus::new(FakeI2c {
        fill: 0xAB,
        ..FakeI2c::default()
    });

    let mut buffer = [0u8; 6];
    bus.mem_read(0x68, 0x3B, &mut buffer, 10).unwrap();

    assert_eq!(buffer, [0xAB; 6]);
    let i2c = bus.release();
    assert_eq!(i2c.writes, vec![(0x68, vec![0x3B])]);
}

#[test]
fn test_mem_write_prefixes_register() {
    let mut bus = HalBus::new(FakeI2c::default());

    bus.mem_write(0x0C, 0x0A, &[0x01], 10).unwrap();

    let i2c = bus.release();
    assert_eq!(i2c.writes, vec![(0x0C, vec![0x0A, 0x01])]);
}

#[test]
fn test_mem_write_rejects_oversize_payload() {
    let mut bus = HalBus::new(FakeI2c::default());

    assert_eq!(bus.mem_write(0x68, 0x19, &[0u8; 9], 10), Err(BusError::Other));
    assert!(
        bus.release().writes.is_empty(),
        "Oversize payload must not be truncated onto the bus"
    );
}

#[test]
fn test_mem_write_accepts_eight_bytes() {
    let mut bus = HalBus::new(FakeI2c::default());

    bus.mem_write(0x68, 0x19, &[1, 2, 3, 4, 5, 6, 7, 8], 10)
        .unwrap();
    let i2c = bus.release();
    assert_eq!(i2c.writes, vec![(0x68, vec![0x19, 1, 2, 3, 4, 5, 6, 7, 8])]);
}

#[test]
fn test_nack_maps_to_nack() {
    let mut bus = HalBus::new(FakeI2c {
        fail_with: Some(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)),
        ..FakeI2c::default()
    });

    let mut buffer = [0u8; 1];
    assert_eq!(
        bus.mem_read(0x0C, 0x00, &mut buffer, 10),
        Err(BusError::Nack)
    );
}

#[test]
fn test_other_errors_map_to_other() {
    let mut bus = HalBus::new(FakeI2c {
        fail_with: Some(ErrorKind::ArbitrationLoss),
        ..FakeI2c::default()
    });

    assert_eq!(bus.mem_write(0x68, 0x6B, &[0x01], 10), Err(BusError::Other));
}
