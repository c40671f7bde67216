//! Unit tests for magnetometer reads and axis conversion

use crate::common::{Operation, assert_float_eq, create_initialized_driver};
use mpu9150::sensors::MAG_SENSITIVITY;
use mpu9150::{AcquisitionState, Axis, PollStatus};

#[test]
fn test_axis_remap() {
    let (mut driver, bus) = create_initialized_driver();
    bus.set_mag_data(100, 200, 300);

    let field = driver.read_magnetometer();

    assert_float_eq(field.x, 200.0 / MAG_SENSITIVITY, 1e-3);
    assert_float_eq(field.y, 100.0 / MAG_SENSITIVITY, 1e-3);
    assert_float_eq(field.z, -300.0 / MAG_SENSITIVITY, 1e-3);
}

#[test]
fn test_blocking_read_waits_for_drdy() {
    let (mut driver, bus) = create_initialized_driver();
    bus.set_mag_ready_after(4);
    bus.set_mag_data(-50, 0, 50);

    let raw = driver.read_magnetometer_raw();

    assert_eq!(raw.axes_le(), [-50, 0, 50]);
    assert_eq!(driver.acquisition_state(), AcquisitionState::Idle);
    let status_reads = bus
        .operations()
        .iter()
        .filter(|op| {
            matches!(
                op,
                Operation::Read {
                    address: 0x0C,
                    register: 0x02,
                    ..
                }
            )
        })
        .count();
    assert_eq!(status_reads, 5, "Should poll ST1 until DRDY is set");
}

#[test]
fn test_ready_read_is_single_burst() {
    let (mut driver, bus) = create_initialized_driver();
    bus.set_mag_data(1, 2, 3);

    driver.poll_magnetometer();
    assert_eq!(driver.poll_magnetometer(), PollStatus::DataReady);
    bus.clear_operations();

    let raw = driver.read_magnetometer_raw();
    assert_eq!(raw.axes_le(), [1, 2, 3]);
    assert_eq!(
        bus.operations(),
        vec![Operation::Read {
            address: 0x0C,
            register: 0x03,
            len: 6,
        }],
        "A ready sample should not retrigger"
    );
}

#[test]
fn test_blocking_read_continues_triggered_cycle() {
    let (mut driver, bus) = create_initialized_driver();
    bus.set_mag_ready_after(2);

    driver.poll_magnetometer();
    driver.read_magnetometer_raw();

    assert_eq!(
        bus.writes_to(0x0C, 0x0A),
        vec![0x01],
        "An outstanding conversion must be finished, not restarted"
    );
}

#[test]
fn test_axis_selection() {
    let (mut driver, bus) = create_initialized_driver();
    bus.set_mag_data(100, 200, 300);

    let field = driver.read_magnetometer();
    let [z, x] = field.select([Axis::Z, Axis::X]);

    assert_eq!(z, field.z);
    assert_eq!(x, field.x);
    assert_eq!(field.get(Axis::Y), field.y);
}

#[test]
fn test_direct_data_ready_check() {
    let (mut driver, bus) = create_initialized_driver();
    assert!(!driver.magnetometer_data_ready().unwrap());

    bus.set_register(0x0C, 0x02, 0x01);
    assert!(driver.magnetometer_data_ready().unwrap());
}
