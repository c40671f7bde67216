//! Unit tests for configuration: ranges, sample rate, power and passthrough

use crate::common::{MockBus, assert_float_eq, create_initialized_driver, create_mock_driver};
use crate::common::test_utils::create_mock_driver_with;
use mpu9150::registers::ak8975;
use mpu9150::{AccelRange, Config, DeviceAddress, Error, GyroRange, Mpu9150Driver, PowerMode};

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.address, DeviceAddress::Primary);
    assert_eq!(config.timeout_ms, 10);
    assert!(config.disable_interrupts);
    assert_eq!(config.accel_range, AccelRange::G16);
    assert_eq!(config.gyro_range, GyroRange::Dps2000);
}

#[test]
fn test_wrong_who_am_i_rejected() {
    let bus = MockBus::new();
    bus.set_who_am_i(0x71);

    let result = Mpu9150Driver::new(bus, Config::default());
    assert!(
        matches!(result, Err(Error::InvalidDevice(0x71))),
        "Unexpected WHO_AM_I should be reported with the value read"
    );
}

#[test]
fn test_chip_id() {
    let (mut driver, _bus) = create_mock_driver();
    assert_eq!(driver.chip_id().unwrap(), 0x68);
}

#[test]
fn test_magnetometer_id_after_init() {
    let (mut driver, _bus) = create_initialized_driver();
    assert_eq!(driver.magnetometer_id().unwrap(), ak8975::WIA_VALUE);
}

#[test]
fn test_accel_range_round_trip() {
    let (mut driver, bus) = create_initialized_driver();

    for index in 0..=3u8 {
        let range = AccelRange::try_from(index).unwrap();
        assert_eq!(driver.set_accel_range(range).unwrap(), range);
        assert_eq!(driver.accel_range().unwrap(), range);
        assert_eq!(driver.cached_accel_range(), range);
        assert_eq!(bus.get_register(0x68, 0x1C), index << 3);
    }
}

#[test]
fn test_gyro_range_round_trip() {
    let (mut driver, bus) = create_initialized_driver();

    for index in 0..=3u8 {
        let range = GyroRange::try_from(index).unwrap();
        assert_eq!(driver.set_gyro_range(range).unwrap(), range);
        assert_eq!(driver.gyro_range().unwrap(), range);
        assert_eq!(driver.cached_gyro_range(), range);
        assert_eq!(bus.get_register(0x68, 0x1B), index << 3);
    }
}

#[test]
fn test_range_index_out_of_bounds() {
    assert_eq!(AccelRange::try_from(4), Err(Error::InvalidRange(4)));
    assert_eq!(GyroRange::try_from(255), Err(Error::InvalidRange(255)));
}

#[test]
fn test_range_read_back_is_authoritative() {
    let (mut driver, bus) = create_initialized_driver();

    // Someone else reprogrammed the chip
    bus.set_register(0x68, 0x1C, 0x08);
    assert_eq!(driver.accel_range().unwrap(), AccelRange::G4);
    assert_eq!(driver.cached_accel_range(), AccelRange::G4);
}

#[test]
fn test_cached_range_drives_conversion() {
    let (mut driver, bus) = create_initialized_driver();
    bus.set_accel_data(16384, 0, -8192);

    driver.set_accel_range(AccelRange::G2).unwrap();
    let g = driver.read_accelerometer();
    assert_float_eq(g.x, 1.0, 1e-4);
    assert_float_eq(g.z, -0.5, 1e-4);

    driver.set_accel_range(AccelRange::G16).unwrap();
    let g = driver.read_accelerometer();
    assert_float_eq(g.x, 8.0, 1e-4);
}

#[test]
fn test_init_applies_configured_ranges() {
    let config = Config {
        accel_range: AccelRange::G4,
        gyro_range: GyroRange::Dps500,
        ..Config::default()
    };
    let (mut driver, bus) = create_mock_driver_with(config);
    driver.init().unwrap();

    assert_eq!(driver.cached_accel_range(), AccelRange::G4);
    assert_eq!(driver.cached_gyro_range(), GyroRange::Dps500);
    assert_eq!(bus.get_register(0x68, 0x1C), 0x08);
    assert_eq!(bus.get_register(0x68, 0x1B), 0x08);
}

#[test]
fn test_sample_rate_exact_values() {
    let (mut driver, bus) = create_initialized_driver();

    assert_float_eq(driver.set_sample_rate(1000).unwrap(), 1000.0, 1e-3);
    assert_eq!(bus.get_register(0x68, 0x19), 7);

    assert_float_eq(driver.set_sample_rate(8000).unwrap(), 8000.0, 1e-3);
    assert_eq!(bus.get_register(0x68, 0x19), 0);
}

#[test]
fn test_sample_rate_clamped() {
    let (mut driver, _bus) = create_initialized_driver();

    assert_float_eq(driver.set_sample_rate(0).unwrap(), 31.25, 1e-3);
    assert_float_eq(driver.set_sample_rate(1).unwrap(), 31.25, 1e-3);
    assert_float_eq(driver.set_sample_rate(50_000).unwrap(), 8000.0, 1e-3);
}

#[test]
fn test_sample_rate_monotonic() {
    let (mut driver, _bus) = create_initialized_driver();

    let mut previous = 0.0f32;
    for hz in (1..=8000).step_by(7) {
        let achieved = driver.set_sample_rate(hz).unwrap();
        assert!(
            achieved >= previous,
            "Achieved rate went down: {} Hz gave {} after {}",
            hz,
            achieved,
            previous
        );
        previous = achieved;
    }
}

#[test]
fn test_sample_rate_within_half_step() {
    let (mut driver, bus) = create_initialized_driver();

    for hz in 32..=8000u32 {
        let achieved = driver.set_sample_rate(hz).unwrap();
        let steps = f32::from(bus.get_register(0x68, 0x19)) + 1.0;
        assert_float_eq(achieved, 8000.0 / steps, 1e-3);

        // Nearest divider: 8000/hz lies within half a step of `steps`
        let ideal = 8000.0 / hz as f32;
        assert!(
            (ideal - steps).abs() <= 0.5 + 1e-4,
            "{} Hz picked {} steps (ideal {})",
            hz,
            steps,
            ideal
        );
    }
}

#[test]
fn test_power_mode_round_trip() {
    let (mut driver, bus) = create_initialized_driver();

    assert_eq!(driver.sleep().unwrap(), PowerMode::Asleep);
    assert_eq!(bus.get_register(0x68, 0x6B), 0x40);

    assert_eq!(driver.wake().unwrap(), PowerMode::Awake);
    assert_eq!(bus.get_register(0x68, 0x6B), 0x01);
    assert_eq!(driver.power_mode().unwrap(), PowerMode::Awake);
}

#[test]
fn test_passthrough_enable_disables_master() {
    let (mut driver, bus) = create_mock_driver();
    bus.set_register(0x68, 0x6A, 0x20);

    assert!(driver.set_passthrough(true).unwrap());
    assert_eq!(bus.get_register(0x68, 0x37), 0x02);
    assert_eq!(bus.get_register(0x68, 0x6A), 0x00);

    assert!(!driver.set_passthrough(false).unwrap());
    assert_eq!(bus.get_register(0x68, 0x37), 0x00);
}

#[test]
fn test_passthrough_tests_only_bypass_bit() {
    let (mut driver, bus) = create_mock_driver();

    bus.set_register(0x68, 0x37, 0x82);
    assert!(driver.passthrough().unwrap());

    bus.set_register(0x68, 0x37, 0xFD);
    assert!(!driver.passthrough().unwrap());
}

#[test]
fn test_secondary_address() {
    let config = Config {
        address: DeviceAddress::Secondary,
        ..Config::default()
    };
    let (mut driver, bus) = create_mock_driver_with(config);
    driver.init().unwrap();

    assert_eq!(DeviceAddress::Secondary.address(), 0x69);
    assert_eq!(bus.get_register(0x69, 0x37), 0x02);
    assert_eq!(
        bus.get_register(0x68, 0x37),
        0x00,
        "Primary address must not be touched"
    );
}
