//! Register definitions for the MPU-9150
//!
//! The MPU-9150 is two dies in one package: the MPU-6050-class accel/gyro at
//! 0x68/0x69 and an AK8975 magnetometer at 0x0C. The magnetometer is only
//! reachable from the host once the MPU's I2C bypass is enabled.
//!
//! Only configuration and status registers are modelled here. Sensor data is
//! read as raw bursts starting at the `*_DATA` addresses below.

/// First accelerometer data register (`ACCEL_XOUT_H`)
pub const ACCEL_DATA: u8 = 0x3B;

/// First temperature data register (`TEMP_OUT_H`)
pub const TEMP_DATA: u8 = 0x41;

/// First gyroscope data register (`GYRO_XOUT_H`)
pub const GYRO_DATA: u8 = 0x43;

/// MPU-9150 accel/gyro registers
pub mod mpu {
    device_driver::create_device!(
        device_name: Mpu9150,
        dsl: {
            config {
                type RegisterAddressType = u8;
                type DefaultByteOrder = BE;
            }

            /// SMPLRT_DIV - Sample Rate Divider (0x19)
            /// Sample rate = 8 kHz / (1 + divider) with the DLPF disabled
            register SmplrtDiv {
                const ADDRESS = 0x19;
                const SIZE_BITS = 8;

                /// Sample rate divider
                divider: uint = 0..8,
            },

            /// GYRO_CONFIG - Gyroscope Configuration (0x1B)
            register GyroConfig {
                const ADDRESS = 0x1B;
                const SIZE_BITS = 8;

                reserved_2_0: uint = 0..3,
                /// Full scale select (0=±250, 1=±500, 2=±1000, 3=±2000 °/s)
                fs_sel: uint = 3..5,
                /// Self-test enables
                self_test: uint = 5..8,
            },

            /// ACCEL_CONFIG - Accelerometer Configuration (0x1C)
            register AccelConfig {
                const ADDRESS = 0x1C;
                const SIZE_BITS = 8;

                reserved_2_0: uint = 0..3,
                /// Full scale select (0=±2, 1=±4, 2=±8, 3=±16 g)
                afs_sel: uint = 3..5,
                /// Self-test enables
                self_test: uint = 5..8,
            },

            /// INT_PIN_CFG - Interrupt Pin / Bypass Enable Configuration (0x37)
            register IntPinCfg {
                const ADDRESS = 0x37;
                const SIZE_BITS = 8;

                reserved_0: uint = 0..1,
                /// Expose the auxiliary I2C bus (magnetometer) to the host
                i2c_bypass_en: bool = 1,
                /// FSYNC pin as interrupt
                fsync_int_en: bool = 2,
                /// FSYNC interrupt active low
                fsync_int_level: bool = 3,
                /// Clear interrupt status on any read
                int_rd_clear: bool = 4,
                /// Latch interrupt pin until cleared
                latch_int_en: bool = 5,
                /// Interrupt pin open drain
                int_open: bool = 6,
                /// Interrupt pin active low
                int_level: bool = 7,
            },

            /// USER_CTRL - User Control (0x6A)
            register UserCtrl {
                const ADDRESS = 0x6A;
                const SIZE_BITS = 8;

                /// Reset all signal paths
                sig_cond_reset: bool = 0,
                /// I2C master reset
                i2c_mst_reset: bool = 1,
                /// FIFO reset
                fifo_reset: bool = 2,
                reserved_3: uint = 3..4,
                /// Primary I2C interface disable
                i2c_if_dis: bool = 4,
                /// I2C master enable (must be off for bypass)
                i2c_mst_en: bool = 5,
                /// FIFO enable
                fifo_en: bool = 6,
                reserved_7: uint = 7..8,
            },

            /// PWR_MGMT_1 - Power Management 1 (0x6B)
            register PwrMgmt1 {
                const ADDRESS = 0x6B;
                const SIZE_BITS = 8;

                /// Clock source select (0=internal 8MHz, 1=PLL with X gyro reference)
                clksel: uint = 0..3,
                /// Temperature sensor disable
                temp_dis: bool = 3,
                reserved_4: uint = 4..5,
                /// Cycle between sleep and single samples
                cycle: bool = 5,
                /// Sleep mode enable
                sleep: bool = 6,
                /// Device reset
                device_reset: bool = 7,
            },

            /// WHO_AM_I - Device ID Register (0x75)
            /// Expected value: 0x68
            register WhoAmI {
                const ADDRESS = 0x75;
                const SIZE_BITS = 8;

                /// Device ID
                who_am_i: uint = 0..8,
            },
        }
    );
}

/// AK8975 magnetometer registers (bus address 0x0C, bypass mode)
pub mod ak8975 {
    /// AK8975 I2C address
    pub const I2C_ADDRESS: u8 = 0x0C;

    /// Expected `WIA` value
    pub const WIA_VALUE: u8 = 0x48;

    /// First measurement data register (HXL)
    pub const REG_HXL: u8 = 0x03;

    /// First sensitivity adjustment register (ASAX)
    pub const REG_ASAX: u8 = 0x10;

    /// `CNTL` value: power-down
    pub const MODE_POWER_DOWN: u8 = 0x00;

    /// `CNTL` value: single measurement
    pub const MODE_SINGLE: u8 = 0x01;

    /// `CNTL` value: fuse ROM access
    pub const MODE_FUSE_ROM: u8 = 0x0F;

    device_driver::create_device!(
        device_name: Ak8975,
        dsl: {
            config {
                type RegisterAddressType = u8;
                type DefaultByteOrder = LE;
            }

            /// WIA - Device ID (0x00)
            /// Expected value: 0x48
            register Wia {
                const ADDRESS = 0x00;
                const SIZE_BITS = 8;

                /// Device ID
                wia: uint = 0..8,
            },

            /// ST1 - Status 1 (0x02)
            register St1 {
                const ADDRESS = 0x02;
                const SIZE_BITS = 8;

                /// Data ready
                drdy: bool = 0,
                reserved_7_1: uint = 1..8,
            },

            /// CNTL - Control (0x0A)
            register Cntl {
                const ADDRESS = 0x0A;
                const SIZE_BITS = 8;

                /// Operating mode (0x0=power-down, 0x1=single, 0xF=fuse ROM)
                mode: uint = 0..4,
                reserved_7_4: uint = 4..8,
            },
        }
    );
}
