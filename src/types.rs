use crate::calibration::Calibration;
use crate::compensation::{FineTemperature, compensate};
use crate::hw_def::*;

use core::fmt;

#[cfg(feature="defmt")]
use defmt::Format;

/// BME280 device driver using the blocking [`embedded_hal::i2c::I2c`] bus
///
/// A device instance carries the fine temperature of its last read cycle, so
/// it must not be shared between concurrent readers without exclusion.
#[cfg(feature = "blocking")]
#[derive(Debug)]
pub struct Bme280<I2C, Delay> {
    pub(crate) i2c: I2C,
    pub(crate) delay: Delay,
    pub(crate) i2c_addr: I2cAddr,
    pub(crate) state: DeviceState,
}

/// BME280 device driver using the async [`embedded_hal_async::i2c::I2c`] bus
///
/// A device instance carries the fine temperature of its last read cycle, so
/// it must not be shared between concurrent readers without exclusion.
#[cfg(feature = "async")]
#[derive(Debug)]
pub struct AsyncBme280<I2C, Delay> {
    pub(crate) i2c: I2C,
    pub(crate) delay: Delay,
    pub(crate) i2c_addr: I2cAddr,
    pub(crate) state: DeviceState,
}

/// Bus-independent driver state shared by the blocking and async drivers
#[derive(Debug, Default)]
pub(crate) struct DeviceState {
    /// `None` until `init()` or `load_calibration()` succeeds
    pub(crate) calibration: Option<Calibration>,
    pub(crate) t_fine: FineTemperature,
    pub(crate) compensation_mode: CompensationMode,
}
impl DeviceState {
    pub(crate) fn is_initialized(&self) -> bool {
        self.calibration.is_some()
    }

    pub(crate) fn reset(&mut self) {
        self.calibration = None;
        self.t_fine = FineTemperature::default();
    }

    pub(crate) fn measurement<E>(&mut self, raw: &RawSample) -> Result<Measurement, Error<E>> {
        let calibration = self.calibration.as_ref().ok_or(Error::Uninitialized)?;
        let (measurement, t_fine) = compensate(calibration, self.compensation_mode, raw);
        self.t_fine = t_fine;
        Ok(measurement)
    }
}

/// All possible errors in this crate
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Debug, Eq, PartialEq)]
pub enum Error<E> {
    /// I²C communication error
    I2c(E),
    /// The identity register did not hold the BME280 chip ID; contains the value read
    IdentityMismatch(u8),
    /// A measurement was requested before the calibration was loaded
    Uninitialized,
}
impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {e:?}"),
            Error::IdentityMismatch(id) => write!(f, "unexpected chip ID 0x{id:02X} (expected 0x{CHIP_ID:02X})"),
            Error::Uninitialized => write!(f, "device used before initialization"),
        }
    }
}

/// Which family of datasheet formulas is used to compensate samples
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CompensationMode {
    /// 32/64-bit integer formulas
    #[default]
    FixedPoint,
    /// Double precision formulas, slightly more accurate
    FloatingPoint,
}

/// Raw (uncompensated) ADC codes from the device
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RawSample {
    /// 20-bit temperature code
    pub temperature: i32,
    /// 20-bit pressure code
    pub pressure: i32,
    /// 16-bit humidity code
    pub humidity: i32,
}
impl RawSample {
    /// Unpack the `press_msb..=hum_lsb` burst read from `0xF7`
    pub fn from_burst(buf: &[u8; MEASUREMENT_LEN]) -> Self {
        Self {
            pressure: adc_20bit(buf[0], buf[1], buf[2]),
            temperature: adc_20bit(buf[3], buf[4], buf[5]),
            humidity: (buf[6] as i32) << 8 | buf[7] as i32,
        }
    }
}

fn adc_20bit(msb: u8, lsb: u8, xlsb: u8) -> i32 {
    (msb as i32) << 12 | (lsb as i32) << 4 | (xlsb as i32) >> 4
}

/// Temperature, pressure and relative humidity after compensation
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Measurement {
    /// degrees centigrade
    pub centigrade: f32,
    /// pressure in hectopascal
    pub pressure_hpa: f32,
    /// relative humidity in percent
    pub humidity_percent: f32,
}
impl Measurement {
    /// Get temperature in Fahrenheit
    pub fn fahrenheit(&self) -> f32 {
        self.centigrade * 9.0 / 5.0 + 32.0
    }
}
impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} °C, {:.2} hPa, {:.2} %RH",
            self.centigrade, self.pressure_hpa, self.humidity_percent
        )
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;
    use crate::calibration::tests::datasheet_calibration;
    use alloc::string::ToString;

    #[test]
    fn unpack_burst() {
        let raw = RawSample::from_burst(&[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x75, 0x30]);
        assert_eq!(raw, RawSample { temperature: 519_888, pressure: 415_148, humidity: 30_000 });
    }

    #[test]
    fn unpack_burst_ignores_low_nibble_of_xlsb() {
        let raw = RawSample::from_burst(&[0xFF, 0xFF, 0xFF, 0x80, 0x00, 0x0F, 0xFF, 0xFF]);
        assert_eq!(raw.pressure, 0xF_FFFF);
        assert_eq!(raw.temperature, 0x8_0000);
        assert_eq!(raw.humidity, 0xFFFF);
    }

    #[test]
    fn uninitialized_state_refuses_measurement() {
        let mut state = DeviceState::default();
        assert!(!state.is_initialized());
        assert_eq!(state.measurement::<()>(&RawSample::default()), Err(Error::Uninitialized));
        assert_eq!(state.t_fine, FineTemperature(0));
    }

    #[test]
    fn measurement_updates_fine_temperature() {
        let mut state = DeviceState {
            calibration: Some(datasheet_calibration()),
            ..Default::default()
        };
        let raw = RawSample { temperature: 519_888, pressure: 415_148, humidity: 30_000 };
        let measurement = state.measurement::<()>(&raw).unwrap();
        assert!((measurement.centigrade - 25.08).abs() < 0.001);
        assert_eq!(state.t_fine, FineTemperature(128_422));

        state.reset();
        assert!(!state.is_initialized());
        assert_eq!(state.t_fine, FineTemperature(0));
    }

    #[test]
    fn fahrenheit() {
        let measurement = Measurement { centigrade: 25.0, ..Default::default() };
        assert!((measurement.fahrenheit() - 77.0).abs() < 0.001);
    }

    #[test]
    fn display_error() {
        assert_eq!(
            Error::<()>::IdentityMismatch(0x58).to_string(),
            "unexpected chip ID 0x58 (expected 0x60)"
        );
    }
}
