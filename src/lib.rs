//! This is a platform-agnostic Rust driver for the Bosch BME280 combined humidity, pressure and
//! temperature sensor using the [`embedded-hal`] or [`embedded-hal-async`] traits.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal/tree/master/embedded-hal
//! [`embedded-hal-async`]: https://github.com/rust-embedded/embedded-hal/tree/master/embedded-hal-async
//!
//! This driver allows you to:
//! - Verify the chip ID and initialize the device (×1 oversampling, normal mode).
//! - Load the factory calibration constants.
//! - Read compensated temperature (°C), pressure (hPa) and relative humidity (%RH).
//! - Choose between the datasheet integer and floating-point compensation formulas.
//! - Read the raw ADC codes.
//! - Get and set oversampling per channel, power mode, standby time and IIR filter.
//! - Trigger a software reset.
//! - blocking API support.
//! - async API support.
//!
//! The compensation formulas are available on their own in [`compensation`], for use with
//! samples obtained some other way.
//!
//! ## Features
//!
//! - `async`: Enables async API.
//! - `blocking`: Enables blocking API.
//! - `defmt`: Enables logging using the `defmt` framework.
//! - `log`: Enables logging using the `log` framework.
//!
//! ## Supported devices: BME280
//!
//! Datasheet:
//!   [BME280](https://www.bosch-sensortec.com/media/boschsensortec/downloads/datasheets/bst-bme280-ds002.pdf)
//!
//! A driver instance keeps the fine temperature of its last read cycle. Every method takes
//! `&mut self`, so at most one read cycle per device is in flight; sharing a device between
//! tasks needs external exclusion.
//!
//! ## Blocking Example:
//!
//! ```ignore
//! use bme280_hal::{Bme280, CompensationMode, I2cAddr};
//!
//! // Platform-specific
//! let i2c = /* embedded_hal::i2c::I2c instance */;
//! let delay = /* embedded_hal::delay::DelayNs instance */;
//!
//! let mut bme280 = Bme280::new(i2c, delay, I2cAddr::Primary);
//! bme280.init().unwrap();
//!
//! let measurement = bme280.read().unwrap();
//! println!("{:.2} °C, {:.2} hPa, {:.1} %RH",
//!     measurement.centigrade,
//!     measurement.pressure_hpa,
//!     measurement.humidity_percent);
//!
//! // Slower, slightly more accurate
//! bme280.set_compensation_mode(CompensationMode::FloatingPoint);
//! println!("{}", bme280.read().unwrap());
//! ```
//!
//! ## Async Example:
//!
//! ```ignore
//! use bme280_hal::{AsyncBme280, Filter, I2cAddr, Oversampling, StandbyTime};
//!
//! // Platform-specific
//! let i2c = /* embedded_hal_async::i2c::I2c instance */;
//! let delay = /* embedded_hal_async::delay::DelayNs instance */;
//!
//! let mut bme280 = AsyncBme280::new(i2c, delay, I2cAddr::Secondary);
//! bme280.init().await.unwrap();
//! bme280.set_pressure_oversampling(Oversampling::X16).await.unwrap();
//! bme280.set_filter(Filter::X16).await.unwrap();
//! bme280.set_standby_time(StandbyTime::Ms1000).await.unwrap();
//!
//! loop {
//!     println!("{}", bme280.read().await.unwrap());
//!     // Platform-specific: sleep a while
//!     sleep_secs(1).await;
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![no_std]

#[cfg(not(any(feature = "async", feature = "blocking")))]
compile_error!("At least one of \"async\" and \"blocking\" features must be enabled");

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features \"defmt\" and \"log\" are mutually exclusive and cannot be enabled together");

mod calibration;
pub mod compensation;
#[cfg(feature = "blocking")]
mod device_impl;
#[cfg(feature = "async")]
mod device_impl_async;
mod hw_def;
mod types;

pub use crate::{
    calibration::{Calibration, decode_dig_h4, decode_dig_h5},
    compensation::FineTemperature,
    hw_def::*,
    types::*,
};
