//! Datasheet compensation formulas.
//!
//! Two families are provided: the integer family reproduces the datasheet
//! reference code bit for bit (including 32-bit wraparound of every
//! intermediate), the floating-point family follows the datasheet's `double`
//! formulas. Temperature must be compensated first: it yields the
//! [`FineTemperature`] that the pressure and humidity formulas consume.

use crate::calibration::Calibration;
use crate::types::{CompensationMode, Measurement, RawSample};

#[cfg(feature = "defmt")]
use defmt::Format;

/// Fine resolution temperature (`t_fine`) carried from temperature to pressure and humidity compensation
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FineTemperature(pub i32);

/// Temperature in 0.01 °C; `5123` equals 51.23 °C
pub fn temperature_fixed(cal: &Calibration, adc_t: i32) -> (i32, FineTemperature) {
    let t1 = cal.dig_t1 as i32;
    let t2 = cal.dig_t2 as i32;
    let t3 = cal.dig_t3 as i32;

    let var1 = (adc_t >> 3).wrapping_sub(t1 << 1).wrapping_mul(t2) >> 11;
    let delta = (adc_t >> 4).wrapping_sub(t1);
    let var2 = (delta.wrapping_mul(delta) >> 12).wrapping_mul(t3) >> 14;
    let t_fine = var1.wrapping_add(var2);
    let temperature = t_fine.wrapping_mul(5).wrapping_add(128) >> 8;
    (temperature, FineTemperature(t_fine))
}

/// Pressure in Pa as Q24.8; `24674867` equals 24674867 / 256 = 96386.2 Pa
///
/// Returns 0 when the calibration yields a zero denominator.
pub fn pressure_fixed(cal: &Calibration, adc_p: i32, t_fine: FineTemperature) -> u32 {
    let p1 = cal.dig_p1 as i64;
    let p2 = cal.dig_p2 as i64;
    let p3 = cal.dig_p3 as i64;
    let p4 = cal.dig_p4 as i64;
    let p5 = cal.dig_p5 as i64;
    let p6 = cal.dig_p6 as i64;
    let p7 = cal.dig_p7 as i64;
    let p8 = cal.dig_p8 as i64;
    let p9 = cal.dig_p9 as i64;

    let mut var1 = (t_fine.0 as i64).wrapping_sub(128_000);
    let mut var2 = var1.wrapping_mul(var1).wrapping_mul(p6);
    var2 = var2.wrapping_add(var1.wrapping_mul(p5) << 17);
    var2 = var2.wrapping_add(p4 << 35);
    var1 = (var1.wrapping_mul(var1).wrapping_mul(p3) >> 8).wrapping_add(var1.wrapping_mul(p2) << 12);
    var1 = (1i64 << 47).wrapping_add(var1).wrapping_mul(p1) >> 33;
    if var1 == 0 {
        return 0;
    }
    let mut p = 1_048_576i64.wrapping_sub(adc_p as i64);
    p = (p << 31).wrapping_sub(var2).wrapping_mul(3125).wrapping_div(var1);
    var1 = p9.wrapping_mul(p >> 13).wrapping_mul(p >> 13) >> 25;
    var2 = p8.wrapping_mul(p) >> 19;
    p = (p.wrapping_add(var1).wrapping_add(var2) >> 8).wrapping_add(p7 << 4);
    p as u32
}

/// Relative humidity in %RH as Q22.10; `47445` equals 47445 / 1024 = 46.333 %RH
pub fn humidity_fixed(cal: &Calibration, adc_h: i32, t_fine: FineTemperature) -> u32 {
    let h1 = cal.dig_h1 as i32;
    let h2 = cal.dig_h2 as i32;
    let h3 = cal.dig_h3 as i32;
    let h4 = cal.dig_h4 as i32;
    let h5 = cal.dig_h5 as i32;
    let h6 = cal.dig_h6 as i32;

    let mut v = t_fine.0.wrapping_sub(76_800);
    let offset = (adc_h << 14)
        .wrapping_sub(h4 << 20)
        .wrapping_sub(h5.wrapping_mul(v))
        .wrapping_add(16_384)
        >> 15;
    let sensitivity = ((v.wrapping_mul(h6) >> 10)
        .wrapping_mul((v.wrapping_mul(h3) >> 11).wrapping_add(32_768))
        >> 10)
        .wrapping_add(2_097_152)
        .wrapping_mul(h2)
        .wrapping_add(8192)
        >> 14;
    v = offset.wrapping_mul(sensitivity);
    v = v.wrapping_sub(((v >> 15).wrapping_mul(v >> 15) >> 7).wrapping_mul(h1) >> 4);
    // 419430400 is 100 %RH in Q22.10 before the final shift
    v = v.clamp(0, 419_430_400);
    (v >> 12) as u32
}

/// Temperature in °C
pub fn temperature_double(cal: &Calibration, adc_t: i32) -> (f64, FineTemperature) {
    let adc_t = adc_t as f64;
    let t1 = cal.dig_t1 as f64;
    let t2 = cal.dig_t2 as f64;
    let t3 = cal.dig_t3 as f64;

    let var1 = (adc_t / 16384.0 - t1 / 1024.0) * t2;
    let delta = adc_t / 131072.0 - t1 / 8192.0;
    let var2 = delta * delta * t3;
    ((var1 + var2) / 5120.0, FineTemperature((var1 + var2) as i32))
}

/// Pressure in Pa
///
/// Returns 0.0 when the calibration yields a zero denominator.
pub fn pressure_double(cal: &Calibration, adc_p: i32, t_fine: FineTemperature) -> f64 {
    let mut var1 = t_fine.0 as f64 / 2.0 - 64000.0;
    let mut var2 = var1 * var1 * cal.dig_p6 as f64 / 32768.0;
    var2 += var1 * cal.dig_p5 as f64 * 2.0;
    var2 = var2 / 4.0 + cal.dig_p4 as f64 * 65536.0;
    var1 = (cal.dig_p3 as f64 * var1 * var1 / 524288.0 + cal.dig_p2 as f64 * var1) / 524288.0;
    var1 = (1.0 + var1 / 32768.0) * cal.dig_p1 as f64;
    if var1 == 0.0 {
        return 0.0;
    }
    let mut p = 1048576.0 - adc_p as f64;
    p = (p - var2 / 4096.0) * 6250.0 / var1;
    var1 = cal.dig_p9 as f64 * p * p / 2147483648.0;
    var2 = p * cal.dig_p8 as f64 / 32768.0;
    p + (var1 + var2 + cal.dig_p7 as f64) / 16.0
}

/// Relative humidity in %RH, clamped to `0.0..=100.0`
pub fn humidity_double(cal: &Calibration, adc_h: i32, t_fine: FineTemperature) -> f64 {
    let mut h = t_fine.0 as f64 - 76800.0;
    h = (adc_h as f64 - (cal.dig_h4 as f64 * 64.0 + cal.dig_h5 as f64 / 16384.0 * h))
        * (cal.dig_h2 as f64 / 65536.0
            * (1.0 + cal.dig_h6 as f64 / 67108864.0 * h * (1.0 + cal.dig_h3 as f64 / 67108864.0 * h)));
    h *= 1.0 - cal.dig_h1 as f64 * h / 524288.0;
    h.clamp(0.0, 100.0)
}

/// Compensate a full sample in temperature, pressure, humidity order and scale to °C, hPa and %RH
pub(crate) fn compensate(cal: &Calibration, mode: CompensationMode, raw: &RawSample) -> (Measurement, FineTemperature) {
    match mode {
        CompensationMode::FixedPoint => {
            let (temperature, t_fine) = temperature_fixed(cal, raw.temperature);
            let pressure = pressure_fixed(cal, raw.pressure, t_fine);
            let humidity = humidity_fixed(cal, raw.humidity, t_fine);
            let measurement = Measurement {
                centigrade: temperature as f32 * 0.01,
                pressure_hpa: pressure as f32 / (256.0 * 100.0),
                humidity_percent: humidity as f32 / 1024.0,
            };
            (measurement, t_fine)
        }
        CompensationMode::FloatingPoint => {
            let (temperature, t_fine) = temperature_double(cal, raw.temperature);
            let pressure = pressure_double(cal, raw.pressure, t_fine);
            let humidity = humidity_double(cal, raw.humidity, t_fine);
            let measurement = Measurement {
                centigrade: temperature as f32,
                pressure_hpa: (pressure / 100.0) as f32,
                humidity_percent: humidity as f32,
            };
            (measurement, t_fine)
        }
    }
}
