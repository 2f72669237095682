//! Register map, bit-field layout and setting enums of the BME280.
//!
//! Values and layouts follow the Bosch BME280 datasheet (BST-BME280-DS002).

#[cfg(feature = "defmt")]
use defmt::Format;

/// Value of the chip identity register for a BME280
pub const CHIP_ID: u8 = 0x60;
/// Value written to the reset register to trigger a power-on-reset sequence
pub const SOFT_RESET_MAGIC: u8 = 0xB6;
/// Start-up time after power-on or soft reset, in milliseconds
pub const STARTUP_TIME_MS: u32 = 2;

pub(crate) const REG_CALIB00: u8 = 0x88;
pub(crate) const REG_ID: u8 = 0xD0;
pub(crate) const REG_RESET: u8 = 0xE0;
pub(crate) const REG_CALIB26: u8 = 0xE1;
pub(crate) const REG_CTRL_HUM: u8 = 0xF2;
pub(crate) const REG_STATUS: u8 = 0xF3;
pub(crate) const REG_CTRL_MEAS: u8 = 0xF4;
pub(crate) const REG_CONFIG: u8 = 0xF5;
pub(crate) const REG_PRESS_MSB: u8 = 0xF7;

/// Length of the calibration block starting at `0x88` (`0x88..=0xA1`)
pub const CALIB00_LEN: usize = 26;
/// Length of the calibration block starting at `0xE1` (`0xE1..=0xE7`)
pub const CALIB26_LEN: usize = 7;
/// Length of the measurement burst starting at `0xF7` (`0xF7..=0xFE`)
pub const MEASUREMENT_LEN: usize = 8;

/// A bit field inside a single register.
///
/// `start_bit` is the most significant bit of the field, so a 3-bit field at
/// `start_bit = 7` covers bits 7:5.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct BitField {
    pub(crate) reg: u8,
    pub(crate) start_bit: u8,
    pub(crate) width: u8,
}
impl BitField {
    const fn new(reg: u8, start_bit: u8, width: u8) -> Self {
        Self { reg, start_bit, width }
    }

    fn shift(&self) -> u8 {
        self.start_bit + 1 - self.width
    }

    fn mask(&self) -> u8 {
        (((1u16 << self.width) - 1) as u8) << self.shift()
    }

    /// Extract the field value from a full register value
    pub(crate) fn extract(&self, reg_value: u8) -> u8 {
        (reg_value & self.mask()) >> self.shift()
    }

    /// Replace the field inside a full register value, leaving other bits untouched
    pub(crate) fn insert(&self, reg_value: u8, field_value: u8) -> u8 {
        let mask = self.mask();
        (reg_value & !mask) | ((field_value << self.shift()) & mask)
    }
}

pub(crate) const FIELD_OSRS_H: BitField = BitField::new(REG_CTRL_HUM, 2, 3);
pub(crate) const FIELD_MEASURING: BitField = BitField::new(REG_STATUS, 3, 1);
pub(crate) const FIELD_OSRS_T: BitField = BitField::new(REG_CTRL_MEAS, 7, 3);
pub(crate) const FIELD_OSRS_P: BitField = BitField::new(REG_CTRL_MEAS, 4, 3);
pub(crate) const FIELD_MODE: BitField = BitField::new(REG_CTRL_MEAS, 1, 2);
pub(crate) const FIELD_T_SB: BitField = BitField::new(REG_CONFIG, 7, 3);
pub(crate) const FIELD_FILTER: BitField = BitField::new(REG_CONFIG, 4, 3);

/// I²C address of the device, selected by the SDO pin
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum I2cAddr {
    /// SDO connected to GND
    #[default]
    Primary,
    /// SDO connected to V_DDIO
    Secondary,
}
impl I2cAddr {
    /// Get the 7-bit I²C address
    pub fn as_u8(&self) -> u8 {
        match self {
            I2cAddr::Primary => 0x76,
            I2cAddr::Secondary => 0x77,
        }
    }
}

/// Oversampling of a measurement channel
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Oversampling {
    /// Measurement skipped, output set to 0x80000 (0x8000 for humidity)
    #[default]
    Skipped,
    /// Oversampling ×1
    X1,
    /// Oversampling ×2
    X2,
    /// Oversampling ×4
    X4,
    /// Oversampling ×8
    X8,
    /// Oversampling ×16
    X16,
}
impl Oversampling {
    pub(crate) fn bits(&self) -> u8 {
        match self {
            Oversampling::Skipped => 0b000,
            Oversampling::X1 => 0b001,
            Oversampling::X2 => 0b010,
            Oversampling::X4 => 0b011,
            Oversampling::X8 => 0b100,
            Oversampling::X16 => 0b101,
        }
    }
}
impl From<u8> for Oversampling {
    fn from(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Oversampling::Skipped,
            0b001 => Oversampling::X1,
            0b010 => Oversampling::X2,
            0b011 => Oversampling::X4,
            0b100 => Oversampling::X8,
            _ => Oversampling::X16,
        }
    }
}

/// Sensor power mode
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PowerMode {
    /// No measurements, lowest power
    #[default]
    Sleep,
    /// Single measurement, then back to sleep
    Forced,
    /// Continuous measurements separated by the standby time
    Normal,
}
impl PowerMode {
    pub(crate) fn bits(&self) -> u8 {
        match self {
            PowerMode::Sleep => 0b00,
            PowerMode::Forced => 0b01,
            PowerMode::Normal => 0b11,
        }
    }
}
impl From<u8> for PowerMode {
    fn from(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => PowerMode::Sleep,
            0b11 => PowerMode::Normal,
            _ => PowerMode::Forced,
        }
    }
}

/// Inactive duration between measurements in normal mode
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum StandbyTime {
    /// 0.5 ms
    #[default]
    Ms0_5,
    /// 62.5 ms
    Ms62_5,
    /// 125 ms
    Ms125,
    /// 250 ms
    Ms250,
    /// 500 ms
    Ms500,
    /// 1000 ms
    Ms1000,
    /// 10 ms
    Ms10,
    /// 20 ms
    Ms20,
}
impl StandbyTime {
    pub(crate) fn bits(&self) -> u8 {
        match self {
            StandbyTime::Ms0_5 => 0b000,
            StandbyTime::Ms62_5 => 0b001,
            StandbyTime::Ms125 => 0b010,
            StandbyTime::Ms250 => 0b011,
            StandbyTime::Ms500 => 0b100,
            StandbyTime::Ms1000 => 0b101,
            StandbyTime::Ms10 => 0b110,
            StandbyTime::Ms20 => 0b111,
        }
    }

    /// Standby duration in microseconds
    pub fn micros(&self) -> u32 {
        match self {
            StandbyTime::Ms0_5 => 500,
            StandbyTime::Ms62_5 => 62_500,
            StandbyTime::Ms125 => 125_000,
            StandbyTime::Ms250 => 250_000,
            StandbyTime::Ms500 => 500_000,
            StandbyTime::Ms1000 => 1_000_000,
            StandbyTime::Ms10 => 10_000,
            StandbyTime::Ms20 => 20_000,
        }
    }
}
impl From<u8> for StandbyTime {
    fn from(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => StandbyTime::Ms0_5,
            0b001 => StandbyTime::Ms62_5,
            0b010 => StandbyTime::Ms125,
            0b011 => StandbyTime::Ms250,
            0b100 => StandbyTime::Ms500,
            0b101 => StandbyTime::Ms1000,
            0b110 => StandbyTime::Ms10,
            _ => StandbyTime::Ms20,
        }
    }
}

/// IIR filter coefficient
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Filter {
    /// Filter off
    #[default]
    Off,
    /// Coefficient 2
    X2,
    /// Coefficient 4
    X4,
    /// Coefficient 8
    X8,
    /// Coefficient 16
    X16,
}
impl Filter {
    pub(crate) fn bits(&self) -> u8 {
        match self {
            Filter::Off => 0b000,
            Filter::X2 => 0b001,
            Filter::X4 => 0b010,
            Filter::X8 => 0b011,
            Filter::X16 => 0b100,
        }
    }
}
impl From<u8> for Filter {
    fn from(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Filter::Off,
            0b001 => Filter::X2,
            0b010 => Filter::X4,
            0b011 => Filter::X8,
            _ => Filter::X16,
        }
    }
}
