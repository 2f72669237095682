//! Factory calibration constants stored in the device NVM.

use crate::hw_def::{CALIB00_LEN, CALIB26_LEN};

#[cfg(feature = "defmt")]
use defmt::Format;

/// Per-unit trimming parameters used by the compensation formulas
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Calibration {
    /// `dig_T1`, `0x88`/`0x89`
    pub dig_t1: u16,
    /// `dig_T2`, `0x8A`/`0x8B`
    pub dig_t2: i16,
    /// `dig_T3`, `0x8C`/`0x8D`
    pub dig_t3: i16,

    /// `dig_P1`, `0x8E`/`0x8F`
    pub dig_p1: u16,
    /// `dig_P2`, `0x90`/`0x91`
    pub dig_p2: i16,
    /// `dig_P3`, `0x92`/`0x93`
    pub dig_p3: i16,
    /// `dig_P4`, `0x94`/`0x95`
    pub dig_p4: i16,
    /// `dig_P5`, `0x96`/`0x97`
    pub dig_p5: i16,
    /// `dig_P6`, `0x98`/`0x99`
    pub dig_p6: i16,
    /// `dig_P7`, `0x9A`/`0x9B`
    pub dig_p7: i16,
    /// `dig_P8`, `0x9C`/`0x9D`
    pub dig_p8: i16,
    /// `dig_P9`, `0x9E`/`0x9F`
    pub dig_p9: i16,

    /// `dig_H1`, `0xA1`
    pub dig_h1: u8,
    /// `dig_H2`, `0xE1`/`0xE2`
    pub dig_h2: i16,
    /// `dig_H3`, `0xE3`
    pub dig_h3: u8,
    /// `dig_H4`, `0xE4` and `0xE5[3:0]`, 12 bits unsigned
    pub dig_h4: i16,
    /// `dig_H5`, `0xE5[7:4]` and `0xE6`, 12 bits unsigned
    pub dig_h5: i16,
    /// `dig_H6`, `0xE7`
    pub dig_h6: i8,
}

impl Calibration {
    /// Parse the two calibration blocks read from `0x88..=0xA1` and `0xE1..=0xE7`
    pub fn from_blocks(tp: &[u8; CALIB00_LEN], h: &[u8; CALIB26_LEN]) -> Self {
        Self {
            dig_t1: le_u16(tp, 0),
            dig_t2: le_i16(tp, 2),
            dig_t3: le_i16(tp, 4),

            dig_p1: le_u16(tp, 6),
            dig_p2: le_i16(tp, 8),
            dig_p3: le_i16(tp, 10),
            dig_p4: le_i16(tp, 12),
            dig_p5: le_i16(tp, 14),
            dig_p6: le_i16(tp, 16),
            dig_p7: le_i16(tp, 18),
            dig_p8: le_i16(tp, 20),
            dig_p9: le_i16(tp, 22),

            // tp[24] (0xA0) is not used
            dig_h1: tp[25],
            dig_h2: le_i16(h, 0),
            dig_h3: h[2],
            dig_h4: decode_dig_h4(h[3], h[4]),
            dig_h5: decode_dig_h5(h[4], h[5]),
            dig_h6: h[6] as i8,
        }
    }
}

fn le_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn le_i16(buf: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([buf[offset], buf[offset + 1]])
}

/// Reassemble `dig_H4` from `0xE4` (bits 11:4) and the low nibble of `0xE5` (bits 3:0)
pub fn decode_dig_h4(msb: u8, shared: u8) -> i16 {
    ((msb as i16) << 4) | (shared & 0x0F) as i16
}

/// Reassemble `dig_H5` from the high nibble of `0xE5` (bits 3:0) and `0xE6` (bits 11:4)
pub fn decode_dig_h5(shared: u8, msb: u8) -> i16 {
    ((msb as i16) << 4) | (shared >> 4) as i16
}
