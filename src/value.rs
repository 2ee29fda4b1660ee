//! Four-state signal values.
//!
//! Every bit of a simulated signal is one of `0`, `1`, `X` (unknown) or `Z`
//! (high impedance). Only `0` and `1` count as *defined*.

use std::fmt;

use crate::error::{TbError, TbResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Logic {
    Zero,
    One,
    X,
    Z,
}

impl Logic {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Logic::Zero),
            '1' => Some(Logic::One),
            'x' | 'X' => Some(Logic::X),
            'z' | 'Z' => Some(Logic::Z),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::X => 'x',
            Logic::Z => 'z',
        }
    }

    #[inline]
    pub fn is_defined(self) -> bool {
        matches!(self, Logic::Zero | Logic::One)
    }
}

impl From<bool> for Logic {
    fn from(b: bool) -> Self {
        if b {
            Logic::One
        } else {
            Logic::Zero
        }
    }
}

/// Fixed-width vector of [`Logic`] bits. Bit 0 is the least significant bit.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct LogicVec {
    bits: Vec<Logic>,
}

impl LogicVec {
    /// All bits unknown, the state of uninitialized storage.
    pub fn new_x(width: u32) -> Self {
        Self::filled(width, Logic::X)
    }

    pub fn filled(width: u32, bit: Logic) -> Self {
        Self {
            bits: vec![bit; width as usize],
        }
    }

    /// Builds a defined vector from the low `width` bits of `value`.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let bits = (0..width)
            .map(|i| Logic::from(i < 64 && (value >> i) & 1 == 1))
            .collect();
        Self { bits }
    }

    /// Parses an MSB-first bit string such as `"0b10xz_0001"`.
    pub fn from_bin_str(s: &str) -> TbResult<Self> {
        let stripped = s.trim_start_matches("0b").replace('_', "");
        let mut bits = Vec::with_capacity(stripped.len());
        for c in stripped.chars().rev() {
            bits.push(Logic::from_char(c).ok_or_else(|| TbError::InvalidBitString(s.to_string()))?);
        }
        if bits.is_empty() {
            return Err(TbError::InvalidBitString(s.to_string()));
        }
        Ok(Self { bits })
    }

    pub fn width(&self) -> u32 {
        self.bits.len() as u32
    }

    pub fn get(&self, index: u32) -> Logic {
        self.bits[index as usize]
    }

    pub fn set(&mut self, index: u32, bit: Logic) {
        self.bits[index as usize] = bit;
    }

    pub fn iter(&self) -> impl Iterator<Item = Logic> + '_ {
        self.bits.iter().copied()
    }

    /// True iff every bit resolves to a concrete `0` or `1`.
    pub fn is_defined(&self) -> bool {
        self.bits.iter().all(|b| b.is_defined())
    }

    /// Integer value, or `None` if any bit is `X`/`Z` or the vector is wider than 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.bits.len() > 64 || !self.is_defined() {
            return None;
        }
        Some(
            self.bits
                .iter()
                .enumerate()
                .fold(0, |acc, (i, b)| acc | (u64::from(*b == Logic::One) << i)),
        )
    }

    /// MSB-first binary string, e.g. `"0000x1z0"`.
    pub fn to_bin_string(&self) -> String {
        self.bits.iter().rev().map(|b| b.to_char()).collect()
    }

    /// Zero-padded hex string such as `0x0f`, only for defined values.
    pub fn to_hex_string(&self) -> Option<String> {
        let digits = (self.bits.len() as u32).div_ceil(4).max(1) as usize;
        self.to_u64().map(|v| format!("0x{:0width$x}", v, width = digits))
    }

    /// Indices of the bits that are `X` or `Z`.
    pub fn undefined_bits(&self) -> Vec<u32> {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_defined())
            .map(|(i, _)| i as u32)
            .collect()
    }
}

impl fmt::Display for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_hex_string() {
            Some(hex) => f.write_str(&hex),
            None => write!(f, "0b{}", self.to_bin_string()),
        }
    }
}

impl fmt::Debug for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicVec({}'b{})", self.width(), self.to_bin_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defined_values_convert_to_integers() {
        let v = LogicVec::from_u64(0xa5, 8);
        assert!(v.is_defined());
        assert_eq!(v.to_u64(), Some(0xa5));
        assert_eq!(v.to_string(), "0xa5");
        assert_eq!(v.to_bin_string(), "10100101");
    }

    #[test]
    fn unknown_and_floating_bits_are_undefined() {
        let v = LogicVec::from_bin_str("0b0000_x000").unwrap();
        assert!(!v.is_defined());
        assert_eq!(v.to_u64(), None);
        assert_eq!(v.undefined_bits(), vec![3]);
        assert_eq!(v.to_string(), "0b0000x000");

        let z = LogicVec::from_bin_str("z1").unwrap();
        assert!(!z.is_defined());
        assert_eq!(z.get(1), Logic::Z);
        assert_eq!(z.get(0), Logic::One);
    }

    #[test]
    fn fresh_storage_is_unknown() {
        let v = LogicVec::new_x(4);
        assert_eq!(v.undefined_bits(), vec![0, 1, 2, 3]);
        assert_eq!(format!("{:?}", v), "LogicVec(4'bxxxx)");
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(LogicVec::from_bin_str("01a1").is_err());
        assert!(LogicVec::from_bin_str("0b").is_err());
    }
}
