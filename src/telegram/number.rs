//! Exact decimal and timestamp decoding for group contents.

use super::structs::Timestamp;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumberError {
    #[error("empty decimal literal")]
    Empty,
    #[error("invalid decimal literal \"{0}\"")]
    Invalid(String),
    #[error("decimal literal \"{0}\" exceeds supported precision")]
    Overflow(String),
}

/// Exact decimal stored as `mantissa * 10^-scale`.
///
/// Equality compares values, so `00001.001` equals `1.0010`.
#[derive(Debug, Clone, Copy)]
pub struct Number {
    mantissa: i128,
    scale: u32,
}

impl Number {
    pub fn new(mantissa: i128, scale: u32) -> Self {
        Self { mantissa, scale }
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    /// Digits after the decimal point as written in the source.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// The value as an integer, when it has no fractional part.
    pub fn as_integer(&self) -> Option<i128> {
        let (mantissa, scale) = self.normalized();
        if scale == 0 {
            Some(mantissa)
        } else {
            None
        }
    }

    /// Lossy conversion for display or plotting; accounting should stay on `Number`.
    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }

    fn normalized(&self) -> (i128, u32) {
        let (mut mantissa, mut scale) = (self.mantissa, self.scale);
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        (mantissa, scale)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Number {}

impl FromStr for Number {
    type Err = NumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(NumberError::Empty);
        }

        let (negative, unsigned) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };

        let digits_only = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if int_part.is_empty()
            || !digits_only(int_part)
            || !digits_only(frac_part)
            || (unsigned.contains('.') && frac_part.is_empty())
        {
            return Err(NumberError::Invalid(s.to_string()));
        }

        let mut mantissa: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add((b - b'0') as i128))
                .ok_or_else(|| NumberError::Overflow(s.to_string()))?;
        }
        if negative {
            mantissa = -mantissa;
        }

        Ok(Number { mantissa, scale: frac_part.len() as u32 })
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let digits = self.mantissa.unsigned_abs().to_string();
        if self.scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }

        let scale = self.scale as usize;
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

// Strings keep JSON consumers away from float rounding.
impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn parse_decimal(content: &str) -> Option<Number> {
    content.parse().ok()
}

/// Unsigned integer literal, as used by event log counts.
pub fn parse_count(content: &str) -> Option<Number> {
    if content.is_empty() || !content.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    parse_decimal(content)
}

/// Exactly twelve digits, no mode letter.
pub fn is_bare_timestamp(content: &str) -> bool {
    content.len() == 12 && content.bytes().all(|b| b.is_ascii_digit())
}

/// Twelve digits followed by `S` (summer, DST) or `W` (winter).
pub fn parse_timestamp(content: &str) -> Option<Timestamp> {
    if content.len() != 13 || !content.is_ascii() {
        return None;
    }
    let (digits, mode) = content.split_at(12);
    if !is_bare_timestamp(digits) {
        return None;
    }
    let dst = match mode {
        "S" => true,
        "W" => false,
        _ => return None,
    };
    Some(Timestamp { value: digits.to_string(), dst })
}

/// `<decimal>*<unit>` with exactly one `*`.
pub fn parse_measurement(content: &str) -> Option<(Number, &str)> {
    let (value, unit) = content.split_once('*')?;
    if unit.is_empty() || !is_unit(unit) {
        return None;
    }
    Some((parse_decimal(value)?, unit))
}

pub fn is_unit(content: &str) -> bool {
    !content.is_empty() && !content.chars().any(|c| c == '*' || c.is_whitespace())
}
