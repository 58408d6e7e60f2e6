//! Primary account numbers: Luhn check and major industry identifier.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{CodecError, Result};

/// A primary account number as read off a card.
///
/// Digit separators (`-`, `_`, whitespace) are skipped on parse. Any other
/// non-digit is kept as an unknown digit so positions stay meaningful; a
/// number with unknown digits never passes the Luhn check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pan {
    digits: Vec<Option<u8>>,
}

impl Pan {
    pub fn parse(s: &str) -> Result<Self> {
        let digits: Vec<Option<u8>> = s
            .chars()
            .filter(|&c| c != '-' && c != '_' && !c.is_whitespace())
            .map(|c| c.to_digit(10).map(|d| d as u8))
            .collect();
        if digits.is_empty() {
            return Err(CodecError::EmptyPan);
        }
        Ok(Self { digits })
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Major industry identifier, from the first digit.
    pub fn mii(&self) -> Option<&'static str> {
        let name = match self.digits.first().copied().flatten()? {
            0 => "ISO/TC 68 and other industry assignments",
            1 => "Airlines",
            2 => "Airlines, financial and other future industry assignments",
            3 => "Travel and entertainment",
            4 | 5 => "Banking and financial",
            6 => "Merchandising and banking/financial",
            7 => "Petroleum and other future industry assignments",
            8 => "Healthcare, telecommunications and other future industry assignments",
            _ => "For assignment by national standards bodies",
        };
        Some(name)
    }

    /// Whether the number passes the Luhn check.
    pub fn is_luhn_valid(&self) -> bool {
        luhn_sum(&self.digits, false) == Some(0)
    }

    /// The Luhn check digit that would complete the current digits.
    pub fn check_digit(&self) -> Result<u8> {
        let sum = luhn_sum(&self.digits, true).ok_or_else(|| self.unknown_digit())?;
        Ok((10 - sum) % 10)
    }

    /// Append the Luhn check digit and return it.
    pub fn push_check_digit(&mut self) -> Result<u8> {
        let digit = self.check_digit()?;
        self.digits.push(Some(digit));
        Ok(digit)
    }

    fn unknown_digit(&self) -> CodecError {
        let index = self.digits.iter().position(Option::is_none).unwrap_or(0);
        CodecError::UnknownDigit { index }
    }
}

/// Luhn sum modulo 10. Counting from the right, every second digit is
/// doubled; with `pending_check` the rightmost digit is doubled too, as it
/// will sit left of a check digit yet to be appended.
fn luhn_sum(digits: &[Option<u8>], pending_check: bool) -> Option<u8> {
    let mut sum = 0u32;
    for (i, digit) in digits.iter().rev().enumerate() {
        let d = u32::from((*digit)?);
        let doubled = (i % 2 == 1) != pending_check;
        sum += match (doubled, d) {
            (false, d) => d,
            (true, d) if d > 4 => 2 * d - 9,
            (true, d) => 2 * d,
        };
    }
    Some((sum % 10) as u8)
}

impl FromStr for Pan {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Pan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for digit in &self.digits {
            match digit {
                Some(d) => write!(f, "{d}")?,
                None => f.write_str("x")?,
            }
        }
        Ok(())
    }
}

impl Serialize for Pan {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
