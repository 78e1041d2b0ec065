//! Exact decimal amounts
//!
//! Balances and transfer amounts are `rust_decimal::Decimal` values wrapped in
//! [`Amount`]. No value ever passes through binary floating point: parsing,
//! arithmetic and formatting all stay in base 10.
//!
//! The canonical string form is the normalized decimal: trailing fractional
//! zeros are dropped, zero is `"0"`, and no exponent is ever emitted.
//!
//! # Precision
//!
//! `Decimal` is a 96-bit mantissa with a scale of at most 28, so values are
//! exact to 28 significant digits. Inputs that do not fit are rejected with
//! [`Error::InvalidNumber`] and sums or differences that overflow fail the
//! same way. Nothing is ever rounded.

use crate::{Error, Result};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Exact decimal amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero, canonically `"0"`
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Wrap a decimal
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Parse a user supplied amount.
    ///
    /// Plain (`-12.50`) and scientific (`1.5e3`) notation are accepted. Inputs
    /// that would need rounding to fit are rejected rather than rounded.
    pub fn parse(input: &str) -> Result<Self> {
        if !is_decimal_literal(input) {
            return Err(Error::InvalidNumber(format!(
                "{:?} is not a decimal number",
                input
            )));
        }

        let parsed = if input.contains(['e', 'E']) {
            Decimal::from_scientific(input)
        } else {
            Decimal::from_str_exact(input)
        };

        parsed
            .map(Self)
            .map_err(|_| Error::InvalidNumber(format!("{:?} is not a decimal number", input)))
    }

    /// Parse a balance record read back from the store
    pub(crate) fn parse_stored(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::Store(format!("Failed to parse balance stored: {}", e)))?;
        Decimal::from_str(text)
            .map(Self)
            .map_err(|e| Error::Store(format!("Failed to parse balance stored: {}", e)))
    }

    /// Underlying decimal
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// True when strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Exact addition
    pub fn checked_add(self, other: Amount) -> Result<Amount> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or_else(|| Error::InvalidNumber(format!("{} + {} overflows", self, other)))
    }

    /// Exact subtraction
    pub fn checked_sub(self, other: Amount) -> Result<Amount> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or_else(|| Error::InvalidNumber(format!("{} - {} overflows", self, other)))
    }

    /// Canonical string used for storage and display
    pub fn to_canonical(&self) -> String {
        self.0.normalize().to_string()
    }
}

/// `[+-]digits[.digits][(e|E)[+-]digits]`, with at least one mantissa digit.
///
/// `rust_decimal` skips `_` separators on its own, so the shape is checked
/// here first.
fn is_decimal_literal(input: &str) -> bool {
    fn digits(bytes: &[u8]) -> usize {
        bytes.iter().take_while(|b| b.is_ascii_digit()).count()
    }

    fn sign(bytes: &[u8]) -> usize {
        usize::from(matches!(bytes.first(), Some(b'+' | b'-')))
    }

    let bytes = input.as_bytes();
    let mut pos = sign(bytes);

    let integer = digits(&bytes[pos..]);
    pos += integer;

    let mut fraction = 0;
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        fraction = digits(&bytes[pos..]);
        pos += fraction;
    }

    if integer + fraction == 0 {
        return false;
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        pos += sign(&bytes[pos..]);
        let exponent = digits(&bytes[pos..]);
        if exponent == 0 {
            return false;
        }
        pos += exponent;
    }

    pos == bytes.len()
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
