//! Directional transfer permission between two accounts
//!
//! A restraint is read from the point of view of an ordered pair `(a, b)`.
//! Its stored code is one ASCII digit:
//!
//! | Code | State | a → b | b → a |
//! |------|-------|-------|-------|
//! | `0` | [`Restraint::Forbidden`] | no | no |
//! | `1` | [`Restraint::Outbound`] | yes | no |
//! | `2` | [`Restraint::Inbound`] | no | yes |
//! | `3` | [`Restraint::Bidirectional`] | yes | yes |
//!
//! Bit 0 of the digit allows `a → b`, bit 1 allows `b → a`, so looking at the
//! same pair from `b`'s side swaps the two bits (see [`Restraint::reverse`]).

use serde::{Serialize, Serializer};
use std::fmt;

/// Transfer restraint for an ordered pair of accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Restraint {
    /// Neither direction allowed (implicit default, never stored)
    #[default]
    Forbidden = b'0',
    /// First party may send to second party only
    Outbound = b'1',
    /// Second party may send to first party only
    Inbound = b'2',
    /// Both directions allowed
    Bidirectional = b'3',
}

/// Direction of a transfer relative to an ordered pair `(a, b)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `a → b`
    Forward,
    /// `b → a`
    Backward,
}

impl Restraint {
    /// All states, in code order
    pub const ALL: [Restraint; 4] = [
        Restraint::Forbidden,
        Restraint::Outbound,
        Restraint::Inbound,
        Restraint::Bidirectional,
    ];

    /// True if `code` is one of the four stored/input codes
    pub fn is_valid(code: u8) -> bool {
        Self::from_code(code).is_some()
    }

    /// Decode a single code byte
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'0' => Some(Restraint::Forbidden),
            b'1' => Some(Restraint::Outbound),
            b'2' => Some(Restraint::Inbound),
            b'3' => Some(Restraint::Bidirectional),
            _ => None,
        }
    }

    /// Parse the textual form accepted from callers: exactly one code digit
    pub fn parse(input: &str) -> Option<Self> {
        match input.as_bytes() {
            [code] => Self::from_code(*code),
            _ => None,
        }
    }

    /// Code byte as stored
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Code as a one-character string
    pub fn as_str(self) -> &'static str {
        match self {
            Restraint::Forbidden => "0",
            Restraint::Outbound => "1",
            Restraint::Inbound => "2",
            Restraint::Bidirectional => "3",
        }
    }

    /// The same restraint seen from the other party.
    ///
    /// Involutive: `r.reverse().reverse() == r`.
    pub fn reverse(self) -> Self {
        let bits = self.code() - b'0';
        let swapped = ((bits & 1) << 1) | ((bits & 2) >> 1);
        match Self::from_code(swapped + b'0') {
            Some(reversed) => reversed,
            None => unreachable!("two-bit swap stays within 0..=3"),
        }
    }

    /// True if a transfer in `direction` is permitted
    pub fn allows(self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => {
                matches!(self, Restraint::Outbound | Restraint::Bidirectional)
            }
            Direction::Backward => {
                matches!(self, Restraint::Inbound | Restraint::Bidirectional)
            }
        }
    }
}

impl fmt::Display for Restraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Restraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
