//! Tumbler digits and their arithmetic.
//!
//! A tumbler is a variable-length sequence of non-negative digits. Ordering
//! is lexicographic; when one tumbler is a prefix of the other, the shorter
//! one sorts first. Equality, hashing and ordering are all taken over the
//! digit sequence, which is exactly what the dotted rendering encodes.
//!
//! Addition and subtraction are *not* positional integer arithmetic. The
//! first nonzero digit of the addend picks the level at which the increment
//! applies; everything finer than that level is replaced by the addend's
//! own tail:
//!
//! ```text
//!   1.1.0.1.0.5      (address)
//! + 0.0.0.0.0.3.2    (offset: increment at level 5, then tail .2)
//! = 1.1.0.1.0.8.2
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{FebeError, Result};

/// A single tumbler digit.
pub type Digit = u64;

/// Largest leading-zero run accepted from the wire.
const MAX_EXPONENT: usize = 4096;

/// Variable-length hierarchical number.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tumbler {
    digits: Vec<Digit>,
}

impl Tumbler {
    /// The zero-length tumbler.
    pub const fn new() -> Self {
        Self { digits: Vec::new() }
    }

    /// Build a tumbler from explicit digits.
    pub fn from_digits(digits: impl Into<Vec<Digit>>) -> Self {
        Self {
            digits: digits.into(),
        }
    }

    /// The digit sequence.
    #[inline]
    pub fn digits(&self) -> &[Digit] {
        &self.digits
    }

    /// Consume into the digit vector.
    #[inline]
    pub fn into_digits(self) -> Vec<Digit> {
        self.digits
    }

    /// Number of digits.
    #[inline]
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    /// True for the zero-length tumbler.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// True when every digit is zero (including the empty tumbler).
    pub fn is_zero(&self) -> bool {
        self.digits.iter().all(|&d| d == 0)
    }

    /// Tumbler addition.
    ///
    /// Keeps `self`'s digits before the addend's first nonzero digit, adds at
    /// that digit, then takes the addend's remaining digits. An all-zero
    /// addend leaves `self` unchanged.
    ///
    /// Fails with [`FebeError::Range`] when the incremented digit would
    /// exceed [`Digit::MAX`].
    pub fn add(&self, other: &Tumbler) -> Result<Tumbler> {
        let Some(i) = other.digits.iter().position(|&d| d != 0) else {
            return Ok(self.clone());
        };

        if i >= self.digits.len() {
            let mut digits = self.digits.clone();
            digits.extend_from_slice(&other.digits[self.digits.len()..]);
            return Ok(Tumbler { digits });
        }

        let sum = self.digits[i]
            .checked_add(other.digits[i])
            .ok_or_else(|| FebeError::range("add", self, other))?;
        let mut digits = Vec::with_capacity(other.digits.len().max(i + 1));
        digits.extend_from_slice(&self.digits[..i]);
        digits.push(sum);
        digits.extend_from_slice(&other.digits[i + 1..]);
        Ok(Tumbler { digits })
    }

    /// Tumbler subtraction, the inverse of [`add`](Self::add).
    ///
    /// Fails with [`FebeError::Range`] when `other` is larger than `self`.
    pub fn sub(&self, other: &Tumbler) -> Result<Tumbler> {
        let shared = self.digits.len().min(other.digits.len());
        let first_diff = (0..shared).find(|&i| self.digits[i] != other.digits[i]);

        match first_diff {
            Some(i) => {
                if self.digits[i] < other.digits[i] {
                    return Err(FebeError::range("sub", self, other));
                }
                let mut digits = vec![0; i];
                digits.push(self.digits[i] - other.digits[i]);
                digits.extend_from_slice(&self.digits[i + 1..]);
                Ok(Tumbler { digits })
            }
            None if self.digits.len() < other.digits.len() => {
                Err(FebeError::range("sub", self, other))
            }
            None if self.digits.len() == other.digits.len() => Ok(Tumbler::new()),
            None => {
                let mut digits = vec![0; shared];
                digits.extend_from_slice(&self.digits[shared..]);
                Ok(Tumbler { digits })
            }
        }
    }

    /// Exponent form used on the wire, without the terminator.
    ///
    /// Leading zeros are folded into an exponent: `0.0.3.1` becomes `2.3.1`.
    /// The empty tumbler is `0`; an all-zero tumbler keeps its length
    /// (`0.0` becomes `1.0`).
    pub fn to_wire_string(&self) -> String {
        if self.digits.is_empty() {
            return "0".to_string();
        }
        let exp = self
            .digits
            .iter()
            .position(|&d| d != 0)
            .unwrap_or(self.digits.len() - 1);
        let mut out = exp.to_string();
        for d in &self.digits[exp..] {
            out.push('.');
            out.push_str(&d.to_string());
        }
        out
    }

    /// Parse the exponent form produced by [`to_wire_string`](Self::to_wire_string).
    ///
    /// The exponent always contributes that many leading zeros, so `2` with
    /// no mantissa is `0.0` and a bare `0` is the empty tumbler.
    pub fn from_wire_str(chunk: &str) -> Result<Tumbler> {
        let mut parts = chunk.split('.');
        let exp = parse_digit(parts.next().unwrap_or(""), chunk)?;
        let exp = usize::try_from(exp)
            .map_err(|_| FebeError::Malformed(format!("tumbler exponent too large: {chunk:?}")))?;

        let mantissa = parts
            .filter(|p| !p.is_empty())
            .map(|p| parse_digit(p, chunk))
            .collect::<Result<Vec<_>>>()?;
        if exp > MAX_EXPONENT {
            return Err(FebeError::Malformed(format!(
                "tumbler exponent out of range: {chunk:?}"
            )));
        }

        let mut digits = vec![0; exp];
        digits.extend(mantissa);
        Ok(Tumbler { digits })
    }
}

fn parse_digit(part: &str, whole: &str) -> Result<Digit> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FebeError::Malformed(format!("bad tumbler digit in {whole:?}")));
    }
    part.parse::<Digit>()
        .map_err(|_| FebeError::Malformed(format!("tumbler digit overflow in {whole:?}")))
}

impl fmt::Display for Tumbler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.digits.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl FromStr for Tumbler {
    type Err = FebeError;

    /// Parse dotted form (`1.1.0.2`). The empty string is the empty tumbler.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Tumbler::new());
        }
        let digits = s
            .split('.')
            .map(|p| parse_digit(p, s))
            .collect::<Result<Vec<_>>>()?;
        Ok(Tumbler { digits })
    }
}

impl From<Vec<Digit>> for Tumbler {
    fn from(digits: Vec<Digit>) -> Self {
        Tumbler { digits }
    }
}

impl<const N: usize> From<[Digit; N]> for Tumbler {
    fn from(digits: [Digit; N]) -> Self {
        Tumbler {
            digits: digits.to_vec(),
        }
    }
}

impl Serialize for Tumbler {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tumbler {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
