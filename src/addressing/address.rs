//! Absolute addresses and relative offsets.
//!
//! [`Address`] and [`Offset`] share a representation but not a role, so
//! they are separate types with no cross-type equality. Arithmetic exists
//! only for the legal combinations:
//!
//! | expression            | result           |
//! |-----------------------|------------------|
//! | `Address + Offset`    | `Result<Address>`|
//! | `Address - Address`   | `Result<Offset>` |
//! | `Offset + Offset`     | `Result<Offset>` |
//! | `Offset - Offset`     | `Result<Offset>` |
//!
//! Anything else fails to compile. Addition fails only when a digit would
//! overflow; subtraction fails when the right side is larger.
//!
//! Document-relative coordinates nest under a document id with a zero
//! separator digit: `docid . 0 . local`. [`Address::globalize`] and
//! [`Address::localize`] move values in and out of that nesting.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::tumbler::{Digit, Tumbler};
use crate::error::{FebeError, Result};

macro_rules! tumbler_newtype {
    ($name:ident) => {
        impl $name {
            /// Zero-length value.
            pub const fn new() -> Self {
                Self(Tumbler::new())
            }

            /// Build from explicit digits.
            pub fn from_digits(digits: impl Into<Vec<Digit>>) -> Self {
                Self(Tumbler::from_digits(digits))
            }

            /// Underlying tumbler.
            #[inline]
            pub fn tumbler(&self) -> &Tumbler {
                &self.0
            }

            /// Digit sequence.
            #[inline]
            pub fn digits(&self) -> &[Digit] {
                self.0.digits()
            }

            /// Number of digits.
            #[inline]
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// True when there are no digits.
            #[inline]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = FebeError;

            fn from_str(s: &str) -> Result<Self> {
                Ok(Self(s.parse()?))
            }
        }

        impl<const N: usize> From<[Digit; N]> for $name {
            fn from(digits: [Digit; N]) -> Self {
                Self(Tumbler::from(digits))
            }
        }

        impl From<$name> for Tumbler {
            fn from(value: $name) -> Tumbler {
                value.0
            }
        }
    };
}

/// Absolute position in the global address space.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(Tumbler);

/// Relative displacement between two addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Offset(Tumbler);

tumbler_newtype!(Address);
tumbler_newtype!(Offset);

impl Address {
    /// Reinterpret a bare tumbler as an address.
    pub fn from_tumbler(tumbler: Tumbler) -> Self {
        Self(tumbler)
    }

    /// Split at the rightmost zero digit into `(docid, local)`.
    ///
    /// ```
    /// use febe_client::Address;
    ///
    /// let addr: Address = "1.1.0.1.0.1.5".parse().unwrap();
    /// let (doc, local) = addr.split().unwrap();
    /// assert_eq!(doc.to_string(), "1.1.0.1");
    /// assert_eq!(local.to_string(), "1.5");
    /// ```
    pub fn split(&self) -> Result<(Address, Address)> {
        let digits = self.digits();
        match digits.iter().rposition(|&d| d == 0) {
            Some(k) => Ok((
                Address::from_digits(&digits[..k]),
                Address::from_digits(&digits[k + 1..]),
            )),
            None => Err(FebeError::range("split", self, "no zero separator")),
        }
    }

    /// Nest a document-local value under this document id.
    pub fn globalize<T: Scoped>(&self, local: &T) -> T {
        local.globalize_in(self)
    }

    /// Strip this document id from a global value.
    pub fn localize<T: Scoped>(&self, global: &T) -> Result<T> {
        global.localize_in(self)
    }

    /// Offset from `base` to `self`.
    pub fn offset_from(&self, base: &Address) -> Result<Offset> {
        Ok(Offset(self.0.sub(&base.0)?))
    }

    /// `self ++ [0]`, the prefix every nested value starts with.
    fn scope_prefix(&self) -> Vec<Digit> {
        let mut prefix = Vec::with_capacity(self.len() + 1);
        prefix.extend_from_slice(self.digits());
        prefix.push(0);
        prefix
    }
}

impl Offset {
    /// Reinterpret a bare tumbler as an offset.
    pub fn from_tumbler(tumbler: Tumbler) -> Self {
        Self(tumbler)
    }
}

/// Values that can be nested under a document id.
pub trait Scoped: Sized {
    /// Express `self`, given in `docid`'s local coordinates, globally.
    fn globalize_in(&self, docid: &Address) -> Self;

    /// Express `self`, given globally, in `docid`'s local coordinates.
    fn localize_in(&self, docid: &Address) -> Result<Self>;
}

impl Scoped for Address {
    fn globalize_in(&self, docid: &Address) -> Self {
        let mut digits = docid.scope_prefix();
        digits.extend_from_slice(self.digits());
        Address::from_digits(digits)
    }

    fn localize_in(&self, docid: &Address) -> Result<Self> {
        let prefix = docid.scope_prefix();
        match self.digits().strip_prefix(prefix.as_slice()) {
            Some(rest) => Ok(Address::from_digits(rest)),
            None => Err(FebeError::range("localize", self, docid)),
        }
    }
}

impl Scoped for Offset {
    fn globalize_in(&self, docid: &Address) -> Self {
        let mut digits = vec![0; docid.len() + 1];
        digits.extend_from_slice(self.digits());
        Offset::from_digits(digits)
    }

    fn localize_in(&self, docid: &Address) -> Result<Self> {
        let n = docid.len() + 1;
        let digits = self.digits();
        if digits.len() < n || digits[..n].iter().any(|&d| d != 0) {
            return Err(FebeError::range("localize", self, docid));
        }
        Ok(Offset::from_digits(&digits[n..]))
    }
}

impl Add<&Offset> for &Address {
    type Output = Result<Address>;

    fn add(self, rhs: &Offset) -> Result<Address> {
        Ok(Address(self.0.add(&rhs.0)?))
    }
}

impl Add<Offset> for Address {
    type Output = Result<Address>;

    fn add(self, rhs: Offset) -> Result<Address> {
        &self + &rhs
    }
}

impl Sub<&Address> for &Address {
    type Output = Result<Offset>;

    fn sub(self, rhs: &Address) -> Result<Offset> {
        self.offset_from(rhs)
    }
}

impl Sub for Address {
    type Output = Result<Offset>;

    fn sub(self, rhs: Address) -> Result<Offset> {
        &self - &rhs
    }
}

impl Add<&Offset> for &Offset {
    type Output = Result<Offset>;

    fn add(self, rhs: &Offset) -> Result<Offset> {
        Ok(Offset(self.0.add(&rhs.0)?))
    }
}

impl Add for Offset {
    type Output = Result<Offset>;

    fn add(self, rhs: Offset) -> Result<Offset> {
        &self + &rhs
    }
}

impl Sub<&Offset> for &Offset {
    type Output = Result<Offset>;

    fn sub(self, rhs: &Offset) -> Result<Offset> {
        Ok(Offset(self.0.sub(&rhs.0)?))
    }
}

impl Sub for Offset {
    type Output = Result<Offset>;

    fn sub(self, rhs: Offset) -> Result<Offset> {
        &self - &rhs
    }
}
