//! Spans: half-open intervals of the address space.

use std::fmt;
use std::ops::BitAnd;

use serde::{Deserialize, Serialize};

use super::address::{Address, Offset, Scoped};
use super::spec::VSpec;
use crate::error::{FebeError, Result};

/// `[start, start + width)` in global coordinates.
///
/// The canonical empty span is `Span::new(NOWHERE, NOWIDTH)`, which is what
/// an intersection of disjoint spans yields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// First address inside the span.
    pub start: Address,
    /// Distance from `start` to the first address past the span.
    pub width: Offset,
}

impl Span {
    /// Span from a start and a width.
    pub fn new(start: Address, width: Offset) -> Self {
        Self { start, width }
    }

    /// Span from explicit endpoints. Fails if `end < start`.
    pub fn between(start: Address, end: &Address) -> Result<Self> {
        let width = end.offset_from(&start)?;
        Ok(Self { start, width })
    }

    /// The canonical empty span.
    pub const fn empty() -> Self {
        Self {
            start: Address::new(),
            width: Offset::new(),
        }
    }

    /// First address past the span.
    ///
    /// Fails with [`FebeError::Range`](crate::FebeError::Range) when the end
    /// is not representable.
    pub fn end(&self) -> Result<Address> {
        &self.start + &self.width
    }

    /// End for comparisons; `None` lies past every representable address.
    fn upper(&self) -> Option<Address> {
        self.end().ok()
    }

    /// True for a span with no extent.
    pub fn is_empty(&self) -> bool {
        self.width.tumbler().is_zero()
    }

    /// True when `item` lies entirely inside this span.
    pub fn contains<R: Region + ?Sized>(&self, item: &R) -> bool {
        item.is_within(self)
    }

    /// Overlap of two spans, or [`Span::empty`] when they are disjoint.
    ///
    /// Fails only when neither end is representable, since the overlap's
    /// width then cannot be expressed.
    pub fn intersect(&self, other: &Span) -> Result<Span> {
        let start = (&self.start).max(&other.start);
        let end = match (self.upper(), other.upper()) {
            (Some(a), Some(b)) => a.min(b),
            (Some(end), None) | (None, Some(end)) => end,
            (None, None) => return Err(FebeError::range("intersect", self, other)),
        };

        if *start >= end {
            return Ok(Span::empty());
        }
        Ok(Span::new(start.clone(), end.offset_from(start)?))
    }
}

impl BitAnd for &Span {
    type Output = Result<Span>;

    fn bitand(self, rhs: &Span) -> Result<Span> {
        self.intersect(rhs)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Span {} +{}>", self.start, self.width)
    }
}

impl Scoped for Span {
    fn globalize_in(&self, docid: &Address) -> Self {
        Span::new(docid.globalize(&self.start), docid.globalize(&self.width))
    }

    fn localize_in(&self, docid: &Address) -> Result<Self> {
        Ok(Span::new(
            docid.localize(&self.start)?,
            docid.localize(&self.width)?,
        ))
    }
}

/// A span in one document's local coordinates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VSpan {
    /// Document the span is relative to.
    pub docid: Address,
    /// Span in local coordinates.
    pub span: Span,
}

impl VSpan {
    /// Scope `span` to `docid`.
    pub fn new(docid: Address, span: Span) -> Self {
        Self { docid, span }
    }

    /// Global address of the first position.
    pub fn start(&self) -> Address {
        self.docid.globalize(&self.span.start)
    }

    /// Global address one past the last position.
    pub fn end(&self) -> Result<Address> {
        Ok(self.docid.globalize(&self.span.end()?))
    }

    /// The same region in global coordinates.
    pub fn globalize(&self) -> Span {
        self.docid.globalize(&self.span)
    }

    /// True when `item` lies entirely inside this span.
    pub fn contains<R: Region + ?Sized>(&self, item: &R) -> bool {
        item.is_within(&self.globalize())
    }
}

impl fmt::Display for VSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<VSpan in {} at {} +{}>", self.docid, self.span.start, self.span.width)
    }
}

/// Anything that can be tested for containment in a [`Span`].
pub trait Region {
    /// True when `self` lies entirely inside `span`.
    fn is_within(&self, span: &Span) -> bool;
}

impl Region for Address {
    fn is_within(&self, span: &Span) -> bool {
        span.start <= *self && span.upper().map_or(true, |end| *self < end)
    }
}

impl Region for Span {
    fn is_within(&self, span: &Span) -> bool {
        let ends_inside = match (self.upper(), span.upper()) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(inner), Some(outer)) => inner <= outer,
        };
        span.start <= self.start && ends_inside
    }
}

impl Region for VSpan {
    fn is_within(&self, span: &Span) -> bool {
        self.globalize().is_within(span)
    }
}

impl Region for VSpec {
    /// Every member span must be inside; an empty VSpec is inside nothing.
    fn is_within(&self, span: &Span) -> bool {
        !self.is_empty() && self.iter().all(|vspan| vspan.is_within(span))
    }
}
