//! Addressing algebra: tumblers and the region types built on them.
//!
//! - [`Tumbler`] - hierarchical digit sequence with its own `+`/`-`
//! - [`Address`] / [`Offset`] - absolute position / relative displacement
//! - [`Span`], [`VSpan`] - half-open intervals, global or document-local
//! - [`VSpec`], [`SpecSet`] - sets of regions exchanged with the backend
//!
//! The sentinels and link-type constants below are plain immutable values.

use std::sync::LazyLock;

mod address;
mod span;
mod spec;
mod tumbler;

pub use address::{Address, Offset, Scoped};
pub use span::{Region, Span, VSpan};
pub use spec::{SpecItem, SpecSet, VSpec};
pub use tumbler::{Digit, Tumbler};

/// The empty address.
pub const NOWHERE: Address = Address::new();

/// The empty offset.
pub const NOWIDTH: Offset = Offset::new();

/// The empty span set.
pub const NOSPECS: SpecSet = SpecSet::new();

/// Bootstrap document holding the standard link types.
pub static LINK_TYPES_DOCID: LazyLock<Address> =
    LazyLock::new(|| Address::from([1, 1, 0, 1, 0, 2]));

fn link_type(start: Address, width: Offset) -> VSpec {
    VSpec::new(LINK_TYPES_DOCID.clone(), [Span::new(start, width)])
}

/// Link type for ordinary jump links.
pub static JUMP_TYPE: LazyLock<VSpec> =
    LazyLock::new(|| link_type(Address::from([2, 1]), Offset::from([0, 1])));

/// Link type for quotations.
pub static QUOTE_TYPE: LazyLock<VSpec> =
    LazyLock::new(|| link_type(Address::from([2, 2]), Offset::from([0, 1])));

/// Link type for footnotes.
pub static FOOTNOTE_TYPE: LazyLock<VSpec> =
    LazyLock::new(|| link_type(Address::from([2, 2, 1]), Offset::from([0, 0, 1])));

/// Link type for marginal notes.
pub static MARGIN_TYPE: LazyLock<VSpec> =
    LazyLock::new(|| link_type(Address::from([2, 2, 1, 1]), Offset::from([0, 0, 0, 1])));
