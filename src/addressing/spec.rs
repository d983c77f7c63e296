//! Span sets: [`VSpec`] (one document) and [`SpecSet`] (anything).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::address::{Address, Scoped};
use super::span::{Region, Span, VSpan};

/// A set of spans in one document's local coordinates.
///
/// Spans are sorted on construction. Overlapping or duplicate spans are
/// kept as given.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VSpec {
    docid: Address,
    spans: Vec<Span>,
}

impl VSpec {
    /// Scope `spans` to `docid`, sorting them.
    pub fn new(docid: Address, spans: impl IntoIterator<Item = Span>) -> Self {
        let mut spans: Vec<Span> = spans.into_iter().collect();
        spans.sort();
        Self { docid, spans }
    }

    /// The document these spans are relative to.
    pub fn docid(&self) -> &Address {
        &self.docid
    }

    /// Local spans in order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Number of spans.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// True when there are no spans.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The `index`th span, scoped to the document.
    pub fn get(&self, index: usize) -> Option<VSpan> {
        self.spans
            .get(index)
            .map(|span| VSpan::new(self.docid.clone(), span.clone()))
    }

    /// Member spans, each scoped to the document.
    pub fn iter(&self) -> impl Iterator<Item = VSpan> + '_ {
        self.spans
            .iter()
            .map(move |span| VSpan::new(self.docid.clone(), span.clone()))
    }

    /// Member spans in global coordinates.
    pub fn global_spans(&self) -> impl Iterator<Item = Span> + '_ {
        self.spans.iter().map(move |span| span.globalize_in(&self.docid))
    }

    /// True when any member span contains `item`.
    pub fn contains<R: Region + ?Sized>(&self, item: &R) -> bool {
        self.global_spans().any(|span| item.is_within(&span))
    }
}

impl From<VSpan> for VSpec {
    fn from(vspan: VSpan) -> Self {
        VSpec {
            docid: vspan.docid,
            spans: vec![vspan.span],
        }
    }
}

impl fmt::Display for VSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<VSpec in {}", self.docid)?;
        for span in &self.spans {
            write!(f, ", at {} +{}", span.start, span.width)?;
        }
        f.write_str(">")
    }
}

/// One element of a [`SpecSet`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecItem {
    /// A region named directly in global coordinates.
    Span(Span),
    /// A region named relative to one document.
    VSpec(VSpec),
}

impl From<Span> for SpecItem {
    fn from(span: Span) -> Self {
        SpecItem::Span(span)
    }
}

impl From<VSpec> for SpecItem {
    fn from(vspec: VSpec) -> Self {
        SpecItem::VSpec(vspec)
    }
}

impl From<VSpan> for SpecItem {
    fn from(vspan: VSpan) -> Self {
        SpecItem::VSpec(vspan.into())
    }
}

impl fmt::Display for SpecItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecItem::Span(span) => span.fmt(f),
            SpecItem::VSpec(vspec) => vspec.fmt(f),
        }
    }
}

/// Ordered, heterogeneous collection of spans and vspecs.
///
/// Ordering compares elements lexicographically, shorter sets first on a
/// tie.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecSet {
    specs: Vec<SpecItem>,
}

impl SpecSet {
    /// Empty set.
    pub const fn new() -> Self {
        Self { specs: Vec::new() }
    }

    /// Append an element. A bare [`VSpan`] becomes a one-span [`VSpec`].
    pub fn push(&mut self, item: impl Into<SpecItem>) {
        self.specs.push(item.into());
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, item: impl Into<SpecItem>) -> Self {
        self.push(item);
        self
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.specs.clear();
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// True when there are no elements.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, SpecItem> {
        self.specs.iter()
    }

    /// Elements as a slice.
    pub fn as_slice(&self) -> &[SpecItem] {
        &self.specs
    }
}

impl<T: Into<SpecItem>> FromIterator<T> for SpecSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            specs: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<T: Into<SpecItem>> Extend<T> for SpecSet {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.specs.extend(iter.into_iter().map(Into::into));
    }
}

impl<'a> IntoIterator for &'a SpecSet {
    type Item = &'a SpecItem;
    type IntoIter = std::slice::Iter<'a, SpecItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}

impl From<VSpec> for SpecSet {
    fn from(vspec: VSpec) -> Self {
        SpecSet::new().with(vspec)
    }
}

impl From<Span> for SpecSet {
    fn from(span: Span) -> Self {
        SpecSet::new().with(span)
    }
}

impl From<VSpan> for SpecSet {
    fn from(vspan: VSpan) -> Self {
        SpecSet::new().with(vspan)
    }
}

impl fmt::Display for SpecSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<SpecSet [")?;
        for (i, item) in self.specs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            item.fmt(f)?;
        }
        f.write_str("]>")
    }
}
