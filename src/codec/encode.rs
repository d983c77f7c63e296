//! Outbound wire encoding.
//!
//! Every value is textual and `~`-terminated:
//!
//! ```text
//! Number    42~
//! Text      t5~hello
//! Tumbler   <exp>.<d>.<d>~        (leading zeros folded into exp)
//! Span      <start><width>
//! VSpec     <docid><count~><span>*
//! SpecSet   <count~>(s<span> | v<vspec>)*
//! List      <count~><value>*
//! ```
//!
//! Arguments are collected as [`WireValue`]s and encoded into a single
//! `BytesMut` so a command either goes out whole or not at all.

use bytes::{BufMut, BytesMut};

use crate::addressing::{Address, Offset, Span, SpecItem, SpecSet, Tumbler, VSpec};
use crate::error::{FebeError, Result};

/// Field terminator.
pub const TERMINATOR: u8 = b'~';

/// Tag opening a text value.
pub const TEXT_TAG: u8 = b't';

/// Tag for a span element of a spec set.
pub const SPAN_TAG: u8 = b's';

/// Tag for a vspec element of a spec set.
pub const VSPEC_TAG: u8 = b'v';

/// Any value that can be sent as a command argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// Decimal number.
    Number(u64),
    /// Latin-1 text.
    Text(String),
    /// Count followed by each element.
    List(Vec<WireValue>),
    /// Absolute address.
    Address(Address),
    /// Relative offset.
    Offset(Offset),
    /// Start address and width.
    Span(Span),
    /// Document-scoped spans.
    VSpec(VSpec),
    /// Heterogeneous region set.
    SpecSet(SpecSet),
}

impl WireValue {
    /// Append the wire form of this value to `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`FebeError::Malformed`] for text outside Latin-1.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        match self {
            WireValue::Number(n) => encode_number(buf, *n),
            WireValue::Text(text) => encode_text(buf, text)?,
            WireValue::List(items) => {
                encode_number(buf, items.len() as u64);
                for item in items {
                    item.encode(buf)?;
                }
            }
            WireValue::Address(addr) => encode_tumbler(buf, addr.tumbler()),
            WireValue::Offset(off) => encode_tumbler(buf, off.tumbler()),
            WireValue::Span(span) => encode_span(buf, span),
            WireValue::VSpec(vspec) => encode_vspec(buf, vspec),
            WireValue::SpecSet(set) => encode_specset(buf, set),
        }
        Ok(())
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<BytesMut> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }
}

/// Write `n~`.
pub fn encode_number(buf: &mut BytesMut, n: u64) {
    buf.put_slice(n.to_string().as_bytes());
    buf.put_u8(TERMINATOR);
}

/// Write `t<len>~<bytes>`; every char must fit in one Latin-1 byte.
pub fn encode_text(buf: &mut BytesMut, text: &str) -> Result<()> {
    let bytes = text
        .chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| {
                FebeError::Malformed(format!("character {c:?} is not representable on the wire"))
            })
        })
        .collect::<Result<Vec<u8>>>()?;
    buf.put_u8(TEXT_TAG);
    encode_number(buf, bytes.len() as u64);
    buf.put_slice(&bytes);
    Ok(())
}

/// Write a tumbler in exponent form.
pub fn encode_tumbler(buf: &mut BytesMut, tumbler: &Tumbler) {
    buf.put_slice(tumbler.to_wire_string().as_bytes());
    buf.put_u8(TERMINATOR);
}

/// Write start then width.
pub fn encode_span(buf: &mut BytesMut, span: &Span) {
    encode_tumbler(buf, span.start.tumbler());
    encode_tumbler(buf, span.width.tumbler());
}

/// Write docid, span count, spans.
pub fn encode_vspec(buf: &mut BytesMut, vspec: &VSpec) {
    encode_tumbler(buf, vspec.docid().tumbler());
    encode_number(buf, vspec.len() as u64);
    for span in vspec.spans() {
        encode_span(buf, span);
    }
}

/// Write count then each tagged element.
pub fn encode_specset(buf: &mut BytesMut, set: &SpecSet) {
    encode_number(buf, set.len() as u64);
    for item in set {
        match item {
            SpecItem::Span(span) => {
                buf.put_u8(SPAN_TAG);
                encode_span(buf, span);
            }
            SpecItem::VSpec(vspec) => {
                buf.put_u8(VSPEC_TAG);
                encode_vspec(buf, vspec);
            }
        }
    }
}

impl From<u64> for WireValue {
    fn from(n: u64) -> Self {
        WireValue::Number(n)
    }
}

impl From<u32> for WireValue {
    fn from(n: u32) -> Self {
        WireValue::Number(u64::from(n))
    }
}

impl From<&str> for WireValue {
    fn from(text: &str) -> Self {
        WireValue::Text(text.to_string())
    }
}

impl From<String> for WireValue {
    fn from(text: String) -> Self {
        WireValue::Text(text)
    }
}

impl From<Address> for WireValue {
    fn from(addr: Address) -> Self {
        WireValue::Address(addr)
    }
}

impl From<&Address> for WireValue {
    fn from(addr: &Address) -> Self {
        WireValue::Address(addr.clone())
    }
}

impl From<Offset> for WireValue {
    fn from(off: Offset) -> Self {
        WireValue::Offset(off)
    }
}

impl From<Span> for WireValue {
    fn from(span: Span) -> Self {
        WireValue::Span(span)
    }
}

impl From<VSpec> for WireValue {
    fn from(vspec: VSpec) -> Self {
        WireValue::VSpec(vspec)
    }
}

impl From<SpecSet> for WireValue {
    fn from(set: SpecSet) -> Self {
        WireValue::SpecSet(set)
    }
}

impl From<&SpecSet> for WireValue {
    fn from(set: &SpecSet) -> Self {
        WireValue::SpecSet(set.clone())
    }
}

impl<T: Into<WireValue>> From<Vec<T>> for WireValue {
    fn from(items: Vec<T>) -> Self {
        WireValue::List(items.into_iter().map(Into::into).collect())
    }
}
