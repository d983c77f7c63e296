//! Inbound wire decoding.
//!
//! [`WireReader`] pulls typed values off a buffered async stream. Values are
//! read as chunks: bytes up to a `~` or newline. A `?` inside a chunk is the
//! backend reporting an error and aborts the read; end of stream before a
//! terminator is fatal.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use super::encode::{SPAN_TAG, TERMINATOR, TEXT_TAG, VSPEC_TAG};
use crate::addressing::{Address, Offset, Span, SpecSet, Tumbler, VSpec};
use crate::config::DEFAULT_MAX_CHUNK_LEN;
use crate::error::{FebeError, ProtocolError, Result};

/// Backend error marker.
pub const ERROR_MARKER: u8 = b'?';

/// One item of retrieved document contents.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Content {
    /// Literal text.
    Text(String),
    /// Embedded link reference.
    Link(Address),
}

/// Typed reader over a buffered byte stream.
#[derive(Debug)]
pub struct WireReader<R> {
    inner: R,
    max_chunk_len: usize,
}

impl<R: AsyncBufRead + Unpin> WireReader<R> {
    /// Wrap a buffered stream with the default chunk limit.
    pub fn new(inner: R) -> Self {
        Self::with_max_chunk_len(inner, DEFAULT_MAX_CHUNK_LEN)
    }

    /// Wrap a buffered stream with a custom chunk limit.
    pub fn with_max_chunk_len(inner: R, max_chunk_len: usize) -> Self {
        Self {
            inner,
            max_chunk_len,
        }
    }

    /// Underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Underlying stream, mutably (used for writes on duplex streams).
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Unwrap the stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read one byte; end of stream is [`ProtocolError::Closed`].
    pub async fn read_byte(&mut self, context: &str) -> Result<u8> {
        match self.inner.read_u8().await {
            Ok(b) => Ok(b),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(closed(context)),
            Err(e) => Err(e.into()),
        }
    }

    /// Look at the next byte without consuming it.
    pub async fn peek_byte(&mut self, context: &str) -> Result<u8> {
        let buf = self.inner.fill_buf().await?;
        buf.first().copied().ok_or_else(|| closed(context))
    }

    /// Consume one byte that must equal `expected`.
    pub async fn expect_byte(&mut self, expected: u8, context: &str) -> Result<()> {
        let b = self.read_byte(context).await?;
        if b != expected {
            return Err(unexpected_byte(b, expected, context));
        }
        Ok(())
    }

    /// Read exactly `n` raw bytes.
    pub async fn read_raw(&mut self, n: usize, context: &str) -> Result<Vec<u8>> {
        if n > self.max_chunk_len {
            return Err(ProtocolError::ChunkTooLong {
                limit: self.max_chunk_len,
                context: context.to_string(),
            }
            .into());
        }
        let mut bytes = vec![0u8; n];
        match self.inner.read_exact(&mut bytes).await {
            Ok(_) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(closed(context)),
            Err(e) => Err(e.into()),
        }
    }

    /// Read bytes up to (not including) a `~` or newline.
    pub async fn read_chunk(&mut self, context: &str) -> Result<String> {
        let mut chunk = String::new();
        loop {
            let b = self.read_byte(context).await?;
            match b {
                TERMINATOR | b'\n' => return Ok(chunk),
                ERROR_MARKER => {
                    return Err(ProtocolError::Rejected {
                        context: context.to_string(),
                    }
                    .into())
                }
                _ => {
                    if chunk.len() >= self.max_chunk_len {
                        return Err(ProtocolError::ChunkTooLong {
                            limit: self.max_chunk_len,
                            context: context.to_string(),
                        }
                        .into());
                    }
                    chunk.push(char::from(b));
                }
            }
        }
    }

    /// Read a decimal number.
    pub async fn read_number(&mut self) -> Result<u64> {
        let chunk = self.read_chunk("number").await?;
        parse_number(&chunk)
    }

    /// Read a count and convert it to `usize`.
    pub async fn read_count(&mut self) -> Result<usize> {
        let n = self.read_number().await?;
        usize::try_from(n).map_err(|_| FebeError::Malformed(format!("count {n} out of range")))
    }

    /// Read `t<len>~<bytes>` as Latin-1 text.
    pub async fn read_text(&mut self) -> Result<String> {
        self.expect_byte(TEXT_TAG, "text").await?;
        self.read_text_body().await
    }

    async fn read_text_body(&mut self) -> Result<String> {
        let len = self.read_count().await?;
        let bytes = self.read_raw(len, "text").await?;
        Ok(bytes.into_iter().map(char::from).collect())
    }

    /// Read a retrieved-contents item: text or a link address.
    pub async fn read_content(&mut self) -> Result<Content> {
        let b = self.peek_byte("content").await?;
        if b == TEXT_TAG {
            Ok(Content::Text(self.read_text().await?))
        } else if b.is_ascii_digit() {
            Ok(Content::Link(self.read_address().await?))
        } else {
            Err(FebeError::Malformed(format!(
                "unexpected byte {:?} at start of content",
                char::from(b)
            )))
        }
    }

    /// Read a tumbler in exponent form.
    pub async fn read_tumbler(&mut self) -> Result<Tumbler> {
        let chunk = self.read_chunk("tumbler").await?;
        Tumbler::from_wire_str(&chunk)
    }

    /// Read an address.
    pub async fn read_address(&mut self) -> Result<Address> {
        Ok(Address::from_tumbler(self.read_tumbler().await?))
    }

    /// Read an offset.
    pub async fn read_offset(&mut self) -> Result<Offset> {
        Ok(Offset::from_tumbler(self.read_tumbler().await?))
    }

    /// Read start then width.
    pub async fn read_span(&mut self) -> Result<Span> {
        let start = self.read_address().await?;
        let width = self.read_offset().await?;
        Ok(Span::new(start, width))
    }

    /// Read docid, span count, spans.
    pub async fn read_vspec(&mut self) -> Result<VSpec> {
        let docid = self.read_address().await?;
        let count = self.read_count().await?;
        let mut spans = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            spans.push(self.read_span().await?);
        }
        Ok(VSpec::new(docid, spans))
    }

    /// Read count then each tagged element.
    pub async fn read_specset(&mut self) -> Result<SpecSet> {
        let count = self.read_count().await?;
        let mut set = SpecSet::new();
        for _ in 0..count {
            match self.read_byte("specset tag").await? {
                SPAN_TAG => set.push(self.read_span().await?),
                VSPEC_TAG => set.push(self.read_vspec().await?),
                other => {
                    return Err(FebeError::Malformed(format!(
                        "unexpected specset tag {:?}",
                        char::from(other)
                    )))
                }
            }
        }
        Ok(set)
    }

    /// Read a count followed by that many addresses.
    pub async fn read_address_list(&mut self) -> Result<Vec<Address>> {
        let count = self.read_count().await?;
        let mut addrs = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            addrs.push(self.read_address().await?);
        }
        Ok(addrs)
    }
}

/// Parse a decimal chunk.
pub fn parse_number(chunk: &str) -> Result<u64> {
    if chunk.is_empty() || !chunk.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FebeError::Malformed(format!("expected number, got {chunk:?}")));
    }
    chunk
        .parse()
        .map_err(|_| FebeError::Malformed(format!("number out of range: {chunk:?}")))
}

fn closed(context: &str) -> FebeError {
    ProtocolError::Closed {
        context: context.to_string(),
    }
    .into()
}

pub(crate) fn unexpected_byte(got: u8, expected: u8, context: &str) -> FebeError {
    FebeError::Malformed(format!(
        "expected {:?} in {context}, got {:?}",
        char::from(expected),
        char::from(got)
    ))
}
