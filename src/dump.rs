//! Enfilade dump parser.
//!
//! `dump_state` makes the backend print one of its trees in a bracketed,
//! recursive form. This is a diagnostic format only. The grammar:
//!
//! ```text
//! tree    := ('g' | 's') exists~ [ crum ]
//! crum    := '(' depth~ 'h' height~ 'e' enftype~
//!            'w' n~ tumbler{n} 'd' n~ tumbler{n}
//!            'c' children~ ( crum{children} | bottom ) ')'
//! bottom  := 'i' ( 'h' homedoc~                      2D crum (POOM/SPAN)
//!                | 1~ 't' len~ bytes{len}            GRAN text
//!                | 2~ 'o' ('0' | '1' crum) )         GRAN orgl
//! ```
//!
//! Any unexpected byte is a hard failure. The parser never skips input.

use serde::Serialize;
use tokio::io::AsyncBufRead;

use crate::addressing::{Address, Tumbler};
use crate::codec::{unexpected_byte, WireReader};
use crate::error::{FebeError, Result};

/// Deepest crum nesting accepted.
pub const MAX_DUMP_DEPTH: usize = 512;

/// Which tree was dumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpKind {
    /// Granfilade (`g`).
    Granf,
    /// Spanfilade (`s`).
    Spanf,
}

/// Enfilade flavour of a crum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnfType {
    /// Content storage.
    Gran,
    /// Permutation matrix of a document.
    Poom,
    /// Span index.
    Span,
}

impl EnfType {
    /// Map the numeric code used in dumps.
    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            1 => Ok(EnfType::Gran),
            2 => Ok(EnfType::Poom),
            3 => Ok(EnfType::Span),
            other => Err(FebeError::Malformed(format!("unknown enfilade type {other}"))),
        }
    }
}

/// A parsed dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnfiladeDump {
    /// Tree the dump came from.
    pub kind: DumpKind,
    /// Root crum, absent when the backend reports no tree.
    pub root: Option<Crum>,
}

/// One node of an enfilade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crum {
    /// Depth below the root as reported by the backend.
    pub depth: u64,
    /// Height above the bottom; bottom crums are 0.
    pub height: u64,
    /// Enfilade flavour.
    pub enftype: EnfType,
    /// Widths, one per dimension.
    pub wid: Vec<Tumbler>,
    /// Displacements, one per dimension.
    pub dsp: Vec<Tumbler>,
    /// Children or bottom payload.
    pub body: CrumBody,
}

/// What hangs below a crum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrumBody {
    /// Interior crum.
    Children(Vec<Crum>),
    /// Bottom crum.
    Bottom(BottomCrum),
}

/// Payload of a bottom crum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "info")]
pub enum BottomCrum {
    /// 2D bottom crum (POOM or SPAN) pointing at a home document.
    Home {
        /// Home document.
        homedoc: Address,
    },
    /// GRAN text atom.
    Text {
        /// Stored text.
        text: String,
    },
    /// GRAN orgl atom, with its subtree when it is in memory.
    Orgl {
        /// Whether the orgl was loaded.
        in_memory: bool,
        /// The orgl's own tree.
        orgl: Option<Box<Crum>>,
    },
}

impl Crum {
    /// Child crums; empty for a bottom crum.
    pub fn children(&self) -> &[Crum] {
        match &self.body {
            CrumBody::Children(children) => children,
            CrumBody::Bottom(_) => &[],
        }
    }

    /// True for a bottom crum.
    pub fn is_bottom(&self) -> bool {
        matches!(self.body, CrumBody::Bottom(_))
    }

    /// Number of crums in this subtree, orgl subtrees included.
    pub fn count(&self) -> usize {
        1 + match &self.body {
            CrumBody::Children(children) => children.iter().map(Crum::count).sum(),
            CrumBody::Bottom(BottomCrum::Orgl {
                orgl: Some(orgl), ..
            }) => orgl.count(),
            CrumBody::Bottom(_) => 0,
        }
    }
}

impl EnfiladeDump {
    /// Render as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse one tree dump from `reader`.
pub async fn read_enfilade<R: AsyncBufRead + Unpin>(
    reader: &mut WireReader<R>,
) -> Result<EnfiladeDump> {
    let kind = match reader.read_byte("dump marker").await? {
        b'g' => DumpKind::Granf,
        b's' => DumpKind::Spanf,
        other => {
            return Err(FebeError::Malformed(format!(
                "unexpected dump marker {:?}",
                char::from(other)
            )))
        }
    };
    let exists = reader.read_number().await?;
    let root = if exists != 0 {
        Some(read_crum(reader, 0).await?)
    } else {
        None
    };
    Ok(EnfiladeDump { kind, root })
}

async fn read_crum<R: AsyncBufRead + Unpin>(
    reader: &mut WireReader<R>,
    nesting: usize,
) -> Result<Crum> {
    if nesting > MAX_DUMP_DEPTH {
        return Err(FebeError::Malformed(format!(
            "dump nested deeper than {MAX_DUMP_DEPTH}"
        )));
    }

    reader.expect_byte(b'(', "crum").await?;
    let depth = reader.read_number().await?;
    reader.expect_byte(b'h', "crum height").await?;
    let height = reader.read_number().await?;
    reader.expect_byte(b'e', "crum enftype").await?;
    let enftype = EnfType::from_code(reader.read_number().await?)?;
    reader.expect_byte(b'w', "crum widths").await?;
    let wid = read_tumblers(reader).await?;
    reader.expect_byte(b'd', "crum displacements").await?;
    let dsp = read_tumblers(reader).await?;
    reader.expect_byte(b'c', "crum child count").await?;
    let child_count = reader.read_count().await?;

    let body = if child_count > 0 {
        let mut children = Vec::with_capacity(child_count.min(64));
        for _ in 0..child_count {
            children.push(Box::pin(read_crum(reader, nesting + 1)).await?);
        }
        CrumBody::Children(children)
    } else {
        CrumBody::Bottom(read_bottom(reader, nesting).await?)
    };

    reader.expect_byte(b')', "end of crum").await?;
    Ok(Crum {
        depth,
        height,
        enftype,
        wid,
        dsp,
        body,
    })
}

async fn read_bottom<R: AsyncBufRead + Unpin>(
    reader: &mut WireReader<R>,
    nesting: usize,
) -> Result<BottomCrum> {
    reader.expect_byte(b'i', "bottom crum").await?;

    if reader.peek_byte("bottom crum info").await? == b'h' {
        reader.read_byte("bottom crum info").await?;
        let homedoc = reader.read_address().await?;
        return Ok(BottomCrum::Home { homedoc });
    }

    match reader.read_number().await? {
        1 => {
            reader.expect_byte(b't', "text atom").await?;
            let len = reader.read_count().await?;
            let bytes = reader.read_raw(len, "text atom").await?;
            Ok(BottomCrum::Text {
                text: bytes.into_iter().map(char::from).collect(),
            })
        }
        2 => {
            reader.expect_byte(b'o', "orgl atom").await?;
            match reader.read_byte("orgl residency").await? {
                b'0' => Ok(BottomCrum::Orgl {
                    in_memory: false,
                    orgl: None,
                }),
                b'1' => {
                    let orgl = Box::pin(read_crum(reader, nesting + 1)).await?;
                    Ok(BottomCrum::Orgl {
                        in_memory: true,
                        orgl: Some(Box::new(orgl)),
                    })
                }
                other => Err(unexpected_byte(other, b'1', "orgl residency")),
            }
        }
        other => Err(FebeError::Malformed(format!("unknown info type {other}"))),
    }
}

async fn read_tumblers<R: AsyncBufRead + Unpin>(reader: &mut WireReader<R>) -> Result<Vec<Tumbler>> {
    let n = reader.read_count().await?;
    let mut tumblers = Vec::with_capacity(n.min(8));
    for _ in 0..n {
        tumblers.push(reader.read_tumbler().await?);
    }
    Ok(tumblers)
}
