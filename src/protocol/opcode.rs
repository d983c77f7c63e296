//! Opcodes and argument enumerations of FeBe 88.1.

use std::fmt;

use crate::codec::WireValue;

/// Request opcodes understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Opcode {
    /// Insert text at a document address.
    Insert = 0,
    /// Span set covering a document.
    RetrieveVSpanSet = 1,
    /// Transclude material into a document.
    VCopy = 2,
    /// Delete, pivot or swap, chosen by the number of cut addresses.
    Rearrange = 3,
    /// Text and link references for a spec set.
    RetrieveContents = 5,
    /// Shared content between two spec sets.
    CompareVersions = 10,
    /// Create an empty document.
    CreateDocument = 11,
    /// Remove a span from a document.
    Remove = 12,
    /// Create a version of a document.
    CreateVersion = 13,
    /// Single span covering a document.
    RetrieveVSpan = 14,
    /// End the session.
    Quit = 16,
    /// One end of a link.
    FollowLink = 18,
    /// Documents containing material from a spec set.
    FindDocuments = 22,
    /// Create a link.
    CreateLink = 27,
    /// All three ends of the links in a spec set.
    RetrieveEndsets = 28,
    /// Links matching end constraints.
    FindLinks = 30,
    /// Select the working account.
    Account = 34,
    /// Open a document.
    OpenDocument = 35,
    /// Close a document.
    CloseDocument = 36,
    /// Create a node under an account.
    CreateNode = 38,
    /// Dump backend enfilade state.
    DumpState = 39,
}

impl Opcode {
    /// All opcodes in numeric order.
    pub const ALL: [Opcode; 21] = [
        Opcode::Insert,
        Opcode::RetrieveVSpanSet,
        Opcode::VCopy,
        Opcode::Rearrange,
        Opcode::RetrieveContents,
        Opcode::CompareVersions,
        Opcode::CreateDocument,
        Opcode::Remove,
        Opcode::CreateVersion,
        Opcode::RetrieveVSpan,
        Opcode::Quit,
        Opcode::FollowLink,
        Opcode::FindDocuments,
        Opcode::CreateLink,
        Opcode::RetrieveEndsets,
        Opcode::FindLinks,
        Opcode::Account,
        Opcode::OpenDocument,
        Opcode::CloseDocument,
        Opcode::CreateNode,
        Opcode::DumpState,
    ];

    /// Numeric code sent on the wire.
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Look up an opcode by number.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }

    /// Human-readable name, for logs.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Insert => "insert",
            Opcode::RetrieveVSpanSet => "retrieve_vspanset",
            Opcode::VCopy => "vcopy",
            Opcode::Rearrange => "rearrange",
            Opcode::RetrieveContents => "retrieve_contents",
            Opcode::CompareVersions => "compare_versions",
            Opcode::CreateDocument => "create_document",
            Opcode::Remove => "remove",
            Opcode::CreateVersion => "create_version",
            Opcode::RetrieveVSpan => "retrieve_vspan",
            Opcode::Quit => "quit",
            Opcode::FollowLink => "follow_link",
            Opcode::FindDocuments => "find_documents",
            Opcode::CreateLink => "create_link",
            Opcode::RetrieveEndsets => "retrieve_endsets",
            Opcode::FindLinks => "find_links",
            Opcode::Account => "account",
            Opcode::OpenDocument => "open_document",
            Opcode::CloseDocument => "close_document",
            Opcode::CreateNode => "create_node",
            Opcode::DumpState => "dump_state",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// Access requested when opening a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Access {
    /// Read only.
    ReadOnly = 1,
    /// Read and write.
    ReadWrite = 2,
}

/// What to do when an open conflicts with another holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CopyMode {
    /// Fail the open.
    ConflictFail = 1,
    /// Open a copy on conflict.
    ConflictCopy = 2,
    /// Always open a copy.
    AlwaysCopy = 3,
}

/// Which end of a link to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum LinkEnd {
    /// The "from" end.
    Source = 1,
    /// The "to" end.
    Target = 2,
    /// The link type.
    Type = 3,
}

impl From<Access> for WireValue {
    fn from(access: Access) -> Self {
        WireValue::Number(access as u64)
    }
}

impl From<CopyMode> for WireValue {
    fn from(mode: CopyMode) -> Self {
        WireValue::Number(mode as u64)
    }
}

impl From<LinkEnd> for WireValue {
    fn from(end: LinkEnd) -> Self {
        WireValue::Number(end as u64)
    }
}
