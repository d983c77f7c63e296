//! Session builder and typed backend operations.
//!
//! The [`SessionBuilder`] collects configuration and performs the handshake.
//! The [`Session`] exposes one method per backend operation; each sends one
//! command and parses its typed reply.
//!
//! # Example
//!
//! ```ignore
//! use febe_client::{Session, Access, CopyMode};
//! use tokio::net::TcpStream;
//!
//! #[tokio::main]
//! async fn main() -> febe_client::Result<()> {
//!     let stream = TcpStream::connect("127.0.0.1:55146").await?;
//!     let mut session = Session::builder().connect(stream).await?;
//!
//!     let doc = session.create_document().await?;
//!     let handle = session
//!         .open_document(&doc, Access::ReadWrite, CopyMode::ConflictFail)
//!         .await?;
//!     session.insert(&handle, &"1.1".parse()?, &["hello"]).await?;
//!     session.close_document(&handle).await?;
//!
//!     session.quit().await
//! }
//! ```

use tokio::io::{AsyncRead, AsyncWrite};

use crate::addressing::{Address, Offset, Span, SpecSet, VSpan, VSpec};
use crate::codec::{Content, WireValue};
use crate::config::SessionConfig;
use crate::dump::{read_enfilade, EnfiladeDump};
use crate::error::Result;
use crate::protocol::{Access, Connection, CopyMode, LinkEnd, Opcode};
use crate::shared::{collapse_sharedspans, SharedSpan};

/// Builder for configuring and connecting a [`Session`].
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    config: SessionConfig,
}

impl SessionBuilder {
    /// Builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn with_config(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Set the longest chunk accepted from the backend.
    ///
    /// Default: 1 MiB
    pub fn max_chunk_len(mut self, limit: usize) -> Self {
        self.config.max_chunk_len = limit;
        self
    }

    /// Set how many preamble bytes the handshake may discard.
    ///
    /// Default: 64 KiB
    pub fn max_preamble_len(mut self, limit: usize) -> Self {
        self.config.max_preamble_len = limit;
        self
    }

    /// Log outbound command bytes at trace level.
    pub fn trace_wire(mut self, enabled: bool) -> Self {
        self.config.trace_wire = enabled;
        self
    }

    /// Set the read buffer capacity.
    ///
    /// Default: 8 KiB
    pub fn read_buffer(mut self, capacity: usize) -> Self {
        self.config.read_buffer = capacity;
        self
    }

    /// Wrap `stream`, perform the handshake and return a live session.
    pub async fn connect<S>(self, stream: S) -> Result<Session<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut conn = Connection::new(stream, self.config);
        conn.handshake().await?;
        Ok(Session { conn })
    }
}

/// Result of [`Session::follow_link`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkFollow {
    /// The requested end.
    Found(SpecSet),
    /// The backend rejected the request; the link has no such end.
    Empty,
}

impl LinkFollow {
    /// The end, or the empty set.
    pub fn into_specset(self) -> SpecSet {
        match self {
            LinkFollow::Found(set) => set,
            LinkFollow::Empty => SpecSet::new(),
        }
    }
}

/// The three ends of the links in a region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endsets {
    /// Source ends.
    pub source: SpecSet,
    /// Target ends.
    pub target: SpecSet,
    /// Type ends.
    pub link_type: SpecSet,
}

/// A connected session with a FeBe backend.
#[derive(Debug)]
pub struct Session<S> {
    conn: Connection<S>,
}

impl Session<()> {
    /// Create a new session builder.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    /// Connect with the default configuration.
    pub async fn connect(stream: S) -> Result<Self> {
        SessionBuilder::new().connect(stream).await
    }

    /// Active configuration.
    pub fn config(&self) -> &SessionConfig {
        self.conn.config()
    }

    /// Create an empty document.
    pub async fn create_document(&mut self) -> Result<Address> {
        self.conn.command(Opcode::CreateDocument, &[]).await?;
        self.conn.reader().read_address().await
    }

    /// Create a new version of `docid`.
    pub async fn create_version(&mut self, docid: &Address) -> Result<Address> {
        self.conn
            .command(Opcode::CreateVersion, &[docid.into()])
            .await?;
        self.conn.reader().read_address().await
    }

    /// Open `docid`; returns the handle to use for edits.
    pub async fn open_document(
        &mut self,
        docid: &Address,
        access: Access,
        copy: CopyMode,
    ) -> Result<Address> {
        self.conn
            .command(
                Opcode::OpenDocument,
                &[docid.into(), access.into(), copy.into()],
            )
            .await?;
        self.conn.reader().read_address().await
    }

    /// Close a document handle.
    pub async fn close_document(&mut self, docid: &Address) -> Result<()> {
        self.conn
            .command(Opcode::CloseDocument, &[docid.into()])
            .await
    }

    /// Insert `texts` at `vaddr` in `docid`.
    pub async fn insert<T: AsRef<str>>(
        &mut self,
        docid: &Address,
        vaddr: &Address,
        texts: &[T],
    ) -> Result<()> {
        let texts = texts
            .iter()
            .map(|t| WireValue::from(t.as_ref()))
            .collect::<Vec<_>>();
        self.conn
            .command(Opcode::Insert, &[docid.into(), vaddr.into(), WireValue::List(texts)])
            .await
    }

    /// Transclude `specs` into `docid` at `vaddr`.
    pub async fn vcopy(&mut self, docid: &Address, vaddr: &Address, specs: &SpecSet) -> Result<()> {
        self.conn
            .command(Opcode::VCopy, &[docid.into(), vaddr.into(), specs.into()])
            .await
    }

    /// Delete `width` starting at `start` in `docid`.
    pub async fn delete(&mut self, docid: &Address, start: &Address, width: &Offset) -> Result<()> {
        let end = (start + width)?;
        self.rearrange(docid, vec![start.clone(), end]).await
    }

    /// Move `[start, pivot)` to after `[pivot, end)`.
    pub async fn pivot(
        &mut self,
        docid: &Address,
        start: &Address,
        pivot: &Address,
        end: &Address,
    ) -> Result<()> {
        self.rearrange(docid, vec![start.clone(), pivot.clone(), end.clone()])
            .await
    }

    /// Exchange `[start_a, end_a)` with `[start_b, end_b)`.
    pub async fn swap(
        &mut self,
        docid: &Address,
        start_a: &Address,
        end_a: &Address,
        start_b: &Address,
        end_b: &Address,
    ) -> Result<()> {
        let cuts = vec![start_a.clone(), end_a.clone(), start_b.clone(), end_b.clone()];
        self.rearrange(docid, cuts).await
    }

    async fn rearrange(&mut self, docid: &Address, cuts: Vec<Address>) -> Result<()> {
        self.conn
            .command(Opcode::Rearrange, &[docid.into(), cuts.into()])
            .await
    }

    /// Remove `vspan` from `docid`.
    pub async fn remove(&mut self, docid: &Address, vspan: &VSpan) -> Result<()> {
        self.conn
            .command(Opcode::Remove, &[docid.into(), vspan.span.clone().into()])
            .await
    }

    /// Spans covering the contents of `docid`.
    pub async fn retrieve_vspanset(&mut self, docid: &Address) -> Result<VSpec> {
        self.conn
            .command(Opcode::RetrieveVSpanSet, &[docid.into()])
            .await?;
        self.conn.reader().read_vspec().await
    }

    /// Single span covering `docid`.
    pub async fn retrieve_vspan(&mut self, docid: &Address) -> Result<VSpan> {
        self.conn
            .command(Opcode::RetrieveVSpan, &[docid.into()])
            .await?;
        let span = self.conn.reader().read_span().await?;
        Ok(VSpan::new(docid.clone(), span))
    }

    /// Text and link references inside `specs`.
    pub async fn retrieve_contents(&mut self, specs: &SpecSet) -> Result<Vec<Content>> {
        self.conn
            .command(Opcode::RetrieveContents, &[specs.into()])
            .await?;
        let reader = self.conn.reader();
        let count = reader.read_count().await?;
        let mut contents = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            contents.push(reader.read_content().await?);
        }
        Ok(contents)
    }

    /// Source, target and type ends of the links in `specs`.
    pub async fn retrieve_endsets(&mut self, specs: &SpecSet) -> Result<Endsets> {
        self.conn
            .command(Opcode::RetrieveEndsets, &[specs.into()])
            .await?;
        let reader = self.conn.reader();
        Ok(Endsets {
            source: reader.read_specset().await?,
            target: reader.read_specset().await?,
            link_type: reader.read_specset().await?,
        })
    }

    /// Create a link homed in `docid`; returns the link's address.
    pub async fn create_link(
        &mut self,
        docid: &Address,
        source: &SpecSet,
        target: &SpecSet,
        link_type: &SpecSet,
    ) -> Result<Address> {
        self.conn
            .command(
                Opcode::CreateLink,
                &[docid.into(), source.into(), target.into(), link_type.into()],
            )
            .await?;
        self.conn.reader().read_address().await
    }

    /// Links whose ends overlap the given sets.
    ///
    /// Empty `target`/`link_type` sets and an empty `home_docs` list leave
    /// that constraint open.
    pub async fn find_links(
        &mut self,
        source: &SpecSet,
        target: &SpecSet,
        link_type: &SpecSet,
        home_docs: &[Address],
    ) -> Result<Vec<Address>> {
        self.conn
            .command(
                Opcode::FindLinks,
                &[
                    source.into(),
                    target.into(),
                    link_type.into(),
                    home_docs.to_vec().into(),
                ],
            )
            .await?;
        self.conn.reader().read_address_list().await
    }

    /// Links whose source overlaps `source`, with no other constraint.
    pub async fn find_links_from(&mut self, source: &SpecSet) -> Result<Vec<Address>> {
        self.find_links(source, &SpecSet::new(), &SpecSet::new(), &[])
            .await
    }

    /// One end of `linkid`.
    ///
    /// A backend rejection, in place of the echo or inside the reply, yields
    /// [`LinkFollow::Empty`]; every other failure propagates.
    pub async fn follow_link(&mut self, linkid: &Address, end: LinkEnd) -> Result<LinkFollow> {
        let reply = async {
            self.conn
                .command(Opcode::FollowLink, &[end.into(), linkid.into()])
                .await?;
            self.conn.reader().read_specset().await
        }
        .await;

        match reply {
            Ok(set) => Ok(LinkFollow::Found(set)),
            Err(e) if e.is_rejection() => {
                tracing::warn!(link = %linkid, ?end, "backend rejected follow_link");
                Ok(LinkFollow::Empty)
            }
            Err(e) => Err(e),
        }
    }

    /// Shared content between two regions, adjacent runs merged.
    pub async fn compare_versions(&mut self, a: &SpecSet, b: &SpecSet) -> Result<Vec<SharedSpan>> {
        self.conn
            .command(Opcode::CompareVersions, &[a.into(), b.into()])
            .await?;
        let reader = self.conn.reader();
        let count = reader.read_count().await?;
        let mut pairs = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let start_a = reader.read_address().await?;
            let start_b = reader.read_address().await?;
            let width = reader.read_offset().await?;
            let (doc_a, local_a) = start_a.split()?;
            let (doc_b, local_b) = start_b.split()?;
            pairs.push((
                VSpan::new(doc_a, Span::new(local_a, width.clone())),
                VSpan::new(doc_b, Span::new(local_b, width)),
            ));
        }
        collapse_sharedspans(pairs)
    }

    /// Documents holding material from `specs`.
    pub async fn find_documents(&mut self, specs: &SpecSet) -> Result<Vec<Address>> {
        self.conn
            .command(Opcode::FindDocuments, &[specs.into()])
            .await?;
        self.conn.reader().read_address_list().await
    }

    /// Select the working account.
    pub async fn account(&mut self, acctid: &Address) -> Result<()> {
        self.conn.command(Opcode::Account, &[acctid.into()]).await
    }

    /// Create a node under `acctid`.
    pub async fn create_node(&mut self, acctid: &Address) -> Result<Address> {
        self.conn
            .command(Opcode::CreateNode, &[acctid.into()])
            .await?;
        self.conn.reader().read_address().await
    }

    /// Dump backend enfilade state for inspection.
    pub async fn dump_state(&mut self) -> Result<EnfiladeDump> {
        self.conn.command(Opcode::DumpState, &[]).await?;
        read_enfilade(self.conn.reader()).await
    }

    /// End the session and close the stream.
    pub async fn quit(mut self) -> Result<()> {
        self.conn.command(Opcode::Quit, &[]).await?;
        tracing::debug!("session closed");
        self.conn.close().await
    }
}
