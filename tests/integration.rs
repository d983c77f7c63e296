//! Integration tests for febe-client.
//!
//! Each test scripts the backend's replies up front on one side of an
//! in-memory duplex, drives a [`Session`] on the other side, then checks the
//! exact bytes the client sent.

use febe_client::dump::{BottomCrum, CrumBody, DumpKind, EnfType};
use febe_client::{
    Access, Address, Content, CopyMode, FebeError, LinkEnd, LinkFollow, Offset, ProtocolError,
    Session, Span, SpecSet, VSpan, VSpec, JUMP_TYPE, NOSPECS,
};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

const HELLO: &[u8] = b"\nP0~";

fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

fn off(s: &str) -> Offset {
    s.parse().unwrap()
}

/// Connect a session to a backend that will answer with `script`.
async fn scripted(script: &[u8]) -> (Session<DuplexStream>, DuplexStream) {
    let (client, mut backend) = duplex(8192);
    backend.write_all(script).await.unwrap();
    let session = Session::connect(client).await.unwrap();
    (session, backend)
}

/// Everything the client wrote, once it has shut down its side.
async fn sent(mut backend: DuplexStream) -> Vec<u8> {
    let mut bytes = Vec::new();
    backend.read_to_end(&mut bytes).await.unwrap();
    bytes
}

fn expect_sent(bytes: &[u8], commands: &str) {
    let mut expected = HELLO.to_vec();
    expected.extend_from_slice(commands.as_bytes());
    assert_eq!(
        String::from_utf8_lossy(bytes),
        String::from_utf8_lossy(&expected)
    );
}

#[tokio::test]
async fn test_create_document_and_quit() {
    let (mut session, backend) = scripted(b"banner text\nP0~11~0.1.1.0.1~16~").await;

    let doc = session.create_document().await.unwrap();
    assert_eq!(doc, addr("1.1.0.1"));
    session.quit().await.unwrap();

    expect_sent(&sent(backend).await, "11~16~");
}

#[tokio::test]
async fn test_open_insert_close() {
    let (mut session, backend) = scripted(b"\nP0~35~0.1.1.0.1~0~36~16~").await;

    let doc = addr("1.1.0.1");
    let handle = session
        .open_document(&doc, Access::ReadWrite, CopyMode::ConflictFail)
        .await
        .unwrap();
    assert_eq!(handle, doc);
    session
        .insert(&handle, &addr("1.1"), &["hello"])
        .await
        .unwrap();
    session.close_document(&handle).await.unwrap();
    session.quit().await.unwrap();

    expect_sent(
        &sent(backend).await,
        "35~0.1.1.0.1~2~1~0~0.1.1.0.1~0.1.1~1~t5~hello36~0.1.1.0.1~16~",
    );
}

#[tokio::test]
async fn test_delete_sends_two_cuts() {
    let (mut session, backend) = scripted(b"\nP0~3~16~").await;

    session
        .delete(&addr("1.1.0.1"), &addr("1.3"), &off("0.2"))
        .await
        .unwrap();
    session.quit().await.unwrap();

    expect_sent(&sent(backend).await, "3~0.1.1.0.1~2~0.1.3~0.1.5~16~");
}

#[tokio::test]
async fn test_swap_sends_four_cuts() {
    let (mut session, backend) = scripted(b"\nP0~3~16~").await;

    session
        .swap(
            &addr("1.1.0.1"),
            &addr("1.1"),
            &addr("1.3"),
            &addr("1.5"),
            &addr("1.9"),
        )
        .await
        .unwrap();
    session.quit().await.unwrap();

    expect_sent(
        &sent(backend).await,
        "3~0.1.1.0.1~4~0.1.1~0.1.3~0.1.5~0.1.9~16~",
    );
}

#[tokio::test]
async fn test_retrieve_vspanset() {
    let (mut session, backend) = scripted(b"\nP0~1~0.1.1.0.1~1~0.1.1~1.5~16~").await;

    let vspec = session.retrieve_vspanset(&addr("1.1.0.1")).await.unwrap();
    assert_eq!(vspec.docid(), &addr("1.1.0.1"));
    assert_eq!(vspec.spans(), &[Span::new(addr("1.1"), off("0.5"))]);
    session.quit().await.unwrap();

    expect_sent(&sent(backend).await, "1~0.1.1.0.1~16~");
}

#[tokio::test]
async fn test_retrieve_contents_text_and_link() {
    let (mut session, backend) =
        scripted(b"\nP0~5~2~t5~hello0.1.1.0.1.0.2.1~16~").await;

    let whole = VSpec::new(addr("1.1.0.1"), [Span::new(addr("1.1"), off("0.5"))]);
    let contents = session
        .retrieve_contents(&SpecSet::from(whole))
        .await
        .unwrap();
    assert_eq!(
        contents,
        vec![
            Content::Text("hello".to_string()),
            Content::Link(addr("1.1.0.1.0.2.1")),
        ]
    );
    session.quit().await.unwrap();

    expect_sent(
        &sent(backend).await,
        "5~1~v0.1.1.0.1~1~0.1.1~1.5~16~",
    );
}

#[tokio::test]
async fn test_create_link_with_jump_type() {
    let (mut session, backend) = scripted(b"\nP0~27~0.1.1.0.1.0.2.1~16~").await;

    let source = SpecSet::from(VSpec::new(
        addr("1.1.0.1"),
        [Span::new(addr("1.1"), off("0.3"))],
    ));
    let target = SpecSet::from(VSpec::new(
        addr("1.1.0.2"),
        [Span::new(addr("1.1"), off("0.4"))],
    ));
    let link = session
        .create_link(
            &addr("1.1.0.1"),
            &source,
            &target,
            &SpecSet::from(JUMP_TYPE.clone()),
        )
        .await
        .unwrap();
    assert_eq!(link, addr("1.1.0.1.0.2.1"));
    session.quit().await.unwrap();

    expect_sent(
        &sent(backend).await,
        "27~0.1.1.0.1~\
         1~v0.1.1.0.1~1~0.1.1~1.3~\
         1~v0.1.1.0.2~1~0.1.1~1.4~\
         1~v0.1.1.0.1.0.2~1~0.2.1~1.1~\
         16~",
    );
}

#[tokio::test]
async fn test_find_links_from_leaves_other_ends_open() {
    let (mut session, backend) =
        scripted(b"\nP0~30~2~0.1.1.0.1.0.2.1~0.1.1.0.1.0.2.2~16~").await;

    let source = SpecSet::from(Span::new(addr("1.1.0.1.0.1.1"), off("0.0.0.0.0.0.3")));
    let links = session.find_links_from(&source).await.unwrap();
    assert_eq!(links, vec![addr("1.1.0.1.0.2.1"), addr("1.1.0.1.0.2.2")]);
    session.quit().await.unwrap();

    expect_sent(
        &sent(backend).await,
        "30~1~s0.1.1.0.1.0.1.1~6.3~0~0~0~16~",
    );
}

#[tokio::test]
async fn test_follow_link_found() {
    let (mut session, backend) = scripted(b"\nP0~18~1~s0.1.1~1.3~16~").await;

    let end = session
        .follow_link(&addr("1.1.0.1.0.2.1"), LinkEnd::Target)
        .await
        .unwrap();
    assert_eq!(
        end,
        LinkFollow::Found(SpecSet::from(Span::new(addr("1.1"), off("0.3"))))
    );
    session.quit().await.unwrap();

    expect_sent(&sent(backend).await, "18~2~0.1.1.0.1.0.2.1~16~");
}

#[tokio::test]
async fn test_follow_link_rejection_is_empty() {
    let (mut session, backend) = scripted(b"\nP0~?16~").await;

    let end = session
        .follow_link(&addr("1.1.0.1.0.2.1"), LinkEnd::Type)
        .await
        .unwrap();
    assert_eq!(end, LinkFollow::Empty);
    assert!(end.into_specset().is_empty());

    // The session stays usable after a rejection.
    session.quit().await.unwrap();
    expect_sent(&sent(backend).await, "18~3~0.1.1.0.1.0.2.1~16~");
}

#[tokio::test]
async fn test_follow_link_rejection_inside_reply_is_empty() {
    let (mut session, backend) = scripted(b"\nP0~18~?16~").await;

    let end = session
        .follow_link(&addr("1.1.0.1.0.2.1"), LinkEnd::Source)
        .await
        .unwrap();
    assert_eq!(end, LinkFollow::Empty);

    session.quit().await.unwrap();
    expect_sent(&sent(backend).await, "18~1~0.1.1.0.1.0.2.1~16~");
}

#[tokio::test]
async fn test_create_version() {
    let (mut session, backend) = scripted(b"\nP0~13~0.1.1.0.1.1~16~").await;

    let version = session.create_version(&addr("1.1.0.1")).await.unwrap();
    assert_eq!(version, addr("1.1.0.1.1"));
    session.quit().await.unwrap();

    expect_sent(&sent(backend).await, "13~0.1.1.0.1~16~");
}

#[tokio::test]
async fn test_vcopy_sends_target_and_specset() {
    let (mut session, backend) = scripted(b"\nP0~2~16~").await;

    let from = SpecSet::from(VSpec::new(
        addr("1.1.0.1"),
        [Span::new(addr("1.1"), off("0.5"))],
    ));
    session
        .vcopy(&addr("1.1.0.2"), &addr("1.1"), &from)
        .await
        .unwrap();
    session.quit().await.unwrap();

    expect_sent(
        &sent(backend).await,
        "2~0.1.1.0.2~0.1.1~1~v0.1.1.0.1~1~0.1.1~1.5~16~",
    );
}

#[tokio::test]
async fn test_pivot_sends_three_cuts() {
    let (mut session, backend) = scripted(b"\nP0~3~16~").await;

    session
        .pivot(&addr("1.1.0.1"), &addr("1.1"), &addr("1.4"), &addr("1.7"))
        .await
        .unwrap();
    session.quit().await.unwrap();

    expect_sent(&sent(backend).await, "3~0.1.1.0.1~3~0.1.1~0.1.4~0.1.7~16~");
}

#[tokio::test]
async fn test_remove_sends_local_span() {
    let (mut session, backend) = scripted(b"\nP0~12~16~").await;

    let region = VSpan::new(addr("1.1.0.1"), Span::new(addr("1.2"), off("0.3")));
    session.remove(&addr("1.1.0.1"), &region).await.unwrap();
    session.quit().await.unwrap();

    expect_sent(&sent(backend).await, "12~0.1.1.0.1~0.1.2~1.3~16~");
}

#[tokio::test]
async fn test_delete_overflow_sends_nothing() {
    let (mut session, backend) = scripted(b"\nP0~16~").await;

    let start = Address::from_digits([1, u64::MAX]);
    let err = session
        .delete(&addr("1.1.0.1"), &start, &off("0.1"))
        .await
        .unwrap_err();
    assert!(matches!(err, FebeError::Range { op: "add", .. }));
    session.quit().await.unwrap();

    expect_sent(&sent(backend).await, "16~");
}

#[tokio::test]
async fn test_retrieve_vspan() {
    let (mut session, backend) = scripted(b"\nP0~14~0.1.1~1.9~16~").await;

    let whole = session.retrieve_vspan(&addr("1.1.0.1")).await.unwrap();
    assert_eq!(
        whole,
        VSpan::new(addr("1.1.0.1"), Span::new(addr("1.1"), off("0.9")))
    );
    session.quit().await.unwrap();

    expect_sent(&sent(backend).await, "14~0.1.1.0.1~16~");
}

#[tokio::test]
async fn test_find_documents() {
    let (mut session, backend) =
        scripted(b"\nP0~22~2~0.1.1.0.1~0.1.1.0.2~16~").await;

    let region = SpecSet::from(VSpec::new(
        addr("1.1.0.1"),
        [Span::new(addr("1.1"), off("0.5"))],
    ));
    let docs = session.find_documents(&region).await.unwrap();
    assert_eq!(docs, vec![addr("1.1.0.1"), addr("1.1.0.2")]);
    session.quit().await.unwrap();

    expect_sent(
        &sent(backend).await,
        "22~1~v0.1.1.0.1~1~0.1.1~1.5~16~",
    );
}

#[tokio::test]
async fn test_find_links_with_home_documents() {
    let (mut session, backend) = scripted(b"\nP0~30~1~0.1.1.0.1.0.2.1~16~").await;

    let source = SpecSet::from(VSpec::new(
        addr("1.1.0.1"),
        [Span::new(addr("1.1"), off("0.3"))],
    ));
    let links = session
        .find_links(
            &source,
            &NOSPECS,
            &SpecSet::from(JUMP_TYPE.clone()),
            &[addr("1.1.0.1"), addr("1.1.0.2")],
        )
        .await
        .unwrap();
    assert_eq!(links, vec![addr("1.1.0.1.0.2.1")]);
    session.quit().await.unwrap();

    expect_sent(
        &sent(backend).await,
        "30~\
         1~v0.1.1.0.1~1~0.1.1~1.3~\
         0~\
         1~v0.1.1.0.1.0.2~1~0.2.1~1.1~\
         2~0.1.1.0.1~0.1.1.0.2~\
         16~",
    );
}

#[tokio::test]
async fn test_retrieve_endsets() {
    let (mut session, backend) = scripted(b"\nP0~28~0~1~s0.1.1~1.1~0~16~").await;

    let endsets = session
        .retrieve_endsets(&SpecSet::from(VSpan::new(
            addr("1.1.0.1"),
            Span::new(addr("1.1"), off("0.9")),
        )))
        .await
        .unwrap();
    assert!(endsets.source.is_empty());
    assert_eq!(endsets.target.len(), 1);
    assert!(endsets.link_type.is_empty());
    session.quit().await.unwrap();

    expect_sent(&sent(backend).await, "28~1~v0.1.1.0.1~1~0.1.1~1.9~16~");
}

#[tokio::test]
async fn test_compare_versions_merges_adjacent_runs() {
    let (mut session, backend) = scripted(
        b"\nP0~10~2~\
          0.1.1.0.1.0.1.1~0.1.1.0.2.0.1.1~1.5~\
          0.1.1.0.1.0.1.6~0.1.1.0.2.0.1.6~1.3~\
          16~",
    )
    .await;

    let shared = session.compare_versions(&NOSPECS, &NOSPECS).await.unwrap();
    assert_eq!(
        shared,
        vec![(
            VSpan::new(addr("1.1.0.1"), Span::new(addr("1.1"), off("0.8"))),
            VSpan::new(addr("1.1.0.2"), Span::new(addr("1.1"), off("0.8"))),
        )]
    );
    session.quit().await.unwrap();

    expect_sent(&sent(backend).await, "10~0~0~16~");
}

#[tokio::test]
async fn test_dump_state() {
    let (mut session, backend) = scripted(
        b"\nP0~39~g1~(0~h1~e2~w2~0~0~d2~0~0~c1~(1~h0~e2~w2~0~0~d2~0~0~c0~ih0~))16~",
    )
    .await;

    let dump = session.dump_state().await.unwrap();
    assert_eq!(dump.kind, DumpKind::Granf);
    let root = dump.root.as_ref().unwrap();
    assert_eq!(root.enftype, EnfType::Poom);
    assert_eq!(root.count(), 2);
    assert_eq!(
        root.children()[0].body,
        CrumBody::Bottom(BottomCrum::Home {
            homedoc: Address::new()
        })
    );
    session.quit().await.unwrap();

    expect_sent(&sent(backend).await, "39~16~");
}

#[tokio::test]
async fn test_account_and_create_node() {
    let (mut session, backend) = scripted(b"\nP0~34~38~0.1.1.0.1.1~16~").await;

    session.account(&addr("1.1.0.1")).await.unwrap();
    let node = session.create_node(&addr("1.1.0.1")).await.unwrap();
    assert_eq!(node, addr("1.1.0.1.1"));
    session.quit().await.unwrap();

    expect_sent(&sent(backend).await, "34~0.1.1.0.1~38~0.1.1.0.1~16~");
}

#[tokio::test]
async fn test_handshake_failure() {
    let (client, mut backend) = duplex(1024);
    backend.write_all(b"\nXX~").await.unwrap();

    let err = Session::connect(client).await.unwrap_err();
    assert!(matches!(
        err,
        FebeError::Protocol(ProtocolError::Handshake(_))
    ));
}

#[tokio::test]
async fn test_opcode_mismatch_is_fatal() {
    let (mut session, _backend) = scripted(b"\nP0~99~").await;

    let err = session.create_document().await.unwrap_err();
    assert!(matches!(
        err,
        FebeError::Protocol(ProtocolError::OpcodeMismatch { sent: 11, .. })
    ));
}

#[tokio::test]
async fn test_rejection_outside_follow_link_propagates() {
    let (mut session, _backend) = scripted(b"\nP0~?").await;

    let err = session.create_version(&addr("1.1.0.1")).await.unwrap_err();
    assert!(err.is_rejection());
}

#[tokio::test]
async fn test_backend_closes_mid_reply() {
    let (client, mut backend) = duplex(1024);
    backend.write_all(b"\nP0~11~0.1.1").await.unwrap();
    backend.shutdown().await.unwrap();

    let mut session = Session::connect(client).await.unwrap();
    let err = session.create_document().await.unwrap_err();
    assert!(matches!(
        err,
        FebeError::Protocol(ProtocolError::Closed { .. })
    ));
}

#[tokio::test]
async fn test_builder_chunk_limit_applies() {
    let (client, mut backend) = duplex(1024);
    backend
        .write_all(b"\nP0~11~0.1.1.0.1.0.1.0.1.0.1~")
        .await
        .unwrap();

    let mut session = Session::builder()
        .max_chunk_len(8)
        .connect(client)
        .await
        .unwrap();
    let err = session.create_document().await.unwrap_err();
    assert!(matches!(
        err,
        FebeError::Protocol(ProtocolError::ChunkTooLong { limit: 8, .. })
    ));
}
