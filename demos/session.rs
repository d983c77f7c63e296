//! Session Demo - a short editing session against a running backend.
//!
//! This example demonstrates:
//! - Connecting with the builder pattern
//! - Creating, opening and editing a document
//! - Versioning and comparing shared content
//! - Linking two regions and following the link
//!
//! # Running
//!
//! Start the backend listening on a TCP port, then:
//!
//! ```text
//! cargo run --example session -- 127.0.0.1:55146
//! ```

use febe_client::{Access, CopyMode, LinkEnd, Session, Span, SpecSet, VSpec, JUMP_TYPE};
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:55146".to_string());

    let stream = TcpStream::connect(&addr).await?;
    let mut session = Session::builder().trace_wire(true).connect(stream).await?;

    // A fresh document with one line of text
    let doc = session.create_document().await?;
    let handle = session
        .open_document(&doc, Access::ReadWrite, CopyMode::ConflictFail)
        .await?;
    session
        .insert(&handle, &"1.1".parse()?, &["Hello, docuverse!"])
        .await?;

    let whole = session.retrieve_vspanset(&handle).await?;
    println!("{doc} spans: {whole}");
    for item in session.retrieve_contents(&SpecSet::from(whole.clone())).await? {
        println!("  {item:?}");
    }

    // Version it and see what the two share
    let version = session.create_version(&doc).await?;
    let copied = session.retrieve_vspanset(&version).await?;
    let shared = session
        .compare_versions(&SpecSet::from(whole), &SpecSet::from(copied))
        .await?;
    for (a, b) in &shared {
        println!("shared: {} <-> {}", a.span, b.span);
    }

    // Link "Hello" to the version's copy of "docuverse"
    let source = VSpec::new(handle.clone(), [Span::new("1.1".parse()?, "0.5".parse()?)]);
    let target = VSpec::new(version.clone(), [Span::new("1.8".parse()?, "0.9".parse()?)]);
    let link = session
        .create_link(
            &handle,
            &SpecSet::from(source),
            &SpecSet::from(target),
            &SpecSet::from(JUMP_TYPE.clone()),
        )
        .await?;
    println!("link {link}");

    let to = session.follow_link(&link, LinkEnd::Target).await?;
    println!("target end: {}", to.into_specset());

    session.close_document(&handle).await?;
    session.quit().await?;
    Ok(())
}
