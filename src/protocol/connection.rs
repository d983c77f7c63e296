//! Handshake and command dispatch over a duplex byte stream.
//!
//! ```text
//! client -> "\nP0~"                 handshake
//! backend -> <anything>\nP0~        (or P0\n)
//! client -> <opcode>~<arg>...       command
//! backend -> <opcode>~<reply>...    echo, then typed reply
//! ```
//!
//! One request is in flight at a time; every method borrows the connection
//! mutably for the whole exchange.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use super::opcode::Opcode;
use crate::codec::{encode_number, parse_number, WireReader, WireValue};
use crate::config::SessionConfig;
use crate::error::{FebeError, ProtocolError, Result};

/// Bytes sent to open the conversation.
pub const HANDSHAKE_REQUEST: &[u8] = b"\nP0~";

/// Protocol identifier the backend must answer with.
pub const PROTOCOL_TAG: &[u8; 2] = b"P0";

/// A live FeBe connection.
#[derive(Debug)]
pub struct Connection<S> {
    reader: WireReader<BufReader<S>>,
    config: SessionConfig,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    /// Wrap a stream. No bytes are exchanged until [`handshake`](Self::handshake).
    pub fn new(stream: S, config: SessionConfig) -> Self {
        let buffered = BufReader::with_capacity(config.read_buffer.max(1), stream);
        Self {
            reader: WireReader::with_max_chunk_len(buffered, config.max_chunk_len),
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Reader for the typed reply following a command.
    pub fn reader(&mut self) -> &mut WireReader<BufReader<S>> {
        &mut self.reader
    }

    /// Perform the 88.1 handshake. Any deviation is fatal.
    pub async fn handshake(&mut self) -> Result<()> {
        self.write_bytes(HANDSHAKE_REQUEST).await?;

        let mut discarded = 0usize;
        loop {
            let b = self.handshake_byte().await?;
            if b == b'\n' {
                break;
            }
            discarded += 1;
            if discarded > self.config.max_preamble_len {
                return Err(ProtocolError::Handshake(format!(
                    "no newline within {} bytes",
                    self.config.max_preamble_len
                ))
                .into());
            }
        }

        let tag = [self.handshake_byte().await?, self.handshake_byte().await?];
        let end = self.handshake_byte().await?;
        if &tag != PROTOCOL_TAG || !(end == b'~' || end == b'\n') {
            return Err(ProtocolError::Handshake(format!(
                "backend does not speak 88.1 (got {:?})",
                String::from_utf8_lossy(&[tag[0], tag[1], end])
            ))
            .into());
        }

        tracing::debug!(discarded, "handshake complete");
        Ok(())
    }

    async fn handshake_byte(&mut self) -> Result<u8> {
        match self.reader.read_byte("handshake").await {
            Err(FebeError::Protocol(ProtocolError::Closed { .. })) => Err(ProtocolError::Handshake(
                "backend closed the stream during handshake".to_string(),
            )
            .into()),
            other => other,
        }
    }

    /// Send `opcode` with `args` and verify the echoed opcode.
    ///
    /// The typed reply, if any, is left on [`reader`](Self::reader).
    pub async fn command(&mut self, opcode: Opcode, args: &[WireValue]) -> Result<()> {
        let mut buf = BytesMut::with_capacity(64);
        encode_number(&mut buf, u64::from(opcode.code()));
        for arg in args {
            arg.encode(&mut buf)?;
        }

        tracing::debug!(opcode = opcode.code(), name = opcode.name(), len = buf.len(), "sending command");
        if self.config.trace_wire {
            tracing::trace!(bytes = %String::from_utf8_lossy(&buf), "outbound");
        }
        self.write_bytes(&buf).await?;

        self.expect_echo(opcode).await
    }

    async fn expect_echo(&mut self, opcode: Opcode) -> Result<()> {
        let sent = opcode.code();
        let context = format!("response to opcode {sent}");
        let chunk = self.reader.read_chunk(&context).await?;
        match parse_number(&chunk) {
            Ok(received) if received == u64::from(sent) => Ok(()),
            Ok(_) => Err(ProtocolError::OpcodeMismatch {
                sent,
                received: chunk,
            }
            .into()),
            Err(_) => Err(ProtocolError::Unreadable {
                opcode: sent,
                context: format!("echo {chunk:?}"),
            }
            .into()),
        }
    }

    /// Shut down the write side and drop the stream.
    pub async fn close(mut self) -> Result<()> {
        self.reader.get_mut().get_mut().shutdown().await?;
        Ok(())
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut().get_mut();
        stream.write_all(bytes).await?;
        stream.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, DuplexStream};

    async fn connected(backend_script: &[u8]) -> (Connection<DuplexStream>, DuplexStream) {
        let (client, mut server) = duplex(4096);
        server.write_all(backend_script).await.unwrap();
        (Connection::new(client, SessionConfig::default()), server)
    }

    #[tokio::test]
    async fn test_handshake_sends_request_and_accepts_reply() {
        let (mut conn, mut server) = connected(b"banner\nP0~").await;
        conn.handshake().await.unwrap();

        let mut sent = [0u8; 4];
        server.read_exact(&mut sent).await.unwrap();
        assert_eq!(&sent, HANDSHAKE_REQUEST);
    }

    #[tokio::test]
    async fn test_handshake_accepts_newline_terminator() {
        let (mut conn, _server) = connected(b"\nP0\n").await;
        conn.handshake().await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_wrong_tag() {
        let (mut conn, _server) = connected(b"\nP1~").await;
        let err = conn.handshake().await.unwrap_err();
        assert!(matches!(
            err,
            FebeError::Protocol(ProtocolError::Handshake(_))
        ));
    }

    #[tokio::test]
    async fn test_handshake_stream_closes_without_newline() {
        let (client, mut server) = duplex(64);
        server.write_all(b"no newline here").await.unwrap();
        server.shutdown().await.unwrap();
        let mut conn = Connection::new(client, SessionConfig::default());
        let err = conn.handshake().await.unwrap_err();
        assert!(err.to_string().contains("handshake"));
    }

    #[tokio::test]
    async fn test_handshake_preamble_limit() {
        let (client, mut server) = duplex(4096);
        server.write_all(&[b'x'; 32]).await.unwrap();
        let config = SessionConfig {
            max_preamble_len: 8,
            ..SessionConfig::default()
        };
        let mut conn = Connection::new(client, config);
        let err = conn.handshake().await.unwrap_err();
        assert!(err.to_string().contains("within 8 bytes"));
    }

    #[tokio::test]
    async fn test_command_writes_opcode_and_args() {
        let (mut conn, mut server) = connected(b"36~").await;
        let doc: crate::Address = "1.1.0.1".parse().unwrap();
        conn.command(Opcode::CloseDocument, &[doc.into()])
            .await
            .unwrap();

        let mut sent = vec![0u8; 13];
        server.read_exact(&mut sent).await.unwrap();
        assert_eq!(&sent, b"36~0.1.1.0.1~");
    }

    #[tokio::test]
    async fn test_command_echo_mismatch() {
        let (mut conn, _server) = connected(b"99~").await;
        let err = conn.command(Opcode::CreateDocument, &[]).await.unwrap_err();
        assert!(matches!(
            err,
            FebeError::Protocol(ProtocolError::OpcodeMismatch { sent: 11, .. })
        ));
        assert!(err.to_string().contains("opcode 11"));
    }

    #[tokio::test]
    async fn test_command_unreadable_echo() {
        let (mut conn, _server) = connected(b"zz~").await;
        let err = conn.command(Opcode::CreateDocument, &[]).await.unwrap_err();
        assert!(matches!(
            err,
            FebeError::Protocol(ProtocolError::Unreadable { opcode: 11, .. })
        ));
    }

    #[tokio::test]
    async fn test_command_rejected() {
        let (mut conn, _server) = connected(b"?").await;
        let err = conn.command(Opcode::FollowLink, &[]).await.unwrap_err();
        assert!(err.is_rejection());
        assert!(err.to_string().contains("opcode 18"));
    }

    #[tokio::test]
    async fn test_unencodable_argument_writes_nothing() {
        let (mut conn, mut server) = connected(b"").await;
        let err = conn
            .command(Opcode::Insert, &[WireValue::from("\u{2603}")])
            .await
            .unwrap_err();
        assert!(matches!(err, FebeError::Malformed(_)));

        conn.close().await.unwrap();
        let mut rest = Vec::new();
        server.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }
}
