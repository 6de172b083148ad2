// ABOUTME: Framed PDU I/O over a TcpStream with per-operation deadlines
// ABOUTME: Whole connection during bind, split into read/write halves for the engines

use crate::codec::CodecError;
use crate::error::{SmppError, SmppResult};
use crate::pdu::Pdu;
use bytes::{Buf, BytesMut};
use std::io::{self, Cursor};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};

/// An authenticated (or about-to-be-authenticated) SMSC connection.
///
/// Owned whole during the bind handshake; afterwards [`Connection::split`]
/// hands the read half to the reader engine and the write half to the
/// writer engine. `system_id` is filled from the bind response.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    system_id: String,
}

/// Pull one frame out of `buffer` if a complete one is present.
fn parse_buffered(buffer: &mut BytesMut) -> Result<Option<Pdu>, CodecError> {
    let mut cursor = Cursor::new(&buffer[..]);
    match Pdu::check(&mut cursor) {
        Ok(()) => {
            let len = cursor.position() as usize;
            cursor.set_position(0);
            // The frame is complete per its command_length; a body that
            // still runs short is malformed, and must not surface as
            // "wait for more bytes" or this loop would never advance.
            let pdu = Pdu::parse(&mut cursor).map_err(|err| match err {
                CodecError::Incomplete => CodecError::TruncatedBody,
                other => other,
            })?;
            buffer.advance(len);
            Ok(Some(pdu))
        }
        // Expected steady-state: more bytes needed from the socket.
        Err(CodecError::Incomplete) => Ok(None),
        Err(e) => Err(e),
    }
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4 * 1024),
            system_id: String::new(),
        }
    }

    /// The peer's system_id from the bind response; empty before bind.
    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    pub(crate) fn set_system_id(&mut self, system_id: String) {
        self.system_id = system_id;
    }

    /// Read one PDU, waiting for as many socket reads as it takes.
    pub async fn read_pdu(&mut self) -> SmppResult<Pdu> {
        loop {
            if let Some(pdu) = parse_buffered(&mut self.buffer)? {
                return Ok(pdu);
            }
            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                // Clean shutdown only when no frame was cut in half.
                return if self.buffer.is_empty() {
                    Err(SmppError::ConnectionClosed)
                } else {
                    Err(SmppError::Io(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "connection reset by peer mid-frame",
                    )))
                };
            }
        }
    }

    pub async fn write_pdu(&mut self, pdu: &Pdu) -> SmppResult<()> {
        let bytes = pdu.to_bytes()?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Split into the engines' halves. `write_timeout` of zero disables the
    /// write deadline.
    pub(crate) fn split(self, write_timeout: Duration) -> (PduReader, PduWriter) {
        let system_id = self.system_id;
        let (read_half, write_half) = self.stream.into_split();
        (
            PduReader {
                half: read_half,
                buffer: self.buffer,
                system_id,
            },
            PduWriter {
                half: write_half,
                timeout: write_timeout,
            },
        )
    }
}

/// The reader engine's half: buffered, parse-on-demand.
#[derive(Debug)]
pub struct PduReader {
    half: OwnedReadHalf,
    buffer: BytesMut,
    system_id: String,
}

impl PduReader {
    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    /// Read one PDU. The caller bounds this with its read deadline.
    pub async fn read_pdu(&mut self) -> SmppResult<Pdu> {
        loop {
            if let Some(pdu) = parse_buffered(&mut self.buffer)? {
                return Ok(pdu);
            }
            if 0 == self.half.read_buf(&mut self.buffer).await? {
                return if self.buffer.is_empty() {
                    Err(SmppError::ConnectionClosed)
                } else {
                    Err(SmppError::Io(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "connection reset by peer mid-frame",
                    )))
                };
            }
        }
    }
}

/// A write failure annotated with how many octets made it out before the
/// error; the writer's triage branches on that count.
#[derive(Debug)]
pub struct WriteError {
    pub written: usize,
    pub source: io::Error,
}

/// The writer engine's half, with the deadline-and-retry write policy.
#[derive(Debug)]
pub struct PduWriter {
    half: OwnedWriteHalf,
    timeout: Duration,
}

impl PduWriter {
    pub fn set_write_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Write the whole buffer under the configured deadline. On a first
    /// attempt that fails without writing a single octet, the deadline is
    /// doubled and the write retried exactly once.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<usize, WriteError> {
        if self.timeout.is_zero() {
            return self.write_all_plain(bytes).await;
        }

        match self.write_all_deadline(bytes, self.timeout).await {
            Err(e) if e.written == 0 => self.write_all_deadline(bytes, self.timeout * 2).await,
            other => other,
        }
    }

    async fn write_all_plain(&mut self, bytes: &[u8]) -> Result<usize, WriteError> {
        let mut written = 0;
        while written < bytes.len() {
            match self.half.write(&bytes[written..]).await {
                Ok(0) => {
                    return Err(WriteError {
                        written,
                        source: io::ErrorKind::WriteZero.into(),
                    })
                }
                Ok(n) => written += n,
                Err(source) => return Err(WriteError { written, source }),
            }
        }
        Ok(written)
    }

    async fn write_all_deadline(
        &mut self,
        bytes: &[u8],
        timeout: Duration,
    ) -> Result<usize, WriteError> {
        let deadline = Instant::now() + timeout;
        let mut written = 0;
        while written < bytes.len() {
            match timeout_at(deadline, self.half.write(&bytes[written..])).await {
                Ok(Ok(0)) => {
                    return Err(WriteError {
                        written,
                        source: io::ErrorKind::WriteZero.into(),
                    })
                }
                Ok(Ok(n)) => written += n,
                Ok(Err(source)) => return Err(WriteError { written, source }),
                Err(_) => {
                    return Err(WriteError {
                        written,
                        source: io::ErrorKind::TimedOut.into(),
                    })
                }
            }
        }
        Ok(written)
    }

    /// Close the connection: send FIN and stop accepting writes. The read
    /// half observes the close through its pending read.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.half.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::EnquireLink;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn frames_survive_arbitrary_tcp_segmentation() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let pdu = Pdu::EnquireLink(EnquireLink { sequence_number: 9 });
        let bytes = pdu.to_bytes().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            // dribble the frame one octet at a time
            for b in bytes.iter() {
                stream.write_all(&[*b]).await.unwrap();
                stream.flush().await.unwrap();
            }
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut conn = Connection::new(stream);
        let received = conn.read_pdu().await.unwrap();
        assert_eq!(received, pdu);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_complete_frame_is_an_error_not_a_stall() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // A submit_sm whose command_length is honest but whose body stops
        // after the service_type: complete on the wire, truncated inside.
        let frame = [
            0x00, 0x00, 0x00, 0x11, // command_length = 17
            0x00, 0x00, 0x00, 0x04, // submit_sm
            0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x01, //
            0x00, // empty service_type, then nothing
        ];
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(&frame).await.unwrap();
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut conn = Connection::new(stream);
        assert!(matches!(
            conn.read_pdu().await,
            Err(SmppError::Codec(CodecError::TruncatedBody))
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn clean_peer_close_reports_connection_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut conn = Connection::new(stream);
        assert!(matches!(
            conn.read_pdu().await,
            Err(SmppError::ConnectionClosed)
        ));
        server.await.unwrap();
    }
}
