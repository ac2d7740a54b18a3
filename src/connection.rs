// ABOUTME: Framed PDU transport over one TCP stream with buffered writes
// ABOUTME: Bad frames are surfaced, not fatal; reads resynchronize past them

use bytes::{Buf, Bytes, BytesMut};
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::warn;

use crate::codec::{check_frame, CodecOptions, FrameCheck, PDU_HEADER_LENGTH};
use crate::datatypes::Pdu;
use crate::error::{SmppError, SmppResult};

/// One inbound frame: either a decoded PDU or the raw bytes of a frame
/// that failed to decode, with enough header context to nack it.
#[derive(Debug)]
pub(crate) enum Inbound {
    Pdu(Pdu, Bytes),
    Malformed {
        /// Sequence number from the frame header, or 0 when the header
        /// itself was unreadable (generic_nack uses 0 for unidentifiable
        /// PDUs).
        sequence_number: u32,
        error: SmppError,
        frame: Bytes,
    },
}

/// A TCP connection carrying SMPP frames.
///
/// Reads accumulate into a buffer until a complete frame (per its
/// `command_length`) is present, so a cancelled read never loses a
/// partial frame. Writes go through a buffered writer and are flushed
/// per PDU.
#[derive(Debug)]
pub(crate) struct Connection {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
    options: CodecOptions,
    /// Remaining octets of an oversized frame being skipped.
    discard: usize,
}

impl Connection {
    pub(crate) fn new(socket: TcpStream, options: CodecOptions) -> Connection {
        Connection {
            stream: BufWriter::new(socket),
            buffer: BytesMut::with_capacity(4 * 1024),
            options,
            discard: 0,
        }
    }

    /// Read the next frame. `Ok(None)` is a clean end of stream; frame
    /// or decode problems come back as [`Inbound::Malformed`] so the
    /// session can nack them and keep reading.
    pub(crate) async fn read_pdu(&mut self) -> SmppResult<Option<Inbound>> {
        loop {
            while self.discard > 0 && !self.buffer.is_empty() {
                let chunk = self.discard.min(self.buffer.len());
                self.buffer.advance(chunk);
                self.discard -= chunk;
            }

            if self.discard == 0 {
                match check_frame(&self.buffer, self.options.max_pdu_size) {
                    FrameCheck::Complete(len) => {
                        let frame = self.buffer.split_to(len).freeze();
                        let inbound = match Pdu::decode(&frame, &self.options) {
                            Ok((pdu, _)) => Inbound::Pdu(pdu, frame),
                            Err(error) => Inbound::Malformed {
                                sequence_number: sequence_of(&frame),
                                error,
                                frame,
                            },
                        };
                        return Ok(Some(inbound));
                    }
                    FrameCheck::Invalid(len) if self.buffer.len() >= len => {
                        let frame = self.buffer.split_to(len).freeze();
                        let declared = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]);
                        return Ok(Some(Inbound::Malformed {
                            sequence_number: sequence_of(&frame),
                            error: SmppError::MalformedPdu {
                                reason: format!(
                                    "command_length {declared} is below the 16-byte minimum"
                                ),
                                offset: 0,
                            },
                            frame,
                        }));
                    }
                    FrameCheck::TooLarge(declared) if self.buffer.len() >= PDU_HEADER_LENGTH => {
                        // Keep the header for the nack, skip the rest of
                        // the frame as it streams in.
                        let have = self.buffer.len().min(declared as usize);
                        let frame = self.buffer.split_to(have).freeze();
                        self.discard = declared as usize - have;
                        warn!(
                            declared,
                            max = self.options.max_pdu_size,
                            "skipping oversized inbound frame"
                        );
                        return Ok(Some(Inbound::Malformed {
                            sequence_number: sequence_of(&frame),
                            error: SmppError::FrameTooLarge {
                                length: declared,
                                max: self.options.max_pdu_size,
                            },
                            frame,
                        }));
                    }
                    // Need more bytes before a verdict.
                    _ => {}
                }
            }

            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                if self.buffer.is_empty() && self.discard == 0 {
                    return Ok(None);
                }
                return Err(SmppError::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed the connection mid-frame",
                )));
            }
        }
    }

    /// Write one encoded PDU and flush it to the socket.
    pub(crate) async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await
    }

    /// Best-effort orderly TCP shutdown.
    pub(crate) async fn shutdown(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}

fn sequence_of(frame: &[u8]) -> u32 {
    if frame.len() >= PDU_HEADER_LENGTH {
        u32::from_be_bytes([frame[12], frame[13], frame[14], frame[15]])
    } else {
        0
    }
}
