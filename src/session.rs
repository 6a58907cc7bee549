//! Client session
//!
//! A [`Session`] owns the stream to the server from the connection handshake
//! until it is closed. Requests are strictly sequential: every request is
//! followed by reading its reply before the next one is sent.

use crate::error::ProtocolError;
use crate::protocol::*;
use crate::security::Credential;
use std::fmt;
use std::io::{Read, Write};

/// An established connection and the setup data the server sent for it
pub struct Session<S: Read + Write> {
    stream: S,
    setup: SetupInfo,
    encoder: RequestEncoder,
    sequence: u16,
}

impl<S: Read + Write> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("byte_order", &self.byte_order())
            .field("vendor", &self.setup.vendor)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

impl<S: Read + Write> Session<S> {
    /// Perform the connection handshake in the native byte order
    pub fn handshake(stream: S, credential: Credential) -> Result<Self, ProtocolError> {
        Self::handshake_with_byte_order(stream, credential, ByteOrder::native())
    }

    pub fn handshake_with_byte_order(
        mut stream: S,
        credential: Credential,
        byte_order: ByteOrder,
    ) -> Result<Self, ProtocolError> {
        let encoder = RequestEncoder::new(byte_order);

        {
            let request = encoder.encode_setup_request(&credential.name, &credential.data);
            drop(credential);
            log::debug!(
                "Sending {} byte setup request ({:?})",
                request.len(),
                byte_order
            );
            write_all(&mut stream, &request)?;
        }

        let mut header = [0u8; SetupResponseHeader::SIZE];
        read_exact(&mut stream, &mut header)?;
        let header = SetupResponseHeader::decode(&mut WireReader::new(&header, byte_order))?;

        let mut data = vec![0u8; header.additional_len()];
        read_exact(&mut stream, &mut data)?;
        log::debug!(
            "Setup response status {} with {} bytes of data",
            header.status,
            data.len()
        );

        match SetupStatus::from_u8(header.status) {
            Some(SetupStatus::Success) => {
                let setup = SetupInfo::decode(
                    &data,
                    byte_order,
                    header.protocol_major_version,
                    header.protocol_minor_version,
                )?;

                Ok(Session {
                    stream,
                    setup,
                    encoder,
                    sequence: 0,
                })
            }
            Some(SetupStatus::Failed) => {
                let len = (header.reason_length as usize).min(data.len());
                Err(ProtocolError::Rejected {
                    reason: reason_text(&data[..len]),
                })
            }
            Some(SetupStatus::Authenticate) => Err(ProtocolError::Rejected {
                reason: reason_text(&data),
            }),
            None => Err(ProtocolError::UnknownSetupStatus(header.status)),
        }
    }

    pub fn setup(&self) -> &SetupInfo {
        &self.setup
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.encoder.byte_order()
    }

    pub fn encoder(&self) -> &RequestEncoder {
        &self.encoder
    }

    /// Sequence number of the last request sent
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Send a complete request, returning its sequence number
    pub fn send_request(&mut self, request: &[u8]) -> Result<u16, ProtocolError> {
        write_all(&mut self.stream, request)?;
        self.sequence = self.sequence.wrapping_add(1);
        log::debug!(
            "Sent request opcode {} ({} bytes, sequence {})",
            request.first().copied().unwrap_or(0),
            request.len(),
            self.sequence
        );
        Ok(self.sequence)
    }

    /// Read one complete reply: the 32-byte block and any additional data
    ///
    /// An error packet in place of the reply becomes [`ProtocolError::Server`].
    pub fn read_reply(&mut self, sequence: u16) -> Result<Vec<u8>, ProtocolError> {
        let mut reply = vec![0u8; REPLY_SIZE];
        read_exact(&mut self.stream, &mut reply)?;

        let byte_order = self.byte_order();
        let header = ReplyHeader::decode(&mut WireReader::new(&reply, byte_order))?;

        match header.status {
            reply_status::REPLY => {}
            reply_status::ERROR => {
                let error = X11Error::decode(&mut WireReader::new(&reply, byte_order))?;
                log::debug!("Request {} failed: {}", sequence, error);
                return Err(ProtocolError::Server(error));
            }
            status => return Err(ProtocolError::UnexpectedStatus(status)),
        }

        if header.sequence != sequence {
            log::warn!(
                "Reply sequence number {} does not match request {}",
                header.sequence,
                sequence
            );
        }

        // The declared length is not trusted for allocation; the buffer only
        // grows as data actually arrives.
        let additional = header.additional_len();
        if additional > 0 {
            let received = (&mut self.stream)
                .take(additional as u64)
                .read_to_end(&mut reply)
                .map_err(|e| ProtocolError::from_read(e, additional))?;
            if received < additional {
                return Err(ProtocolError::Truncated {
                    expected: additional,
                });
            }
        }

        Ok(reply)
    }

    /// Send a request and read its reply
    pub fn round_trip(&mut self, request: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        let sequence = self.send_request(request)?;
        self.read_reply(sequence)
    }

    /// Close the connection, keeping the setup data
    pub fn close(self) -> SetupInfo {
        log::debug!("Closing connection after {} requests", self.sequence);
        drop(self.stream);
        self.setup
    }
}

/// Write the whole buffer; interrupted and partial writes are retried
fn write_all<S: Write>(stream: &mut S, buf: &[u8]) -> Result<(), ProtocolError> {
    stream.write_all(buf).map_err(ProtocolError::WriteFailed)?;
    stream.flush().map_err(ProtocolError::WriteFailed)
}

/// Fill the whole buffer; interrupted and partial reads are retried
fn read_exact<S: Read>(stream: &mut S, buf: &mut [u8]) -> Result<(), ProtocolError> {
    stream
        .read_exact(buf)
        .map_err(|e| ProtocolError::from_read(e, buf.len()))
}

fn reason_text(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    String::from_utf8_lossy(&bytes[..end]).trim_end().to_string()
}
