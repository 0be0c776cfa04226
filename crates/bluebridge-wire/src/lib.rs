//! Wire framing for the bluebridge command protocol.
//!
//! Requests and text replies travel as frames: a big-endian `u16` length
//! prefix followed by that many bytes of UTF-8 text. An empty frame (length
//! zero) is valid and marks the end of an enumeration reply. The byte
//! protocol profile additionally answers commands with a single raw boolean
//! byte, written without any length prefix.
//!
//! Frame reads distinguish a clean end-of-stream (the peer closed between
//! frames) from a truncated frame (the peer died mid-frame); only the former
//! is a normal outcome.

use std::io::{self, Read, Write};

use thiserror::Error;

/// Largest frame payload the length prefix can carry.
pub const MAX_FRAME_BYTES: usize = u16::MAX as usize;

/// Boolean reply byte for `true`.
pub const BOOL_TRUE: u8 = 0x01;

/// Boolean reply byte for `false`.
pub const BOOL_FALSE: u8 = 0x00;

/// Errors surfaced while reading or writing frames.
#[derive(Debug, Error)]
pub enum WireError {
    /// The stream ended inside a frame header or payload.
    #[error("stream ended mid-frame after {received} of {expected} bytes")]
    Truncated { expected: usize, received: usize },

    /// Frame payload was not valid UTF-8.
    #[error("frame payload is not valid UTF-8")]
    InvalidUtf8(#[source] std::string::FromUtf8Error),

    /// Frame payload exceeds what the length prefix can represent.
    #[error("frame payload of {size} bytes exceeds the {MAX_FRAME_BYTES} byte limit")]
    FrameTooLarge { size: usize },

    /// Underlying transport failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Reads one frame, returning `None` on a clean end-of-stream.
///
/// # Errors
///
/// Returns [`WireError::Truncated`] when the peer disconnects mid-frame,
/// [`WireError::InvalidUtf8`] for non-UTF-8 payloads, and [`WireError::Io`]
/// for transport failures.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<String>, WireError> {
    let mut header = [0_u8; 2];
    if !fill(reader, &mut header)? {
        return Ok(None);
    }

    let length = usize::from(u16::from_be_bytes(header));
    let mut payload = vec![0_u8; length];
    if length > 0 {
        fill_rest(reader, &mut payload)?;
    }

    String::from_utf8(payload)
        .map(Some)
        .map_err(WireError::InvalidUtf8)
}

/// Writes one text frame.
///
/// # Errors
///
/// Returns [`WireError::FrameTooLarge`] when the payload does not fit the
/// length prefix, or [`WireError::Io`] for transport failures.
pub fn write_frame<W: Write>(writer: &mut W, line: &str) -> Result<(), WireError> {
    let payload = line.as_bytes();
    let Ok(length) = u16::try_from(payload.len()) else {
        return Err(WireError::FrameTooLarge {
            size: payload.len(),
        });
    };
    writer.write_all(&length.to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Writes a single boolean reply byte (byte protocol profile).
///
/// # Errors
///
/// Returns [`WireError::Io`] for transport failures.
pub fn write_bool<W: Write>(writer: &mut W, value: bool) -> Result<(), WireError> {
    let byte = if value { BOOL_TRUE } else { BOOL_FALSE };
    writer.write_all(&[byte])?;
    writer.flush()?;
    Ok(())
}

/// Reads a single boolean reply byte, returning `None` on a clean
/// end-of-stream. Any non-zero byte decodes as `true`.
///
/// # Errors
///
/// Returns [`WireError::Io`] for transport failures.
pub fn read_bool<R: Read>(reader: &mut R) -> Result<Option<bool>, WireError> {
    let mut byte = [0_u8; 1];
    if !fill(reader, &mut byte)? {
        return Ok(None);
    }
    Ok(Some(byte[0] != BOOL_FALSE))
}

/// Fills `buf` completely. Returns `Ok(false)` when the stream is already at
/// end-of-stream before the first byte; errors when it ends part-way.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool, WireError> {
    let mut received = 0;
    while received < buf.len() {
        match reader.read(&mut buf[received..]) {
            Ok(0) if received == 0 => return Ok(false),
            Ok(0) => {
                return Err(WireError::Truncated {
                    expected: buf.len(),
                    received,
                });
            }
            Ok(read) => received += read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error.into()),
        }
    }
    Ok(true)
}

/// Like [`fill`] but an immediate end-of-stream is also truncation: the
/// caller has already consumed the frame header.
fn fill_rest<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), WireError> {
    let mut received = 0;
    while received < buf.len() {
        match reader.read(&mut buf[received..]) {
            Ok(0) => {
                return Err(WireError::Truncated {
                    expected: buf.len(),
                    received,
                });
            }
            Ok(read) => received += read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    fn frame_bytes(line: &str) -> Vec<u8> {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, line).unwrap();
        buffer
    }

    #[rstest]
    #[case("")]
    #[case("LIST")]
    #[case("SEND AA:BB:CC:DD:EE:FF hello world")]
    #[case("ünïcode påyload")]
    fn frames_round_trip(#[case] line: &str) {
        let bytes = frame_bytes(line);
        let mut cursor = Cursor::new(bytes);
        let decoded = read_frame(&mut cursor).unwrap();
        assert_eq!(decoded.as_deref(), Some(line));
    }

    #[test]
    fn clean_eof_reads_as_none() {
        let mut cursor = Cursor::new(Vec::new());
        assert!(read_frame(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn eof_inside_header_is_truncation() {
        let mut cursor = Cursor::new(vec![0x00]);
        let error = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(error, WireError::Truncated { .. }));
    }

    #[test]
    fn eof_inside_payload_is_truncation() {
        let mut bytes = frame_bytes("EXIT");
        bytes.truncate(bytes.len() - 2);
        let mut cursor = Cursor::new(bytes);
        let error = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(error, WireError::Truncated { .. }));
    }

    #[test]
    fn rejects_invalid_utf8_payload() {
        let bytes = vec![0x00, 0x02, 0xff, 0xfe];
        let mut cursor = Cursor::new(bytes);
        let error = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(error, WireError::InvalidUtf8(_)));
    }

    #[test]
    fn oversized_payload_is_rejected_before_writing() {
        let line = "x".repeat(MAX_FRAME_BYTES + 1);
        let mut buffer = Vec::new();
        let error = write_frame(&mut buffer, &line).unwrap_err();
        assert!(matches!(error, WireError::FrameTooLarge { .. }));
        assert!(buffer.is_empty());
    }

    #[test]
    fn bool_bytes_round_trip() {
        let mut buffer = Vec::new();
        write_bool(&mut buffer, true).unwrap();
        write_bool(&mut buffer, false).unwrap();
        assert_eq!(buffer, vec![BOOL_TRUE, BOOL_FALSE]);

        let mut cursor = Cursor::new(buffer);
        assert_eq!(read_bool(&mut cursor).unwrap(), Some(true));
        assert_eq!(read_bool(&mut cursor).unwrap(), Some(false));
        assert_eq!(read_bool(&mut cursor).unwrap(), None);
    }

    #[test]
    fn empty_frame_marks_enumeration_end() {
        let mut bytes = frame_bytes("Device A [AA:BB:CC:DD:EE:FF]");
        bytes.extend_from_slice(&frame_bytes(""));
        let mut cursor = Cursor::new(bytes);
        assert!(read_frame(&mut cursor).unwrap().is_some());
        assert_eq!(read_frame(&mut cursor).unwrap().as_deref(), Some(""));
    }
}
