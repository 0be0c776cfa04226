//! Reply shapes and their wire encodings.

use std::io::Write;

use bluebridge_wire::{WireError, write_bool, write_frame};

/// One reply to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A single framed status line.
    Status(String),
    /// An enumeration: one frame per line, terminated by an empty frame.
    Listing(Vec<String>),
    /// A single raw boolean byte (byte protocol profile).
    Flag(bool),
}

/// Whether the session loop continues after the reply is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Reply plus loop-control decision for one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub reply: Reply,
    pub flow: Flow,
}

impl Outcome {
    /// Status-line reply; the loop continues.
    #[must_use]
    pub fn status(line: impl Into<String>) -> Self {
        Self {
            reply: Reply::Status(line.into()),
            flow: Flow::Continue,
        }
    }

    /// Enumeration reply; the loop continues.
    #[must_use]
    pub fn listing(lines: Vec<String>) -> Self {
        Self {
            reply: Reply::Listing(lines),
            flow: Flow::Continue,
        }
    }

    /// Boolean byte reply; the loop continues.
    #[must_use]
    pub fn flag(value: bool) -> Self {
        Self {
            reply: Reply::Flag(value),
            flow: Flow::Continue,
        }
    }

    /// Status-line reply after which the loop terminates.
    #[must_use]
    pub fn closing(line: impl Into<String>) -> Self {
        Self {
            reply: Reply::Status(line.into()),
            flow: Flow::Close,
        }
    }
}

/// Encodes one reply onto the client stream.
///
/// # Errors
///
/// Returns a [`WireError`] when the transport write fails; the caller treats
/// that as a connection fault.
pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> Result<(), WireError> {
    match reply {
        Reply::Status(line) => write_frame(writer, line),
        Reply::Listing(lines) => {
            for line in lines {
                write_frame(writer, line)?;
            }
            write_frame(writer, "")
        }
        Reply::Flag(value) => write_bool(writer, *value),
    }
}
