use std::fmt::{self, Display, Formatter};
use std::io;

/// Information about a parse failure.
///
/// Mirrors `mpegts-io`'s `ErrorDetails` enum: every fatal condition names
/// what went wrong. Recoverable conditions (continuity gaps, auto-latch
/// misses, and the like) are handled in place by logging, not by raising.
#[derive(Debug)]
pub enum ErrorDetails {
    /// A [`crate::slice_reader::SliceReader`] read past the end of its slice.
    /// The [`usize`] is the length of the offending read.
    PacketOverrun(usize),
    /// MPEG-TS packets must begin with sync byte `0x47`.
    LostSync,
    /// An adaptation field's declared length was inconsistent with the
    /// remaining packet bytes.
    BadAdaptationHeader,
    /// A PES optional header's declared additional-header length was
    /// inconsistent with the remaining PES bytes.
    BadPesHeader,
    /// The configured teletext page number was outside 100..899.
    PageOutOfRange(u16),
}

/// Error type encapsulating all possible parser/orchestration failures.
#[derive(Debug)]
pub struct Error {
    /// Byte offset within the packet (or `0` if not packet-scoped) the
    /// error was encountered at.
    pub location: usize,
    /// Information about the error.
    pub details: ErrorDetails,
}

impl Error {
    pub(crate) fn new(location: usize, details: ErrorDetails) -> Self {
        Self { location, details }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.details {
            ErrorDetails::PacketOverrun(len) => {
                write!(f, "read of {len} bytes overran packet at offset {}", self.location)
            }
            ErrorDetails::LostSync => write!(f, "lost TS sync at offset {}", self.location),
            ErrorDetails::BadAdaptationHeader => {
                write!(f, "malformed adaptation field at offset {}", self.location)
            }
            ErrorDetails::BadPesHeader => write!(f, "malformed PES header at offset {}", self.location),
            ErrorDetails::PageOutOfRange(page) => {
                write!(f, "teletext page {page} is out of range 100..899")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Top-level error, adding the I/O failures that can occur while driving
/// the pipeline from a byte stream.
#[derive(Debug)]
pub enum RunError {
    /// A parse error surfaced by the demux/PES layers.
    Parse(Error),
    /// Reading the input stream failed.
    Io(io::Error),
}

impl From<Error> for RunError {
    fn from(e: Error) -> Self {
        RunError::Parse(e)
    }
}

impl From<io::Error> for RunError {
    fn from(e: io::Error) -> Self {
        RunError::Io(e)
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Parse(e) => Display::fmt(e, f),
            RunError::Io(e) => Display::fmt(e, f),
        }
    }
}

impl std::error::Error for RunError {}

/// [`std::result::Result`] alias used throughout the parser.
pub type Result<T> = std::result::Result<T, Error>;
