// Error types for hybf

use std::error::Error;
use std::fmt;
use std::io;

use crate::data::FormatType;

pub type Result<T> = std::result::Result<T, FormatError>;

/// Failures surfaced by the codec. Writer failures are pre-emission
/// validation; reader failures describe a malformed or truncated stream.
/// Nothing is retried, and a mid-stream failure leaves the sink in an
/// indeterminate state.
#[derive(Debug)]
pub enum FormatError {
    InvalidMagic,
    UnsupportedVersion(u8),
    UnsupportedFormat(u8),
    WrongContainer {
        expected: FormatType,
        actual: FormatType,
    },
    UnknownEncoding(u8),
    UnknownValueTag(u8),
    Truncated,
    LengthMismatch {
        expected: usize,
        actual: usize,
    },
    NameTooLong(String),
    DictionaryTooLarge(usize),
    ShapeError(String),
    IoError(io::Error),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::InvalidMagic => {
                write!(f, "Invalid magic number: not a hybf file")
            }
            FormatError::UnsupportedVersion(version) => {
                write!(f, "Unsupported format version: {}", version)
            }
            FormatError::UnsupportedFormat(code) => {
                write!(f, "Unknown container format type: {}", code)
            }
            FormatError::WrongContainer { expected, actual } => {
                write!(
                    f,
                    "Wrong container: expected {:?}, found {:?}",
                    expected, actual
                )
            }
            FormatError::UnknownEncoding(tag) => {
                write!(f, "Unknown column encoding tag: {}", tag)
            }
            FormatError::UnknownValueTag(tag) => {
                write!(f, "Unknown value tag: {}", tag)
            }
            FormatError::Truncated => {
                write!(f, "Unexpected end of input")
            }
            FormatError::LengthMismatch { expected, actual } => {
                write!(
                    f,
                    "Length mismatch: expected {} rows, got {}",
                    expected, actual
                )
            }
            FormatError::NameTooLong(name) => {
                write!(f, "Column name exceeds 255 bytes: {:?}", name)
            }
            FormatError::DictionaryTooLarge(size) => {
                write!(f, "Dictionary exceeds 65535 entries: {}", size)
            }
            FormatError::ShapeError(msg) => {
                write!(f, "Shape error: {}", msg)
            }
            FormatError::IoError(e) => {
                write!(f, "I/O error: {}", e)
            }
        }
    }
}

impl Error for FormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FormatError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FormatError {
    fn from(error: io::Error) -> Self {
        // Running out of bytes mid-read is a format-level condition, not an
        // environment failure.
        if error.kind() == io::ErrorKind::UnexpectedEof {
            FormatError::Truncated
        } else {
            FormatError::IoError(error)
        }
    }
}
