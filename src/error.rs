// Error type shared by every layer of the reader.
//
// Decoding steps return `Result<_, Error>` and bail out with `?`; nothing
// is retried. `Error::kind()` collapses the detailed variants into the
// small classification callers usually branch on.

use std::io;

/// Errors produced while reading a delta RPM or an embedded RPM.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller passed an unusable argument (unknown or mistyped tag, absent field).
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Opening, reading or seeking the underlying file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The container violates the format (bad magic, version, length, enum code).
    #[error("invalid format: {0}")]
    Format(String),

    /// The input ended before a field was complete.
    #[error("truncated input while reading {context}")]
    Truncated { context: String },

    /// The decompressor rejected the stream.
    #[error("corrupt compressed stream: {0}")]
    Corrupt(String),

    /// A buffer for a producer-declared length could not be allocated.
    #[error("out of memory")]
    OutOfMemory,

    /// Library failure unrelated to the input format.
    #[error("internal failure: {0}")]
    Internal(String),
}

/// Coarse classification of an [`Error`].
///
/// The discriminants are stable numeric codes; `0` is reserved for success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorKind {
    Memory = 1,
    Args = 2,
    Io = 3,
    Format = 4,
    Other = 6,
}

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub(crate) fn truncated(context: impl Into<String>) -> Self {
        Self::Truncated {
            context: context.into(),
        }
    }

    pub(crate) fn args(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Classify a raw `io::Error` coming out of a (possibly decompressing) reader.
    ///
    /// A short read becomes [`Error::Truncated`], data errors raised by the
    /// decompressors become [`Error::Corrupt`], everything else stays I/O.
    pub(crate) fn from_stream(err: io::Error, context: &str) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::truncated(context),
            io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
                Self::Corrupt(format!("{context}: {err}"))
            }
            _ => Self::Io(err),
        }
    }

    /// The coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArguments(_) => ErrorKind::Args,
            Self::Io(_) => ErrorKind::Io,
            Self::Format(_) | Self::Truncated { .. } | Self::Corrupt(_) => ErrorKind::Format,
            Self::OutOfMemory => ErrorKind::Memory,
            Self::Internal(_) => ErrorKind::Other,
        }
    }

    /// Numeric code of [`Error::kind`].
    pub fn code(&self) -> u32 {
        self.kind() as u32
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
