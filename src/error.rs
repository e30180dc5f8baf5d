//! Library-wide error and result types.

use std::io;

use thiserror::Error;

/// Result alias used throughout ed8pkg.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
///
/// Only [`Error::MalformedHeader`] is fatal to a whole archive; everything
/// else is scoped to the entry being decoded and is turned into a
/// [`crate::extract::Skipped`] record by the extraction driver.
#[derive(Debug, Error)]
pub enum Error {
    /// The entry directory ended before the declared entry count was read.
    #[error("malformed header: directory is truncated")]
    MalformedHeader,
    /// A NISLZSS stream header disagrees with the directory record.
    #[error("compressed size mismatch: stream declares {declared}, directory says {expected}")]
    SizeMismatch { declared: u32, expected: u32 },
    /// A decoder tried to read or write outside the output buffer.
    #[error("decoder index outside the output buffer")]
    BufferOverrun,
    /// An LZ4 stream ended where more data was required.
    #[error("lz4 stream truncated")]
    TruncatedStream,
    /// An LZ4 match carried an offset of zero.
    #[error("lz4 match offset is zero")]
    InvalidOffset,
    /// An entry name is not ASCII and cannot name an output file.
    #[error("entry name {0:?} is not ASCII")]
    InvalidName(String),
    /// A shared placeholder entry could not be resolved from a companion archive.
    #[error("{0} references common.pkg, but it was not found")]
    UnresolvedReference(String),
    /// The entry needs a codec that is not available in this build.
    #[error("{0} codec is not available")]
    CodecUnavailable(&'static str),
    /// Zstandard decompression failed.
    #[error("zstd decompression failed: {0}")]
    Zstd(#[source] io::Error),
    /// An underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this error aborts the whole archive rather than one entry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::MalformedHeader)
    }

    /// Whether this error is the stream running dry mid-read.
    pub(crate) fn is_eof(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}
