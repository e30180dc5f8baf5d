//! NISLZSS decompression.
//!
//! A byte-oriented LZ77 scheme where one stream-chosen *escape* value marks
//! back-references.
//!
//! ## Layout
//! ```text
//! [0x00] DecompressedSize   (u32 LE)
//! [0x04] CompressedSize     (u32 LE) - whole stream, header included
//! [0x08] Escape             (u32 LE) - only the low byte can ever match
//! [0x0C] Body               (CompressedSize - 0x0C bytes)
//! ```
//!
//! ## Body
//! ```text
//! b                 literal b            (b != escape)
//! escape escape     literal escape
//! escape dist len   copy len bytes from dist back
//!                   (dist > escape is stored one higher and decremented)
//! ```

use std::io::Read;

use super::Window;
use crate::utils::{le_u32, u8};
use crate::{Error, Result};

/// Header size triple of one shipped archive entry whose stream
/// over-reports its compressed size. Accepted verbatim, never generalised.
const KNOWN_OVERSIZED: (u32, u32, u32) = (451_019, 176_128, 176_796);

/// Whether a stream-declared compressed size agrees with the directory.
///
/// The stream may declare the directory size itself or 4 bytes less.
pub fn header_matches(decompressed_size: u32, compressed_size: u32, declared: u32) -> bool {
    declared == compressed_size
        || compressed_size.checked_sub(declared) == Some(4)
        || (decompressed_size, compressed_size, declared) == KNOWN_OVERSIZED
}

/// Decompress one NISLZSS stream.
///
/// `r` must be positioned at the stream header. The output buffer is the
/// larger of `decompressed_size` and the size the stream declares.
///
/// Returns [`Error::SizeMismatch`] if the header disagrees with
/// `compressed_size`, or [`Error::BufferOverrun`] if a back-reference
/// points outside the output.
pub fn decompress_nislzss<R: Read>(
    r: &mut R,
    decompressed_size: u32,
    compressed_size: u32,
) -> Result<Vec<u8>> {
    let stream_size = le_u32(r)?;
    let declared = le_u32(r)?;
    if !header_matches(decompressed_size, compressed_size, declared) {
        return Err(Error::SizeMismatch {
            declared,
            expected: compressed_size,
        });
    }
    let escape = le_u32(r)?;

    let mut out = Window::new(stream_size.max(decompressed_size) as usize);
    // Position relative to the header start; an operation may begin on any
    // byte before `declared` and finish past it.
    let mut pos = 12u64;
    let end = u64::from(declared);

    while pos < end {
        let b = u8(r)?;
        pos += 1;
        if u32::from(b) != escape {
            out.push(b)?;
            continue;
        }

        let mut dist = u8(r)?;
        pos += 1;
        if u32::from(dist) == escape {
            out.push(dist)?;
            continue;
        }
        if u32::from(dist) > escape {
            dist -= 1;
        }
        let len = u8(r)?;
        pos += 1;
        out.copy_back(usize::from(dist), usize::from(len))?;
    }

    Ok(out.into_inner())
}
