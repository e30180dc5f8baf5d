//! LZ4 block variant decompression.
//!
//! The token stream is ordinary LZ4 block format (high nibble literal length,
//! low nibble match length minus 4, 15 extended by `0xFF`-continued bytes,
//! little-endian `u16` match offsets). What differs is how the end of the
//! stream is found: there is no size prefix, so the decoder runs until the
//! offset after a literal run cannot be read, or lies past the entry's
//! compressed size. That final sequence must not announce a match.

use std::io::Read;

use super::Window;
use crate::utils::{le_u16, u8};
use crate::{Error, Result};

const MIN_MATCH: usize = 4;

/// Decompress one LZ4-variant stream into a buffer of `decompressed_size`
/// bytes.
///
/// `r` must be positioned at the first token; `compressed_size` bounds the
/// stream.
///
/// Returns [`Error::TruncatedStream`] if the stream ends inside a sequence,
/// [`Error::InvalidOffset`] for a zero match offset, or
/// [`Error::BufferOverrun`] if a sequence writes or reads outside the output.
pub fn decompress_lz4<R: Read>(
    r: &mut R,
    decompressed_size: u32,
    compressed_size: u32,
) -> Result<Vec<u8>> {
    let mut out = Window::new(decompressed_size as usize);
    let end = u64::from(compressed_size);
    let mut pos = 0u64;

    while pos <= end {
        let token = u8(r).map_err(truncated)?;
        pos += 1;

        let literal_len = extended_len(r, &mut pos, token >> 4)?;
        out.fill_from(r, literal_len).map_err(truncated)?;
        pos += literal_len as u64;

        let offset = match le_u16(r) {
            Ok(offset) => {
                pos += 2;
                Some(offset).filter(|_| pos <= end)
            }
            Err(e) if e.is_eof() => None,
            Err(e) => return Err(e),
        };
        let Some(offset) = offset else {
            if token & 0x0F != 0 {
                return Err(Error::TruncatedStream);
            }
            break;
        };
        if offset == 0 {
            return Err(Error::InvalidOffset);
        }

        let match_len = extended_len(r, &mut pos, token & 0x0F)? + MIN_MATCH;
        out.copy_back(usize::from(offset), match_len)?;
    }

    Ok(out.into_inner())
}

/// Expand a token nibble; 15 continues with bytes summed until one is below 255.
fn extended_len<R: Read>(r: &mut R, pos: &mut u64, nibble: u8) -> Result<usize> {
    let mut len = usize::from(nibble);
    if nibble != 0x0F {
        return Ok(len);
    }
    loop {
        let part = u8(r).map_err(truncated)?;
        *pos += 1;
        len += usize::from(part);
        if part != 0xFF {
            return Ok(len);
        }
    }
}

fn truncated(e: Error) -> Error {
    if e.is_eof() { Error::TruncatedStream } else { e }
}
