//! Low-level I/O primitives shared by the parser and the decoders.
//!
//! Each function reads exactly the bytes it promises or returns an error -
//! there is no partial-read ambiguity. The one exception is [`bytes_upto`],
//! which mirrors a plain `read(n)` and may come back short at end of stream.

use std::io::Read;

use crate::Result;

/// Read one byte.
#[inline]
pub(crate) fn u8<R: Read>(r: &mut R) -> Result<u8> {
    let mut b = [0u8; 1];
    r.read_exact(&mut b)?;
    Ok(b[0])
}

/// Read a little-endian `u16`.
#[inline]
pub(crate) fn le_u16<R: Read>(r: &mut R) -> Result<u16> {
    let mut b = [0u8; 2];
    r.read_exact(&mut b)?;
    Ok(u16::from_le_bytes(b))
}

/// Read a little-endian `u32`.
#[inline]
pub(crate) fn le_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}

/// Read exactly `N` bytes into a fixed-size array.
#[inline]
pub(crate) fn bytesa<const N: usize>(r: &mut impl Read) -> Result<[u8; N]> {
    let mut b = [0u8; N];
    r.read_exact(&mut b)?;
    Ok(b)
}

/// Read exactly `len` bytes into a `Vec`.
#[inline]
#[cfg_attr(not(feature = "compression"), allow(dead_code))]
pub(crate) fn bytesv<R: Read>(r: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut b = vec![0u8; len];
    r.read_exact(&mut b)?;
    Ok(b)
}

/// Read up to `len` bytes, stopping early at end of stream.
pub(crate) fn bytes_upto<R: Read>(r: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut b = Vec::new();
    r.take(len).read_to_end(&mut b)?;
    Ok(b)
}

/// Strip the trailing NUL padding from a fixed-width name field.
pub(crate) fn padded_name(field: &[u8]) -> &[u8] {
    let end = field.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &field[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_name_strips_trailing_nuls_only() {
        assert_eq!(padded_name(b"a\0b.dds\0\0\0"), b"a\0b.dds");
        assert_eq!(padded_name(b"\0\0\0\0"), b"");
        assert_eq!(padded_name(b"full"), b"full");
    }

    #[test]
    fn bytes_upto_returns_short_read() {
        let mut r: &[u8] = b"abc";
        assert_eq!(bytes_upto(&mut r, 8).unwrap(), b"abc");
    }
}
