//! Decompressors for the three codecs found in `.pkg` entries.
//!
//! ## Submodules
//!
//! | Module      | Algorithm                  | Flag bits |
//! |-------------|----------------------------|-----------|
//! | [`nislzss`] | NISLZSS (escape-byte LZ77) | `0x01`, after probing |
//! | [`lz4`]     | LZ4 block variant          | `0x04`, or `0x01` after probing |
//! | [`zstd`]    | Zstandard                  | `0x08` / `0x10` (requires the `compression` feature) |
//!
//! The two custom decoders write into a [`Window`]: an output buffer sized up
//! front whose back-references are allowed to overlap the bytes being
//! produced, which is how both formats encode runs.

use std::io::Read;

use crate::{Error, Result};

pub mod lz4;
pub mod nislzss;
pub mod zstd;

/// Pre-sized output buffer with a write cursor and bounds-checked LZ copies.
#[derive(Debug)]
pub(crate) struct Window {
    buf: Vec<u8>,
    pos: usize,
}

impl Window {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            buf: vec![0u8; size],
            pos: 0,
        }
    }

    /// Append one byte.
    #[inline]
    pub(crate) fn push(&mut self, b: u8) -> Result<()> {
        let slot = self.buf.get_mut(self.pos).ok_or(Error::BufferOverrun)?;
        *slot = b;
        self.pos += 1;
        Ok(())
    }

    /// Append `len` bytes read verbatim from `r`.
    pub(crate) fn fill_from<R: Read>(&mut self, r: &mut R, len: usize) -> Result<()> {
        let end = self.reserve(len)?;
        r.read_exact(&mut self.buf[self.pos..end])?;
        self.pos = end;
        Ok(())
    }

    /// Append `len` bytes copied from `dist` bytes behind the cursor.
    ///
    /// When `dist < len` the source overlaps the destination and the copy
    /// must run byte by byte so that freshly written bytes are re-read.
    pub(crate) fn copy_back(&mut self, dist: usize, len: usize) -> Result<()> {
        let src = self.pos.checked_sub(dist).ok_or(Error::BufferOverrun)?;
        let end = self.reserve(len)?;
        if dist < len {
            for i in self.pos..end {
                self.buf[i] = self.buf[i - dist];
            }
        } else {
            self.buf.copy_within(src..src + len, self.pos);
        }
        self.pos = end;
        Ok(())
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    fn reserve(&self, len: usize) -> Result<usize> {
        self.pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(Error::BufferOverrun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_copy_repeats_pattern() {
        let mut w = Window::new(7);
        w.push(b'x').unwrap();
        w.push(b'y').unwrap();
        w.copy_back(2, 5).unwrap();
        assert_eq!(w.into_inner(), b"xyxyxyx");
    }

    #[test]
    fn copy_before_start_is_rejected() {
        let mut w = Window::new(8);
        w.push(1).unwrap();
        assert!(matches!(w.copy_back(2, 1), Err(Error::BufferOverrun)));
    }

    #[test]
    fn write_past_end_is_rejected() {
        let mut w = Window::new(2);
        w.push(1).unwrap();
        assert!(matches!(w.copy_back(1, 2), Err(Error::BufferOverrun)));
        let mut r: &[u8] = b"abc";
        assert!(matches!(w.fill_from(&mut r, 3), Err(Error::BufferOverrun)));
    }
}
