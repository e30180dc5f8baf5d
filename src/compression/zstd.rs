//! Zstandard decompression.
//!
//! Flag `0x08` marks Zstd entries in the PC releases, flag `0x10` in the
//! Switch releases; the payload is a single frame either way. The codec is
//! linked only with the `compression` feature. Without it
//! [`decompress_zstd`] reports [`Error::CodecUnavailable`], which the
//! extraction driver treats as a skip rather than a failure.

use std::io::Read;

#[cfg(feature = "compression")]
use crate::utils::bytesv;
use crate::{Error, Result};

/// Whether the Zstandard codec was compiled into this build.
pub const AVAILABLE: bool = cfg!(feature = "compression");

/// Decompress `compressed_size` bytes from `r` into at most
/// `decompressed_size` bytes.
///
/// Returns [`Error::Zstd`] if the frame is corrupt or inflates past
/// `decompressed_size`.
#[cfg(feature = "compression")]
pub fn decompress_zstd<R: Read>(
    r: &mut R,
    decompressed_size: u32,
    compressed_size: u32,
) -> Result<Vec<u8>> {
    let data = bytesv(r, compressed_size as usize)?;
    zstd::bulk::decompress(&data, decompressed_size as usize).map_err(Error::Zstd)
}

/// Always fails: this build has no Zstandard codec.
#[cfg(not(feature = "compression"))]
pub fn decompress_zstd<R: Read>(
    _r: &mut R,
    _decompressed_size: u32,
    _compressed_size: u32,
) -> Result<Vec<u8>> {
    Err(Error::CodecUnavailable("zstd"))
}

#[cfg(all(test, feature = "compression"))]
mod tests {
    use super::*;

    #[test]
    fn frame_decodes() {
        let original = b"Trails of Cold Steel asset payload, compressed with Zstandard.";
        let frame = zstd::encode_all(&original[..], 3).unwrap();
        let out = decompress_zstd(
            &mut frame.as_slice(),
            original.len() as u32,
            frame.len() as u32,
        )
        .unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let original = vec![7u8; 1024];
        let frame = zstd::encode_all(&original[..], 3).unwrap();
        let err = decompress_zstd(&mut frame.as_slice(), 16, frame.len() as u32).unwrap_err();
        assert!(matches!(err, Error::Zstd(_)));
    }
}
