//! Codec selection and dispatch for a single entry.
//!
//! Flag bits pick the codec directly except for `0x01`, which both NISLZSS
//! and the LZ4 variant use. For those entries the payload is probed: a
//! NISLZSS stream repeats its own compressed size at byte 4, an LZ4 stream
//! has no header at all.

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::compression::{lz4, nislzss, zstd};
use crate::formats::pkg::{EntryFlags, PkgEntry};
use crate::utils::{bytes_upto, bytesa};
use crate::{Error, Result};

/// How an entry's payload is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Raw bytes.
    Stored,
    Nislzss,
    /// LZ4 block variant.
    Lz4,
    Zstd,
    /// Placeholder for an asset in the companion archive.
    Shared,
}

/// Optional codecs available to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub zstd: bool,
}

impl Default for Capabilities {
    /// Everything this build was compiled with.
    fn default() -> Self {
        Self {
            zstd: zstd::AVAILABLE,
        }
    }
}

impl Codec {
    /// Select the codec from the flags alone.
    ///
    /// Returns [`None`] for the NISLZSS/LZ4 bit, which needs [`Codec::probe`].
    pub fn from_flags(entry: &PkgEntry) -> Option<Self> {
        let flags = entry.flags;
        if entry.is_shared() {
            Some(Codec::Shared)
        } else if flags.contains(EntryFlags::FORCE_LZ4) {
            Some(Codec::Lz4)
        } else if flags.contains(EntryFlags::ZSTD_OR_SHARED | EntryFlags::ZSTD_ALT) {
            Some(Codec::Zstd)
        } else if flags.contains(EntryFlags::LZ_PAYLOAD) {
            None
        } else {
            Some(Codec::Stored)
        }
    }

    /// Tell NISLZSS from LZ4 by peeking at the first 8 payload bytes.
    ///
    /// `r` must be at the payload start and is left there. Payloads shorter
    /// than 8 bytes are always LZ4.
    pub fn probe<R: Read + Seek>(r: &mut R, entry: &PkgEntry) -> Result<Self> {
        if entry.compressed_size < 8 {
            return Ok(Codec::Lz4);
        }
        let head = bytesa::<8>(r)?;
        r.seek(SeekFrom::Current(-8))?;
        let declared = u32::from_le_bytes([head[4], head[5], head[6], head[7]]);
        if nislzss::header_matches(entry.uncompressed_size, entry.compressed_size, declared) {
            Ok(Codec::Nislzss)
        } else {
            Ok(Codec::Lz4)
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Codec::Stored => "stored",
            Codec::Nislzss => "nislzss",
            Codec::Lz4 => "lz4",
            Codec::Zstd => "zstd",
            Codec::Shared => "shared",
        }
    }

    /// Decode an entry whose payload starts at the current position of `r`.
    pub fn decode<R: Read>(
        self,
        r: &mut R,
        entry: &PkgEntry,
        caps: Capabilities,
    ) -> Result<Vec<u8>> {
        let (size, stored) = (entry.uncompressed_size, entry.compressed_size);
        match self {
            Codec::Stored => bytes_upto(r, u64::from(size)),
            Codec::Nislzss => nislzss::decompress_nislzss(r, size, stored),
            Codec::Lz4 => lz4::decompress_lz4(r, size, stored),
            Codec::Zstd if !caps.zstd => Err(Error::CodecUnavailable("zstd")),
            Codec::Zstd => zstd::decompress_zstd(r, size, stored),
            Codec::Shared => Err(Error::UnresolvedReference(entry.name.clone())),
        }
    }
}

/// Seek to an entry, skip its CRC prefix if any, pick its codec and decode it.
pub fn read_entry<R: Read + Seek>(
    r: &mut R,
    entry: &PkgEntry,
    caps: Capabilities,
) -> Result<Vec<u8>> {
    let by_flags = Codec::from_flags(entry);
    r.seek(SeekFrom::Start(u64::from(entry.offset)))?;
    if entry.flags.contains(EntryFlags::CRC_PREFIX) {
        // CRC32 of the decoded data; not verified
        r.seek(SeekFrom::Current(4))?;
    }

    let codec = match by_flags {
        Some(codec) => codec,
        None => Codec::probe(r, entry)?,
    };
    debug!(
        name = %entry.name,
        codec = codec.name(),
        compressed = entry.compressed_size,
        uncompressed = entry.uncompressed_size,
        "decoding entry"
    );
    codec.decode(r, entry, caps)
}
