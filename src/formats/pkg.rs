//! PKG - ED8 engine asset archive.
//!
//! Shipped with Trails of Cold Steel I-IV, Trails into Reverie and Tokyo
//! Xanadu (Vita, PS3, PS4, Switch and PC releases).
//!
//! ## Layout
//! ```text
//! [0x00] Unknown                   (4 bytes, ignored)
//! [0x04] EntryCount                (u32 LE)
//! [0x08] EntryTable                (EntryCount × 0x50 bytes)
//! [...]  Payloads at the absolute offsets given by each entry
//! ```
//!
//! ## Entry (0x50 bytes)
//! ```text
//! [0x00] Name              (64 bytes, NUL padded)
//! [0x40] UncompressedSize  (u32 LE)
//! [0x44] CompressedSize    (u32 LE) - excludes the optional CRC prefix
//! [0x48] Offset            (u32 LE) - absolute
//! [0x4C] Flags             (u32 LE) - see [`EntryFlags`]
//! ```
//!
//! ## Notes
//! * Entries with flag `0x08` and both offset and compressed size zero are
//!   placeholders for assets stored once in a companion `common.pkg`.
//! * Payloads are not aligned.

use std::collections::BTreeMap;
use std::io::{Read, Seek};

use tracing::warn;

use crate::codec::{self, Capabilities};
use crate::utils::{bytesa, le_u32, padded_name};
use crate::{Error, Result};

/// Size of one directory record.
pub const ENTRY_SIZE: usize = 0x50;
/// Width of the NUL-padded name field.
pub const NAME_SIZE: usize = 0x40;

/// Per-entry codec and prefix bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryFlags(pub u32);

impl EntryFlags {
    /// NISLZSS or LZ4 variant, told apart by probing the payload.
    pub const LZ_PAYLOAD: u32 = 0x01;
    /// Payload starts with a 4-byte CRC32 that is skipped.
    pub const CRC_PREFIX: u32 = 0x02;
    /// LZ4 variant, no probing.
    pub const FORCE_LZ4: u32 = 0x04;
    /// Zstandard, or a companion placeholder when offset and size are zero.
    pub const ZSTD_OR_SHARED: u32 = 0x08;
    /// Zstandard (Switch releases).
    pub const ZSTD_ALT: u32 = 0x10;

    /// Whether any bit of `mask` is set.
    #[inline]
    pub fn contains(self, mask: u32) -> bool {
        self.0 & mask != 0
    }
}

/// Metadata for a single entry inside a PKG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgEntry {
    /// Name with NUL padding stripped; also the output file name.
    pub name: String,
    /// Decoded size in bytes.
    pub uncompressed_size: u32,
    /// Stored payload size in bytes, not counting a CRC prefix.
    pub compressed_size: u32,
    /// Absolute payload offset.
    pub offset: u32,
    pub flags: EntryFlags,
}

impl PkgEntry {
    /// Whether this entry only points at an asset in the companion archive.
    pub fn is_shared(&self) -> bool {
        self.flags.contains(EntryFlags::ZSTD_OR_SHARED)
            && self.offset == 0
            && self.compressed_size == 0
    }
}

/// Parsed PKG directory (metadata only).
///
/// Entries are keyed by their raw name bytes, so iteration is in byte-wise
/// name order and names that only differ in non-UTF-8 bytes stay distinct.
#[derive(Debug, Default)]
pub struct Pkg {
    pub entries: BTreeMap<Vec<u8>, PkgEntry>,
}

impl Pkg {
    /// Parse the header and entry directory from `r`.
    ///
    /// `r` must be positioned at the start of the archive. Returns
    /// [`Error::MalformedHeader`] if the stream ends before the declared
    /// number of entries has been read. A name that appears twice keeps the
    /// later record.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        let _unknown = bytesa::<4>(r).map_err(malformed)?;
        let count = le_u32(r).map_err(malformed)?;

        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let record = bytesa::<ENTRY_SIZE>(r).map_err(malformed)?;
            let key = padded_name(&record[..NAME_SIZE]).to_vec();
            let entry = PkgEntry::from_record(&record);
            if let Some(prev) = entries.insert(key, entry) {
                warn!(name = %prev.name, "duplicate directory entry, keeping the later record");
            }
        }

        Ok(Self { entries })
    }

    /// Iterate over all entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = &PkgEntry> {
        self.entries.values()
    }

    /// Find an entry by name. Returns [`None`] if not found.
    pub fn get(&self, name: &str) -> Option<&PkgEntry> {
        self.entries.get(name.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PkgEntry {
    fn from_record(record: &[u8; ENTRY_SIZE]) -> Self {
        let field = |at: usize| {
            u32::from_le_bytes([record[at], record[at + 1], record[at + 2], record[at + 3]])
        };
        Self {
            name: String::from_utf8_lossy(padded_name(&record[..NAME_SIZE])).into_owned(),
            uncompressed_size: field(NAME_SIZE),
            compressed_size: field(NAME_SIZE + 4),
            offset: field(NAME_SIZE + 8),
            flags: EntryFlags(field(NAME_SIZE + 12)),
        }
    }
}

fn malformed(e: Error) -> Error {
    if e.is_eof() { Error::MalformedHeader } else { e }
}

/// Reader wrapper around a [`Pkg`] directory.
///
/// Owns the underlying reader and decodes individual entries on demand.
pub struct PkgReader<R> {
    inner: R,
    /// Parsed metadata.
    pub pkg: Pkg,
}

impl<R: Read + Seek> PkgReader<R> {
    /// Parse a PKG and wrap the provided reader.
    pub fn new(mut reader: R) -> Result<Self> {
        let pkg = Pkg::parse(&mut reader)?;
        Ok(Self { inner: reader, pkg })
    }

    /// Decode one entry's payload.
    ///
    /// Shared placeholders fail with [`Error::UnresolvedReference`]; they
    /// have no bytes in this archive.
    pub fn read_entry(&mut self, entry: &PkgEntry, caps: Capabilities) -> Result<Vec<u8>> {
        codec::read_entry(&mut self.inner, entry, caps)
    }

    /// Decode an entry by name. Returns [`None`] if not found.
    pub fn read_by_name(&mut self, name: &str, caps: Capabilities) -> Option<Result<Vec<u8>>> {
        let entry = self.pkg.get(name)?.clone();
        Some(self.read_entry(&entry, caps))
    }

    /// Consume the reader, returning the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn record(name: impl AsRef<[u8]>, sizes: (u32, u32), offset: u32, flags: u32) -> Vec<u8> {
        let name = name.as_ref();
        let mut rec = vec![0u8; NAME_SIZE];
        rec[..name.len()].copy_from_slice(name);
        for v in [sizes.0, sizes.1, offset, flags] {
            rec.extend_from_slice(&v.to_le_bytes());
        }
        rec
    }

    fn directory(records: &[Vec<u8>]) -> Vec<u8> {
        let mut pkg = vec![0xDE, 0xAD, 0xBE, 0xEF];
        pkg.extend_from_slice(&(records.len() as u32).to_le_bytes());
        for r in records {
            pkg.extend_from_slice(r);
        }
        pkg
    }

    #[test]
    fn parses_records_in_name_order() {
        let data = directory(&[
            record("b.dds", (10, 6), 0x200, 0x01),
            record("a.tbl", (4, 4), 0x100, 0),
        ]);
        let pkg = Pkg::parse(&mut data.as_slice()).unwrap();
        let names: Vec<_> = pkg.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.tbl", "b.dds"]);

        let b = pkg.get("b.dds").unwrap();
        assert_eq!(b.uncompressed_size, 10);
        assert_eq!(b.compressed_size, 6);
        assert_eq!(b.offset, 0x200);
        assert!(b.flags.contains(EntryFlags::LZ_PAYLOAD));
        assert!(!b.flags.contains(EntryFlags::CRC_PREFIX));
    }

    #[test]
    fn truncated_directory_is_malformed() {
        let mut data = directory(&[record("a", (1, 1), 0x58, 0)]);
        data[4..8].copy_from_slice(&3u32.to_le_bytes());
        assert!(matches!(
            Pkg::parse(&mut data.as_slice()),
            Err(Error::MalformedHeader)
        ));
        assert!(matches!(
            Pkg::parse(&mut &data[..6]),
            Err(Error::MalformedHeader)
        ));
    }

    #[test]
    fn duplicate_name_keeps_later_record() {
        let data = directory(&[record("x", (1, 1), 10, 0), record("x", (2, 2), 20, 0)]);
        let pkg = Pkg::parse(&mut data.as_slice()).unwrap();
        assert_eq!(pkg.len(), 1);
        assert_eq!(pkg.get("x").unwrap().offset, 20);
    }

    #[test]
    fn undecodable_names_stay_distinct() {
        let data = directory(&[
            record(b"\xffx", (1, 1), 10, 0),
            record(b"\xfex", (2, 2), 20, 0),
        ]);
        let pkg = Pkg::parse(&mut data.as_slice()).unwrap();
        assert_eq!(pkg.len(), 2);
        let offsets: Vec<_> = pkg.entries().map(|e| e.offset).collect();
        assert_eq!(offsets, [20, 10]);
        assert!(pkg.entries().all(|e| e.name == "\u{FFFD}x"));
    }

    #[test]
    fn shared_placeholder_detection() {
        let data = directory(&[
            record("shared.bin", (16, 0), 0, 0x08),
            record("zstd.bin", (16, 9), 0x200, 0x08),
            record("empty.bin", (0, 0), 0, 0),
        ]);
        let pkg = Pkg::parse(&mut data.as_slice()).unwrap();
        assert!(pkg.get("shared.bin").unwrap().is_shared());
        assert!(!pkg.get("zstd.bin").unwrap().is_shared());
        assert!(!pkg.get("empty.bin").unwrap().is_shared());
    }

    #[test]
    fn reader_decodes_stored_entry_by_name() {
        let mut data = directory(&[record("raw.txt", (5, 5), 0x58, 0)]);
        data.extend_from_slice(b"hello");
        let mut reader = PkgReader::new(Cursor::new(data)).unwrap();
        let out = reader
            .read_by_name("raw.txt", Capabilities::default())
            .unwrap()
            .unwrap();
        assert_eq!(out, b"hello");
        assert!(reader.read_by_name("missing", Capabilities::default()).is_none());
    }
}
