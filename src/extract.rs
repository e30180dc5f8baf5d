//! Whole-archive extraction.
//!
//! [`unpack`] parses an archive's directory, resolves shared placeholders
//! against the companion archive (normally `common.pkg`), then decodes every
//! remaining entry in name order and hands it to a [`Sink`].
//!
//! Failures are scoped: a truncated directory aborts the archive, while an
//! entry that cannot be decoded, resolved or written is logged, recorded in
//! the [`Report`] and skipped.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use ed8pkg::extract::{DirSink, ExtractOptions, find_companion, unpack};
//!
//! let input = Path::new("data/scripts.pkg");
//! let companion = find_companion(input);
//! let mut sink = DirSink::new("scripts.pkg__");
//! let report = unpack(input, companion, &mut sink, &ExtractOptions::default())?;
//! println!("{} files", report.extracted.len());
//! # Ok::<(), ed8pkg::Error>(())
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codec::{self, Capabilities};
use crate::formats::pkg::{Pkg, PkgEntry};
use crate::{Error, Result};

/// File name of the companion archive shipped next to the game's packages.
pub const COMMON_PKG: &str = "common.pkg";

/// Something that can open a fresh reader over an archive.
///
/// Each call to [`unpack`] opens its own reader and drops it before
/// returning.
pub trait Source {
    type Reader: Read + Seek;

    fn open(&self) -> io::Result<Self::Reader>;
}

impl Source for &Path {
    type Reader = BufReader<File>;

    fn open(&self) -> io::Result<Self::Reader> {
        File::open(self).map(BufReader::new)
    }
}

impl Source for PathBuf {
    type Reader = BufReader<File>;

    fn open(&self) -> io::Result<Self::Reader> {
        self.as_path().open()
    }
}

impl<'a> Source for &'a [u8] {
    type Reader = Cursor<&'a [u8]>;

    fn open(&self) -> io::Result<Self::Reader> {
        Ok(Cursor::new(*self))
    }
}

/// Receiver for decoded entries.
pub trait Sink {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> io::Result<()>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> io::Result<()> {
        (**self).write_entry(name, data)
    }
}

/// Writes each entry to `<root>/<name>`.
///
/// The root directory must already exist. Names that would escape it are
/// refused with [`io::ErrorKind::InvalidInput`].
#[derive(Debug, Clone)]
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Sink for DirSink {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> io::Result<()> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to write entry named {name:?}"),
            ));
        }
        let mut file = File::create(self.root.join(name))?;
        file.write_all(data)
    }
}

/// Collects entries in memory, keyed by name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemorySink {
    pub files: BTreeMap<String, Vec<u8>>,
}

impl Sink for MemorySink {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> io::Result<()> {
        self.files.insert(name.to_owned(), data.to_vec());
        Ok(())
    }
}

/// Per-entry inclusion predicate; `true` extracts the entry.
pub type EntryFilter<'a> = dyn Fn(&str, &PkgEntry) -> bool + 'a;

/// Knobs for one [`unpack`] run.
#[derive(Clone, Copy, Default)]
pub struct ExtractOptions<'a> {
    pub capabilities: Capabilities,
    pub filter: Option<&'a EntryFilter<'a>>,
}

impl ExtractOptions<'_> {
    fn includes(&self, entry: &PkgEntry) -> bool {
        self.filter.is_none_or(|f| f(&entry.name, entry))
    }
}

/// An entry that was not extracted, and why.
#[derive(Debug)]
pub struct Skipped {
    pub name: String,
    pub error: Error,
}

/// Outcome of an [`unpack`] run, in processing order.
#[derive(Debug, Default)]
pub struct Report {
    /// Names handed to the sink, companion entries first.
    pub extracted: Vec<String>,
    pub skipped: Vec<Skipped>,
}

impl Report {
    fn skip(&mut self, name: &str, error: Error) {
        warn!(name, %error, "skipping entry");
        self.skipped.push(Skipped {
            name: name.to_owned(),
            error,
        });
    }

    fn merge(&mut self, other: Report) {
        self.extracted.extend(other.extracted);
        self.skipped.extend(other.skipped);
    }
}

/// Extract every entry of `archive` that passes the options' filter.
///
/// Placeholders are materialised from `companion` before any other entry is
/// decoded; without a usable companion they are reported as
/// [`Error::UnresolvedReference`]. Only failing to open or parse `archive`
/// aborts the run; every per-entry failure, including a sink write, is
/// recorded in the [`Report`].
pub fn unpack<A, C, S>(
    archive: A,
    companion: Option<C>,
    sink: &mut S,
    options: &ExtractOptions<'_>,
) -> Result<Report>
where
    A: Source,
    C: Source,
    S: Sink + ?Sized,
{
    let mut r = archive.open()?;
    let pkg = Pkg::parse(&mut r)?;
    let mut report = Report::default();

    let mut shared = BTreeSet::new();
    let mut local = Vec::new();
    for entry in pkg.entries().filter(|e| options.includes(e)) {
        if !entry.name.is_ascii() {
            report.skip(&entry.name, Error::InvalidName(entry.name.clone()));
        } else if entry.is_shared() {
            shared.insert(entry.name.clone());
        } else {
            local.push(entry);
        }
    }

    if !shared.is_empty() {
        match companion {
            Some(companion) => {
                resolve_shared(companion, &shared, sink, options.capabilities, &mut report)
            }
            None => {
                for name in &shared {
                    report.skip(name, Error::UnresolvedReference(name.clone()));
                }
            }
        }
    }

    for entry in local {
        let written = codec::read_entry(&mut r, entry, options.capabilities)
            .and_then(|data| sink.write_entry(&entry.name, &data).map_err(Error::Io));
        match written {
            Ok(()) => report.extracted.push(entry.name.clone()),
            Err(e) => report.skip(&entry.name, e),
        }
    }

    info!(
        entries = pkg.len(),
        extracted = report.extracted.len(),
        skipped = report.skipped.len(),
        "archive unpacked"
    );
    Ok(report)
}

/// Run a full extraction of `companion` restricted to the `shared` names.
///
/// A companion that cannot be opened or parsed leaves every shared name
/// unresolved.
fn resolve_shared<C, S>(
    companion: C,
    shared: &BTreeSet<String>,
    sink: &mut S,
    capabilities: Capabilities,
    report: &mut Report,
) where
    C: Source,
    S: Sink + ?Sized,
{
    info!(count = shared.len(), "resolving shared entries from companion archive");
    let wanted = |name: &str, _: &PkgEntry| shared.contains(name);
    let options = ExtractOptions {
        capabilities,
        filter: Some(&wanted),
    };
    let sub = match unpack(companion, None::<C>, sink, &options) {
        Ok(sub) => sub,
        Err(error) => {
            warn!(%error, "companion archive unusable");
            Report::default()
        }
    };

    let missing: Vec<&String> = shared
        .iter()
        .filter(|name| {
            !sub.extracted.contains(*name) && !sub.skipped.iter().any(|s| &s.name == *name)
        })
        .collect();
    report.merge(sub);
    for name in missing {
        report.skip(name, Error::UnresolvedReference(name.clone()));
    }
}

/// Locate `common.pkg` in the same directory as `input`.
pub fn find_companion(input: &Path) -> Option<PathBuf> {
    let candidate = input.parent()?.join(COMMON_PKG);
    candidate.is_file().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_sink_refuses_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirSink::new(dir.path());
        for name in ["", ".", "..", "../x", "a/b", "a\\b"] {
            let err = sink.write_entry(name, b"x").unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "{name:?}");
        }
        sink.write_entry("ok.bin", b"x").unwrap();
        assert_eq!(std::fs::read(dir.path().join("ok.bin")).unwrap(), b"x");
    }

    #[test]
    fn companion_is_found_beside_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene.pkg");
        assert_eq!(find_companion(&input), None);
        std::fs::write(dir.path().join(COMMON_PKG), b"").unwrap();
        assert_eq!(find_companion(&input), Some(dir.path().join(COMMON_PKG)));
    }

    #[test]
    fn filter_defaults_to_everything() {
        let entry = PkgEntry {
            name: "a".into(),
            uncompressed_size: 0,
            compressed_size: 0,
            offset: 0,
            flags: Default::default(),
        };
        assert!(ExtractOptions::default().includes(&entry));
        let none = |_: &str, _: &PkgEntry| false;
        let options = ExtractOptions {
            filter: Some(&none),
            ..Default::default()
        };
        assert!(!options.includes(&entry));
    }
}
