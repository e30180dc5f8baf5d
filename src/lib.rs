//! **ed8pkg** - a Rust library for unpacking ED8 engine `.pkg` archives.
//!
//! `.pkg` is the asset container of Trails of Cold Steel I-IV, Trails into
//! Reverie and Tokyo Xanadu. Each archive is a flat directory of named
//! entries; each entry is stored raw or compressed with one of three codecs.
//!
//! # Modules
//! | Module | Purpose |
//! |--------|---------|
//! | [`formats::pkg`] | Archive header and entry directory |
//! | [`codec`]        | Per-entry codec selection, including the NISLZSS/LZ4 probe |
//! | [`compression`]  | NISLZSS, LZ4 variant and Zstandard decoders |
//! | [`extract`]      | Whole-archive extraction with `common.pkg` resolution |

pub mod codec;
pub mod compression;
pub mod error;
pub mod extract;
pub mod formats;
pub mod utils;

pub use error::{Error, Result};
