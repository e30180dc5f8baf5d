//! Parsers for ED8 container formats.
//!
//! Parsers follow the same conventions:
//!
//! * **Generic over** [`std::io::Read`] (+ [`std::io::Seek`] where payloads
//!   are accessed) - pass a [`std::fs::File`], a [`std::io::Cursor`], or
//!   anything else that implements both traits.
//! * **Metadata only** - `parse` reads the directory into memory. Payloads are
//!   decoded on demand through a `*Reader<R>` wrapper or [`crate::extract`].
//!
//! | Module  | Format | Description |
//! |---------|--------|-------------|
//! | [`pkg`] | PKG    | Flat asset archive with per-entry compression |

pub mod pkg;
