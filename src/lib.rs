//! # runrar
//!
//! A Rust RAR catalog reader with HTTP URL support using Range requests.
//!
//! This library lists the entries of RAR 1.5-4.x archives and returns the raw
//! stored bytes of any entry from any offset. It never decompresses or
//! decrypts, so it can serve the stored payload of an entry as soon as its
//! bytes are available, from the local filesystem, memory, or a remote
//! HTTP server that supports Range requests.
//!
//! ## Features
//!
//! - Walk the block structure of local, in-memory, or remote archives
//! - Large-file (64-bit) packed and unpacked sizes
//! - Random access into stored payloads by entry id or name
//! - Volume, solid, continuation and password flags exposed, not acted on
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use runrar::{LocalFileReader, RarArchive};
//!
//! fn main() -> anyhow::Result<()> {
//!     let reader = Arc::new(LocalFileReader::new("archive.rar".as_ref())?);
//!
//!     // Opening only checks the marker; cataloging is a separate step
//!     let archive = RarArchive::open(reader)?;
//!     let catalog = archive.build_catalog()?;
//!     for entry in &catalog {
//!         println!("{} ({} bytes stored)", entry.filename_lossy(), entry.packed_size);
//!     }
//!
//!     // The last 5 stored bytes of a.txt
//!     let tail = archive.extract(&catalog, "a.txt", 5, None)?;
//!     println!("{tail:?}");
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod rar;

pub use cli::Cli;
pub use error::{FormatError, RarError, Result};
pub use io::{ByteCursor, HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use rar::{
    ArchiveFlags, BlockHeader, BlockKind, Catalog, Entry, EntryRef, FileFlags, HostOs, RarArchive,
};
