//! RAR archive parsing and raw payload access.
//!
//! This module reads the block structure of RAR 1.5-4.x archives and hands
//! out the stored bytes of each entry, starting at any offset. Nothing is
//! decompressed or decrypted.
//!
//! ## Architecture
//!
//! - [`structures`]: block kinds, flag words, host OS table and the [`Entry`] record
//! - `layout`: per-block field tables resolved against flag words
//! - [`parser`]: the block decoder, one block per step
//! - [`catalog`]: the ordered, immutable list of entries
//! - [`extractor`]: the archive handle that opens, catalogs and extracts
//!
//! ## RAR Format Overview
//!
//! A RAR file is a flat run of blocks:
//! 1. The marker block (`Rar!\x1a\x07\x00`)
//! 2. One archive block with archive-wide flags
//! 3. A file block per entry, each followed by that entry's stored payload
//! 4. Optionally an end block
//!
//! Every block declares its own header size, and the next block always
//! starts right after that header (plus the payload for file blocks).
//!
//! ## Limitations
//!
//! - No decompression: compressed entries come back as packed bytes
//! - No decryption: password-protected entries are flagged, not decoded
//! - No joining of multi-volume sets
//! - No checksum verification
//! - RAR 5.0 archives are not supported

pub mod catalog;
pub mod extractor;
mod layout;
pub mod parser;
pub mod structures;

pub use catalog::{Catalog, EntryRef};
pub use extractor::RarArchive;
pub use parser::{Block, Detail, FileBlock, RarParser};
pub use structures::*;
