//! The ordered entry catalog.

use std::io;

use crate::error::{FormatError, RarError, Result};
use crate::io::ReadAt;

use super::parser::{Block, Detail, FileBlock, RarParser};
use super::structures::{ArchiveFlags, Entry};

/// A reference to a catalog entry, by position or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRef {
    Index(usize),
    Name(Vec<u8>),
}

impl From<usize> for EntryRef {
    fn from(index: usize) -> Self {
        EntryRef::Index(index)
    }
}

impl From<&str> for EntryRef {
    fn from(name: &str) -> Self {
        EntryRef::Name(name.as_bytes().to_vec())
    }
}

impl From<String> for EntryRef {
    fn from(name: String) -> Self {
        EntryRef::Name(name.into_bytes())
    }
}

impl From<&[u8]> for EntryRef {
    fn from(name: &[u8]) -> Self {
        EntryRef::Name(name.to_vec())
    }
}

/// Every file entry of an archive, in the order their blocks appear.
///
/// A catalog is built in one pass and never changes afterwards; building
/// again re-reads the archive from the start.
#[derive(Debug, Clone)]
pub struct Catalog {
    archive_flags: ArchiveFlags,
    entries: Vec<Entry>,
    has_end_block: bool,
}

impl Catalog {
    /// Walk the archive after its marker block and decode every file block.
    ///
    /// The walk stops cleanly at the end block or where the stream ends on a
    /// block boundary. Any decode error aborts the build; no partial catalog
    /// is returned.
    pub fn build<R: ReadAt>(parser: &RarParser<R>, after_marker: u64) -> Result<Self> {
        let (archive_flags, mut position) = match parser.decode_block(after_marker, Detail::Structural)? {
            Some((Block::Archive(archive, _), next)) => (archive.flags, next),
            Some((other, _)) => {
                return Err(FormatError::InconsistentHeader {
                    offset: after_marker,
                    reason: format!("expected the archive block, found {other:?}"),
                }
                .into());
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended before the archive block",
                )
                .into());
            }
        };

        // Everything past the archive block is ciphertext
        if archive_flags.has_encrypted_headers() {
            return Err(RarError::Unsupported {
                name: "archive".to_string(),
                feature: "encrypted headers",
            });
        }
        if archive_flags.is_solid() {
            log::info!("solid archive: entries depend on their predecessors");
        }
        if archive_flags.is_volume() {
            log::warn!("archive is one volume of a multi-part set; parts are not joined");
        }

        let mut entries = Vec::new();
        let mut has_end_block = false;

        while let Some((block, next)) = parser.decode_block(position, Detail::Full)? {
            match block {
                Block::File(FileBlock::Full(entry)) => {
                    if entry.is_encrypted() {
                        log::warn!("{}: entry is password-protected", entry.filename_lossy());
                    }
                    if entry.is_continued_from_previous() || entry.continues_in_next() {
                        log::warn!("{}: entry spans volumes", entry.filename_lossy());
                    }
                    // Speed past the payload
                    position = next + entry.packed_size;
                    entries.push(entry);
                }
                Block::End(_) => {
                    has_end_block = true;
                    break;
                }
                other => {
                    return Err(FormatError::InconsistentHeader {
                        offset: position,
                        reason: format!("unexpected block inside the archive body: {other:?}"),
                    }
                    .into());
                }
            }
        }

        log::info!(
            "catalog built: {} entries, {}",
            entries.len(),
            if has_end_block {
                "ended by end block"
            } else {
                "ended at end of stream"
            }
        );

        Ok(Self {
            archive_flags,
            entries,
            has_end_block,
        })
    }

    pub fn archive_flags(&self) -> ArchiveFlags {
        self.archive_flags
    }

    /// Whether the archive closed with an end block rather than just running out.
    pub fn has_end_block(&self) -> bool {
        self.has_end_block
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Entry> {
        self.entries.get(index).ok_or(RarError::NoSuchIndex {
            index,
            count: self.entries.len(),
        })
    }

    /// Id of the first entry named `name`.
    ///
    /// Names need not be unique inside an archive; the lowest id wins.
    pub fn find(&self, name: impl AsRef<[u8]>) -> Result<usize> {
        let name = name.as_ref();
        self.entries
            .iter()
            .position(|e| e.filename == name)
            .ok_or_else(|| RarError::NotFound {
                name: String::from_utf8_lossy(name).into_owned(),
            })
    }

    pub fn resolve(&self, entry: &EntryRef) -> Result<&Entry> {
        match entry {
            EntryRef::Index(index) => self.get(*index),
            EntryRef::Name(name) => self.get(self.find(name)?),
        }
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
