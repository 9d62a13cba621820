//! Low-level RAR block decoder.
//!
//! A RAR 1.5-4.x archive is a flat sequence of blocks. Every block opens with
//! the same 7-byte prefix (crc, type tag, flags, header size) and the header
//! size alone decides where the next block begins, whatever the flags say
//! about optional fields.
//!
//! ## Decoding Strategy
//!
//! Each step is a function of `(source, position)` returning the decoded
//! block and the position of the next one:
//! 1. Read the prefix and classify the block by its tag
//! 2. Read the whole declared header region into memory
//! 3. Resolve the block's field table against its flags and pick fields
//!    out of the region by absolute offset
//!
//! Nothing is read twice and the cursor never moves backwards.

use std::io;
use std::sync::Arc;

use crate::error::{FormatError, RarError, Result};
use crate::io::{ByteCursor, ReadAt};

use super::layout::{Field, Layout};
use super::structures::*;

/// How much of a file block to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    /// Sizes and offsets only; the name and metadata are left alone.
    Structural,
    /// Every field, filename included.
    Full,
}

/// A file block at the requested level of detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileBlock {
    Structural(BlockHeader),
    Full(Entry),
}

impl FileBlock {
    pub fn header(&self) -> BlockHeader {
        match self {
            FileBlock::Structural(header) => *header,
            FileBlock::Full(entry) => BlockHeader {
                kind: BlockKind::File,
                block_start: entry.block_start,
                flags: entry.flags.bits(),
                head_size: entry.head_size,
                packed_size: entry.packed_size,
            },
        }
    }

    pub fn packed_size(&self) -> u64 {
        self.header().packed_size
    }
}

/// One decoded block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Marker(BlockHeader),
    Archive(ArchiveHeader, BlockHeader),
    File(FileBlock),
    End(BlockHeader),
}

/// Low-level RAR parser.
///
/// Holds the byte source and its length. Decoding never mutates the parser,
/// every call carries its own position.
pub struct RarParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> RarParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Total size of the archive in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Get a reference to the underlying reader.
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    /// Check the marker block at offset 0.
    ///
    /// Returns the offset of the block that follows it.
    pub fn read_marker(&self) -> Result<u64> {
        let mut cursor = ByteCursor::new(&*self.reader, 0);
        let mut buf = [0u8; BLOCK_PREFIX_SIZE];
        let n = cursor.try_fill(&mut buf)?;

        if n < BLOCK_PREFIX_SIZE || buf != MARKER {
            return Err(FormatError::BadSignature {
                found: buf[..n].to_vec(),
            }
            .into());
        }

        Ok(cursor.position())
    }

    /// Decode the block starting at `position`.
    ///
    /// Returns the block and the offset where the next block's prefix
    /// starts, which is always `block_start + head_size`. A file block's
    /// payload sits between the two; skipping it is up to the caller.
    ///
    /// Returns `Ok(None)` when the stream ends exactly at `position`. A
    /// stream that ends anywhere inside a block is an I/O error.
    pub fn decode_block(&self, position: u64, detail: Detail) -> Result<Option<(Block, u64)>> {
        let mut cursor = ByteCursor::new(&*self.reader, position);

        let mut prefix = [0u8; BLOCK_PREFIX_SIZE];
        let n = cursor.try_fill(&mut prefix)?;
        if n == 0 {
            return Ok(None);
        }

        if n < BLOCK_PREFIX_SIZE {
            // The crc in front of the tag is not checked.
            if n > 2 && BlockKind::from_tag(prefix[2]).is_none() {
                return Err(unsupported(prefix[2], position));
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ended inside the block prefix at offset {position}"),
            )
            .into());
        }

        let Some(kind) = BlockKind::from_tag(prefix[2]) else {
            return Err(unsupported(prefix[2], position));
        };
        let flags = u16::from_le_bytes([prefix[3], prefix[4]]);
        let head_size = u16::from_le_bytes([prefix[5], prefix[6]]);

        log::debug!(
            "{} block at {position}: flags {flags:#06x}, head size {head_size}",
            kind.name()
        );

        if (head_size as usize) < BLOCK_PREFIX_SIZE {
            return Err(inconsistent(
                position,
                format!("head size {head_size} is smaller than the block prefix"),
            ));
        }

        if kind == BlockKind::Marker && prefix != MARKER {
            return Err(FormatError::BadSignature {
                found: prefix.to_vec(),
            }
            .into());
        }

        let mut region = vec![0u8; head_size as usize];
        region[..BLOCK_PREFIX_SIZE].copy_from_slice(&prefix);
        cursor.fill_exact(&mut region[BLOCK_PREFIX_SIZE..])?;

        let layout = Layout::resolve(kind, flags);
        if layout.fixed_len() > region.len() {
            return Err(inconsistent(
                position,
                format!(
                    "{} header of {head_size} bytes cannot hold its {} bytes of fixed fields",
                    kind.name(),
                    layout.fixed_len()
                ),
            ));
        }

        let packed_size = wide(&layout, &region, Field::PackedSize, Field::HighPackedSize);
        let header = structural(kind, position, flags, head_size, packed_size);
        let next = header.data_start();

        let block = match kind {
            BlockKind::Marker => Block::Marker(header),
            BlockKind::Archive => Block::Archive(
                ArchiveHeader {
                    block_start: position,
                    head_size,
                    flags: ArchiveFlags(flags),
                },
                header,
            ),
            BlockKind::End => Block::End(header),
            BlockKind::File => {
                if next
                    .checked_add(packed_size)
                    .is_none_or(|end| end > self.size)
                {
                    return Err(inconsistent(
                        position,
                        format!(
                            "payload of {packed_size} bytes at offset {next} runs past the end of a {} byte stream",
                            self.size
                        ),
                    ));
                }

                match detail {
                    Detail::Structural => Block::File(FileBlock::Structural(header)),
                    Detail::Full => Block::File(FileBlock::Full(decode_entry(
                        &layout, &region, header,
                    )?)),
                }
            }
        };

        Ok(Some((block, next)))
    }

    /// Walk every block from the marker on, without decoding file names.
    ///
    /// Stops after the end block or at the end of the stream.
    pub fn scan_blocks(&self) -> Result<Vec<BlockHeader>> {
        let mut blocks = Vec::new();
        let mut position = 0;

        while let Some((block, next)) = self.decode_block(position, Detail::Structural)? {
            position = next;
            let header = match block {
                Block::Marker(header) | Block::End(header) | Block::Archive(_, header) => header,
                Block::File(file) => {
                    position += file.packed_size();
                    file.header()
                }
            };
            blocks.push(header);
            if header.kind == BlockKind::End {
                break;
            }
        }

        Ok(blocks)
    }
}

fn structural(
    kind: BlockKind,
    block_start: u64,
    flags: u16,
    head_size: u16,
    packed_size: u64,
) -> BlockHeader {
    BlockHeader {
        kind,
        block_start,
        flags,
        head_size,
        packed_size,
    }
}

fn unsupported(tag: u8, offset: u64) -> RarError {
    FormatError::UnsupportedBlockType { tag, offset }.into()
}

fn inconsistent(offset: u64, reason: String) -> RarError {
    FormatError::InconsistentHeader { offset, reason }.into()
}

/// A size split into a low word and an optional high-order word.
fn wide(layout: &Layout, region: &[u8], low: Field, high: Field) -> u64 {
    let low = layout.read(region, low).unwrap_or(0);
    let high = layout.read(region, high).unwrap_or(0);
    low + (high << 32)
}

fn decode_entry(layout: &Layout, region: &[u8], header: BlockHeader) -> Result<Entry> {
    let offset = header.block_start;
    let read = |field| layout.read(region, field).unwrap_or(0);

    let os_index = read(Field::HostOs) as u8;
    let os_origin = HostOs::from_index(os_index).ok_or(FormatError::UnknownHostOs {
        index: os_index,
        offset,
    })?;

    let method = read(Field::Method) as u8;
    let compression_level = method.checked_sub(METHOD_BASE).ok_or_else(|| {
        inconsistent(offset, format!("method byte {method:#04x} is below {METHOD_BASE:#04x}"))
    })?;

    let name_len = read(Field::NameLen) as usize;
    let name_start = layout.fixed_len();
    let Some(filename) = region.get(name_start..name_start + name_len) else {
        return Err(inconsistent(
            offset,
            format!(
                "file name of {name_len} bytes overruns a {} byte header",
                region.len()
            ),
        ));
    };

    Ok(Entry {
        block_start: header.block_start,
        head_size: header.head_size,
        packed_size: header.packed_size,
        real_size: wide(layout, region, Field::RealSize, Field::HighRealSize),
        os_origin,
        compression_level,
        dos_time: read(Field::DosTime) as u16,
        dos_date: read(Field::DosDate) as u16,
        attributes: read(Field::Attributes) as u32,
        filename: filename.to_vec(),
        flags: FileFlags(header.flags),
    })
}
