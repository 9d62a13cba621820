use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::io::{ByteCursor, ReadAt};

use super::catalog::{Catalog, EntryRef};
use super::parser::RarParser;
use super::structures::{BlockHeader, Entry};

/// Chunk size used when streaming a payload to a writer.
const COPY_CHUNK: usize = 64 * 1024;

/// An opened RAR archive
///
/// Opening only checks the marker. The catalog is built by an explicit
/// [`build_catalog`](Self::build_catalog) call, and the returned value is
/// what lookups and extractions run against.
pub struct RarArchive<R: ReadAt> {
    parser: RarParser<R>,
    body_start: u64,
}

impl<R: ReadAt> RarArchive<R> {
    /// Validate the marker block and wrap the source.
    pub fn open(reader: Arc<R>) -> Result<Self> {
        let parser = RarParser::new(reader);
        let body_start = parser.read_marker()?;
        log::debug!("RAR marker found, {} byte archive", parser.size());
        Ok(Self { parser, body_start })
    }

    /// Decode every file block into an immutable catalog
    pub fn build_catalog(&self) -> Result<Catalog> {
        Catalog::build(&self.parser, self.body_start)
    }

    /// List all entries in the archive
    pub fn list_entries(&self) -> Result<Vec<Entry>> {
        Ok(self.build_catalog()?.into_entries())
    }

    /// Structural layout of every block, payloads skipped
    pub fn scan_blocks(&self) -> Result<Vec<BlockHeader>> {
        self.parser.scan_blocks()
    }

    pub fn reader(&self) -> &Arc<R> {
        self.parser.reader()
    }

    /// Read raw stored bytes of an entry.
    ///
    /// `offset` is relative to the start of the entry's payload and may not
    /// exceed its packed size. `length` defaults to the rest of the payload;
    /// an explicit length may run past the payload and is only cut short by
    /// the end of the stream. Bytes come back exactly as stored: compressed
    /// or encrypted entries are not decoded.
    pub fn extract(
        &self,
        catalog: &Catalog,
        entry: impl Into<EntryRef>,
        offset: u64,
        length: Option<u64>,
    ) -> Result<Vec<u8>> {
        let entry = catalog.resolve(&entry.into())?;
        let mut cursor = self.payload_cursor(entry, offset)?;
        let length = length.unwrap_or(entry.packed_size - offset);

        // Never allocate past what the stream can still deliver
        let length = length.min(cursor.remaining()) as usize;
        log::trace!(
            "{}: reading {length} bytes at {}",
            entry.filename_lossy(),
            cursor.position()
        );
        Ok(cursor.read_up_to(length)?)
    }

    /// Stream raw stored bytes of an entry into `writer`.
    ///
    /// Same range rules as [`extract`](Self::extract). Returns the number of
    /// bytes written.
    pub fn extract_to_writer<W: Write>(
        &self,
        catalog: &Catalog,
        entry: impl Into<EntryRef>,
        offset: u64,
        length: Option<u64>,
        writer: &mut W,
    ) -> Result<u64> {
        let entry = catalog.resolve(&entry.into())?;
        let mut cursor = self.payload_cursor(entry, offset)?;
        let mut left = length
            .unwrap_or(entry.packed_size - offset)
            .min(cursor.remaining());

        let mut buf = vec![0u8; COPY_CHUNK.min(left as usize)];
        let mut written = 0;
        while left > 0 {
            let want = (left as usize).min(buf.len());
            cursor.fill_exact(&mut buf[..want])?;
            writer.write_all(&buf[..want])?;
            written += want as u64;
            left -= want as u64;
        }
        writer.flush()?;

        Ok(written)
    }

    /// Extract an entry's raw payload to a file on disk
    pub fn extract_to_file(
        &self,
        catalog: &Catalog,
        entry: impl Into<EntryRef>,
        output_path: &Path,
    ) -> Result<u64> {
        // Create parent directories if needed
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = io::BufWriter::new(fs::File::create(output_path)?);
        self.extract_to_writer(catalog, entry, 0, None, &mut file)
    }

    fn payload_cursor(&self, entry: &Entry, offset: u64) -> Result<ByteCursor<'_, R>> {
        entry.check_offset(offset)?;
        Ok(ByteCursor::new(
            &**self.parser.reader(),
            entry.data_start() + offset,
        ))
    }
}
