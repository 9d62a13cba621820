use std::io::{self, Read};

use super::ReadAt;

/// A read position over a [`ReadAt`] source.
///
/// The cursor owns its position exclusively; the source itself stays
/// stateless, so two cursors over the same source never disturb each other.
/// Implements [`Read`], which makes the `byteorder` extension methods
/// available for sequential field reads.
pub struct ByteCursor<'a, R: ReadAt + ?Sized> {
    source: &'a R,
    pos: u64,
}

impl<'a, R: ReadAt + ?Sized> ByteCursor<'a, R> {
    pub fn new(source: &'a R, pos: u64) -> Self {
        Self { source, pos }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Bytes left between the current position and the end of the source.
    pub fn remaining(&self) -> u64 {
        self.source.size().saturating_sub(self.pos)
    }

    /// Absolute seek.
    pub fn seek(&mut self, pos: u64) {
        self.pos = pos;
    }

    /// Relative seek forward.
    pub fn skip(&mut self, n: u64) {
        self.pos = self.pos.saturating_add(n);
    }

    /// Read as many bytes as are available, up to `buf.len()`.
    ///
    /// A return of 0 means the cursor sits at the end of the source; a
    /// short non-zero count means the source ended part way.
    pub fn try_fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.source.read_full_at(self.pos, buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    /// Read exactly `buf.len()` bytes or fail with `UnexpectedEof`.
    pub fn fill_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let n = self.try_fill(buf)?;
        if n < buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "stream ended at offset {} while reading {} bytes",
                    self.pos,
                    buf.len()
                ),
            ));
        }
        Ok(())
    }

    /// Read `len` bytes, or fewer if the source ends first.
    pub fn read_up_to(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let n = self.try_fill(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }
}

impl<R: ReadAt + ?Sized> Read for ByteCursor<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.source.read_at(self.pos, buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use byteorder::{LittleEndian, ReadBytesExt};

    #[test]
    fn sequential_reads_advance_position() {
        let source = MemoryReader::new(vec![0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xAA]);
        let mut cursor = ByteCursor::new(&source, 0);

        assert_eq!(cursor.read_u16::<LittleEndian>().unwrap(), 0x1234);
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 0x12345678);
        assert_eq!(cursor.position(), 6);
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn seek_and_skip() {
        let source = MemoryReader::new(b"abcdefgh".to_vec());
        let mut cursor = ByteCursor::new(&source, 0);

        cursor.seek(5);
        assert_eq!(cursor.read_u8().unwrap(), b'f');
        cursor.seek(1);
        cursor.skip(2);
        assert_eq!(cursor.read_u8().unwrap(), b'd');
    }

    #[test]
    fn try_fill_distinguishes_clean_end_from_short_read() {
        let source = MemoryReader::new(b"xyz".to_vec());
        let mut cursor = ByteCursor::new(&source, 1);

        let mut buf = [0u8; 7];
        assert_eq!(cursor.try_fill(&mut buf).unwrap(), 2);
        assert_eq!(cursor.try_fill(&mut buf).unwrap(), 0);
    }

    #[test]
    fn read_exact_reports_unexpected_eof() {
        let source = MemoryReader::new(b"xyz".to_vec());
        let mut cursor = ByteCursor::new(&source, 0);

        let mut buf = [0u8; 4];
        let err = cursor.fill_exact(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn read_up_to_truncates_at_end() {
        let source = MemoryReader::new(b"hello".to_vec());
        let mut cursor = ByteCursor::new(&source, 3);
        assert_eq!(cursor.read_up_to(10).unwrap(), b"lo");
    }
}
