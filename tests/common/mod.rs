//! Builds small RAR 1.5-4.x archives in memory.
//!
//! CRC fields are written as zero since the reader never checks them.

#![allow(dead_code)]

pub const MARKER: [u8; 7] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00];

pub const HIGH_PACK: u16 = 0x0001;
pub const MORE_SIZE: u16 = 0x0080;
pub const CONTINUED: u16 = 0x0100;
pub const CONTINUES: u16 = 0x0200;
pub const PASSWORDED: u16 = 0x0400;

pub const ARCH_FIRST_VOLUME: u16 = 0x0001;
pub const ARCH_VOLUME: u16 = 0x0100;
pub const ARCH_SOLID: u16 = 0x0800;
pub const ARCH_RECOVERY: u16 = 0x4000;
pub const ARCH_ENCRYPTED_HEADERS: u16 = 0x8000;

/// One file block to emit.
#[derive(Clone, Debug)]
pub struct FileSpec {
    pub name: Vec<u8>,
    pub payload: Vec<u8>,
    pub flags: u16,
    pub host_os: u8,
    pub method: u8,
    pub real_size: u64,
    pub dos_time: u16,
    pub dos_date: u16,
    pub attributes: u32,
    /// Bytes of padding appended to the header region after the name.
    pub header_padding: usize,
    /// Overrides the packed size written to the header.
    pub declared_packed_size: Option<u64>,
}

impl FileSpec {
    pub fn stored(name: &str, payload: &[u8]) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            payload: payload.to_vec(),
            flags: 0,
            host_os: 2,
            method: 0x30,
            real_size: payload.len() as u64,
            dos_time: 0,
            dos_date: 0,
            attributes: 0x20,
            header_padding: 0,
            declared_packed_size: None,
        }
    }

    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn host_os(mut self, host_os: u8) -> Self {
        self.host_os = host_os;
        self
    }

    pub fn method(mut self, method: u8) -> Self {
        self.method = method;
        self
    }

    pub fn padding(mut self, padding: usize) -> Self {
        self.header_padding = padding;
        self
    }

    pub fn time(mut self, dos_time: u16, dos_date: u16) -> Self {
        self.dos_time = dos_time;
        self.dos_date = dos_date;
        self
    }

    pub fn declared_packed_size(mut self, size: u64) -> Self {
        self.declared_packed_size = Some(size);
        self
    }

    pub fn real_size(mut self, size: u64) -> Self {
        self.real_size = size;
        self
    }

    /// Header region bytes, prefix included.
    pub fn header(&self) -> Vec<u8> {
        let packed = self
            .declared_packed_size
            .unwrap_or(self.payload.len() as u64);

        let mut body = Vec::new();
        body.extend_from_slice(&(packed as u32).to_le_bytes());
        body.extend_from_slice(&(self.real_size as u32).to_le_bytes());
        body.push(self.host_os);
        body.extend_from_slice(&0u32.to_le_bytes()); // file crc
        body.extend_from_slice(&self.dos_time.to_le_bytes());
        body.extend_from_slice(&self.dos_date.to_le_bytes());
        body.push(29); // version
        body.push(self.method);
        body.extend_from_slice(&(self.name.len() as u16).to_le_bytes());
        body.extend_from_slice(&self.attributes.to_le_bytes());
        if self.flags & HIGH_PACK != 0 {
            body.extend_from_slice(&((packed >> 32) as u32).to_le_bytes());
            body.extend_from_slice(&((self.real_size >> 32) as u32).to_le_bytes());
        }
        body.extend_from_slice(&self.name);
        body.extend(std::iter::repeat_n(0xEEu8, self.header_padding));

        block(0x74, self.flags, &body)
    }
}

/// A block with the common prefix; head size covers prefix and body.
pub fn block(tag: u8, flags: u16, body: &[u8]) -> Vec<u8> {
    let head_size = (7 + body.len()) as u16;
    let mut out = Vec::with_capacity(head_size as usize);
    out.extend_from_slice(&0u16.to_le_bytes());
    out.push(tag);
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&head_size.to_le_bytes());
    out.extend_from_slice(body);
    out
}

#[derive(Clone, Debug, Default)]
pub struct ArchiveBuilder {
    archive_flags: u16,
    files: Vec<FileSpec>,
    end_block: bool,
    trailing: Vec<u8>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            end_block: true,
            ..Self::default()
        }
    }

    pub fn archive_flags(mut self, flags: u16) -> Self {
        self.archive_flags = flags;
        self
    }

    pub fn file(mut self, file: FileSpec) -> Self {
        self.files.push(file);
        self
    }

    pub fn stored(self, name: &str, payload: &[u8]) -> Self {
        self.file(FileSpec::stored(name, payload))
    }

    pub fn without_end_block(mut self) -> Self {
        self.end_block = false;
        self
    }

    /// Raw bytes appended after everything else.
    pub fn trailing(mut self, bytes: &[u8]) -> Self {
        self.trailing = bytes.to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = MARKER.to_vec();
        // Archive block: two reserved fields after the prefix
        out.extend(block(0x73, self.archive_flags, &[0u8; 6]));
        for file in &self.files {
            out.extend(file.header());
            out.extend_from_slice(&file.payload);
        }
        if self.end_block {
            out.extend(block(0x7B, 0x4000, &[]));
        }
        out.extend_from_slice(&self.trailing);
        out
    }

    /// Offset where each file's payload starts in the built archive.
    pub fn payload_offsets(&self) -> Vec<u64> {
        let mut offset = (MARKER.len() + 13) as u64;
        self.files
            .iter()
            .map(|file| {
                let start = offset + file.header().len() as u64;
                offset = start + file.payload.len() as u64;
                start
            })
            .collect()
    }
}
