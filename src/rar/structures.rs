use crate::error::{RarError, Result};

/// The marker block every RAR 1.5-4.x archive opens with: `Rar!\x1a\x07\x00`.
pub const MARKER: [u8; 7] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00];

/// Common prefix shared by every block: crc (2), tag (1), flags (2), head size (2).
pub const BLOCK_PREFIX_SIZE: usize = 7;

/// Baseline of the method byte; `0x30` means stored.
pub const METHOD_BASE: u8 = 0x30;

/// Block type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Marker,
    Archive,
    File,
    End,
}

impl BlockKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x72 => Some(BlockKind::Marker),
            0x73 => Some(BlockKind::Archive),
            0x74 => Some(BlockKind::File),
            0x7B => Some(BlockKind::End),
            _ => None,
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            BlockKind::Marker => 0x72,
            BlockKind::Archive => 0x73,
            BlockKind::File => 0x74,
            BlockKind::End => 0x7B,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Marker => "marker",
            BlockKind::Archive => "archive",
            BlockKind::File => "file",
            BlockKind::End => "end",
        }
    }
}

/// Flags carried by the archive block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveFlags(pub u16);

impl ArchiveFlags {
    pub const FIRST_VOLUME: u16 = 0x0001;
    pub const VOLUME: u16 = 0x0100;
    pub const LOCKED: u16 = 0x0400;
    pub const SOLID: u16 = 0x0800;
    pub const NEW_NAMING: u16 = 0x1000;
    pub const RECOVERY: u16 = 0x4000;
    pub const ENCRYPTED_HEADERS: u16 = 0x8000;

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn is_first_volume(&self) -> bool {
        self.0 & Self::FIRST_VOLUME != 0
    }

    pub fn is_volume(&self) -> bool {
        self.0 & Self::VOLUME != 0
    }

    pub fn is_locked(&self) -> bool {
        self.0 & Self::LOCKED != 0
    }

    pub fn is_solid(&self) -> bool {
        self.0 & Self::SOLID != 0
    }

    pub fn has_new_naming(&self) -> bool {
        self.0 & Self::NEW_NAMING != 0
    }

    pub fn has_recovery_record(&self) -> bool {
        self.0 & Self::RECOVERY != 0
    }

    pub fn has_encrypted_headers(&self) -> bool {
        self.0 & Self::ENCRYPTED_HEADERS != 0
    }
}

/// Flags carried by each block; meanings below are those of file blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileFlags(pub u16);

impl FileFlags {
    pub const HIGH_PACK: u16 = 0x0001;
    pub const UNICODE: u16 = 0x0002;
    pub const SALTED: u16 = 0x0004;
    pub const EXT_TIME: u16 = 0x0010;
    pub const MORE_SIZE: u16 = 0x0080;
    pub const CONTINUED: u16 = 0x0100;
    pub const CONTINUES: u16 = 0x0200;
    pub const PASSWORDED: u16 = 0x0400;
    pub const SOLID: u16 = 0x1000;

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn contains(&self, bit: u16) -> bool {
        self.0 & bit != 0
    }
}

/// Operating system an entry was archived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    MsDos,
    Os2,
    Win32,
    Unix,
    MacOs,
    BeOs,
}

impl HostOs {
    const TABLE: [HostOs; 6] = [
        HostOs::MsDos,
        HostOs::Os2,
        HostOs::Win32,
        HostOs::Unix,
        HostOs::MacOs,
        HostOs::BeOs,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::TABLE.get(index as usize).copied()
    }

    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            HostOs::MsDos => "MS DOS",
            HostOs::Os2 => "OS/2",
            HostOs::Win32 => "Win32",
            HostOs::Unix => "Unix",
            HostOs::MacOs => "Mac OS",
            HostOs::BeOs => "BeOS",
        }
    }
}

/// Structural fields common to every decoded block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub kind: BlockKind,
    /// Absolute offset of the block's first byte (its crc field).
    pub block_start: u64,
    pub flags: u16,
    /// Declared length of the header region, prefix included.
    pub head_size: u16,
    /// Payload bytes following the header; 0 for blocks without one.
    pub packed_size: u64,
}

impl BlockHeader {
    /// Offset just past the header region.
    pub fn data_start(&self) -> u64 {
        self.block_start + self.head_size as u64
    }
}

/// The archive block, decoded once per archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub block_start: u64,
    pub head_size: u16,
    pub flags: ArchiveFlags,
}

/// One file stored in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub block_start: u64,
    pub head_size: u16,
    /// Stored payload length, high-order word folded in.
    pub packed_size: u64,
    /// Declared uncompressed length; informational only.
    pub real_size: u64,
    pub os_origin: HostOs,
    /// Method level: 0 stored, 1 fastest through 5 best.
    pub compression_level: u8,
    pub dos_time: u16,
    pub dos_date: u16,
    pub attributes: u32,
    /// Raw name bytes, no charset conversion.
    pub filename: Vec<u8>,
    pub flags: FileFlags,
}

impl Entry {
    /// Absolute offset of the first payload byte.
    pub fn data_start(&self) -> u64 {
        self.block_start + self.head_size as u64
    }

    pub fn filename_lossy(&self) -> String {
        String::from_utf8_lossy(&self.filename).into_owned()
    }

    pub fn is_stored(&self) -> bool {
        self.compression_level == 0
    }

    pub fn is_large(&self) -> bool {
        self.flags.contains(FileFlags::HIGH_PACK)
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags.contains(FileFlags::PASSWORDED)
    }

    pub fn is_continued_from_previous(&self) -> bool {
        self.flags.contains(FileFlags::CONTINUED)
    }

    pub fn continues_in_next(&self) -> bool {
        self.flags.contains(FileFlags::CONTINUES)
    }

    /// Fails for password-protected entries, whose stored bytes are ciphertext.
    pub fn ensure_unencrypted(&self) -> Result<()> {
        if self.is_encrypted() {
            return Err(RarError::Unsupported {
                name: self.filename_lossy(),
                feature: "password-protected entry",
            });
        }
        Ok(())
    }

    /// Fails with [`RarError::OutOfRange`] if `offset` lies past the payload.
    pub fn check_offset(&self, offset: u64) -> Result<()> {
        if offset > self.packed_size {
            return Err(RarError::OutOfRange {
                offset,
                packed_size: self.packed_size,
            });
        }
        Ok(())
    }

    /// Seconds since midnight, at the format's 2-second resolution.
    pub fn seconds_of_day(&self) -> u32 {
        let t = self.dos_time as u32;
        (t & 0x1F) * 2 + ((t >> 5) & 0x3F) * 60 + ((t >> 11) & 0x1F) * 3600
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.dos_time & 0x1F) * 2) as u8;
        let minute = ((self.dos_time >> 5) & 0x3F) as u8;
        let hour = ((self.dos_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.dos_date & 0x1F) as u8;
        let month = ((self.dos_date >> 5) & 0x0F) as u8;
        let year = ((self.dos_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(flags: u16, dos_time: u16, dos_date: u16) -> Entry {
        Entry {
            block_start: 20,
            head_size: 37,
            packed_size: 10,
            real_size: 10,
            os_origin: HostOs::Unix,
            compression_level: 0,
            dos_time,
            dos_date,
            attributes: 0,
            filename: b"a.txt".to_vec(),
            flags: FileFlags(flags),
        }
    }

    #[test]
    fn block_tags_round_trip() {
        for kind in [BlockKind::Marker, BlockKind::Archive, BlockKind::File, BlockKind::End] {
            assert_eq!(BlockKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(BlockKind::from_tag(0x7A), None);
    }

    #[test]
    fn host_os_table() {
        assert_eq!(HostOs::from_index(0), Some(HostOs::MsDos));
        assert_eq!(HostOs::from_index(3).map(|os| os.name()), Some("Unix"));
        assert_eq!(HostOs::from_index(5), Some(HostOs::BeOs));
        assert_eq!(HostOs::from_index(6), None);
        assert_eq!(HostOs::Win32.index(), 2);
    }

    #[test]
    fn archive_flag_bits() {
        let flags = ArchiveFlags(0x0001 | 0x0100 | 0x0800 | 0x1000);
        assert!(flags.is_first_volume());
        assert!(flags.is_volume());
        assert!(flags.is_solid());
        assert!(flags.has_new_naming());
        assert!(!flags.is_locked());
    }

    #[test]
    fn file_flag_accessors() {
        let entry = entry_with(0x0001 | 0x0200 | 0x0400, 0, 0);
        assert!(entry.is_large());
        assert!(entry.continues_in_next());
        assert!(!entry.is_continued_from_previous());
        assert!(entry.is_encrypted());
        assert!(matches!(
            entry.ensure_unencrypted(),
            Err(RarError::Unsupported { .. })
        ));
        assert!(entry_with(0, 0, 0).ensure_unencrypted().is_ok());
    }

    #[test]
    fn dos_time_decoding() {
        // 13:45:58 -> hour 13, minute 45, two-second units 29
        let dos_time = (13 << 11) | (45 << 5) | 29;
        // 2009-06-15
        let dos_date = ((2009 - 1980) << 9) | (6 << 5) | 15;
        let entry = entry_with(0, dos_time, dos_date);

        assert_eq!(entry.mod_time(), (13, 45, 58));
        assert_eq!(entry.seconds_of_day(), 13 * 3600 + 45 * 60 + 58);
        assert_eq!(entry.mod_date(), (2009, 6, 15));
    }

    #[test]
    fn data_start_follows_header() {
        assert_eq!(entry_with(0, 0, 0).data_start(), 57);
    }
}
