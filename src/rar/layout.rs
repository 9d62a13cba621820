//! Declarative header layouts.
//!
//! Each block type has an ordered table of fixed-width fields. A field may be
//! conditional on the block's flags; absent fields take no space, so the
//! offset of every later field shifts accordingly. Resolving a table against
//! a flag word yields absolute offsets from the block start, which lets the
//! decoder pick fields out of the header region in any order.

use byteorder::{ByteOrder, LittleEndian};

use super::structures::{BlockKind, FileFlags};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Crc,
    Tag,
    Flags,
    HeadSize,
    PackedSize,
    RealSize,
    HostOs,
    FileCrc,
    DosTime,
    DosDate,
    Version,
    Method,
    NameLen,
    Attributes,
    HighPackedSize,
    HighRealSize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSpec {
    pub field: Field,
    pub width: usize,
    pub present: fn(u16) -> bool,
}

const fn always(_: u16) -> bool {
    true
}

const fn more_size(flags: u16) -> bool {
    flags & FileFlags::MORE_SIZE != 0
}

const fn high_pack(flags: u16) -> bool {
    flags & FileFlags::HIGH_PACK != 0
}

const fn field(field: Field, width: usize) -> FieldSpec {
    FieldSpec {
        field,
        width,
        present: always,
    }
}

const fn field_if(field: Field, width: usize, present: fn(u16) -> bool) -> FieldSpec {
    FieldSpec {
        field,
        width,
        present,
    }
}

const PREFIX: [FieldSpec; 4] = [
    field(Field::Crc, 2),
    field(Field::Tag, 1),
    field(Field::Flags, 2),
    field(Field::HeadSize, 2),
];

const MARKER_FIELDS: &[FieldSpec] = &PREFIX;

const ARCHIVE_FIELDS: &[FieldSpec] = &[
    PREFIX[0],
    PREFIX[1],
    PREFIX[2],
    PREFIX[3],
    field_if(Field::PackedSize, 4, more_size),
];

const FILE_FIELDS: &[FieldSpec] = &[
    PREFIX[0],
    PREFIX[1],
    PREFIX[2],
    PREFIX[3],
    field(Field::PackedSize, 4),
    field(Field::RealSize, 4),
    field(Field::HostOs, 1),
    field(Field::FileCrc, 4),
    field(Field::DosTime, 2),
    field(Field::DosDate, 2),
    field(Field::Version, 1),
    field(Field::Method, 1),
    field(Field::NameLen, 2),
    field(Field::Attributes, 4),
    field_if(Field::HighPackedSize, 4, high_pack),
    field_if(Field::HighRealSize, 4, high_pack),
];

const END_FIELDS: &[FieldSpec] = &PREFIX;

pub(crate) fn fields_for(kind: BlockKind) -> &'static [FieldSpec] {
    match kind {
        BlockKind::Marker => MARKER_FIELDS,
        BlockKind::Archive => ARCHIVE_FIELDS,
        BlockKind::File => FILE_FIELDS,
        BlockKind::End => END_FIELDS,
    }
}

/// A field table resolved against one flag word.
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    slots: Vec<(Field, usize, usize)>,
    fixed_len: usize,
}

impl Layout {
    pub fn resolve(kind: BlockKind, flags: u16) -> Self {
        let mut slots = Vec::with_capacity(fields_for(kind).len());
        let mut offset = 0;
        for spec in fields_for(kind) {
            if (spec.present)(flags) {
                slots.push((spec.field, offset, spec.width));
                offset += spec.width;
            }
        }
        Self {
            slots,
            fixed_len: offset,
        }
    }

    /// Bytes occupied by the fixed fields; variable data starts here.
    pub fn fixed_len(&self) -> usize {
        self.fixed_len
    }

    fn slot(&self, field: Field) -> Option<(usize, usize)> {
        self.slots
            .iter()
            .find(|(f, _, _)| *f == field)
            .map(|&(_, off, width)| (off, width))
    }

    /// Read a present field out of a header region as a little-endian integer.
    ///
    /// The region must be at least `fixed_len()` bytes long.
    pub fn read(&self, region: &[u8], field: Field) -> Option<u64> {
        let (off, width) = self.slot(field)?;
        Some(LittleEndian::read_uint(&region[off..off + width], width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_layout_without_high_pack() {
        let layout = Layout::resolve(BlockKind::File, 0);
        assert_eq!(layout.fixed_len(), 32);
        assert_eq!(layout.read(&[0u8; 32], Field::HighPackedSize), None);

        let mut region = vec![0u8; 32];
        region[7..11].copy_from_slice(&10u32.to_le_bytes());
        region[15] = 3;
        region[25] = 0x33;
        region[26..28].copy_from_slice(&5u16.to_le_bytes());

        assert_eq!(layout.read(&region, Field::PackedSize), Some(10));
        assert_eq!(layout.read(&region, Field::HostOs), Some(3));
        assert_eq!(layout.read(&region, Field::Method), Some(0x33));
        assert_eq!(layout.read(&region, Field::NameLen), Some(5));
        assert_eq!(layout.read(&region, Field::HighRealSize), None);
    }

    #[test]
    fn high_pack_shifts_the_variable_area() {
        let layout = Layout::resolve(BlockKind::File, FileFlags::HIGH_PACK);
        assert_eq!(layout.fixed_len(), 40);

        let mut region = vec![0u8; 40];
        region[32..36].copy_from_slice(&7u32.to_le_bytes());
        region[36..40].copy_from_slice(&9u32.to_le_bytes());
        assert_eq!(layout.read(&region, Field::HighPackedSize), Some(7));
        assert_eq!(layout.read(&region, Field::HighRealSize), Some(9));
    }

    #[test]
    fn archive_packed_size_depends_on_more_size() {
        assert_eq!(Layout::resolve(BlockKind::Archive, 0).fixed_len(), 7);
        let layout = Layout::resolve(BlockKind::Archive, FileFlags::MORE_SIZE);
        assert_eq!(layout.fixed_len(), 11);
        assert_eq!(layout.read(&[0, 0, 0x73, 0x80, 0, 13, 0, 9, 0, 0, 0], Field::PackedSize), Some(9));
    }

    #[test]
    fn prefix_is_shared() {
        for kind in [BlockKind::Marker, BlockKind::Archive, BlockKind::File, BlockKind::End] {
            let layout = Layout::resolve(kind, 0);
            let region = [0x52, 0x61, 0x74, 0x21, 0x1A, 0x07, 0x00];
            assert_eq!(layout.read(&region, Field::Tag), Some(0x74));
            assert_eq!(layout.read(&region, Field::HeadSize), Some(7));
        }
    }
}
