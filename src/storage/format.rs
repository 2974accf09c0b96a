//! Binary format structures for record logs

use bytemuck::{Pod, Zeroable};

/// File magic bytes: "MOCK\x00\x01\x00\x00"
pub const FILE_MAGIC: [u8; 8] = [0x4D, 0x4F, 0x43, 0x4B, 0x00, 0x01, 0x00, 0x00];

/// Current format version
pub const FILE_VERSION: u32 = 1;

/// File header size
pub const HEADER_SIZE: usize = 64;

/// Entry header size
pub const ENTRY_HEADER_SIZE: usize = 80;

/// Byte range of the header CRC field, excluded from the header checksum
pub const HEADER_CRC_RANGE: std::ops::Range<usize> = 12..16;

/// File extension of record logs
pub const LOG_EXTENSION: &str = "mocklog";

/// File header (64 bytes)
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct FileHeader {
    /// Magic bytes for file format identification
    pub magic: [u8; 8],

    /// Format version
    pub version: u32,

    /// CRC32 of header (excluding this field)
    pub header_crc: u32,

    /// Creation timestamp (Unix epoch nanoseconds)
    pub created_at: u64,

    /// Category tag of every entry in the log
    pub category: u32,

    /// Reserved for future use
    pub reserved: [u32; 9],
}

static_assertions::const_assert_eq!(std::mem::size_of::<FileHeader>(), HEADER_SIZE);

/// Header preceding each JSON envelope (80 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct EntryHeader {
    /// SHA-256 of the record id
    pub record_key: [u8; 32],

    /// SHA-256 of the version scope app id, zero when unscoped
    pub scope_key: [u8; 32],

    /// Append timestamp (Unix epoch nanoseconds)
    pub recorded_at: u64,

    /// Envelope length in bytes
    pub payload_len: u32,

    /// CRC32 of the envelope
    pub payload_crc: u32,
}

static_assertions::const_assert_eq!(std::mem::size_of::<EntryHeader>(), ENTRY_HEADER_SIZE);

impl FileHeader {
    /// Header for a new log of the given category
    #[must_use]
    pub fn new(category: u32, created_at: u64) -> Self {
        Self {
            magic: FILE_MAGIC,
            version: FILE_VERSION,
            header_crc: 0,
            created_at,
            category,
            reserved: [0; 9],
        }
    }
}

/// CRC of a serialized header, skipping the CRC field
#[must_use]
pub fn header_crc(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&bytes[..HEADER_CRC_RANGE.start]);
    hasher.update(&bytes[HEADER_CRC_RANGE.end..HEADER_SIZE]);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(std::mem::size_of::<FileHeader>(), 64);
        assert_eq!(std::mem::size_of::<EntryHeader>(), 80);
    }

    #[test]
    fn test_header_defaults() {
        let header = FileHeader::new(3, 42);
        assert_eq!(header.magic, FILE_MAGIC);
        assert_eq!(header.version, FILE_VERSION);
        assert_eq!(header.category, 3);
        assert_eq!(header.header_crc, 0);
    }

    #[test]
    fn test_header_crc_ignores_crc_field() {
        let mut header = FileHeader::new(1, 7);
        let before = header_crc(bytemuck::bytes_of(&header));
        header.header_crc = 0xDEAD_BEEF;
        let after = header_crc(bytemuck::bytes_of(&header));
        assert_eq!(before, after);
    }
}
