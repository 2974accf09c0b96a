//! Record log reader

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use tracing::warn;

use super::format::{EntryHeader, FileHeader, ENTRY_HEADER_SIZE, HEADER_SIZE};
use crate::{MockError, Result};

/// One entry borrowed from a mapped record log
#[derive(Debug, Clone, Copy)]
pub struct LogEntry<'a> {
    /// Entry header
    pub header: EntryHeader,
    /// JSON envelope
    pub payload: &'a [u8],
}

/// Reader over a snapshot of a record log
pub struct LogReader {
    _file: File,
    mmap: Mmap,
    header: FileHeader,
}

impl LogReader {
    /// Map an existing record log
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened, mapped, or is invalid
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: logs are only ever appended to; bytes inside the mapped
        // length are never rewritten.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < HEADER_SIZE {
            return Err(MockError::InvalidFormat(
                "File too small to contain header".to_string(),
            ));
        }

        let header: FileHeader = bytemuck::pod_read_unaligned(&mmap[..HEADER_SIZE]);
        super::validate_header(&header, &mmap[..HEADER_SIZE])?;

        Ok(Self {
            _file: file,
            mmap,
            header,
        })
    }

    /// Category tag from the header
    #[must_use]
    pub fn category_tag(&self) -> u32 {
        self.header.category
    }

    /// All complete entries in append order
    ///
    /// A truncated trailing entry (an append still in flight, or a crash
    /// mid-write) ends the scan.
    ///
    /// # Errors
    ///
    /// Returns error if an entry fails its CRC check
    pub fn entries(&self) -> Result<Vec<LogEntry<'_>>> {
        let mut entries = Vec::new();
        let mut offset = HEADER_SIZE;

        while offset < self.mmap.len() {
            if self.mmap.len() - offset < ENTRY_HEADER_SIZE {
                warn!("Ignoring torn entry header at offset {}", offset);
                break;
            }

            let header: EntryHeader =
                bytemuck::pod_read_unaligned(&self.mmap[offset..offset + ENTRY_HEADER_SIZE]);
            let start = offset + ENTRY_HEADER_SIZE;
            let end = start + header.payload_len as usize;

            if end > self.mmap.len() {
                warn!("Ignoring torn entry payload at offset {}", offset);
                break;
            }

            let payload = &self.mmap[start..end];
            let actual = crc32fast::hash(payload);
            if actual != header.payload_crc {
                return Err(MockError::CorruptedData {
                    offset: offset as u64,
                    expected: header.payload_crc,
                    actual,
                });
            }

            entries.push(LogEntry { header, payload });
            offset = end;
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LogWriter;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("http.mocklog");

        {
            let mut writer = LogWriter::open(&path, 1).unwrap();
            writer.append([1u8; 32], [0u8; 32], b"first").unwrap();
            writer.append([2u8; 32], [9u8; 32], b"second").unwrap();
        }

        let reader = LogReader::open(&path).unwrap();
        assert_eq!(reader.category_tag(), 1);

        let entries = reader.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].header.record_key, [1u8; 32]);
        assert_eq!(entries[0].payload, b"first");
        assert_eq!(entries[1].header.scope_key, [9u8; 32]);
        assert_eq!(entries[1].payload, b"second");
    }

    #[test]
    fn test_torn_tail_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("http.mocklog");

        {
            let mut writer = LogWriter::open(&path, 1).unwrap();
            writer.append([1u8; 32], [0u8; 32], b"complete").unwrap();
        }
        {
            let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&[0xAB; 20]).unwrap();
        }

        let reader = LogReader::open(&path).unwrap();
        let entries = reader.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].payload, b"complete");
    }

    #[test]
    fn test_corrupted_payload_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("http.mocklog");

        {
            let mut writer = LogWriter::open(&path, 1).unwrap();
            writer.append([1u8; 32], [0u8; 32], b"payload").unwrap();
        }

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let reader = LogReader::open(&path).unwrap();
        assert!(matches!(
            reader.entries(),
            Err(MockError::CorruptedData { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.mocklog");
        std::fs::write(&path, [0u8; HEADER_SIZE]).unwrap();

        assert!(matches!(
            LogReader::open(&path),
            Err(MockError::InvalidFormat(_))
        ));
    }
}
