//! Record log writer

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bytemuck::bytes_of;

use super::format::{header_crc, EntryHeader, FileHeader, ENTRY_HEADER_SIZE, HEADER_SIZE};
use crate::{MockError, Result};

/// Append-only writer for one category's record log
pub struct LogWriter {
    file: File,
}

impl LogWriter {
    /// Open a record log for appending, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or belongs to another category
    pub fn open(path: &Path, category: u32) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        if file.metadata()?.len() == 0 {
            let mut header = FileHeader::new(category, now_nanos());
            header.header_crc = header_crc(bytes_of(&header));
            file.write_all(bytes_of(&header))?;
            file.sync_data()?;
        } else {
            let mut buf = [0u8; HEADER_SIZE];
            file.read_exact(&mut buf)?;
            let header: FileHeader = bytemuck::pod_read_unaligned(&buf);
            super::validate_header(&header, &buf)?;

            if header.category != category {
                return Err(MockError::InvalidFormat(format!(
                    "Record log {} holds category tag {}, expected {}",
                    path.display(),
                    header.category,
                    category
                )));
            }
        }

        Ok(Self { file })
    }

    /// Append one entry
    ///
    /// # Errors
    ///
    /// Returns error if the payload exceeds `u32::MAX` bytes or the write fails
    pub fn append(&mut self, record_key: [u8; 32], scope_key: [u8; 32], payload: &[u8]) -> Result<()> {
        let payload_len = u32::try_from(payload.len()).map_err(|_| MockError::DataTooLarge {
            size: payload.len(),
            limit: u32::MAX as usize,
        })?;

        let entry = EntryHeader {
            record_key,
            scope_key,
            recorded_at: now_nanos(),
            payload_len,
            payload_crc: crc32fast::hash(payload),
        };

        // One write per entry so a crash leaves at most a torn tail.
        let mut buf = Vec::with_capacity(ENTRY_HEADER_SIZE + payload.len());
        buf.extend_from_slice(bytes_of(&entry));
        buf.extend_from_slice(payload);
        self.file.write_all(&buf)?;
        Ok(())
    }

    /// Flush appended entries to disk
    ///
    /// # Errors
    ///
    /// Returns error if sync fails
    pub fn sync(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_writer_writes_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("http.mocklog");

        drop(LogWriter::open(&path, 1).unwrap());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), HEADER_SIZE as u64);
    }

    #[test]
    fn test_append_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("http.mocklog");

        let mut writer = LogWriter::open(&path, 1).unwrap();
        writer.append([1u8; 32], [0u8; 32], b"{\"a\":1}").unwrap();
        writer.sync().unwrap();

        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            (HEADER_SIZE + ENTRY_HEADER_SIZE + 7) as u64
        );
    }

    #[test]
    fn test_reopen_rejects_other_category() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("http.mocklog");

        drop(LogWriter::open(&path, 1).unwrap());
        assert!(LogWriter::open(&path, 1).is_ok());
        assert!(matches!(
            LogWriter::open(&path, 2),
            Err(MockError::InvalidFormat(_))
        ));
    }
}
