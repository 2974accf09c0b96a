//! Record store backed by an append-only log file per category

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::format::LOG_EXTENSION;
use super::reader::LogReader;
use super::writer::LogWriter;
use super::{RecordStore, StoredRecord};
use crate::category::Category;
use crate::codec::ResultCodec;
use crate::model::VersionScope;
use crate::{MockError, Result};

const UNSCOPED: [u8; 32] = [0; 32];

/// JSON envelope persisted after each entry header
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    record_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<VersionScope>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    packed: Vec<String>,
    payload: Value,
}

/// Summary of a record log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogStats {
    /// Category tag from the log header
    pub category_tag: u32,
    /// Complete entries in the log
    pub entries: usize,
}

/// Writer plus the sequence length of every record id in the log
struct LogState {
    writer: LogWriter,
    lengths: HashMap<[u8; 32], usize>,
}

/// File-backed record store
pub struct FileRecordStore {
    category: Category,
    path: PathBuf,
    state: Mutex<LogState>,
    codec: ResultCodec,
    max_payload_size: usize,
}

impl FileRecordStore {
    /// Open (or create) the log for `category` inside `dir`
    ///
    /// # Errors
    ///
    /// Returns error if the log cannot be created or is invalid
    pub fn open(dir: &Path, category: Category, codec: ResultCodec, max_payload_size: usize) -> Result<Self> {
        let path = Self::log_path(dir, category);
        let writer = LogWriter::open(&path, category.tag())?;

        let mut lengths = HashMap::new();
        for entry in LogReader::open(&path)?.entries()? {
            *lengths.entry(entry.header.record_key).or_insert(0) += 1;
        }
        debug!(
            "Opened record log {} with {} record ids",
            path.display(),
            lengths.len()
        );

        Ok(Self {
            category,
            path,
            state: Mutex::new(LogState { writer, lengths }),
            codec,
            max_payload_size,
        })
    }

    /// Path of the log for a category
    #[must_use]
    pub fn log_path(dir: &Path, category: Category) -> PathBuf {
        dir.join(format!("{}.{LOG_EXTENSION}", category.name()))
    }

    /// Path of this store's log
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header category and entry count of the log
    ///
    /// # Errors
    ///
    /// Returns error if the log cannot be read
    pub fn log_stats(&self) -> Result<LogStats> {
        let reader = LogReader::open(&self.path)?;
        Ok(LogStats {
            category_tag: reader.category_tag(),
            entries: reader.entries()?.len(),
        })
    }

    fn decode(&self, raw: &[u8]) -> Result<Envelope> {
        let mut envelope: Envelope = serde_json::from_slice(raw)?;
        self.codec
            .unpack_fields(&mut envelope.payload, &envelope.packed)?;
        Ok(envelope)
    }
}

impl RecordStore for FileRecordStore {
    fn category(&self) -> Category {
        self.category
    }

    fn save(&self, record: &StoredRecord) -> Result<usize> {
        let mut payload = record.payload.clone();
        let packed = self.codec.pack_fields(&mut payload, record.directives)?;

        let envelope = Envelope {
            record_id: record.record_id.clone(),
            scope: record.scope.clone(),
            packed,
            payload,
        };
        let bytes = serde_json::to_vec(&envelope)?;

        if bytes.len() > self.max_payload_size {
            return Err(MockError::DataTooLarge {
                size: bytes.len(),
                limit: self.max_payload_size,
            });
        }

        let scope_key = record
            .scope
            .as_ref()
            .map_or(UNSCOPED, |s| key_hash(&s.app_id));

        let record_key = key_hash(&record.record_id);
        let mut state = self
            .state
            .lock()
            .map_err(|_| MockError::Other("record log writer poisoned".to_string()))?;

        state.writer.append(record_key, scope_key, &bytes)?;
        let length = state.lengths.entry(record_key).or_insert(0);
        *length += 1;
        let position = *length - 1;

        state.writer.sync()?;
        Ok(position)
    }

    fn load_sequence(&self, record_id: &str) -> Result<Vec<Value>> {
        let reader = LogReader::open(&self.path)?;
        let record_key = key_hash(record_id);

        let mut sequence = Vec::new();
        for entry in reader.entries()? {
            if entry.header.record_key != record_key {
                continue;
            }
            let envelope = self.decode(entry.payload)?;
            if envelope.record_id == record_id {
                sequence.push(envelope.payload);
            }
        }

        debug!(
            "Loaded {} {} items for record {} (key {})",
            sequence.len(),
            self.category,
            record_id,
            hex::encode(&record_key[..8])
        );
        Ok(sequence)
    }

    fn query_by_version(&self, scope: &VersionScope) -> Result<Option<Value>> {
        let reader = LogReader::open(&self.path)?;
        let scope_key = key_hash(&scope.app_id);

        let mut latest = None;
        for entry in reader.entries()? {
            if entry.header.scope_key != scope_key {
                continue;
            }
            let envelope = self.decode(entry.payload)?;
            if envelope.scope.as_ref().is_some_and(|s| scope.matches(s)) {
                latest = Some(envelope.payload);
            }
        }

        Ok(latest)
    }
}

fn key_hash(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}
