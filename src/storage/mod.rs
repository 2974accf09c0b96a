//! Per-category persistent storage of recorded items

mod file;
mod format;
mod memory;
mod reader;
mod writer;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

pub use file::{FileRecordStore, LogStats};
pub use format::{
    EntryHeader, FileHeader, ENTRY_HEADER_SIZE, FILE_MAGIC, FILE_VERSION, HEADER_SIZE,
    LOG_EXTENSION,
};
pub use memory::MemoryRecordStore;
pub use reader::{LogEntry, LogReader};
pub use writer::LogWriter;

use crate::category::Category;
use crate::codec::FieldDirective;
use crate::model::{MockItem, VersionScope};
use crate::{MockError, Result};

/// Validate record log magic, version and header checksum
///
/// # Errors
///
/// Returns error if magic, version or CRC is invalid
pub fn validate_header(header: &FileHeader, raw: &[u8]) -> Result<()> {
    if header.magic != FILE_MAGIC {
        return Err(MockError::InvalidFormat(format!(
            "Invalid magic bytes: expected {:?}, got {:?}",
            FILE_MAGIC, header.magic
        )));
    }

    if header.version != FILE_VERSION {
        return Err(MockError::InvalidFormat(format!(
            "Unsupported version: {}, expected {}",
            header.version, FILE_VERSION
        )));
    }

    let computed = format::header_crc(raw);
    if header.header_crc != computed {
        return Err(MockError::CorruptedData {
            offset: 0,
            expected: header.header_crc,
            actual: computed,
        });
    }

    Ok(())
}

/// One item ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Category of the item
    pub category: Category,
    /// Recorded transaction id
    pub record_id: String,
    /// Snapshot scope, for config kinds
    pub scope: Option<VersionScope>,
    /// Storage directives for payload fields
    pub directives: &'static [FieldDirective],
    /// Full item as JSON
    pub payload: Value,
}

impl StoredRecord {
    /// Capture an item under the given category
    ///
    /// # Errors
    ///
    /// Returns error if the item cannot be represented as JSON
    pub fn from_item<T: MockItem + ?Sized>(category: Category, item: &T) -> Result<Self> {
        Ok(Self {
            category,
            record_id: item.record_id().to_string(),
            scope: item.version_scope(),
            directives: item.field_directives(),
            payload: serde_json::to_value(item)?,
        })
    }
}

/// Persistent storage for one category
///
/// Implementations report failures as errors; [`StoreRegistry`] folds them
/// into "no data".
pub trait RecordStore: Send + Sync {
    /// Category served by this store
    fn category(&self) -> Category;

    /// Persist one item, returning its position within the record id's sequence
    ///
    /// Positions follow the order [`RecordStore::load_sequence`] returns.
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage rejects the write
    fn save(&self, record: &StoredRecord) -> Result<usize>;

    /// All items of a record id, in recording order
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be read
    fn load_sequence(&self, record_id: &str) -> Result<Vec<Value>>;

    /// Latest item whose scope matches
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be read
    fn query_by_version(&self, scope: &VersionScope) -> Result<Option<Value>>;
}

/// Category to store lookup
#[derive(Default, Clone)]
pub struct StoreRegistry {
    stores: HashMap<Category, Arc<dyn RecordStore>>,
}

impl StoreRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store under its category, replacing any previous one
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.register(store);
        self
    }

    /// Register a store under its category, replacing any previous one
    pub fn register(&mut self, store: Arc<dyn RecordStore>) {
        self.stores.insert(store.category(), store);
    }

    /// Store for a category
    #[must_use]
    pub fn find(&self, category: Category) -> Option<&Arc<dyn RecordStore>> {
        self.stores.get(&category)
    }

    /// Categories with a store, in tag order
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<_> = self.stores.keys().copied().collect();
        categories.sort();
        categories
    }

    /// Persist an item and return its sequence position; `None` when no store
    /// is configured or the write fails
    pub fn save(&self, category: Category, record: &StoredRecord) -> Option<usize> {
        let Some(store) = self.find(category) else {
            warn!("No record store configured for category {}", category);
            return None;
        };

        match store.save(record) {
            Ok(position) => Some(position),
            Err(e) => {
                warn!(
                    "Failed to save {} record {}: {}",
                    category, record.record_id, e
                );
                None
            }
        }
    }

    /// Load a recorded sequence; empty on missing store or storage fault
    #[must_use]
    pub fn load_sequence(&self, category: Category, record_id: &str) -> Vec<Value> {
        let Some(store) = self.find(category) else {
            debug!("No record store configured for category {}", category);
            return Vec::new();
        };

        store.load_sequence(record_id).unwrap_or_else(|e| {
            warn!(
                "Failed to load {} sequence for record {}: {}",
                category, record_id, e
            );
            Vec::new()
        })
    }

    /// Latest snapshot matching a scope; `None` on missing store or storage fault
    #[must_use]
    pub fn query_by_version(&self, category: Category, scope: &VersionScope) -> Option<Value> {
        let store = self.find(category)?;

        store.query_by_version(scope).unwrap_or_else(|e| {
            warn!(
                "Failed to query {} by version for app {}: {}",
                category, scope.app_id, e
            );
            None
        })
    }
}
