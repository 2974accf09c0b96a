//! In-memory record store

use std::sync::RwLock;

use dashmap::DashMap;
use serde_json::Value;

use super::{RecordStore, StoredRecord};
use crate::category::Category;
use crate::model::VersionScope;
use crate::{MockError, Result};

/// Record store held entirely in memory
pub struct MemoryRecordStore {
    category: Category,
    sequences: DashMap<String, Vec<Value>>,
    snapshots: RwLock<Vec<(VersionScope, Value)>>,
}

impl MemoryRecordStore {
    /// Create an empty store for a category
    #[must_use]
    pub fn new(category: Category) -> Self {
        Self {
            category,
            sequences: DashMap::new(),
            snapshots: RwLock::new(Vec::new()),
        }
    }

    /// Number of record ids held
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.sequences.len()
    }
}

impl RecordStore for MemoryRecordStore {
    fn category(&self) -> Category {
        self.category
    }

    fn save(&self, record: &StoredRecord) -> Result<usize> {
        if let Some(scope) = &record.scope {
            self.snapshots
                .write()
                .map_err(|_| MockError::Other("snapshot lock poisoned".to_string()))?
                .push((scope.clone(), record.payload.clone()));
        }

        let mut sequence = self.sequences.entry(record.record_id.clone()).or_default();
        sequence.push(record.payload.clone());
        Ok(sequence.len() - 1)
    }

    fn load_sequence(&self, record_id: &str) -> Result<Vec<Value>> {
        Ok(self
            .sequences
            .get(record_id)
            .map(|s| s.value().clone())
            .unwrap_or_default())
    }

    fn query_by_version(&self, scope: &VersionScope) -> Result<Option<Value>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| MockError::Other("snapshot lock poisoned".to_string()))?;

        Ok(snapshots
            .iter()
            .rev()
            .find(|(stored, _)| scope.matches(stored))
            .map(|(_, payload)| payload.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConfigFileMocker, MockerCommon};
    use serde_json::json;

    fn config_file(record_id: &str, version: i32, content: &str) -> StoredRecord {
        let item = ConfigFileMocker {
            common: MockerCommon {
                app_id: "orders".to_string(),
                ..MockerCommon::recorded(record_id)
            },
            key: "app.yaml".to_string(),
            record_version: Some(version),
            file_version: None,
            content: content.to_string(),
        };
        StoredRecord::from_item(Category::ConfigFile, &item).unwrap()
    }

    #[test]
    fn test_sequence_keeps_order() {
        let store = MemoryRecordStore::new(Category::ConfigFile);
        assert_eq!(store.save(&config_file("rec1", 1, "a")).unwrap(), 0);
        assert_eq!(store.save(&config_file("rec1", 1, "b")).unwrap(), 1);
        assert_eq!(store.save(&config_file("rec2", 1, "c")).unwrap(), 0);

        let sequence = store.load_sequence("rec1").unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence[0]["content"], json!("a"));
        assert_eq!(sequence[1]["content"], json!("b"));
        assert_eq!(store.record_count(), 2);
        assert!(store.load_sequence("missing").unwrap().is_empty());
    }

    #[test]
    fn test_query_by_version_returns_latest_match() {
        let store = MemoryRecordStore::new(Category::ConfigFile);
        store.save(&config_file("rec1", 1, "v1-old")).unwrap();
        store.save(&config_file("rec2", 1, "v1-new")).unwrap();
        store.save(&config_file("rec3", 2, "v2")).unwrap();

        let latest = store
            .query_by_version(&VersionScope::app("orders"))
            .unwrap()
            .unwrap();
        assert_eq!(latest["content"], json!("v2"));

        let v1 = VersionScope {
            record_version: Some(1),
            ..VersionScope::app("orders")
        };
        let found = store.query_by_version(&v1).unwrap().unwrap();
        assert_eq!(found["content"], json!("v1-new"));

        assert!(store
            .query_by_version(&VersionScope::app("billing"))
            .unwrap()
            .is_none());
    }
}
