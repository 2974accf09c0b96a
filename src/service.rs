//! Working service used by agents during recording and replay
//!
//! Recording persists each item through the category's store. Replay
//! resolves each dependency call to the next recorded result, reloading
//! from storage once on a cache miss. Every answer is encoded bytes or
//! [`EMPTY_INSTANCE`]; nothing fails across this boundary.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::category::{traits, Category};
use crate::codec::{ResultCodec, EMPTY_INSTANCE};
use crate::config::Config;
use crate::model::{ConfigVersion, MockItem};
use crate::replay::{Payload, ReplayMappingIndex, ResultCache};
use crate::storage::{FileRecordStore, StoreRegistry, StoredRecord};
use crate::Result;

/// Record/replay orchestrator
pub struct WorkingService {
    stores: StoreRegistry,
    cache: Arc<ResultCache>,
    mapping: Arc<ReplayMappingIndex>,
    codec: ResultCodec,
    record_to_cache: bool,
}

impl WorkingService {
    /// Create a service from its collaborators
    #[must_use]
    pub fn new(
        stores: StoreRegistry,
        cache: Arc<ResultCache>,
        mapping: Arc<ReplayMappingIndex>,
        codec: ResultCodec,
    ) -> Self {
        Self {
            stores,
            cache,
            mapping,
            codec,
            record_to_cache: true,
        }
    }

    /// Whether saves also feed the result cache
    #[must_use]
    pub fn with_record_to_cache(mut self, enabled: bool) -> Self {
        self.record_to_cache = enabled;
        self
    }

    /// Build a service with one file-backed store per configured category
    ///
    /// # Errors
    ///
    /// Returns error if a record log cannot be opened
    pub fn from_config(config: &Config) -> Result<Self> {
        let codec = ResultCodec::new(config.codec.compression_level);

        let mut stores = StoreRegistry::new();
        for category in &config.stores {
            let store = FileRecordStore::open(
                &config.storage_dir,
                *category,
                codec,
                config.limits.max_payload_size,
            )?;
            stores.register(Arc::new(store));
        }

        info!(
            "Working service ready: {} stores in {}",
            config.stores.len(),
            config.storage_dir.display()
        );

        Ok(Self::new(
            stores,
            Arc::new(ResultCache::new(config.limits.max_sequence_len)),
            Arc::new(ReplayMappingIndex::new()),
            codec,
        )
        .with_record_to_cache(config.cache.record_to_cache))
    }

    /// Persist an item recorded by an agent
    ///
    /// Returns false when no store is configured for the category or the
    /// store rejects the item.
    pub fn save_record<T: MockItem + ?Sized>(&self, category: Category, item: &T) -> bool {
        if self.stores.find(category).is_none() {
            warn!(
                "No store for {}, dropping record {}",
                category,
                item.record_id()
            );
            return false;
        }

        let record = match StoredRecord::from_item(category, item) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "Failed to capture {} record {}: {}",
                    category,
                    item.record_id(),
                    e
                );
                return false;
            }
        };

        let Some(position) = self.stores.save(category, &record) else {
            return false;
        };

        // Placed by store position so concurrent saves of one record id
        // reach the cache in the order a reload would return them.
        if self.record_to_cache {
            self.cache
                .record_at(category, &record.record_id, position, record.payload);
        }
        true
    }

    /// Resolve the mocked result for a dependency call during replay
    ///
    /// Results under one replay id are served in recording order; once the
    /// sequence is exhausted the last result repeats.
    pub fn query_mock_result<T: MockItem + ?Sized>(&self, category: Category, item: &T) -> Bytes {
        let record_id = item.record_id();
        let replay_id = item.replay_id();

        match serde_json::to_value(item) {
            Ok(value) => self.cache.put_replay_result(category, replay_id, value),
            Err(e) => warn!("Failed to mirror replay item {}: {}", replay_id, e),
        }

        let attrs = traits(category);
        if attrs.is_main_entry {
            info!(
                "skip main entry mock response, record id: {}, replay id: {}",
                record_id, replay_id
            );
            if attrs.is_queue_consumer {
                self.mapping.put_last(category, record_id, replay_id);
            }
            return self.codec.encode(Some(item));
        }

        let result = match self.cache.get_record_result(category, item) {
            Some(result) => result,
            None => {
                info!(
                    "replay mock record empty from cache, record id: {}, replay id: {}",
                    record_id, replay_id
                );
                let reloaded = self.preload(category, record_id);
                let retried = if reloaded {
                    self.cache.get_record_result(category, item)
                } else {
                    None
                };

                let Some(result) = retried else {
                    info!(
                        "reload replay mock record empty, record id: {}, replay id: {}, reloaded: {}",
                        record_id, replay_id, reloaded
                    );
                    return EMPTY_INSTANCE;
                };
                result
            }
        };

        info!(
            "found result for category: {}, record id: {}, replay id: {}",
            category.display_name(),
            record_id,
            replay_id
        );
        self.codec.encode(Some(&*result))
    }

    /// Load a record's sequence from storage into the cache
    ///
    /// Returns true when a non-empty sequence was installed. The store is
    /// read without holding any cache lock.
    pub fn preload(&self, category: Category, record_id: &str) -> bool {
        let sequence = self.stores.load_sequence(category, record_id);
        if sequence.is_empty() {
            return false;
        }
        self.cache.replace(category, record_id, sequence);
        true
    }

    /// Latest snapshot of `category` matching the version's scope
    pub fn query_config_version<V: ConfigVersion + ?Sized>(&self, category: Category, version: &V) -> Bytes {
        let value = self.stores.query_by_version(category, &version.scope());
        self.codec.encode(value.as_ref())
    }

    /// Configuration version key for an application
    pub fn query_config_version_key<V: ConfigVersion + ?Sized>(&self, version: &V) -> Bytes {
        if version.app_id().is_empty() {
            warn!("The appId is empty from request application");
            return EMPTY_INSTANCE;
        }
        self.query_config_version(Category::ConfigVersion, version)
    }

    /// Items mirrored for a replay, for the comparison pass
    #[must_use]
    pub fn replay_results(&self, category: Category, replay_id: &str) -> Vec<Payload> {
        self.cache.replay_results(category, replay_id)
    }

    /// Remove and return the items mirrored for a finished replay
    pub fn take_replay_results(&self, category: Category, replay_id: &str) -> Vec<Payload> {
        self.cache.take_replay_results(category, replay_id)
    }

    /// Latest replay id seen for a queue-consumer record
    #[must_use]
    pub fn last_replay_id(&self, category: Category, record_id: &str) -> Option<String> {
        self.mapping.get_last(category, record_id)
    }

    /// Shared result cache
    #[must_use]
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Result codec
    #[must_use]
    pub fn codec(&self) -> &ResultCodec {
        &self.codec
    }
}
