//! Sequenced result cache for replay lookups

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::category::Category;
use crate::model::MockItem;

/// Shared handle to one recorded payload
pub type Payload = Arc<Value>;

type Key = (Category, String);

/// Cached sequence of one record id
#[derive(Default)]
struct Slot {
    /// Contiguous prefix visible to readers
    items: Arc<Vec<Payload>>,
    /// Items fed ahead of an earlier store position, keyed by that position
    pending: BTreeMap<usize, Payload>,
}

impl Slot {
    /// Move pending items that now extend the prefix into it
    fn drain_pending(&mut self) {
        let len = self.items.len();
        self.pending.retain(|&position, _| position >= len);

        let mut next = len;
        let mut ready = Vec::new();
        while let Some(item) = self.pending.remove(&next) {
            ready.push(item);
            next += 1;
        }
        if !ready.is_empty() {
            Arc::make_mut(&mut self.items).extend(ready);
        }
    }
}

/// Result cache keyed by record id (sequences) and replay id (cursors)
///
/// Sequences are immutable snapshots behind an `Arc`: readers clone the
/// handle and never observe a partially built sequence. Cursors are atomics
/// so consumption under one replay id needs no lock beyond the map lookup.
pub struct ResultCache {
    /// Recorded payloads per (category, record id)
    sequences: DashMap<Key, Slot>,
    /// Consumption cursor per (category, replay id)
    cursors: DashMap<Key, Arc<AtomicUsize>>,
    /// Items seen during replay per (category, replay id)
    replay_results: DashMap<Key, Vec<Payload>>,
    /// Longest sequence held per record id
    max_sequence_len: usize,
    /// Cache hit counter
    hits: AtomicUsize,
    /// Cache miss counter
    misses: AtomicUsize,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(super::DEFAULT_MAX_SEQUENCE_LEN)
    }
}

impl ResultCache {
    /// Create an empty cache
    #[must_use]
    pub fn new(max_sequence_len: usize) -> Self {
        Self {
            sequences: DashMap::new(),
            cursors: DashMap::new(),
            replay_results: DashMap::new(),
            max_sequence_len: max_sequence_len.max(1),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Append a recorded item to its sequence
    ///
    /// Returns false when the sequence is already at its limit.
    pub fn record(&self, category: Category, record_id: &str, item: Value) -> bool {
        let mut sequence = self
            .sequences
            .entry((category, record_id.to_string()))
            .or_default();

        let position = sequence.items.len() + sequence.pending.len();
        if position >= self.max_sequence_len {
            warn!(
                "Sequence for {} record {} is full ({} items), dropping item",
                category, record_id, position
            );
            return false;
        }

        // Copies only when a reader still holds the previous snapshot.
        Arc::make_mut(&mut sequence.items).push(Arc::new(item));
        sequence.drain_pending();
        true
    }

    /// Place a recorded item at the position its store assigned
    ///
    /// Items become visible in position order: an item whose predecessors
    /// have not arrived yet waits until they do, so the cached sequence
    /// always matches what the store returns on reload. Positions already
    /// covered (by an earlier reload) are skipped. Returns false when the
    /// position is past the sequence limit.
    pub fn record_at(&self, category: Category, record_id: &str, position: usize, item: Value) -> bool {
        if position >= self.max_sequence_len {
            warn!(
                "Position {} of {} record {} is past the sequence limit, dropping item",
                position, category, record_id
            );
            return false;
        }

        let mut slot = self
            .sequences
            .entry((category, record_id.to_string()))
            .or_default();

        if position < slot.items.len() {
            debug!(
                "{} record {} already holds position {}",
                category, record_id, position
            );
            return true;
        }

        slot.pending.insert(position, Arc::new(item));
        slot.drain_pending();
        true
    }

    /// Swap in a freshly loaded sequence
    ///
    /// Existing cursors are kept; a cursor past the new end reads the last
    /// item. An empty sequence is ignored.
    pub fn replace(&self, category: Category, record_id: &str, mut sequence: Vec<Value>) {
        if sequence.is_empty() {
            debug!("Ignoring empty reload for {} record {}", category, record_id);
            return;
        }
        sequence.truncate(self.max_sequence_len);

        let snapshot: Vec<Payload> = sequence.into_iter().map(Arc::new).collect();
        debug!(
            "Replacing {} sequence for record {} with {} items",
            category,
            record_id,
            snapshot.len()
        );
        let mut slot = self
            .sequences
            .entry((category, record_id.to_string()))
            .or_default();
        slot.items = Arc::new(snapshot);
        slot.drain_pending();
    }

    /// Consume the next recorded result for the item's replay
    ///
    /// Returns the payload at the replay's cursor and advances the cursor,
    /// saturating at the last item. `None` when nothing is cached for the
    /// item's record id.
    pub fn get_record_result<T: MockItem + ?Sized>(&self, category: Category, item: &T) -> Option<Payload> {
        let sequence = self
            .sequences
            .get(&(category, item.record_id().to_string()))
            .map(|s| Arc::clone(&s.items));

        let Some(sequence) = sequence.filter(|s| !s.is_empty()) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        let cursor = Arc::clone(
            self.cursors
                .entry((category, item.replay_id().to_string()))
                .or_default()
                .value(),
        );

        let last = sequence.len() - 1;
        // Compare-and-increment: concurrent consumers of one replay id each
        // get a distinct index until the last item.
        let previous = cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
                (c < last).then_some(c + 1)
            })
            .unwrap_or_else(|c| c);
        let index = previous.min(last);

        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!(
            "{} record {} replay {} consumed index {}/{}",
            category,
            item.record_id(),
            item.replay_id(),
            index,
            last
        );
        Some(Arc::clone(&sequence[index]))
    }

    /// Mirror an item seen during replay for later comparison
    pub fn put_replay_result(&self, category: Category, replay_id: &str, item: Value) {
        self.replay_results
            .entry((category, replay_id.to_string()))
            .or_default()
            .push(Arc::new(item));
    }

    /// Items mirrored for a replay, in arrival order
    #[must_use]
    pub fn replay_results(&self, category: Category, replay_id: &str) -> Vec<Payload> {
        self.replay_results
            .get(&(category, replay_id.to_string()))
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Remove and return the items mirrored for a replay
    ///
    /// Used once a replay has finished; the mirror for that replay id starts
    /// empty again afterwards.
    pub fn take_replay_results(&self, category: Category, replay_id: &str) -> Vec<Payload> {
        self.replay_results
            .remove(&(category, replay_id.to_string()))
            .map(|(_, items)| items)
            .unwrap_or_default()
    }

    /// Number of replays with mirrored items
    #[must_use]
    pub fn replay_result_count(&self) -> usize {
        self.replay_results.len()
    }

    /// Snapshot of a cached sequence
    #[must_use]
    pub fn sequence(&self, category: Category, record_id: &str) -> Option<Arc<Vec<Payload>>> {
        self.sequences
            .get(&(category, record_id.to_string()))
            .map(|s| Arc::clone(&s.items))
            .filter(|s| !s.is_empty())
    }

    /// Current cursor of a replay
    #[must_use]
    pub fn cursor(&self, category: Category, replay_id: &str) -> Option<usize> {
        self.cursors
            .get(&(category, replay_id.to_string()))
            .map(|c| c.load(Ordering::Acquire))
    }

    /// Get cache hit count
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Get cache miss count
    #[must_use]
    pub fn miss_count(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get cache hit rate (0.0 to 1.0)
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hit_count();
        let misses = self.miss_count();
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Number of cached sequences
    #[must_use]
    pub fn size(&self) -> usize {
        self.sequences.len()
    }

    /// Snapshot of the counters
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hit_count(),
            misses: self.miss_count(),
            hit_rate: self.hit_rate(),
            size: self.size(),
        }
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.sequences.clear();
        self.cursors.clear();
        self.replay_results.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    /// Cache hits
    pub hits: usize,
    /// Cache misses
    pub misses: usize,
    /// Hit rate (0.0 to 1.0)
    pub hit_rate: f64,
    /// Number of cached sequences
    pub size: usize,
}
