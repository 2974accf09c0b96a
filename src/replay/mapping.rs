//! Record id to latest replay id correlation for queue consumers

use dashmap::DashMap;

use crate::category::Category;

/// Last-write-wins map from (category, record id) to replay id
#[derive(Default)]
pub struct ReplayMappingIndex {
    last: DashMap<(Category, String), String>,
}

impl ReplayMappingIndex {
    /// Create an empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `replay_id` as the latest replay of `record_id`
    ///
    /// Overwrites unconditionally; arrival order decides.
    pub fn put_last(&self, category: Category, record_id: &str, replay_id: &str) {
        self.last
            .insert((category, record_id.to_string()), replay_id.to_string());
    }

    /// Latest replay id seen for `record_id`
    #[must_use]
    pub fn get_last(&self, category: Category, record_id: &str) -> Option<String> {
        self.last
            .get(&(category, record_id.to_string()))
            .map(|r| r.value().clone())
    }

    /// Number of mapped record ids
    #[must_use]
    pub fn len(&self) -> usize {
        self.last.len()
    }

    /// Whether the index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    /// Drop every mapping
    pub fn clear(&self) {
        self.last.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let index = ReplayMappingIndex::new();
        assert!(index.get_last(Category::QueueConsumer, "rec1").is_none());

        index.put_last(Category::QueueConsumer, "rec1", "rep2");
        index.put_last(Category::QueueConsumer, "rec1", "rep1");

        assert_eq!(
            index.get_last(Category::QueueConsumer, "rec1").as_deref(),
            Some("rep1")
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_keys_include_category() {
        let index = ReplayMappingIndex::new();
        index.put_last(Category::QueueConsumer, "rec1", "rep1");

        assert!(index.get_last(Category::Http, "rec1").is_none());

        index.clear();
        assert!(index.is_empty());
    }
}
