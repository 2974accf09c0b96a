//! Replay-time state: sequenced results and replay correlation

mod cache;
mod mapping;

pub use cache::{CacheStats, Payload, ResultCache};
pub use mapping::ReplayMappingIndex;

/// Default number of items held per record id
pub const DEFAULT_MAX_SEQUENCE_LEN: usize = 65_536;
