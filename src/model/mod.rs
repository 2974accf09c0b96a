//! Recorded item capabilities

pub mod mocker;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::codec::FieldDirective;

pub use mocker::{
    ConfigFileMocker, ConfigVersionMocker, DatabaseMocker, DynamicClassMocker, HttpMocker,
    MockerCommon, QueueMessageMocker, RedisMocker, ServletMocker,
};

/// An item recorded during a recording pass and queried during replay
pub trait MockItem: Serialize {
    /// Recorded transaction this item belongs to
    fn record_id(&self) -> &str;

    /// Replay execution consuming the transaction (empty while recording)
    fn replay_id(&self) -> &str;

    /// Category of the item
    fn category(&self) -> Category;

    /// Storage directives for payload fields
    fn field_directives(&self) -> &'static [FieldDirective] {
        &[]
    }

    /// Version scope for snapshot-style lookups, if the item has one
    fn version_scope(&self) -> Option<VersionScope> {
        None
    }
}

/// Application identity plus version descriptor
pub trait ConfigVersion {
    /// Application identity
    fn app_id(&self) -> &str;

    /// Scope used to match stored snapshots
    fn scope(&self) -> VersionScope;
}

/// Snapshot lookup scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionScope {
    /// Application identity
    pub app_id: String,
    /// Recording version, matched only when set on the query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_version: Option<i32>,
    /// Snapshot key, matched only when set on the query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl VersionScope {
    /// Scope matching every snapshot of an application
    #[must_use]
    pub fn app(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Self::default()
        }
    }

    /// Whether a stored snapshot scope satisfies this query scope
    #[must_use]
    pub fn matches(&self, stored: &VersionScope) -> bool {
        self.app_id == stored.app_id
            && self
                .record_version
                .map_or(true, |v| stored.record_version == Some(v))
            && self
                .key
                .as_deref()
                .map_or(true, |k| stored.key.as_deref() == Some(k))
    }
}

impl ConfigVersion for VersionScope {
    fn app_id(&self) -> &str {
        &self.app_id
    }

    fn scope(&self) -> VersionScope {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_matching() {
        let stored = VersionScope {
            app_id: "orders".to_string(),
            record_version: Some(3),
            key: Some("app.yaml".to_string()),
        };

        assert!(VersionScope::app("orders").matches(&stored));
        assert!(!VersionScope::app("billing").matches(&stored));

        let versioned = VersionScope {
            record_version: Some(3),
            ..VersionScope::app("orders")
        };
        assert!(versioned.matches(&stored));

        let other_version = VersionScope {
            record_version: Some(4),
            ..VersionScope::app("orders")
        };
        assert!(!other_version.matches(&stored));

        let other_key = VersionScope {
            key: Some("db.yaml".to_string()),
            ..VersionScope::app("orders")
        };
        assert!(!other_key.matches(&stored));
    }
}
