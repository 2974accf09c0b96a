//! Concrete record kinds sent by agents

use serde::{Deserialize, Serialize};

use super::{ConfigVersion, MockItem, VersionScope};
use crate::category::Category;
use crate::codec::FieldDirective;

/// Fields shared by every record kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockerCommon {
    /// Recorded transaction id
    pub record_id: String,
    /// Replay execution id, empty while recording
    #[serde(default)]
    pub replay_id: String,
    /// Application that produced the record
    #[serde(default)]
    pub app_id: String,
    /// Creation time, Unix epoch milliseconds
    #[serde(default)]
    pub created_at: u64,
}

impl MockerCommon {
    /// Common fields for a recorded item
    #[must_use]
    pub fn recorded(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            ..Self::default()
        }
    }

    /// Common fields for an item queried during replay
    #[must_use]
    pub fn replayed(record_id: impl Into<String>, replay_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            replay_id: replay_id.into(),
            ..Self::default()
        }
    }
}

macro_rules! impl_mock_item {
    (@ids) => {
        fn record_id(&self) -> &str {
            &self.common.record_id
        }

        fn replay_id(&self) -> &str {
            &self.common.replay_id
        }
    };
    ($kind:ty, $category:expr, $directives:expr) => {
        impl MockItem for $kind {
            impl_mock_item!(@ids);

            fn category(&self) -> Category {
                $category
            }

            fn field_directives(&self) -> &'static [FieldDirective] {
                $directives
            }
        }
    };
    // Category carried by the item itself.
    ($kind:ty, field $category:ident, $directives:expr) => {
        impl MockItem for $kind {
            impl_mock_item!(@ids);

            fn category(&self) -> Category {
                self.$category
            }

            fn field_directives(&self) -> &'static [FieldDirective] {
                $directives
            }
        }
    };
    // Snapshot kinds matched by `ConfigVersion::scope`.
    ($kind:ty, $category:expr, $directives:expr, scoped) => {
        impl MockItem for $kind {
            impl_mock_item!(@ids);

            fn category(&self) -> Category {
                $category
            }

            fn field_directives(&self) -> &'static [FieldDirective] {
                $directives
            }

            fn version_scope(&self) -> Option<VersionScope> {
                Some(self.scope())
            }
        }
    };
}

const BODY_FIELDS: &[FieldDirective] = &[
    FieldDirective::compressed("request"),
    FieldDirective::compressed("response"),
];
const RESPONSE_FIELD: &[FieldDirective] = &[FieldDirective::compressed("response")];
const MESSAGE_BODY_FIELD: &[FieldDirective] = &[FieldDirective::compressed("messageBody")];
const CONTENT_FIELD: &[FieldDirective] = &[FieldDirective::compressed("content")];

/// Inbound request of the application under test
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServletMocker {
    /// Shared fields
    #[serde(flatten)]
    pub common: MockerCommon,
    /// HTTP method
    pub method: String,
    /// Request path
    pub path: String,
    /// Request headers
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Request body
    #[serde(default)]
    pub request: String,
    /// Response body
    #[serde(default)]
    pub response: String,
}

impl_mock_item!(ServletMocker, Category::ServletEntrance, BODY_FIELDS);

/// Outbound HTTP call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpMocker {
    /// Shared fields
    #[serde(flatten)]
    pub common: MockerCommon,
    /// HTTP method
    pub method: String,
    /// Target URL
    pub url: String,
    /// Request body
    #[serde(default)]
    pub request: String,
    /// Response status
    #[serde(default)]
    pub status: u16,
    /// Response body
    #[serde(default)]
    pub response: String,
}

impl_mock_item!(HttpMocker, Category::Http, BODY_FIELDS);

/// Database statement and its result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseMocker {
    /// Shared fields
    #[serde(flatten)]
    pub common: MockerCommon,
    /// Database name
    pub db_name: String,
    /// SQL text
    pub sql: String,
    /// Bound parameters, serialized
    #[serde(default)]
    pub parameters: String,
    /// Result set, serialized
    #[serde(default)]
    pub response: String,
}

impl_mock_item!(DatabaseMocker, Category::Database, RESPONSE_FIELD);

/// Redis command and its reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedisMocker {
    /// Shared fields
    #[serde(flatten)]
    pub common: MockerCommon,
    /// Cluster name
    #[serde(default)]
    pub cluster: String,
    /// Redis key
    pub redis_key: String,
    /// Reply, serialized
    #[serde(default)]
    pub response: String,
}

impl_mock_item!(RedisMocker, Category::Redis, &[]);

/// Recorded result of an arbitrary method call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicClassMocker {
    /// Shared fields
    #[serde(flatten)]
    pub common: MockerCommon,
    /// Declaring class
    pub clazz_name: String,
    /// Operation name
    pub operation: String,
    /// Result, serialized
    #[serde(default)]
    pub response: String,
}

impl_mock_item!(DynamicClassMocker, Category::DynamicClass, RESPONSE_FIELD);

/// Message published to or consumed from a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessageMocker {
    /// Shared fields
    #[serde(flatten)]
    pub common: MockerCommon,
    /// Queue category, producer or consumer
    pub category: Category,
    /// Topic or subject
    pub subject: String,
    /// Message body
    #[serde(default)]
    pub message_body: String,
}

impl_mock_item!(QueueMessageMocker, field category, MESSAGE_BODY_FIELD);

/// Snapshot of one configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFileMocker {
    /// Shared fields
    #[serde(flatten)]
    pub common: MockerCommon,
    /// File key
    pub key: String,
    /// Recording version the snapshot belongs to
    #[serde(default)]
    pub record_version: Option<i32>,
    /// Version of the file itself
    #[serde(default)]
    pub file_version: Option<i64>,
    /// File content
    #[serde(default)]
    pub content: String,
}

impl_mock_item!(ConfigFileMocker, Category::ConfigFile, CONTENT_FIELD, scoped);

impl ConfigVersion for ConfigFileMocker {
    fn app_id(&self) -> &str {
        &self.common.app_id
    }

    fn scope(&self) -> VersionScope {
        VersionScope {
            app_id: self.common.app_id.clone(),
            record_version: self.record_version,
            key: (!self.key.is_empty()).then(|| self.key.clone()),
        }
    }
}

/// Version key grouping every configuration snapshot of one recording
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigVersionMocker {
    /// Shared fields
    #[serde(flatten)]
    pub common: MockerCommon,
    /// Recording version
    #[serde(default)]
    pub record_version: Option<i32>,
}

impl_mock_item!(ConfigVersionMocker, Category::ConfigVersion, &[], scoped);

impl ConfigVersion for ConfigVersionMocker {
    fn app_id(&self) -> &str {
        &self.common.app_id
    }

    fn scope(&self) -> VersionScope {
        VersionScope {
            app_id: self.common.app_id.clone(),
            record_version: self.record_version,
            key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_common_fields_flatten_camel_case() {
        let item = HttpMocker {
            common: MockerCommon::replayed("rec1", "rep1"),
            method: "GET".to_string(),
            url: "https://api.example.com/orders".to_string(),
            status: 200,
            ..HttpMocker::default()
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["recordId"], json!("rec1"));
        assert_eq!(value["replayId"], json!("rep1"));
        assert_eq!(value["url"], json!("https://api.example.com/orders"));
        assert_eq!(item.record_id(), "rec1");
        assert_eq!(item.replay_id(), "rep1");
        assert_eq!(item.category(), Category::Http);
    }

    #[test]
    fn test_agent_json_parses() {
        let item: ConfigFileMocker = serde_json::from_value(json!({
            "recordId": "rec9",
            "appId": "orders",
            "key": "app.yaml",
            "recordVersion": 2,
            "content": "a: 1"
        }))
        .unwrap();

        assert_eq!(item.common.replay_id, "");
        let scope = item.version_scope().unwrap();
        assert_eq!(scope.app_id, "orders");
        assert_eq!(scope.record_version, Some(2));
        assert_eq!(scope.key.as_deref(), Some("app.yaml"));
        assert_eq!(item.field_directives()[0].field, "content");
    }

    #[test]
    fn test_queue_message_category_is_per_item() {
        let consumer = QueueMessageMocker {
            common: MockerCommon::replayed("rec1", "rep1"),
            category: Category::QueueConsumer,
            subject: "order.created".to_string(),
            message_body: "{}".to_string(),
        };
        assert_eq!(consumer.category(), Category::QueueConsumer);

        let value = serde_json::to_value(&consumer).unwrap();
        assert_eq!(value["category"], json!("queue_consumer"));
    }

    #[test]
    fn test_every_kind_reads_common_ids() {
        let common = MockerCommon::replayed("rec7", "rep7");
        let seen = [
            ids(&ServletMocker {
                common: common.clone(),
                ..ServletMocker::default()
            }),
            ids(&RedisMocker {
                common: common.clone(),
                ..RedisMocker::default()
            }),
            ids(&QueueMessageMocker {
                common: common.clone(),
                category: Category::QueueProducer,
                subject: "order.paid".to_string(),
                message_body: String::new(),
            }),
            ids(&ConfigFileMocker {
                common: common.clone(),
                ..ConfigFileMocker::default()
            }),
            ids(&ConfigVersionMocker {
                common,
                record_version: Some(1),
            }),
        ];

        for (record_id, replay_id, _, _) in &seen {
            assert_eq!(record_id, "rec7");
            assert_eq!(replay_id, "rep7");
        }
        assert_eq!(seen[0].2, Category::ServletEntrance);
        assert!(seen[1].3.is_none());
        assert_eq!(seen[2].2, Category::QueueProducer);
        assert_eq!(seen[3].2, Category::ConfigFile);
        assert!(seen[3].3.is_some());
        assert_eq!(seen[4].3.as_ref().unwrap().record_version, Some(1));
    }

    fn ids<T: MockItem>(item: &T) -> (String, String, Category, Option<VersionScope>) {
        (
            item.record_id().to_string(),
            item.replay_id().to_string(),
            item.category(),
            item.version_scope(),
        )
    }
}
