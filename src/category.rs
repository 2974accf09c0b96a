//! Closed category set and its static trait table

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MockError;

/// Kind of call being recorded or replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Category {
    /// Inbound servlet request of the application under test
    ServletEntrance = 0,
    /// Outbound HTTP call
    Http = 1,
    /// Database statement
    Database = 2,
    /// Redis command
    Redis = 3,
    /// Dynamically recorded method result
    DynamicClass = 4,
    /// Message published to a queue
    QueueProducer = 5,
    /// Message consumed from a queue
    QueueConsumer = 6,
    /// Configuration file snapshot
    ConfigFile = 7,
    /// Configuration version key
    ConfigVersion = 8,
}

/// Static attributes of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryTraits {
    /// Human readable name used in logs
    pub display_name: &'static str,
    /// Represents the application's own entrypoint, never mocked
    pub is_main_entry: bool,
    /// Asynchronous consumption that needs last-write-wins correlation
    pub is_queue_consumer: bool,
}

const fn attrs(
    display_name: &'static str,
    is_main_entry: bool,
    is_queue_consumer: bool,
) -> CategoryTraits {
    CategoryTraits {
        display_name,
        is_main_entry,
        is_queue_consumer,
    }
}

// Indexed by `Category as usize`.
const TRAITS: [CategoryTraits; Category::ALL.len()] = [
    attrs("ServletEntrance", true, false),
    attrs("Http", false, false),
    attrs("Database", false, false),
    attrs("Redis", false, false),
    attrs("DynamicClass", false, false),
    attrs("QueueProducer", false, false),
    attrs("QueueConsumer", true, true),
    attrs("ConfigFile", false, false),
    attrs("ConfigVersion", false, false),
];

/// Look up the static attributes of a category
#[must_use]
pub fn traits(category: Category) -> &'static CategoryTraits {
    &TRAITS[category as usize]
}

impl Category {
    /// Every category, in tag order
    pub const ALL: [Category; 9] = [
        Category::ServletEntrance,
        Category::Http,
        Category::Database,
        Category::Redis,
        Category::DynamicClass,
        Category::QueueProducer,
        Category::QueueConsumer,
        Category::ConfigFile,
        Category::ConfigVersion,
    ];

    /// Stable numeric tag, persisted in record log headers
    #[must_use]
    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Resolve a numeric tag
    #[must_use]
    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Snake case name used in configuration and file names
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ServletEntrance => "servlet_entrance",
            Self::Http => "http",
            Self::Database => "database",
            Self::Redis => "redis",
            Self::DynamicClass => "dynamic_class",
            Self::QueueProducer => "queue_producer",
            Self::QueueConsumer => "queue_consumer",
            Self::ConfigFile => "config_file",
            Self::ConfigVersion => "config_version",
        }
    }

    /// Display name from the trait table
    #[must_use]
    pub fn display_name(self) -> &'static str {
        traits(self).display_name
    }

    /// Whether this category is the application's own entrypoint
    #[must_use]
    pub fn is_main_entry(self) -> bool {
        traits(self).is_main_entry
    }

    /// Whether this category is a queue consumer
    #[must_use]
    pub fn is_queue_consumer(self) -> bool {
        traits(self).is_queue_consumer
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Category {
    type Err = MockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s || c.display_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| MockError::UnknownCategory(s.to_string()))
    }
}
