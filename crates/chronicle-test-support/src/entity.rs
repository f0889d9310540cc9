//! Mock read-model entity.

use chronicle_core::repository::{Entity, Versionable};
use uuid::Uuid;

/// A versioned read model holding one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockEntity {
    /// Entity identifier.
    pub id: Uuid,
    /// Version of the last projected event.
    pub version: i64,
    /// Projected content.
    pub content: String,
}

impl MockEntity {
    /// Creates an entity at `version`.
    #[must_use]
    pub fn new(id: Uuid, version: i64, content: &str) -> Self {
        Self {
            id,
            version,
            content: content.to_owned(),
        }
    }
}

impl Entity for MockEntity {
    fn entity_id(&self) -> Uuid {
        self.id
    }
}

impl Versionable for MockEntity {
    fn aggregate_version(&self) -> i64 {
        self.version
    }
}
