//! Audit metadata carried by every persisted entity.

use serde::Serialize;

/// Creation/modification stamp resolved for one write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStamp {
    /// Ambient actor performing the write.
    pub actor: String,
    /// Unix epoch milliseconds observed on the injected clock.
    pub now: i64,
}

/// Who created/last modified a record, and when (epoch milliseconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditMetadata {
    pub created_at: i64,
    pub created_by: String,
    pub modified_at: i64,
    pub modified_by: String,
}

impl AuditMetadata {
    /// Metadata for a first insert: modification mirrors creation.
    pub fn on_create(stamp: &AuditStamp) -> Self {
        Self {
            created_at: stamp.now,
            created_by: stamp.actor.clone(),
            modified_at: stamp.now,
            modified_by: stamp.actor.clone(),
        }
    }

    /// Metadata for an update of an already persisted record.
    ///
    /// `created_*` is carried over untouched. `modified_at` always moves
    /// forward, even when the clock did not advance since the last write.
    pub fn on_update(previous: &Self, stamp: &AuditStamp) -> Self {
        Self {
            created_at: previous.created_at,
            created_by: previous.created_by.clone(),
            modified_at: stamp.now.max(previous.modified_at.saturating_add(1)),
            modified_by: stamp.actor.clone(),
        }
    }
}
