use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pending change of an entity submitted to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum DataState {
    #[default]
    Unchanged = 0,
    Inserted = 1,
    Updated = 2,
    Deleted = 3,
}

/// Audit columns carried by entities with the audit-log capability.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub created_by_user_name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_by_user_name: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Capability markers an entity may carry. Absent capabilities keep the
/// default `None` answers.
pub trait Capabilities {
    fn data_state(&self) -> Option<DataState> {
        None
    }

    fn audit_log_mut(&mut self) -> Option<&mut AuditLog> {
        None
    }
}

/// Entities addressable by a key.
pub trait HasKey {
    type Key: Clone + PartialEq;

    fn key(&self) -> Self::Key;
    fn set_key(&mut self, key: Self::Key);
}
