//! Exclusivity lock entity

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// What a lock protects: one named operation on one entity of one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockScope {
    pub tenant_id: String,
    pub entity_id: String,
    pub name: String,
}

impl LockScope {
    /// Scope guarding smart charging recomputation of a site area.
    pub fn smart_charging(tenant_id: impl Into<String>, site_area_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            entity_id: site_area_id.into(),
            name: "site-area-smart-charging".to_string(),
        }
    }

    /// Storage key, unique per scope.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.tenant_id, self.name, self.entity_id)
    }
}

/// A held lock. Exclusive, expires at `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub id: String,
    pub scope: LockScope,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Lock {
    pub fn new(scope: LockScope, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            scope,
            acquired_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
