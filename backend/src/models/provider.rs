//! Provider and version-provider association models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A distribution format (virtualbox, vmware, libvirt, ...). Process-wide reference data.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Provider {
    pub id: Uuid,
    pub name: String,
    /// Lowercase key used as the path segment and `.box` file stem
    pub short_name: String,
    pub created_at: DateTime<Utc>,
}

/// Records that a version has an artifact published for a provider.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct VersionProvider {
    pub version_id: Uuid,
    pub provider_id: Uuid,
    pub created_at: DateTime<Utc>,
}
