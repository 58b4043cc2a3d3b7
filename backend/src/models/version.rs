//! Box version model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Publication status of a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "version_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Active,
    Inactive,
}

impl VersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Active => "active",
            VersionStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(VersionStatus::Active),
            "inactive" => Ok(VersionStatus::Inactive),
            other => Err(format!("unknown version status '{}'", other)),
        }
    }
}

/// Version entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BoxVersion {
    pub id: Uuid,
    pub box_id: Uuid,
    pub version: String,
    pub status: VersionStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
