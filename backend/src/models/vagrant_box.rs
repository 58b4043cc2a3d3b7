//! Box model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A named family of box versions. Names are unique per owner, not globally.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VagrantBox {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub created_at: DateTime<Utc>,
}
