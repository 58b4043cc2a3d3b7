//! Entity store: the repository interface the catalog reads through.
//!
//! Lookups return `Ok(None)` for absent rows; `Err` always means the store
//! could not answer (`StoreUnavailable`) or rejected a write (`Conflict`,
//! `Validation`). Callers decide which absences are `NotFound`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{BoxVersion, Provider, User, VagrantBox, VersionProvider, VersionStatus};

pub use memory::MemoryCatalogStore;
pub use postgres::PgCatalogStore;

/// Request to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Request to create a box under an existing owner
#[derive(Debug, Clone)]
pub struct NewBox {
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub short_description: String,
}

/// Request to create a version under an existing box
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub box_id: Uuid,
    pub version: String,
    pub status: VersionStatus,
    pub description: String,
}

/// Request to register a provider
#[derive(Debug, Clone)]
pub struct NewProvider {
    pub name: String,
    pub short_name: String,
}

/// Catalog entity store
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Check that the store is reachable
    async fn ping(&self) -> Result<()>;

    async fn create_user(&self, new: NewUser) -> Result<User>;

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>>;

    async fn create_box(&self, new: NewBox) -> Result<VagrantBox>;

    /// Find a box by name within one owner's namespace
    async fn find_box(&self, owner_id: Uuid, name: &str) -> Result<Option<VagrantBox>>;

    /// List an owner's boxes, ordered by name
    async fn list_boxes_by_owner(&self, owner_id: Uuid) -> Result<Vec<VagrantBox>>;

    async fn create_version(&self, new: NewVersion) -> Result<BoxVersion>;

    async fn find_version(&self, box_id: Uuid, version: &str) -> Result<Option<BoxVersion>>;

    /// List a box's versions in creation order
    async fn list_versions(&self, box_id: Uuid) -> Result<Vec<BoxVersion>>;

    async fn create_provider(&self, new: NewProvider) -> Result<Provider>;

    async fn find_provider_by_short_name(&self, short_name: &str) -> Result<Option<Provider>>;

    /// List all providers, ordered by short name
    async fn list_providers(&self) -> Result<Vec<Provider>>;

    /// Record that `version_id` has an artifact for `provider_id`
    async fn associate(&self, version_id: Uuid, provider_id: Uuid) -> Result<VersionProvider>;

    async fn find_association(
        &self,
        version_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<VersionProvider>>;

    /// List the providers associated with a version, ordered by short name
    async fn list_version_providers(&self, version_id: Uuid) -> Result<Vec<Provider>>;
}
