//! Catalog resolution service.
//!
//! Turns a parsed [`PathQuery`] into a document or an artifact location by
//! walking user -> box -> version -> provider association. Each step gates
//! the next and the walk stops at the first missing entity. Nothing is
//! cached; every call reads the store afresh.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::{AppError, Entity, Result};
use crate::formats::catalog_document::{
    qualified_name, CatalogDocument, ProviderEntry, VersionDocument, VersionEntry,
};
use crate::formats::vagrant::{CatalogTarget, PathQuery};
use crate::models::{BoxVersion, Provider, User, VagrantBox};
use crate::services::metrics_service;
use crate::storage::{artifact_key, StorageBackend};
use crate::store::CatalogStore;

/// A box file whose association and presence have both been confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub owner: String,
    pub box_name: String,
    pub version: String,
    pub provider: String,
    /// Key of the file in the artifact store
    pub storage_key: String,
    /// File name offered to the client
    pub file_name: String,
}

/// Outcome of resolving one catalog path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    BoxNames(Vec<String>),
    Catalog(CatalogDocument),
    Versions(Vec<VersionEntry>),
    Version(VersionDocument),
    Providers(Vec<ProviderEntry>),
    Provider(ProviderEntry),
    Artifact(ResolvedArtifact),
}

/// Catalog resolver over an entity store and an artifact store
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    storage: Arc<dyn StorageBackend>,
    public_url: String,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        storage: Arc<dyn StorageBackend>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            storage,
            public_url: public_url.into(),
        }
    }

    /// Resolve a parsed path.
    #[instrument(skip(self, query), fields(owner = %query.owner))]
    pub async fn resolve(&self, query: &PathQuery) -> Result<Resolution> {
        let owner = query.owner.as_str();
        let result = match &query.target {
            CatalogTarget::Owner => self.list_box_names(owner).await.map(Resolution::BoxNames),
            CatalogTarget::Box { name, .. } => self
                .catalog_document(owner, name)
                .await
                .map(Resolution::Catalog),
            CatalogTarget::Versions { box_name } => self
                .version_entries(owner, box_name)
                .await
                .map(Resolution::Versions),
            CatalogTarget::Version { box_name, version } => self
                .version_document(owner, box_name, version)
                .await
                .map(Resolution::Version),
            CatalogTarget::Providers { box_name, version } => self
                .provider_entries(owner, box_name, version)
                .await
                .map(Resolution::Providers),
            CatalogTarget::Provider {
                box_name,
                version,
                provider,
            } => self
                .provider_entry(owner, box_name, version, provider)
                .await
                .map(Resolution::Provider),
            CatalogTarget::Artifact {
                box_name,
                version,
                provider,
            } => self
                .resolve_artifact(owner, box_name, version, provider)
                .await
                .map(Resolution::Artifact),
        };

        metrics_service::record_resolution(target_label(&query.target), &result);
        result
    }

    /// Names of every box the owner has, sorted.
    pub async fn list_box_names(&self, owner: &str) -> Result<Vec<String>> {
        let user = self.find_user(owner).await?;
        let boxes = self.store.list_boxes_by_owner(user.id).await?;
        for vbox in &boxes {
            ensure_owned(&user, vbox)?;
        }
        Ok(boxes.into_iter().map(|b| b.name).collect())
    }

    /// Box metadata with its shallow version listing.
    pub async fn catalog_document(&self, owner: &str, box_name: &str) -> Result<CatalogDocument> {
        let user = self.find_user(owner).await?;
        let vbox = self.find_box(&user, box_name).await?;
        let versions = self.store.list_versions(vbox.id).await?;
        debug!(
            box_name = %vbox.name,
            versions = versions.len(),
            "Assembled catalog document"
        );
        Ok(CatalogDocument::new(&user, &vbox, &versions))
    }

    pub async fn version_entries(&self, owner: &str, box_name: &str) -> Result<Vec<VersionEntry>> {
        let user = self.find_user(owner).await?;
        let vbox = self.find_box(&user, box_name).await?;
        let versions = self.store.list_versions(vbox.id).await?;
        Ok(versions.iter().map(VersionEntry::from).collect())
    }

    pub async fn version_document(
        &self,
        owner: &str,
        box_name: &str,
        version: &str,
    ) -> Result<VersionDocument> {
        let user = self.find_user(owner).await?;
        let vbox = self.find_box(&user, box_name).await?;
        let found = self.find_version(&user, &vbox, version).await?;
        let providers = self.linked_provider_entries(&user, &vbox, &found).await?;
        Ok(VersionDocument::new(&found, providers))
    }

    pub async fn provider_entries(
        &self,
        owner: &str,
        box_name: &str,
        version: &str,
    ) -> Result<Vec<ProviderEntry>> {
        let user = self.find_user(owner).await?;
        let vbox = self.find_box(&user, box_name).await?;
        let found = self.find_version(&user, &vbox, version).await?;
        self.linked_provider_entries(&user, &vbox, &found).await
    }

    /// Metadata of one provider the version is published for.
    pub async fn provider_entry(
        &self,
        owner: &str,
        box_name: &str,
        version: &str,
        provider: &str,
    ) -> Result<ProviderEntry> {
        let user = self.find_user(owner).await?;
        let vbox = self.find_box(&user, box_name).await?;
        let found = self.find_version(&user, &vbox, version).await?;
        let linked = self
            .find_linked_provider(&found, provider)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    Entity::Provider,
                    format!("{}/{}", qualified_version(&user, &vbox, &found), provider),
                )
            })?;
        Ok(ProviderEntry::new(
            &self.public_url,
            &user.name,
            &vbox.name,
            &found.version,
            &linked,
        ))
    }

    /// Locate the box file for a provider.
    ///
    /// The association is checked before the artifact store is consulted, so
    /// a file lying at the conventional path is never served on its own.
    pub async fn resolve_artifact(
        &self,
        owner: &str,
        box_name: &str,
        version: &str,
        provider: &str,
    ) -> Result<ResolvedArtifact> {
        let user = self.find_user(owner).await?;
        let vbox = self.find_box(&user, box_name).await?;
        let found = self.find_version(&user, &vbox, version).await?;
        let artifact_id = format!("{}/{}.box", qualified_version(&user, &vbox, &found), provider);

        let linked = self
            .find_linked_provider(&found, provider)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Artifact, artifact_id.clone()))?;

        let storage_key = artifact_key(&user.name, &vbox.name, &found.version, &linked.short_name);
        if !self.storage.exists(&storage_key).await? {
            debug!(key = %storage_key, "Associated box file missing from storage");
            return Err(AppError::not_found(Entity::Artifact, artifact_id));
        }

        Ok(ResolvedArtifact {
            owner: user.name,
            box_name: vbox.name,
            version: found.version,
            file_name: format!("{}.box", linked.short_name),
            provider: linked.short_name,
            storage_key,
        })
    }

    async fn find_user(&self, owner: &str) -> Result<User> {
        self.store
            .find_user_by_name(owner)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::User, owner))
    }

    async fn find_box(&self, user: &User, box_name: &str) -> Result<VagrantBox> {
        let vbox = self
            .store
            .find_box(user.id, box_name)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Box, qualified_name(&user.name, box_name)))?;
        ensure_owned(user, &vbox)?;
        Ok(vbox)
    }

    async fn find_version(
        &self,
        user: &User,
        vbox: &VagrantBox,
        version: &str,
    ) -> Result<BoxVersion> {
        let found = self
            .store
            .find_version(vbox.id, version)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    Entity::Version,
                    format!("{}/{}", qualified_name(&user.name, &vbox.name), version),
                )
            })?;
        if found.box_id != vbox.id {
            return Err(AppError::InvariantViolation(format!(
                "version {} returned for box {} belongs to box {}",
                found.id, vbox.id, found.box_id
            )));
        }
        Ok(found)
    }

    /// The provider with `short_name`, if the version is associated with it.
    async fn find_linked_provider(
        &self,
        version: &BoxVersion,
        short_name: &str,
    ) -> Result<Option<Provider>> {
        let Some(provider) = self.store.find_provider_by_short_name(short_name).await? else {
            return Ok(None);
        };
        let linked = self
            .store
            .find_association(version.id, provider.id)
            .await?
            .is_some();
        Ok(linked.then_some(provider))
    }

    async fn linked_provider_entries(
        &self,
        user: &User,
        vbox: &VagrantBox,
        version: &BoxVersion,
    ) -> Result<Vec<ProviderEntry>> {
        let providers = self.store.list_version_providers(version.id).await?;
        Ok(providers
            .iter()
            .map(|p| ProviderEntry::new(&self.public_url, &user.name, &vbox.name, &version.version, p))
            .collect())
    }
}

/// A box handed back for one owner must belong to that owner.
fn ensure_owned(user: &User, vbox: &VagrantBox) -> Result<()> {
    if vbox.owner_id != user.id {
        return Err(AppError::InvariantViolation(format!(
            "box {} listed under user {} is owned by {}",
            vbox.id, user.id, vbox.owner_id
        )));
    }
    Ok(())
}

fn qualified_version(user: &User, vbox: &VagrantBox, version: &BoxVersion) -> String {
    format!(
        "{}/version/{}",
        qualified_name(&user.name, &vbox.name),
        version.version
    )
}

fn target_label(target: &CatalogTarget) -> &'static str {
    match target {
        CatalogTarget::Owner => "owner",
        CatalogTarget::Box { .. } => "box",
        CatalogTarget::Versions { .. } => "versions",
        CatalogTarget::Version { .. } => "version",
        CatalogTarget::Providers { .. } => "providers",
        CatalogTarget::Provider { .. } => "provider",
        CatalogTarget::Artifact { .. } => "artifact",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::vagrant::parse_path;
    use crate::models::VersionStatus;
    use crate::storage::filesystem::FilesystemStorage;
    use crate::store::{MemoryCatalogStore, NewBox, NewProvider, NewUser, NewVersion};
    use async_trait::async_trait;
    use bytes::Bytes;
    use uuid::Uuid;

    struct Fixture {
        service: CatalogService,
        store: Arc<MemoryCatalogStore>,
        storage: Arc<FilesystemStorage>,
        _dir: tempfile::TempDir,
    }

    /// sparticvs owns ubuntu-14.04.1 with version 1.0 published for vmware;
    /// a qemu provider exists but is not associated.
    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryCatalogStore::new());
        let storage = Arc::new(FilesystemStorage::new(dir.path()));

        let user = store
            .create_user(NewUser {
                name: "sparticvs".into(),
                email: "sparticvs@example.com".into(),
            })
            .await
            .unwrap();
        let vbox = store
            .create_box(NewBox {
                owner_id: user.id,
                name: "ubuntu-14.04.1".into(),
                description: "Ubuntu 14.04.1 LTS server".into(),
                short_description: "Ubuntu 14.04.1".into(),
            })
            .await
            .unwrap();
        let version = store
            .create_version(NewVersion {
                box_id: vbox.id,
                version: "1.0".into(),
                status: VersionStatus::Active,
                description: "Initial release".into(),
            })
            .await
            .unwrap();
        let vmware = store
            .create_provider(NewProvider {
                name: "VMware".into(),
                short_name: "vmware".into(),
            })
            .await
            .unwrap();
        store
            .create_provider(NewProvider {
                name: "QEMU".into(),
                short_name: "qemu".into(),
            })
            .await
            .unwrap();
        store.associate(version.id, vmware.id).await.unwrap();

        for provider in ["vmware", "qemu"] {
            storage
                .put(
                    &artifact_key("sparticvs", "ubuntu-14.04.1", "1.0", provider),
                    Bytes::from_static(b"box"),
                )
                .await
                .unwrap();
        }

        let service = CatalogService::new(store.clone(), storage.clone(), "http://boxes.test");
        Fixture {
            service,
            store,
            storage,
            _dir: dir,
        }
    }

    async fn resolve(f: &Fixture, path: &str) -> Result<Resolution> {
        f.service.resolve(&parse_path(path).unwrap()).await
    }

    #[tokio::test]
    async fn test_list_box_names() {
        let f = fixture().await;
        assert_eq!(
            resolve(&f, "sparticvs").await.unwrap(),
            Resolution::BoxNames(vec!["ubuntu-14.04.1".into()])
        );
    }

    #[tokio::test]
    async fn test_unknown_owner() {
        let f = fixture().await;
        let err = resolve(&f, "nobody").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFound {
                entity: Entity::User,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_catalog_document() {
        let f = fixture().await;
        let Resolution::Catalog(doc) = resolve(&f, "sparticvs/ubuntu-14.04.1").await.unwrap()
        else {
            panic!("expected catalog document");
        };
        assert_eq!(doc.name, "sparticvs/ubuntu-14.04.1");
        assert_eq!(doc.description, "Ubuntu 14.04.1 LTS server");
        assert_eq!(doc.short_description, "Ubuntu 14.04.1");
        assert_eq!(
            doc.versions,
            vec![VersionEntry {
                version: "1.0".into(),
                status: VersionStatus::Active
            }]
        );
    }

    #[tokio::test]
    async fn test_json_suffix_resolves_same_document() {
        let f = fixture().await;
        let bare = resolve(&f, "sparticvs/ubuntu-14.04.1").await.unwrap();
        let json = resolve(&f, "sparticvs/ubuntu-14.04.1.json").await.unwrap();
        assert_eq!(bare, json);
    }

    #[tokio::test]
    async fn test_box_scoped_to_owner() {
        let f = fixture().await;
        f.store
            .create_user(NewUser {
                name: "mallory".into(),
                email: "mallory@example.com".into(),
            })
            .await
            .unwrap();

        let err = resolve(&f, "mallory/ubuntu-14.04.1").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFound {
                entity: Entity::Box,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_artifact_resolved() {
        let f = fixture().await;
        let Resolution::Artifact(artifact) = resolve(
            &f,
            "sparticvs/ubuntu-14.04.1/version/1.0/provider/vmware.box",
        )
        .await
        .unwrap() else {
            panic!("expected artifact");
        };
        assert_eq!(artifact.storage_key, "sparticvs/ubuntu-14.04.1/1.0/vmware.box");
        assert_eq!(artifact.file_name, "vmware.box");
        assert_eq!(artifact.provider, "vmware");
    }

    #[tokio::test]
    async fn test_artifact_requires_association_even_if_file_exists() {
        let f = fixture().await;
        assert!(f
            .storage
            .exists("sparticvs/ubuntu-14.04.1/1.0/qemu.box")
            .await
            .unwrap());

        let err = resolve(&f, "sparticvs/ubuntu-14.04.1/version/1.0/provider/qemu.box")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFound {
                entity: Entity::Artifact,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_artifact_requires_file() {
        let f = fixture().await;
        let user = f.store.find_user_by_name("sparticvs").await.unwrap().unwrap();
        let vbox = f.store.find_box(user.id, "ubuntu-14.04.1").await.unwrap().unwrap();
        let version = f
            .store
            .create_version(NewVersion {
                box_id: vbox.id,
                version: "2.0".into(),
                status: VersionStatus::Active,
                description: String::new(),
            })
            .await
            .unwrap();
        let vmware = f
            .store
            .find_provider_by_short_name("vmware")
            .await
            .unwrap()
            .unwrap();
        f.store.associate(version.id, vmware.id).await.unwrap();

        let err = resolve(&f, "sparticvs/ubuntu-14.04.1/version/2.0/provider/vmware.box")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFound {
                entity: Entity::Artifact,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unknown_version() {
        let f = fixture().await;
        let err = resolve(&f, "sparticvs/ubuntu-14.04.1/version/9.9")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFound {
                entity: Entity::Version,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_version_document_lists_linked_providers() {
        let f = fixture().await;
        let Resolution::Version(doc) = resolve(&f, "sparticvs/ubuntu-14.04.1/version/1.0")
            .await
            .unwrap()
        else {
            panic!("expected version document");
        };
        assert_eq!(doc.version, "1.0");
        assert_eq!(doc.description_markdown, "Initial release");
        assert_eq!(
            doc.providers,
            vec![ProviderEntry {
                name: "vmware".into(),
                url: "http://boxes.test/sparticvs/ubuntu-14.04.1/version/1.0/provider/vmware.box"
                    .into()
            }]
        );
    }

    #[tokio::test]
    async fn test_provider_metadata_requires_association() {
        let f = fixture().await;
        assert!(matches!(
            resolve(&f, "sparticvs/ubuntu-14.04.1/version/1.0/provider/vmware")
                .await
                .unwrap(),
            Resolution::Provider(_)
        ));
        let err = resolve(&f, "sparticvs/ubuntu-14.04.1/version/1.0/provider/qemu")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFound {
                entity: Entity::Provider,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let f = fixture().await;
        let first = resolve(&f, "sparticvs/ubuntu-14.04.1").await.unwrap();
        let second = resolve(&f, "sparticvs/ubuntu-14.04.1").await.unwrap();
        assert_eq!(first, second);
    }

    /// Store that answers every box lookup with a box owned by someone else.
    struct MisownedStore {
        inner: MemoryCatalogStore,
    }

    #[async_trait]
    impl CatalogStore for MisownedStore {
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
        async fn create_user(&self, new: NewUser) -> Result<User> {
            self.inner.create_user(new).await
        }
        async fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
            self.inner.find_user_by_name(name).await
        }
        async fn create_box(&self, new: NewBox) -> Result<VagrantBox> {
            self.inner.create_box(new).await
        }
        async fn find_box(&self, _owner_id: Uuid, name: &str) -> Result<Option<VagrantBox>> {
            Ok(Some(VagrantBox {
                id: Uuid::new_v4(),
                owner_id: Uuid::new_v4(),
                name: name.to_string(),
                description: String::new(),
                short_description: String::new(),
                created_at: chrono::Utc::now(),
            }))
        }
        async fn list_boxes_by_owner(&self, owner_id: Uuid) -> Result<Vec<VagrantBox>> {
            self.inner.list_boxes_by_owner(owner_id).await
        }
        async fn create_version(&self, new: NewVersion) -> Result<BoxVersion> {
            self.inner.create_version(new).await
        }
        async fn find_version(&self, box_id: Uuid, version: &str) -> Result<Option<BoxVersion>> {
            self.inner.find_version(box_id, version).await
        }
        async fn list_versions(&self, box_id: Uuid) -> Result<Vec<BoxVersion>> {
            self.inner.list_versions(box_id).await
        }
        async fn create_provider(&self, new: NewProvider) -> Result<Provider> {
            self.inner.create_provider(new).await
        }
        async fn find_provider_by_short_name(&self, short_name: &str) -> Result<Option<Provider>> {
            self.inner.find_provider_by_short_name(short_name).await
        }
        async fn list_providers(&self) -> Result<Vec<Provider>> {
            self.inner.list_providers().await
        }
        async fn associate(
            &self,
            version_id: Uuid,
            provider_id: Uuid,
        ) -> Result<crate::models::VersionProvider> {
            self.inner.associate(version_id, provider_id).await
        }
        async fn find_association(
            &self,
            version_id: Uuid,
            provider_id: Uuid,
        ) -> Result<Option<crate::models::VersionProvider>> {
            self.inner.find_association(version_id, provider_id).await
        }
        async fn list_version_providers(&self, version_id: Uuid) -> Result<Vec<Provider>> {
            self.inner.list_version_providers(version_id).await
        }
    }

    #[tokio::test]
    async fn test_misowned_box_is_invariant_violation() {
        let store = Arc::new(MisownedStore {
            inner: MemoryCatalogStore::new(),
        });
        store
            .create_user(NewUser {
                name: "alice".into(),
                email: "alice@example.com".into(),
            })
            .await
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let service = CatalogService::new(
            store,
            Arc::new(FilesystemStorage::new(dir.path())),
            "http://boxes.test",
        );

        let err = service.catalog_document("alice", "ubuntu").await.unwrap_err();
        assert!(matches!(err, AppError::InvariantViolation(_)));
    }

    /// Store whose backend is down.
    struct UnavailableStore;

    #[async_trait]
    impl CatalogStore for UnavailableStore {
        async fn ping(&self) -> Result<()> {
            Err(down())
        }
        async fn create_user(&self, _: NewUser) -> Result<User> {
            Err(down())
        }
        async fn find_user_by_name(&self, _: &str) -> Result<Option<User>> {
            Err(down())
        }
        async fn create_box(&self, _: NewBox) -> Result<VagrantBox> {
            Err(down())
        }
        async fn find_box(&self, _: Uuid, _: &str) -> Result<Option<VagrantBox>> {
            Err(down())
        }
        async fn list_boxes_by_owner(&self, _: Uuid) -> Result<Vec<VagrantBox>> {
            Err(down())
        }
        async fn create_version(&self, _: NewVersion) -> Result<BoxVersion> {
            Err(down())
        }
        async fn find_version(&self, _: Uuid, _: &str) -> Result<Option<BoxVersion>> {
            Err(down())
        }
        async fn list_versions(&self, _: Uuid) -> Result<Vec<BoxVersion>> {
            Err(down())
        }
        async fn create_provider(&self, _: NewProvider) -> Result<Provider> {
            Err(down())
        }
        async fn find_provider_by_short_name(&self, _: &str) -> Result<Option<Provider>> {
            Err(down())
        }
        async fn list_providers(&self) -> Result<Vec<Provider>> {
            Err(down())
        }
        async fn associate(&self, _: Uuid, _: Uuid) -> Result<crate::models::VersionProvider> {
            Err(down())
        }
        async fn find_association(
            &self,
            _: Uuid,
            _: Uuid,
        ) -> Result<Option<crate::models::VersionProvider>> {
            Err(down())
        }
        async fn list_version_providers(&self, _: Uuid) -> Result<Vec<Provider>> {
            Err(down())
        }
    }

    fn down() -> AppError {
        AppError::StoreUnavailable("connection refused".into())
    }

    #[tokio::test]
    async fn test_store_failure_is_not_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let service = CatalogService::new(
            Arc::new(UnavailableStore),
            Arc::new(FilesystemStorage::new(dir.path())),
            "http://boxes.test",
        );
        let err = service
            .resolve(&parse_path("alice/ubuntu").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }
}
