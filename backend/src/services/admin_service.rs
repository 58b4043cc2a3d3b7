//! Catalog administration: creating users, boxes, versions and providers,
//! and publishing box files.
//!
//! The HTTP surface is read-only, so this is the only write path. Names are
//! validated here against the same shapes the path parser accepts, so that
//! everything created can later be addressed.

use std::sync::{Arc, LazyLock};

use bytes::Bytes;
use regex::Regex;
use tracing::info;

use crate::error::{AppError, Entity, Result};
use crate::formats::catalog_document::qualified_name;
use crate::formats::vagrant::JSON_SUFFIX;
use crate::models::{BoxVersion, Provider, User, VagrantBox, VersionProvider, VersionStatus};
use crate::storage::{artifact_key, StorageBackend};
use crate::store::{CatalogStore, NewBox, NewProvider, NewUser, NewVersion};

static USER_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]{1,32}$").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static BOX_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._-]{1,64}$").unwrap());
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+$").unwrap());
static PROVIDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]{1,32}$").unwrap());

/// Request to publish a version for a provider
#[derive(Debug, Clone)]
pub struct AttachRequest {
    pub owner: String,
    pub box_name: String,
    pub version: String,
    pub provider: String,
    /// Box file to store alongside the association, if any
    pub content: Option<Bytes>,
}

pub struct AdminService {
    store: Arc<dyn CatalogStore>,
    storage: Arc<dyn StorageBackend>,
}

impl AdminService {
    pub fn new(store: Arc<dyn CatalogStore>, storage: Arc<dyn StorageBackend>) -> Self {
        Self { store, storage }
    }

    pub async fn create_user(&self, name: &str, email: &str) -> Result<User> {
        validate_user_name(name)?;
        if !EMAIL_RE.is_match(email) {
            return Err(AppError::Validation(format!("invalid email '{}'", email)));
        }
        let user = self
            .store
            .create_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
            })
            .await?;
        info!(user = %user.name, "Created user");
        Ok(user)
    }

    pub async fn create_box(
        &self,
        owner: &str,
        name: &str,
        description: &str,
        short_description: &str,
    ) -> Result<VagrantBox> {
        validate_box_name(name)?;
        let user = self.find_user(owner).await?;
        let vbox = self
            .store
            .create_box(NewBox {
                owner_id: user.id,
                name: name.to_string(),
                description: description.to_string(),
                short_description: short_description.to_string(),
            })
            .await?;
        info!(box_name = %qualified_name(&user.name, &vbox.name), "Created box");
        Ok(vbox)
    }

    pub async fn create_version(
        &self,
        owner: &str,
        box_name: &str,
        version: &str,
        status: VersionStatus,
        description: &str,
    ) -> Result<BoxVersion> {
        validate_version(version)?;
        let user = self.find_user(owner).await?;
        let vbox = self.find_box(&user, box_name).await?;
        let created = self
            .store
            .create_version(NewVersion {
                box_id: vbox.id,
                version: version.to_string(),
                status,
                description: description.to_string(),
            })
            .await?;
        info!(
            box_name = %qualified_name(&user.name, &vbox.name),
            version = %created.version,
            status = %created.status,
            "Created version"
        );
        Ok(created)
    }

    pub async fn create_provider(&self, name: &str, short_name: &str) -> Result<Provider> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("provider name must not be empty".into()));
        }
        validate_provider_short_name(short_name)?;
        let provider = self
            .store
            .create_provider(NewProvider {
                name: name.to_string(),
                short_name: short_name.to_string(),
            })
            .await?;
        info!(provider = %provider.short_name, "Created provider");
        Ok(provider)
    }

    pub async fn list_providers(&self) -> Result<Vec<Provider>> {
        self.store.list_providers().await
    }

    /// Associate a version with a provider, storing the box file first when
    /// one is supplied. An existing association is left as is.
    pub async fn attach(&self, request: AttachRequest) -> Result<VersionProvider> {
        let user = self.find_user(&request.owner).await?;
        let vbox = self.find_box(&user, &request.box_name).await?;
        let version = self
            .store
            .find_version(vbox.id, &request.version)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    Entity::Version,
                    format!("{}/{}", qualified_name(&user.name, &vbox.name), request.version),
                )
            })?;
        let provider = self
            .store
            .find_provider_by_short_name(&request.provider)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Provider, request.provider.as_str()))?;

        if let Some(content) = request.content {
            let key = artifact_key(&user.name, &vbox.name, &version.version, &provider.short_name);
            let size = content.len();
            self.storage.put(&key, content).await?;
            info!(key = %key, size, "Stored box file");
        }

        if let Some(existing) = self.store.find_association(version.id, provider.id).await? {
            return Ok(existing);
        }
        let link = self.store.associate(version.id, provider.id).await?;
        info!(
            box_name = %qualified_name(&user.name, &vbox.name),
            version = %version.version,
            provider = %provider.short_name,
            "Published version for provider"
        );
        Ok(link)
    }

    async fn find_user(&self, name: &str) -> Result<User> {
        self.store
            .find_user_by_name(name)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::User, name))
    }

    async fn find_box(&self, user: &User, name: &str) -> Result<VagrantBox> {
        self.store
            .find_box(user.id, name)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Box, qualified_name(&user.name, name)))
    }
}

fn validate_user_name(name: &str) -> Result<()> {
    if !USER_NAME_RE.is_match(name) {
        return Err(AppError::Validation(format!(
            "user name '{}' must be 1-32 characters of a-z, 0-9, '_' or '-'",
            name
        )));
    }
    Ok(())
}

/// Box names ending in `.json` would be unreachable: the suffix is always
/// taken as a format selector.
fn validate_box_name(name: &str) -> Result<()> {
    if !BOX_NAME_RE.is_match(name) {
        return Err(AppError::Validation(format!(
            "box name '{}' must be 1-64 characters of a-z, 0-9, '.', '_' or '-'",
            name
        )));
    }
    if name.ends_with(JSON_SUFFIX) {
        return Err(AppError::Validation(format!(
            "box name '{}' must not end in '{}'",
            name, JSON_SUFFIX
        )));
    }
    Ok(())
}

fn validate_version(version: &str) -> Result<()> {
    if !VERSION_RE.is_match(version) {
        return Err(AppError::Validation(format!(
            "version '{}' must look like MAJOR.MINOR",
            version
        )));
    }
    Ok(())
}

fn validate_provider_short_name(short_name: &str) -> Result<()> {
    if !PROVIDER_RE.is_match(short_name) {
        return Err(AppError::Validation(format!(
            "provider short name '{}' must be 1-32 characters of a-z, 0-9, '_' or '-'",
            short_name
        )));
    }
    Ok(())
}
