//! In-memory entity store.
//!
//! Mirrors the PostgreSQL constraints (uniqueness, parent existence) so the
//! resolver behaves the same against either store. Used by tests and local runs.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{CatalogStore, NewBox, NewProvider, NewUser, NewVersion};
use crate::error::{AppError, Result};
use crate::models::{BoxVersion, Provider, User, VagrantBox, VersionProvider};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    boxes: Vec<VagrantBox>,
    versions: Vec<BoxVersion>,
    providers: Vec<Provider>,
    version_providers: Vec<VersionProvider>,
}

/// Entity store held entirely in process memory
#[derive(Default)]
pub struct MemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| AppError::StoreUnavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| AppError::StoreUnavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn ping(&self) -> Result<()> {
        self.read().map(|_| ())
    }

    async fn create_user(&self, new: NewUser) -> Result<User> {
        let mut t = self.write()?;
        if t.users.iter().any(|u| u.name == new.name || u.email == new.email) {
            return Err(AppError::Conflict(format!("user '{}' already exists", new.name)));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            created_at: Utc::now(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.name == name).cloned())
    }

    async fn create_box(&self, new: NewBox) -> Result<VagrantBox> {
        let mut t = self.write()?;
        if !t.users.iter().any(|u| u.id == new.owner_id) {
            return Err(AppError::Validation(format!(
                "box '{}' refers to a missing parent",
                new.name
            )));
        }
        if t
            .boxes
            .iter()
            .any(|b| b.owner_id == new.owner_id && b.name == new.name)
        {
            return Err(AppError::Conflict(format!("box '{}' already exists", new.name)));
        }
        let vbox = VagrantBox {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            name: new.name,
            description: new.description,
            short_description: new.short_description,
            created_at: Utc::now(),
        };
        t.boxes.push(vbox.clone());
        Ok(vbox)
    }

    async fn find_box(&self, owner_id: Uuid, name: &str) -> Result<Option<VagrantBox>> {
        Ok(self
            .read()?
            .boxes
            .iter()
            .find(|b| b.owner_id == owner_id && b.name == name)
            .cloned())
    }

    async fn list_boxes_by_owner(&self, owner_id: Uuid) -> Result<Vec<VagrantBox>> {
        let mut boxes: Vec<VagrantBox> = self
            .read()?
            .boxes
            .iter()
            .filter(|b| b.owner_id == owner_id)
            .cloned()
            .collect();
        boxes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(boxes)
    }

    async fn create_version(&self, new: NewVersion) -> Result<BoxVersion> {
        let mut t = self.write()?;
        if !t.boxes.iter().any(|b| b.id == new.box_id) {
            return Err(AppError::Validation(format!(
                "version '{}' refers to a missing parent",
                new.version
            )));
        }
        if t
            .versions
            .iter()
            .any(|v| v.box_id == new.box_id && v.version == new.version)
        {
            return Err(AppError::Conflict(format!(
                "version '{}' already exists",
                new.version
            )));
        }
        let version = BoxVersion {
            id: Uuid::new_v4(),
            box_id: new.box_id,
            version: new.version,
            status: new.status,
            description: new.description,
            created_at: Utc::now(),
        };
        t.versions.push(version.clone());
        Ok(version)
    }

    async fn find_version(&self, box_id: Uuid, version: &str) -> Result<Option<BoxVersion>> {
        Ok(self
            .read()?
            .versions
            .iter()
            .find(|v| v.box_id == box_id && v.version == version)
            .cloned())
    }

    async fn list_versions(&self, box_id: Uuid) -> Result<Vec<BoxVersion>> {
        // Insertion order is creation order.
        Ok(self
            .read()?
            .versions
            .iter()
            .filter(|v| v.box_id == box_id)
            .cloned()
            .collect())
    }

    async fn create_provider(&self, new: NewProvider) -> Result<Provider> {
        let mut t = self.write()?;
        if t.providers.iter().any(|p| p.short_name == new.short_name) {
            return Err(AppError::Conflict(format!(
                "provider '{}' already exists",
                new.short_name
            )));
        }
        let provider = Provider {
            id: Uuid::new_v4(),
            name: new.name,
            short_name: new.short_name,
            created_at: Utc::now(),
        };
        t.providers.push(provider.clone());
        Ok(provider)
    }

    async fn find_provider_by_short_name(&self, short_name: &str) -> Result<Option<Provider>> {
        Ok(self
            .read()?
            .providers
            .iter()
            .find(|p| p.short_name == short_name)
            .cloned())
    }

    async fn list_providers(&self) -> Result<Vec<Provider>> {
        let mut providers = self.read()?.providers.clone();
        providers.sort_by(|a, b| a.short_name.cmp(&b.short_name));
        Ok(providers)
    }

    async fn associate(&self, version_id: Uuid, provider_id: Uuid) -> Result<VersionProvider> {
        let mut t = self.write()?;
        if !t.versions.iter().any(|v| v.id == version_id)
            || !t.providers.iter().any(|p| p.id == provider_id)
        {
            return Err(AppError::Validation(
                "version/provider association refers to a missing parent".into(),
            ));
        }
        if t
            .version_providers
            .iter()
            .any(|vp| vp.version_id == version_id && vp.provider_id == provider_id)
        {
            return Err(AppError::Conflict(
                "version/provider association already exists".into(),
            ));
        }
        let link = VersionProvider {
            version_id,
            provider_id,
            created_at: Utc::now(),
        };
        t.version_providers.push(link.clone());
        Ok(link)
    }

    async fn find_association(
        &self,
        version_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<VersionProvider>> {
        Ok(self
            .read()?
            .version_providers
            .iter()
            .find(|vp| vp.version_id == version_id && vp.provider_id == provider_id)
            .cloned())
    }

    async fn list_version_providers(&self, version_id: Uuid) -> Result<Vec<Provider>> {
        let t = self.read()?;
        let mut providers: Vec<Provider> = t
            .version_providers
            .iter()
            .filter(|vp| vp.version_id == version_id)
            .filter_map(|vp| t.providers.iter().find(|p| p.id == vp.provider_id))
            .cloned()
            .collect();
        providers.sort_by(|a, b| a.short_name.cmp(&b.short_name));
        Ok(providers)
    }
}
