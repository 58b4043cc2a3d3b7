//! PostgreSQL entity store.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CatalogStore, NewBox, NewProvider, NewUser, NewVersion};
use crate::error::{AppError, Result};
use crate::models::{BoxVersion, Provider, User, VagrantBox, VersionProvider};

/// Entity store backed by the `users`, `boxes`, `versions`, `providers` and
/// `version_providers` tables.
#[derive(Clone)]
pub struct PgCatalogStore {
    db: PgPool,
}

impl PgCatalogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn read_error(e: sqlx::Error) -> AppError {
    AppError::StoreUnavailable(e.to_string())
}

/// Map a failed insert, translating constraint violations into caller errors.
fn write_error(e: sqlx::Error, what: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::Conflict(format!("{} already exists", what));
        }
        if db_err.is_foreign_key_violation() {
            return AppError::Validation(format!("{} refers to a missing parent", what));
        }
        if db_err.is_check_violation() {
            return AppError::Validation(format!("{} has an invalid field", what));
        }
    }
    AppError::StoreUnavailable(e.to_string())
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.db)
            .await
            .map_err(read_error)?;
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.email)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, &format!("user '{}'", new.name)))
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT id, name, email, created_at FROM users WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.db)
            .await
            .map_err(read_error)
    }

    async fn create_box(&self, new: NewBox) -> Result<VagrantBox> {
        sqlx::query_as::<_, VagrantBox>(
            r#"
            INSERT INTO boxes (id, owner_id, name, description, short_description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, name, description, short_description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.owner_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.short_description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, &format!("box '{}'", new.name)))
    }

    async fn find_box(&self, owner_id: Uuid, name: &str) -> Result<Option<VagrantBox>> {
        sqlx::query_as::<_, VagrantBox>(
            r#"
            SELECT id, owner_id, name, description, short_description, created_at
            FROM boxes
            WHERE owner_id = $1 AND name = $2
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&self.db)
        .await
        .map_err(read_error)
    }

    async fn list_boxes_by_owner(&self, owner_id: Uuid) -> Result<Vec<VagrantBox>> {
        sqlx::query_as::<_, VagrantBox>(
            r#"
            SELECT id, owner_id, name, description, short_description, created_at
            FROM boxes
            WHERE owner_id = $1
            ORDER BY name
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .map_err(read_error)
    }

    async fn create_version(&self, new: NewVersion) -> Result<BoxVersion> {
        sqlx::query_as::<_, BoxVersion>(
            r#"
            INSERT INTO versions (id, box_id, version, status, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, box_id, version, status, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.box_id)
        .bind(&new.version)
        .bind(new.status)
        .bind(&new.description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, &format!("version '{}'", new.version)))
    }

    async fn find_version(&self, box_id: Uuid, version: &str) -> Result<Option<BoxVersion>> {
        sqlx::query_as::<_, BoxVersion>(
            r#"
            SELECT id, box_id, version, status, description, created_at
            FROM versions
            WHERE box_id = $1 AND version = $2
            "#,
        )
        .bind(box_id)
        .bind(version)
        .fetch_optional(&self.db)
        .await
        .map_err(read_error)
    }

    async fn list_versions(&self, box_id: Uuid) -> Result<Vec<BoxVersion>> {
        sqlx::query_as::<_, BoxVersion>(
            r#"
            SELECT id, box_id, version, status, description, created_at
            FROM versions
            WHERE box_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(box_id)
        .fetch_all(&self.db)
        .await
        .map_err(read_error)
    }

    async fn create_provider(&self, new: NewProvider) -> Result<Provider> {
        sqlx::query_as::<_, Provider>(
            r#"
            INSERT INTO providers (id, name, short_name)
            VALUES ($1, $2, $3)
            RETURNING id, name, short_name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.short_name)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, &format!("provider '{}'", new.short_name)))
    }

    async fn find_provider_by_short_name(&self, short_name: &str) -> Result<Option<Provider>> {
        sqlx::query_as::<_, Provider>(
            "SELECT id, name, short_name, created_at FROM providers WHERE short_name = $1",
        )
        .bind(short_name)
        .fetch_optional(&self.db)
        .await
        .map_err(read_error)
    }

    async fn list_providers(&self) -> Result<Vec<Provider>> {
        sqlx::query_as::<_, Provider>(
            "SELECT id, name, short_name, created_at FROM providers ORDER BY short_name",
        )
        .fetch_all(&self.db)
        .await
        .map_err(read_error)
    }

    async fn associate(&self, version_id: Uuid, provider_id: Uuid) -> Result<VersionProvider> {
        sqlx::query_as::<_, VersionProvider>(
            r#"
            INSERT INTO version_providers (version_id, provider_id)
            VALUES ($1, $2)
            RETURNING version_id, provider_id, created_at
            "#,
        )
        .bind(version_id)
        .bind(provider_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, "version/provider association"))
    }

    async fn find_association(
        &self,
        version_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<VersionProvider>> {
        sqlx::query_as::<_, VersionProvider>(
            r#"
            SELECT version_id, provider_id, created_at
            FROM version_providers
            WHERE version_id = $1 AND provider_id = $2
            "#,
        )
        .bind(version_id)
        .bind(provider_id)
        .fetch_optional(&self.db)
        .await
        .map_err(read_error)
    }

    async fn list_version_providers(&self, version_id: Uuid) -> Result<Vec<Provider>> {
        sqlx::query_as::<_, Provider>(
            r#"
            SELECT p.id, p.name, p.short_name, p.created_at
            FROM providers p
            JOIN version_providers vp ON vp.provider_id = p.id
            WHERE vp.version_id = $1
            ORDER BY p.short_name
            "#,
        )
        .bind(version_id)
        .fetch_all(&self.db)
        .await
        .map_err(read_error)
    }
}
