//! Execution of admin CLI commands against the catalog database.

use std::sync::Arc;

use bytes::Bytes;

use crate::cli::admin::{output, AdminCli, AdminCommand};
use crate::db;
use crate::error::{AppError, Result};
use crate::formats::catalog_document::qualified_name;
use crate::services::admin_service::{AdminService, AttachRequest};
use crate::storage::filesystem::FilesystemStorage;
use crate::store::PgCatalogStore;

/// Run one admin command
pub async fn run(cli: AdminCli) -> Result<()> {
    let database_url = cli
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL not set".into()))?;
    let pool = db::create_pool(database_url, 2).await?;

    if let AdminCommand::Migrate = cli.command {
        db::run_migrations(&pool).await?;
        output(&cli.format, "Database migrations complete", None);
        return Ok(());
    }

    let admin = AdminService::new(
        Arc::new(PgCatalogStore::new(pool)),
        Arc::new(FilesystemStorage::new(&cli.storage_path)),
    );
    execute(&admin, &cli.format, cli.command).await
}

pub async fn execute(admin: &AdminService, format: &str, command: AdminCommand) -> Result<()> {
    match command {
        AdminCommand::Migrate => Err(AppError::Internal(
            "migrate must be run through run()".into(),
        )),
        AdminCommand::User { name, email } => {
            let user = admin.create_user(&name, &email).await?;
            output(
                format,
                &format!("Created user {} ({})", user.name, user.id),
                Some(serde_json::to_value(&user)?),
            );
            Ok(())
        }
        AdminCommand::CreateBox {
            owner,
            name,
            description,
            short_description,
        } => {
            let vbox = admin
                .create_box(&owner, &name, &description, &short_description)
                .await?;
            output(
                format,
                &format!("Created box {} ({})", qualified_name(&owner, &vbox.name), vbox.id),
                Some(serde_json::to_value(&vbox)?),
            );
            Ok(())
        }
        AdminCommand::Version {
            owner,
            box_name,
            version,
            status,
            description,
        } => {
            let created = admin
                .create_version(&owner, &box_name, &version, status, &description)
                .await?;
            output(
                format,
                &format!(
                    "Created version {} of {} ({})",
                    created.version,
                    qualified_name(&owner, &box_name),
                    created.status
                ),
                Some(serde_json::to_value(&created)?),
            );
            Ok(())
        }
        AdminCommand::Provider { name, short_name } => {
            let provider = admin.create_provider(&name, &short_name).await?;
            output(
                format,
                &format!("Created provider {} ({})", provider.short_name, provider.name),
                Some(serde_json::to_value(&provider)?),
            );
            Ok(())
        }
        AdminCommand::Providers => {
            let providers = admin.list_providers().await?;
            let lines: Vec<String> = providers
                .iter()
                .map(|p| format!("{}\t{}", p.short_name, p.name))
                .collect();
            output(
                format,
                &lines.join("\n"),
                Some(serde_json::to_value(&providers)?),
            );
            Ok(())
        }
        AdminCommand::Attach {
            owner,
            box_name,
            version,
            provider,
            file,
        } => {
            let content = match file {
                Some(path) => Some(Bytes::from(tokio::fs::read(&path).await?)),
                None => None,
            };
            let message = format!(
                "Published {} version {} for {}",
                qualified_name(&owner, &box_name),
                version,
                provider
            );
            let link = admin
                .attach(AttachRequest {
                    owner,
                    box_name,
                    version,
                    provider,
                    content,
                })
                .await?;
            output(format, &message, Some(serde_json::to_value(&link)?));
            Ok(())
        }
    }
}
