//! Command-line interface for catalog administration.
//!
//! The HTTP server only reads the catalog; users, boxes, versions and
//! providers are created here.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::VersionStatus;

/// Manage the Alley box catalog
#[derive(Parser, Debug)]
#[command(name = "alley-admin")]
#[command(about = "Manage users, boxes, versions and providers of an Alley catalog", long_about = None)]
pub struct AdminCli {
    #[command(subcommand)]
    pub command: AdminCommand,

    /// Database URL (can also be set via DATABASE_URL env var)
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Root directory of stored box files (can also be set via STORAGE_PATH env var)
    #[arg(long, env = "STORAGE_PATH", default_value = "./boxes", global = true)]
    pub storage_path: PathBuf,

    /// Output format (json, text)
    #[arg(long, default_value = "text", global = true)]
    pub format: String,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Apply pending database migrations
    Migrate,

    /// Create a user
    User {
        name: String,
        #[arg(long)]
        email: String,
    },

    /// Create a box under an existing user
    #[command(name = "box")]
    CreateBox {
        owner: String,
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        short_description: String,
    },

    /// Create a version of an existing box
    Version {
        owner: String,
        #[arg(value_name = "BOX")]
        box_name: String,
        version: String,
        /// Publication status (active, inactive)
        #[arg(long, default_value = "active")]
        status: VersionStatus,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Register a provider
    Provider {
        /// Display name, e.g. "VMware"
        name: String,
        /// Lowercase key used in URLs and file names, e.g. "vmware"
        short_name: String,
    },

    /// List registered providers
    Providers,

    /// Publish a version for a provider, optionally uploading its box file
    Attach {
        owner: String,
        #[arg(value_name = "BOX")]
        box_name: String,
        version: String,
        provider: String,
        /// Box file to copy into storage
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

/// Print a result, as JSON when requested
pub fn output(format: &str, message: &str, json_value: Option<serde_json::Value>) {
    match (format, json_value) {
        ("json", Some(value)) => println!(
            "{}",
            serde_json::to_string_pretty(&value).unwrap_or_default()
        ),
        ("json", None) => println!("{}", serde_json::json!({ "message": message })),
        _ => println!("{}", message),
    }
}

/// Print error message
pub fn error(format: &str, message: &str) {
    match format {
        "json" => eprintln!("{}", serde_json::json!({ "error": message })),
        _ => eprintln!("Error: {}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_command() {
        let cli = AdminCli::try_parse_from([
            "alley-admin",
            "--database-url",
            "postgres://localhost/alley",
            "version",
            "sparticvs",
            "ubuntu-14.04.1",
            "1.0",
            "--status",
            "inactive",
        ])
        .unwrap();

        match cli.command {
            AdminCommand::Version {
                owner,
                box_name,
                version,
                status,
                ..
            } => {
                assert_eq!(owner, "sparticvs");
                assert_eq!(box_name, "ubuntu-14.04.1");
                assert_eq!(version, "1.0");
                assert_eq!(status, VersionStatus::Inactive);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_box_command() {
        let cli = AdminCli::try_parse_from([
            "alley-admin",
            "box",
            "sparticvs",
            "ubuntu-14.04.1",
            "--short-description",
            "Ubuntu",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            AdminCommand::CreateBox { ref short_description, .. } if short_description == "Ubuntu"
        ));
    }

    #[test]
    fn test_rejects_unknown_status() {
        let result = AdminCli::try_parse_from([
            "alley-admin",
            "version",
            "a",
            "b",
            "1.0",
            "--status",
            "retired",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_does_not_panic() {
        output("text", "done", None);
        output("json", "done", Some(serde_json::json!({ "ok": true })));
        error("json", "failed");
    }
}
