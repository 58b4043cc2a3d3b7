//! Catalog documents and their canonical JSON rendering.
//!
//! Installers parse these documents by key, so field names and order are
//! part of the wire contract. Struct field order below is the output order.

use bytes::Bytes;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{BoxVersion, Provider, User, VagrantBox, VersionStatus};

/// One entry of a box's version listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionEntry {
    pub version: String,
    pub status: VersionStatus,
}

impl From<&BoxVersion> for VersionEntry {
    fn from(v: &BoxVersion) -> Self {
        Self {
            version: v.version.clone(),
            status: v.status,
        }
    }
}

/// Box metadata with its shallow version listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogDocument {
    pub description: String,
    pub short_description: String,
    /// `owner/box`
    pub name: String,
    pub versions: Vec<VersionEntry>,
}

impl CatalogDocument {
    /// Assemble a fresh document for one box.
    pub fn new(owner: &User, vbox: &VagrantBox, versions: &[BoxVersion]) -> Self {
        Self {
            description: vbox.description.clone(),
            short_description: vbox.short_description.clone(),
            name: qualified_name(&owner.name, &vbox.name),
            versions: versions.iter().map(VersionEntry::from).collect(),
        }
    }

    fn validate(&self) -> Result<()> {
        let well_formed = matches!(
            self.name.split_once('/'),
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/')
        );
        if !well_formed {
            return Err(AppError::InvariantViolation(format!(
                "catalog document name '{}' is not owner/box",
                self.name
            )));
        }
        if self.versions.iter().any(|v| v.version.is_empty()) {
            return Err(AppError::InvariantViolation(format!(
                "catalog document '{}' lists an empty version",
                self.name
            )));
        }
        Ok(())
    }
}

/// A provider a version is published for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderEntry {
    pub name: String,
    pub url: String,
}

impl ProviderEntry {
    pub fn new(
        public_url: &str,
        owner: &str,
        box_name: &str,
        version: &str,
        provider: &Provider,
    ) -> Self {
        Self {
            name: provider.short_name.clone(),
            url: format!(
                "{}/{}",
                public_url.trim_end_matches('/'),
                artifact_url_path(owner, box_name, version, &provider.short_name)
            ),
        }
    }
}

/// One version with the providers it can be downloaded for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDocument {
    pub version: String,
    pub status: VersionStatus,
    pub description_html: Option<String>,
    pub description_markdown: String,
    pub providers: Vec<ProviderEntry>,
}

impl VersionDocument {
    pub fn new(version: &BoxVersion, providers: Vec<ProviderEntry>) -> Self {
        Self {
            version: version.version.clone(),
            status: version.status,
            description_html: None,
            description_markdown: version.description.clone(),
            providers,
        }
    }
}

pub fn qualified_name(owner: &str, box_name: &str) -> String {
    format!("{}/{}", owner, box_name)
}

/// URL path (without host) under which a box file is served.
pub fn artifact_url_path(owner: &str, box_name: &str, version: &str, provider: &str) -> String {
    format!(
        "{}/{}/version/{}/provider/{}.box",
        owner, box_name, version, provider
    )
}

/// Render the canonical catalog document.
pub fn render(doc: &CatalogDocument) -> Result<Bytes> {
    doc.validate()?;
    render_json(doc)
}

/// Render any catalog response body as JSON.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| AppError::InvariantViolation(format!("failed to serialize document: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample() -> CatalogDocument {
        CatalogDocument {
            description: "Ubuntu 14.04.1 LTS".into(),
            short_description: "Ubuntu".into(),
            name: "sparticvs/ubuntu-14.04.1".into(),
            versions: vec![VersionEntry {
                version: "1.0".into(),
                status: VersionStatus::Active,
            }],
        }
    }

    #[test]
    fn test_render_field_order_and_names() {
        let bytes = render(&sample()).unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"description":"Ubuntu 14.04.1 LTS","short_description":"Ubuntu","name":"sparticvs/ubuntu-14.04.1","versions":[{"version":"1.0","status":"active"}]}"#
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let doc = sample();
        assert_eq!(render(&doc).unwrap(), render(&doc).unwrap());
    }

    #[test]
    fn test_render_rejects_malformed_name() {
        for name in ["ubuntu", "/ubuntu", "sparticvs/", "a/b/c"] {
            let mut doc = sample();
            doc.name = name.into();
            assert!(
                matches!(render(&doc), Err(AppError::InvariantViolation(_))),
                "name {:?}",
                name
            );
        }
    }

    #[test]
    fn test_render_rejects_empty_version() {
        let mut doc = sample();
        doc.versions.push(VersionEntry {
            version: String::new(),
            status: VersionStatus::Inactive,
        });
        assert!(matches!(render(&doc), Err(AppError::InvariantViolation(_))));
    }

    #[test]
    fn test_provider_entry_url() {
        let provider = Provider {
            id: Uuid::new_v4(),
            name: "VMware".into(),
            short_name: "vmware".into(),
            created_at: Utc::now(),
        };
        let entry = ProviderEntry::new(
            "https://boxes.example.com/",
            "sparticvs",
            "ubuntu-14.04.1",
            "1.0",
            &provider,
        );
        assert_eq!(entry.name, "vmware");
        assert_eq!(
            entry.url,
            "https://boxes.example.com/sparticvs/ubuntu-14.04.1/version/1.0/provider/vmware.box"
        );
    }

    #[test]
    fn test_version_document_shape() {
        let version = BoxVersion {
            id: Uuid::new_v4(),
            box_id: Uuid::new_v4(),
            version: "1.0".into(),
            status: VersionStatus::Active,
            description: "First build".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(VersionDocument::new(&version, vec![])).unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["status"], "active");
        assert!(json["description_html"].is_null());
        assert_eq!(json["description_markdown"], "First build");
        assert_eq!(json["providers"], serde_json::json!([]));
    }
}
