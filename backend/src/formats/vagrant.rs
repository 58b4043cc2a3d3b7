//! Vagrant catalog path grammar.
//!
//! ```text
//! {owner}
//! {owner}/{box}            {owner}/{box}.json
//! {owner}/{box}/version
//! {owner}/{box}/version/{version}
//! {owner}/{box}/version/{version}/provider
//! {owner}/{box}/version/{version}/provider/{provider}
//! {owner}/{box}/version/{version}/provider/{provider}.box
//! ```
//!
//! Box and provider segments are disambiguated by their suffix: `.json` on
//! the final box segment forces a JSON document, `.box` on the provider
//! segment selects the artifact download instead of provider metadata.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

use crate::error::{AppError, Result};

const VERSION_KEYWORD: &str = "version";
const PROVIDER_KEYWORD: &str = "provider";
pub const JSON_SUFFIX: &str = ".json";
const BOX_SUFFIX: &str = ".box";

/// A box segment, tagged by which alternative of the grammar matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxSegment {
    /// `ubuntu`
    Bare(String),
    /// `ubuntu.json`, carrying the name without the suffix
    Json(String),
}

/// A provider segment, tagged by whether the artifact suffix was present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSegment {
    /// `vmware`: provider metadata
    Bare(String),
    /// `vmware.box`: artifact download, carrying the short name
    Artifact(String),
}

/// What a catalog path asks for below its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogTarget {
    /// All box names of the owner
    Owner,
    /// Catalog document of one box
    Box { name: String, json_forced: bool },
    /// Version entries of one box
    Versions { box_name: String },
    /// One version with its providers
    Version { box_name: String, version: String },
    /// Providers published for one version
    Providers { box_name: String, version: String },
    /// Metadata of one provider of a version
    Provider {
        box_name: String,
        version: String,
        provider: String,
    },
    /// The box file for one provider of a version
    Artifact {
        box_name: String,
        version: String,
        provider: String,
    },
}

/// A parsed catalog path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    pub owner: String,
    pub target: CatalogTarget,
}

impl PathQuery {
    pub fn box_name(&self) -> Option<&str> {
        match &self.target {
            CatalogTarget::Owner => None,
            CatalogTarget::Box { name, .. } => Some(name),
            CatalogTarget::Versions { box_name }
            | CatalogTarget::Version { box_name, .. }
            | CatalogTarget::Providers { box_name, .. }
            | CatalogTarget::Provider { box_name, .. }
            | CatalogTarget::Artifact { box_name, .. } => Some(box_name),
        }
    }

    pub fn version(&self) -> Option<&str> {
        match &self.target {
            CatalogTarget::Version { version, .. }
            | CatalogTarget::Providers { version, .. }
            | CatalogTarget::Provider { version, .. }
            | CatalogTarget::Artifact { version, .. } => Some(version),
            _ => None,
        }
    }

    pub fn provider_short_name(&self) -> Option<&str> {
        match &self.target {
            CatalogTarget::Provider { provider, .. } | CatalogTarget::Artifact { provider, .. } => {
                Some(provider)
            }
            _ => None,
        }
    }

    /// True when the path used the `.json` box suffix
    pub fn json_forced(&self) -> bool {
        matches!(
            self.target,
            CatalogTarget::Box {
                json_forced: true,
                ..
            }
        )
    }

    /// True when the path names a `.box` file rather than metadata
    pub fn is_artifact(&self) -> bool {
        matches!(self.target, CatalogTarget::Artifact { .. })
    }
}

fn is_owner_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'
}

/// Validate an owner segment: `^[a-z0-9_-]+$`, strictly lowercase.
pub fn parse_owner(segment: &str) -> Result<String> {
    if segment.is_empty() || !segment.chars().all(is_owner_char) {
        return Err(AppError::InvalidPath(format!(
            "'{}' is not a valid user name",
            segment
        )));
    }
    Ok(segment.to_string())
}

/// Match a box segment against the bare and `.json` alternatives, in that order.
///
/// Letters of either case are accepted and the captured name is lowercased.
pub fn parse_box_segment(segment: &str) -> Result<BoxSegment> {
    if segment.is_empty() || !segment.chars().all(is_name_char) {
        return Err(AppError::InvalidPath(format!(
            "'{}' is not a valid box name",
            segment
        )));
    }
    let name = segment.to_ascii_lowercase();
    match name.strip_suffix(JSON_SUFFIX) {
        None => Ok(BoxSegment::Bare(name)),
        Some(stem) if !stem.is_empty() => Ok(BoxSegment::Json(stem.to_string())),
        Some(_) => Err(AppError::InvalidPath(format!(
            "'{}' is not a valid box name",
            segment
        ))),
    }
}

/// Match a provider segment; only the `.box` form selects an artifact.
pub fn parse_provider_segment(segment: &str) -> Result<ProviderSegment> {
    if segment.is_empty() || !segment.chars().all(is_name_char) {
        return Err(AppError::InvalidPath(format!(
            "'{}' is not a valid provider name",
            segment
        )));
    }
    let name = segment.to_ascii_lowercase();
    match name.strip_suffix(BOX_SUFFIX) {
        Some(stem) if !stem.is_empty() => Ok(ProviderSegment::Artifact(stem.to_string())),
        Some(_) => Err(AppError::InvalidPath(format!(
            "'{}' is not a valid provider name",
            segment
        ))),
        None => Ok(ProviderSegment::Bare(name)),
    }
}

fn expect_keyword(segment: &str, keyword: &str) -> Result<()> {
    if segment == keyword {
        Ok(())
    } else {
        Err(AppError::InvalidPath(format!(
            "expected '{}' but found '{}'",
            keyword, segment
        )))
    }
}

/// Box segments below the box level must be bare names.
fn bare_box_name(segment: &str) -> Result<String> {
    match parse_box_segment(segment)? {
        BoxSegment::Bare(name) => Ok(name),
        BoxSegment::Json(_) => Err(AppError::InvalidPath(format!(
            "'{}' may only be used as the last path segment",
            segment
        ))),
    }
}

/// Parse a raw request path such as `/alice/ubuntu/version/1.0`.
///
/// `path` is still percent-encoded. It is split on literal `/` first and each
/// segment is decoded afterwards, so an encoded `%2F` never separates
/// segments. Leading and trailing slashes are ignored; empty interior
/// segments are not.
pub fn parse_path(path: &str) -> Result<PathQuery> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(AppError::InvalidPath("path must name a user".to_string()));
    }
    let decoded = trimmed
        .split('/')
        .map(decode_segment)
        .collect::<Result<Vec<_>>>()?;
    let segments: Vec<&str> = decoded.iter().map(|s| s.as_ref()).collect();
    parse_segments(&segments)
}

fn decode_segment(raw: &str) -> Result<Cow<'_, str>> {
    percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| AppError::InvalidPath(format!("segment '{}' is not valid UTF-8", raw)))
}

/// Parse an ordered segment sequence into a [`PathQuery`].
pub fn parse_segments(segments: &[&str]) -> Result<PathQuery> {
    if segments.iter().any(|s| s.is_empty()) {
        return Err(AppError::InvalidPath("empty path segment".to_string()));
    }

    let owner = match segments.first() {
        Some(seg) => parse_owner(seg)?,
        None => return Err(AppError::InvalidPath("path must name a user".to_string())),
    };

    let target = match segments {
        [_] => CatalogTarget::Owner,
        [_, box_seg] => match parse_box_segment(box_seg)? {
            BoxSegment::Bare(name) => CatalogTarget::Box {
                name,
                json_forced: false,
            },
            BoxSegment::Json(name) => CatalogTarget::Box {
                name,
                json_forced: true,
            },
        },
        [_, box_seg, kw] => {
            let box_name = bare_box_name(box_seg)?;
            expect_keyword(kw, VERSION_KEYWORD)?;
            CatalogTarget::Versions { box_name }
        }
        [_, box_seg, kw, version] => {
            let box_name = bare_box_name(box_seg)?;
            expect_keyword(kw, VERSION_KEYWORD)?;
            CatalogTarget::Version {
                box_name,
                version: version.to_string(),
            }
        }
        [_, box_seg, kw, version, pkw] => {
            let box_name = bare_box_name(box_seg)?;
            expect_keyword(kw, VERSION_KEYWORD)?;
            expect_keyword(pkw, PROVIDER_KEYWORD)?;
            CatalogTarget::Providers {
                box_name,
                version: version.to_string(),
            }
        }
        [_, box_seg, kw, version, pkw, provider_seg] => {
            let box_name = bare_box_name(box_seg)?;
            expect_keyword(kw, VERSION_KEYWORD)?;
            expect_keyword(pkw, PROVIDER_KEYWORD)?;
            let version = version.to_string();
            match parse_provider_segment(provider_seg)? {
                ProviderSegment::Artifact(provider) => CatalogTarget::Artifact {
                    box_name,
                    version,
                    provider,
                },
                ProviderSegment::Bare(provider) => CatalogTarget::Provider {
                    box_name,
                    version,
                    provider,
                },
            }
        }
        _ => {
            return Err(AppError::InvalidPath(format!(
                "too many path segments ({})",
                segments.len()
            )))
        }
    };

    Ok(PathQuery { owner, target })
}
