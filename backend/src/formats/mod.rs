//! Catalog path grammar and document formats.

pub mod catalog_document;
pub mod vagrant;
