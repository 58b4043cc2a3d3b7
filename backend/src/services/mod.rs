//! Business logic services.

pub mod admin_service;
pub mod catalog_service;
pub mod metrics_service;
