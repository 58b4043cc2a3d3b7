//! Alley - Backend Library
//!
//! Self-hosted catalog server for Vagrant boxes.

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod formats;
pub mod models;
pub mod services;
pub mod storage;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
