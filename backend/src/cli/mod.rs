//! CLI modules for Alley.

pub mod admin;
pub mod admin_runner;

pub use admin::{AdminCli, AdminCommand};
pub use admin_runner::run as run_admin;
