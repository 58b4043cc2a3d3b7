//! Catalog entity models (SQLx).

pub mod provider;
pub mod user;
pub mod vagrant_box;
pub mod version;

pub use provider::{Provider, VersionProvider};
pub use user::User;
pub use vagrant_box::VagrantBox;
pub use version::{BoxVersion, VersionStatus};
