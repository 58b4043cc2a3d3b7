//! Catalog fixtures for API tests

#![allow(dead_code)]

use bytes::Bytes;

use alley_backend::models::VersionStatus;
use alley_backend::services::admin_service::AttachRequest;

use super::TestApp;

pub const PUBLIC_URL: &str = "http://boxes.test";

pub const OWNER: &str = "sparticvs";
pub const BOX_NAME: &str = "ubuntu-14.04.1";
pub const BOX_CONTENT: &[u8] = b"vmware box image";

/// sparticvs/ubuntu-14.04.1 version 1.0, published for vmware with a stored
/// box file. qemu is registered but not associated, and a stray qemu.box
/// sits at its conventional path anyway.
pub async fn seed_sparticvs(app: &TestApp) {
    let admin = &app.admin;
    admin
        .create_user(OWNER, "sparticvs@example.com")
        .await
        .unwrap();
    admin
        .create_box(OWNER, BOX_NAME, "Ubuntu 14.04.1 LTS server", "Ubuntu 14.04.1")
        .await
        .unwrap();
    admin
        .create_version(OWNER, BOX_NAME, "1.0", VersionStatus::Active, "Initial release")
        .await
        .unwrap();
    admin.create_provider("VMware", "vmware").await.unwrap();
    admin.create_provider("QEMU", "qemu").await.unwrap();
    admin
        .attach(AttachRequest {
            owner: OWNER.into(),
            box_name: BOX_NAME.into(),
            version: "1.0".into(),
            provider: "vmware".into(),
            content: Some(Bytes::from_static(BOX_CONTENT)),
        })
        .await
        .unwrap();

    let stray = app.dir.path().join(OWNER).join(BOX_NAME).join("1.0");
    std::fs::create_dir_all(&stray).unwrap();
    std::fs::write(stray.join("qemu.box"), b"unpublished").unwrap();
}
