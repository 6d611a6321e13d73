//! Shared state handed to every HTTP handler.

use crate::services::{local_store::LocalDiskStore, upload_service::UploadService};

#[derive(Clone)]
pub struct AppState {
    /// Orchestrator behind `PUT /assets/...`.
    pub uploads: UploadService,

    /// Disk store used to serve objects back and for readiness checks.
    pub objects: LocalDiskStore,
}
