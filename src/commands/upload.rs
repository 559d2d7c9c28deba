//! Upload command implementation

use crate::error::Result;
use crate::logstore::LogStore;
use crate::resources::{EmbedderKey, Resources};
use crate::workflow::{self, UploadReport};
use std::path::Path;
use tracing::info;

/// Upload and index a document
pub async fn cmd_upload(
    logs: &LogStore,
    resources: &Resources,
    path: &Path,
) -> Result<UploadReport> {
    info!("Uploading {:?}", path);

    let key = EmbedderKey::from_config(resources.config())?;
    workflow::upload_document(logs, resources, &key, path).await
}

/// Print upload outcome to console
pub fn print_upload_report(report: &UploadReport) {
    if report.succeeded() {
        println!("✓ {}", report);
    } else {
        println!("✗ {}", report);
    }
}
