//! Remove command implementation

use crate::error::{Error, Result};
use crate::logstore::LogStore;
use crate::resources::{EmbedderKey, Resources};
use crate::workflow::{self, DeleteReport};
use tracing::info;

/// Delete a document from the index and the registry
pub async fn cmd_remove(
    logs: &LogStore,
    resources: &Resources,
    id: i64,
) -> Result<DeleteReport> {
    info!("Removing document {}", id);

    let record = logs.get_document(id).await?;
    if record.is_none() {
        return Err(Error::DocumentNotFound(id.to_string()));
    }

    let key = EmbedderKey::from_config(resources.config())?;
    Ok(workflow::remove_document(logs, resources, &key, id).await)
}

/// Print delete outcome to console
pub fn print_delete_report(report: &DeleteReport) {
    if report.succeeded() {
        println!("✓ {}", report);
    } else {
        println!("✗ {}", report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_remove_unknown_id_reports_not_found() {
        let tmp = TempDir::new().unwrap();
        let logs = LogStore::connect(&tmp.path().join("test.db")).await.unwrap();
        logs.init_schema().await.unwrap();
        let resources = Resources::new(Config::with_base_dir(tmp.path().to_path_buf()));

        // Rejected on the registry lookup, before any vector store call
        let err = cmd_remove(&logs, &resources, 42).await.unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound(ref id) if id == "42"));
        assert!(logs.list_documents().await.is_empty());
    }
}
