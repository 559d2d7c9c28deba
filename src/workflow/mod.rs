//! Document lifecycle and chat turn coordination
//!
//! Upload registers the document first, then indexes; an index failure
//! rolls the registration back so the registry never lists a document
//! with no vectors. Delete goes the other way: vectors first, and the
//! registry row is only removed once the vector delete succeeded, so a
//! failure leaves the document visible rather than silently orphaning
//! its chunks.

use crate::error::{Error, Result};
use crate::ingest::{delete_document_chunks, index_document};
use crate::logstore::LogStore;
use crate::resources::{ChainKey, EmbedderKey, Resources};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A private working copy of an uploaded file
///
/// The copy is removed when the guard drops, on every exit path of the
/// upload flow, success or failure.
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    /// Copy the source file into the staging directory under a unique name
    pub fn stage(staging_dir: &Path, source: &Path) -> Result<Self> {
        let filename = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Config(format!("Invalid upload path: {:?}", source)))?;

        std::fs::create_dir_all(staging_dir)?;
        let path = staging_dir.join(format!("{}-{}", Uuid::new_v4(), filename));
        std::fs::copy(source, &path)?;

        debug!("Staged {:?} at {:?}", source, path);
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove staged file {:?}: {}", self.path, e);
            }
        }
    }
}

/// Terminal outcome of an upload
#[derive(Debug)]
pub enum UploadReport {
    /// Registered and fully indexed
    Indexed {
        id: i64,
        filename: String,
        chunks: usize,
    },
    /// Indexing failed; the registration was rolled back
    IndexFailedRolledBack {
        filename: String,
        index_error: String,
    },
    /// Indexing failed and the rollback failed too; the registry still
    /// lists a document with no vectors
    IndexFailedRollbackFailed {
        id: i64,
        filename: String,
        index_error: String,
        rollback_error: String,
    },
}

impl UploadReport {
    pub fn succeeded(&self) -> bool {
        matches!(self, UploadReport::Indexed { .. })
    }
}

impl fmt::Display for UploadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadReport::Indexed {
                id,
                filename,
                chunks,
            } => write!(
                f,
                "File '{}' uploaded and indexed successfully (id {}, {} chunks)",
                filename, id, chunks
            ),
            UploadReport::IndexFailedRolledBack {
                filename,
                index_error,
            } => write!(
                f,
                "File '{}' could not be indexed; its registration was removed. Cause: {}",
                filename, index_error
            ),
            UploadReport::IndexFailedRollbackFailed {
                id,
                filename,
                index_error,
                rollback_error,
            } => write!(
                f,
                "File '{}' could not be indexed ({}) and removing its registration \
                 failed too ({}); document {} remains registered without an index",
                filename, index_error, rollback_error, id
            ),
        }
    }
}

/// Terminal outcome of a delete
#[derive(Debug)]
pub enum DeleteReport {
    /// Vectors and registry row both removed
    Deleted { id: i64 },
    /// Vector delete failed; the registry row was kept so the document
    /// stays visible for a retry
    VectorDeleteFailed { id: i64, error: String },
    /// Vectors are gone but the registry row could not be removed
    RegistryDeleteFailed { id: i64, error: String },
}

impl DeleteReport {
    pub fn succeeded(&self) -> bool {
        matches!(self, DeleteReport::Deleted { .. })
    }
}

impl fmt::Display for DeleteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteReport::Deleted { id } => {
                write!(f, "Deleted document {} from the index and the registry", id)
            }
            DeleteReport::VectorDeleteFailed { id, error } => write!(
                f,
                "Failed to delete document {} from the vector index; it remains registered: {}",
                id, error
            ),
            DeleteReport::RegistryDeleteFailed { id, error } => write!(
                f,
                "Document {} was removed from the vector index but its registry \
                 entry could not be deleted: {}",
                id, error
            ),
        }
    }
}

/// Upload and index one document
///
/// Registration failures (duplicate filename, database errors) abort
/// before any staging or indexing and surface as `Err`. Once the
/// document is registered, every later failure resolves to a report
/// variant instead of an error.
pub async fn upload_document(
    logs: &LogStore,
    resources: &Resources,
    key: &EmbedderKey,
    source: &Path,
) -> Result<UploadReport> {
    let filename = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Config(format!("Invalid upload path: {:?}", source)))?
        .to_string();

    let id = logs.register_document(&filename).await?;
    debug!("Registered '{}' as document {}", filename, id);

    let index_result = match StagedFile::stage(&resources.config().paths.staging_dir, source) {
        Ok(staged) => index_document(resources, key, staged.path(), id).await,
        Err(e) => Err(e),
    };

    match index_result {
        Ok(chunks) => Ok(UploadReport::Indexed {
            id,
            filename,
            chunks,
        }),
        Err(index_error) => {
            warn!(
                "Indexing '{}' (document {}) failed, rolling back registration: {}",
                filename, id, index_error
            );
            match logs.unregister_document(id).await {
                Ok(()) => Ok(UploadReport::IndexFailedRolledBack {
                    filename,
                    index_error: index_error.to_string(),
                }),
                Err(rollback_error) => Ok(UploadReport::IndexFailedRollbackFailed {
                    id,
                    filename,
                    index_error: index_error.to_string(),
                    rollback_error: rollback_error.to_string(),
                }),
            }
        }
    }
}

/// Delete one document from the index and the registry
pub async fn remove_document(
    logs: &LogStore,
    resources: &Resources,
    key: &EmbedderKey,
    id: i64,
) -> DeleteReport {
    if let Err(e) = delete_document_chunks(resources, key, id).await {
        return DeleteReport::VectorDeleteFailed {
            id,
            error: e.to_string(),
        };
    }

    match logs.unregister_document(id).await {
        Ok(()) => {
            info!("Deleted document {}", id);
            DeleteReport::Deleted { id }
        }
        Err(e) => DeleteReport::RegistryDeleteFailed {
            id,
            error: e.to_string(),
        },
    }
}

/// Run one chat turn for a session
///
/// The turn is logged after a successful answer; a logging failure is
/// recorded but never turns a good answer into an error.
pub async fn chat_turn(
    logs: &LogStore,
    resources: &Resources,
    key: &ChainKey,
    session_id: &str,
    question: &str,
) -> Result<String> {
    let chain = resources.chain(key).await?;
    let history = logs.get_history(session_id).await?;

    let output = chain.ask(question, &history).await?;

    logs.append_chat_turn(session_id, question, &output.answer, chain.model_name())
        .await;

    Ok(output.answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    async fn test_store(tmp: &TempDir) -> LogStore {
        let store = LogStore::connect(&tmp.path().join("test.db")).await.unwrap();
        store.init_schema().await.unwrap();
        store
    }

    fn test_resources(tmp: &TempDir) -> Resources {
        let mut config = Config::with_base_dir(tmp.path().to_path_buf());
        config.embedding.dimensionality = Some(4);
        Resources::new(config)
    }

    fn test_key() -> EmbedderKey {
        EmbedderKey {
            api_key: "test-key".to_string(),
            model: "nomic-embed-text-v1.5".to_string(),
            dimensionality: Some(4),
        }
    }

    #[test]
    fn test_staged_file_removed_on_drop() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("report.pdf");
        std::fs::write(&source, b"data").unwrap();

        let staging = tmp.path().join("staging");
        let staged_path;
        {
            let staged = StagedFile::stage(&staging, &source).unwrap();
            staged_path = staged.path().to_path_buf();
            assert!(staged_path.exists());
            assert!(staged_path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .ends_with("report.pdf"));
        }
        assert!(!staged_path.exists());
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_upload_duplicate_name_aborts_before_indexing() {
        let tmp = TempDir::new().unwrap();
        let logs = test_store(&tmp).await;
        let resources = test_resources(&tmp);

        logs.register_document("report.pdf").await.unwrap();

        let source = tmp.path().join("report.pdf");
        std::fs::write(&source, b"data").unwrap();

        let err = upload_document(&logs, &resources, &test_key(), &source)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
        assert_eq!(logs.list_documents().await.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_rolls_back_registration_on_index_failure() {
        let tmp = TempDir::new().unwrap();
        let logs = test_store(&tmp).await;
        let resources = test_resources(&tmp);

        // A corrupt docx fails at parse time, before any network call
        let source = tmp.path().join("broken.docx");
        std::fs::write(&source, b"not a zip archive").unwrap();

        let report = upload_document(&logs, &resources, &test_key(), &source)
            .await
            .unwrap();

        match report {
            UploadReport::IndexFailedRolledBack {
                filename,
                index_error,
            } => {
                assert_eq!(filename, "broken.docx");
                assert!(!index_error.is_empty());
            }
            other => panic!("expected rollback report, got {other:?}"),
        }
        assert!(logs.list_documents().await.is_empty());

        // Staging directory holds no leftover copy
        let staging = &resources.config().paths.staging_dir;
        let leftover = std::fs::read_dir(staging)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_upload_rejects_pathless_source() {
        let tmp = TempDir::new().unwrap();
        let logs = test_store(&tmp).await;
        let resources = test_resources(&tmp);

        let err = upload_document(&logs, &resources, &test_key(), Path::new("/"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(logs.list_documents().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_keeps_registry_row_when_vector_delete_fails() {
        let tmp = TempDir::new().unwrap();
        let logs = test_store(&tmp).await;

        let mut config = Config::with_base_dir(tmp.path().to_path_buf());
        config.embedding.dimensionality = Some(4);
        // Nothing listens on port 1, so the vector delete always fails
        config.qdrant_url = "http://127.0.0.1:1".to_string();
        let resources = Resources::new(config);

        let id = logs.register_document("report.pdf").await.unwrap();
        let report = remove_document(&logs, &resources, &test_key(), id).await;

        match report {
            DeleteReport::VectorDeleteFailed { id: failed, error } => {
                assert_eq!(failed, id);
                assert!(!error.is_empty());
            }
            other => panic!("expected vector delete failure, got {other:?}"),
        }

        // The document stays visible for a retry
        assert!(logs.get_document(id).await.unwrap().is_some());
        assert_eq!(logs.list_documents().await.len(), 1);
    }

    #[tokio::test]
    async fn test_chat_turn_chain_failure_logs_no_turn() {
        let tmp = TempDir::new().unwrap();
        let logs = test_store(&tmp).await;
        let resources = test_resources(&tmp);

        // An empty chat key fails chain construction before any request
        let key = ChainKey {
            embedder: test_key(),
            api_key: String::new(),
            model: "llama-3.1-8b-instant".to_string(),
        };

        let err = chat_turn(&logs, &resources, &key, "s1", "What is X?")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ChainInit(_)));
        assert!(logs.get_history("s1").await.unwrap().is_empty());
    }

    #[test]
    fn test_report_messages() {
        let report = UploadReport::Indexed {
            id: 3,
            filename: "a.pdf".to_string(),
            chunks: 12,
        };
        assert!(report.succeeded());
        assert!(report.to_string().contains("12 chunks"));

        let report = DeleteReport::VectorDeleteFailed {
            id: 3,
            error: "connection refused".to_string(),
        };
        assert!(!report.succeeded());
        assert!(report.to_string().contains("remains registered"));
    }
}
