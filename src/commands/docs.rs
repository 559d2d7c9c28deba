//! Document listing command implementation

use crate::logstore::{DocumentRecord, LogStore};
use tracing::info;

/// List registered documents, newest first
pub async fn cmd_list_documents(logs: &LogStore) -> Vec<DocumentRecord> {
    info!("Listing documents");
    logs.list_documents().await
}

/// Print the document list to console
pub fn print_documents(documents: &[DocumentRecord]) {
    println!("\n📄 Indexed Documents\n");

    if documents.is_empty() {
        println!("No documents indexed. Use 'ragchat upload' to add one.");
        return;
    }

    for doc in documents {
        println!("• {} (id {})", doc.filename, doc.id);
        println!("  Uploaded: {}", doc.uploaded_at);
    }
}
