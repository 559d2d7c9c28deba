//! Status command implementation

use crate::config::Config;
use crate::error::Result;
use crate::logstore::{LogStore, StoreStats};
use crate::store::VectorStore;
use serde::Serialize;
use tracing::info;

/// Status information
#[derive(Debug, Serialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub qdrant_url: String,
    pub collection_name: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub qdrant_connected: bool,
    pub collection_exists: bool,
    pub qdrant_points: u64,
    pub db_stats: StoreStats,
}

/// Get system status
pub async fn cmd_status(config: &Config, logs: &LogStore) -> Result<StatusInfo> {
    info!("Getting status");

    let db_stats = logs.stats().await?;

    // Collection info is best effort; a down Qdrant is a status, not an error
    let (qdrant_connected, collection_exists, qdrant_points) =
        match config.embedding.resolved_dimension().and_then(|dimension| {
            VectorStore::connect(&config.qdrant_url, &config.collection_name, dimension)
        }) {
            Ok(store) => match store.get_collection_info().await {
                Ok(Some(collection)) => (true, true, collection.points_count),
                Ok(None) => (true, false, 0),
                Err(e) => {
                    tracing::debug!("Qdrant connection error: {:?}", e);
                    (false, false, 0)
                }
            },
            Err(e) => {
                tracing::debug!("Qdrant client error: {:?}", e);
                (false, false, 0)
            }
        };

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        qdrant_url: config.qdrant_url.clone(),
        collection_name: config.collection_name.clone(),
        embedding_model: config.embedding.model.clone(),
        chat_model: config.chat.model.clone(),
        qdrant_connected,
        collection_exists,
        qdrant_points,
        db_stats,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 ragchat Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Database: {}", status.db_path);
    println!("\nQdrant:");
    println!("  URL: {}", status.qdrant_url);
    println!("  Collection: {}", status.collection_name);

    let connection_status = if status.qdrant_connected {
        if status.collection_exists {
            "✓ Connected"
        } else {
            "⚠ Connected (collection not created - run 'ragchat upload' to create)"
        }
    } else {
        "✗ Not connected"
    };
    println!("  Status: {}", connection_status);
    println!("  Points: {}", status.qdrant_points);
    println!("\nEmbedding Model: {}", status.embedding_model);
    println!("Chat Model: {}", status.chat_model);
    println!("\nDatabase Stats:");
    println!("  Documents: {}", status.db_stats.document_count);
    println!("  Chat turns: {}", status.db_stats.turn_count);
    println!("  Sessions: {}", status.db_stats.session_count);
}
