//! Document ingestion pipeline
//!
//! Load a file, split it into overlapping character windows, tag every
//! chunk with its registry document id, embed, and upsert to the
//! vector store in one batch.

mod loaders;

pub use loaders::*;

use crate::config::ChunkConfig;
use crate::embed::embed_in_batches;
use crate::error::{Error, Result};
use crate::resources::{EmbedderKey, Resources};
use crate::store::{ChunkPayload, ChunkPoint};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// A chunk ready for embedding
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    pub text: String,
    pub page: Option<i64>,
}

/// Split text into fixed character windows with overlap
///
/// Window size and overlap are counted in characters, not bytes, so
/// multibyte text never splits inside a code point. The final window
/// may be shorter. Overlap is clamped below the window size.
pub fn split_text(text: &str, chunk_chars: usize, overlap_chars: usize) -> Vec<String> {
    let chunk_chars = chunk_chars.max(1);
    let overlap_chars = overlap_chars.min(chunk_chars - 1);
    let step = chunk_chars - overlap_chars;

    // Byte offset of each char boundary, plus the end of the text
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    boundaries.push(text.len());
    let total_chars = boundaries.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < total_chars {
        let end = (start + chunk_chars).min(total_chars);
        let window = &text[boundaries[start]..boundaries[end]];
        if !window.trim().is_empty() {
            chunks.push(window.to_string());
        }
        if end == total_chars {
            break;
        }
        start += step;
    }

    chunks
}

/// Load a file and split it into chunks
pub fn load_and_split(path: &Path, config: &ChunkConfig) -> Result<Vec<DocumentChunk>> {
    let sections = load_document(path)?;

    let mut chunks = Vec::new();
    for section in sections {
        for text in split_text(&section.text, config.chunk_chars, config.overlap_chars) {
            chunks.push(DocumentChunk {
                text,
                page: section.page,
            });
        }
    }

    debug!("Split {:?} into {} chunks", path, chunks.len());
    Ok(chunks)
}

/// Index a document's chunks under its registry id
///
/// Clients are resolved first so nothing is parsed or embedded when
/// the backing services are unavailable. A document that yields zero
/// chunks is an indexing failure, not a silent success.
pub async fn index_document(
    resources: &Resources,
    key: &EmbedderKey,
    path: &Path,
    document_id: i64,
) -> Result<usize> {
    let embedder = resources.embedder(key).await?;
    let store = resources.vector_store(key).await?;
    store.ensure_collection().await?;

    let chunks = load_and_split(path, &resources.config().chunk)?;
    if chunks.is_empty() {
        return Err(Error::Indexing(format!(
            "No text could be extracted from {:?}",
            path.file_name().unwrap_or_default()
        )));
    }

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();
    let document_id_tag = document_id.to_string();

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let batch_size = resources.config().embedding.batch_size;
    let embeddings = embed_in_batches(embedder.as_ref(), texts, batch_size).await?;

    let points: Vec<ChunkPoint> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, vector)| ChunkPoint {
            id: Uuid::new_v4(),
            vector,
            payload: ChunkPayload {
                document_id: document_id_tag.clone(),
                source: source.clone(),
                page: chunk.page,
                text: chunk.text,
            },
        })
        .collect();

    let count = points.len();
    store.upsert_points(points).await?;

    info!("Indexed {} chunks for document {}", count, document_id);
    Ok(count)
}

/// Remove every indexed chunk belonging to a document
pub async fn delete_document_chunks(
    resources: &Resources,
    key: &EmbedderKey,
    document_id: i64,
) -> Result<()> {
    let store = resources.vector_store(key).await?;
    store.delete_by_document(&document_id.to_string()).await
}
