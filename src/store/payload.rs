//! Payload schema for Qdrant points

use qdrant_client::qdrant::{PointStruct, Value as QdrantValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::error;
use uuid::Uuid;

/// A point ready to be upserted to Qdrant
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

impl ChunkPoint {
    /// Convert to qdrant-client PointStruct
    pub fn to_point_struct(self) -> PointStruct {
        let payload_map = self.payload.to_qdrant_payload();
        PointStruct::new(self.id.to_string(), self.vector, payload_map)
    }
}

/// Payload stored with each chunk in Qdrant
///
/// `document_id` is the stringified registry id; it is the only join
/// key between the vector store and the relational log store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Registry document id (stringified)
    pub document_id: String,

    /// Source filename the chunk came from
    pub source: String,

    /// Page or section number within the source, when the loader knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,

    /// Chunk text
    pub text: String,
}

impl ChunkPayload {
    /// Convert to Qdrant payload format
    pub fn to_qdrant_payload(self) -> HashMap<String, QdrantValue> {
        let mut map = HashMap::new();

        map.insert("document_id".to_string(), string_to_qdrant(&self.document_id));
        map.insert("source".to_string(), string_to_qdrant(&self.source));
        map.insert("text".to_string(), string_to_qdrant(&self.text));

        if let Some(page) = self.page {
            map.insert("page".to_string(), int_to_qdrant(page));
        }

        map
    }
}

fn string_to_qdrant(s: &str) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::StringValue(s.to_string())),
    }
}

fn int_to_qdrant(i: i64) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::IntegerValue(i)),
    }
}

impl From<Map<String, Value>> for ChunkPayload {
    fn from(map: Map<String, Value>) -> Self {
        match serde_json::from_value(Value::Object(map)) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to decode chunk payload, substituting empty: {}", e);
                ChunkPayload::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serialization() {
        let payload = ChunkPayload {
            document_id: "7".to_string(),
            source: "report.pdf".to_string(),
            page: Some(2),
            text: "chunk text".to_string(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["document_id"], "7");
        assert_eq!(json["page"], 2);

        let parsed: ChunkPayload = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.document_id, "7");
        assert_eq!(parsed.text, "chunk text");
    }

    #[test]
    fn test_qdrant_payload_omits_missing_page() {
        let payload = ChunkPayload {
            document_id: "1".to_string(),
            source: "notes.html".to_string(),
            page: None,
            text: "t".to_string(),
        };

        let map = payload.to_qdrant_payload();
        assert!(map.contains_key("document_id"));
        assert!(!map.contains_key("page"));
    }

    #[test]
    fn test_payload_from_malformed_map_falls_back_to_default() {
        let mut map = Map::new();
        map.insert("document_id".to_string(), Value::from(vec![1, 2]));

        let payload = ChunkPayload::from(map);
        assert!(payload.document_id.is_empty());
    }
}
