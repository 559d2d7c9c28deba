//! Default values for configuration

/// Default Qdrant gRPC URL for local development (port 6334, not 6333 REST)
pub fn default_qdrant_url() -> String {
    std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://127.0.0.1:6334".to_string())
}

/// Default collection name
pub fn default_collection_name() -> String {
    "ragchat_docs".to_string()
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    std::env::var("NOMIC_MODEL_NAME").unwrap_or_else(|_| "nomic-embed-text-v1.5".to_string())
}

/// Default embedding API base URL
pub fn default_embedding_api_url() -> String {
    "https://api-atlas.nomic.ai/v1".to_string()
}

/// Default environment variable holding the embedding API key
pub fn default_embedding_api_key_env() -> String {
    "NOMIC_API_KEY".to_string()
}

/// Default batch size for embedding requests
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default chat model
pub fn default_chat_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

/// Default chat API base URL (OpenAI-compatible)
pub fn default_chat_api_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

/// Default environment variable holding the chat API key
pub fn default_chat_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

/// Default sampling temperature for grounded answers
pub fn default_chat_temperature() -> f32 {
    0.0
}

/// Default characters per chunk
pub fn default_chunk_chars() -> usize {
    1000
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    200
}

/// Default number of chunks retrieved per question
pub fn default_retrieval_k() -> usize {
    2
}

/// Default HTTP request timeout in seconds
pub fn default_request_timeout() -> u64 {
    60
}
