//! Configuration management for ragchat
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Qdrant connection URL
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,

    /// Qdrant collection name
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chat model configuration
    #[serde(default)]
    pub chat: ChatConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Requested output dimensionality (None = model default)
    #[serde(default)]
    pub dimensionality: Option<usize>,

    /// API base URL
    #[serde(default = "default_embedding_api_url")]
    pub api_url: String,

    /// Environment variable name for the API key
    #[serde(default = "default_embedding_api_key_env")]
    pub api_key_env: String,

    /// Batch size for embedding requests
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

/// Lookup the native embedding dimension for a known model
pub fn embedding_dimension_for_model(model: &str) -> Option<usize> {
    match model {
        "nomic-embed-text-v1" => Some(768),
        "nomic-embed-text-v1.5" => Some(768),
        _ => None,
    }
}

impl EmbeddingConfig {
    /// Resolve the effective embedding dimension
    ///
    /// A configured dimensionality wins (Matryoshka truncation); otherwise
    /// the model's native dimension is used.
    pub fn resolved_dimension(&self) -> Result<usize> {
        if let Some(dim) = self.dimensionality {
            if let Some(native) = embedding_dimension_for_model(&self.model) {
                if dim > native {
                    warn!(
                        "Requested dimensionality {} exceeds native {} for model '{}'",
                        dim, native, self.model
                    );
                }
            }
            return Ok(dim);
        }
        embedding_dimension_for_model(&self.model).ok_or_else(|| {
            Error::Config(format!(
                "Unknown embedding model '{}': set embedding.dimensionality explicitly",
                self.model
            ))
        })
    }
}

/// Chat model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Model name/identifier
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// API base URL (OpenAI-compatible)
    #[serde(default = "default_chat_api_url")]
    pub api_url: String,

    /// Environment variable name for the API key
    #[serde(default = "default_chat_api_key_env")]
    pub api_key_env: String,

    /// Sampling temperature
    #[serde(default = "default_chat_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Target characters per chunk
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,

    /// Overlap characters between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub overlap_chars: usize,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question
    #[serde(default = "default_retrieval_k")]
    pub top_k: usize,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for ragchat data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,

    /// Directory for staged upload copies
    pub staging_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            qdrant_url: default_qdrant_url(),
            collection_name: default_collection_name(),
            embedding: EmbeddingConfig::default(),
            chat: ChatConfig::default(),
            chunk: ChunkConfig::default(),
            retrieval: RetrievalConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimensionality: None,
            api_url: default_embedding_api_url(),
            api_key_env: default_embedding_api_key_env(),
            batch_size: default_embedding_batch_size(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            api_url: default_chat_api_url(),
            api_key_env: default_chat_api_key_env(),
            temperature: default_chat_temperature(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_chars: default_chunk_chars(),
            overlap_chars: default_chunk_overlap(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_retrieval_k(),
        }
    }
}

impl Config {
    /// Get the default base directory for ragchat (~/.ragchat)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ragchat")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    fn init_paths(&mut self, base: PathBuf) {
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            db_file: base.join("ragchat.db"),
            staging_dir: base.join("staging"),
            base_dir: base,
        };
    }

    /// Build a config rooted at the given base directory without touching disk
    pub fn with_base_dir(base: PathBuf) -> Self {
        let mut config = Config::default();
        config.init_paths(base);
        config
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::NotInitialized);
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.init_paths(base);
        config.paths.config_file = config_path.to_path_buf();

        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path or the default location
    pub fn load_or_default_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Self::load(&Self::default_config_path()),
        }
    }

    /// Save configuration to its config file path
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.paths.base_dir)?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        debug!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.chunk.chunk_chars == 0 {
            return Err(Error::Config("chunk.chunk_chars must be > 0".to_string()));
        }
        if self.chunk.overlap_chars >= self.chunk.chunk_chars {
            return Err(Error::Config(
                "chunk.overlap_chars must be smaller than chunk.chunk_chars".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be > 0".to_string()));
        }
        Ok(())
    }

    /// Read the embedding API key from the configured environment variable
    pub fn embedding_api_key(&self) -> Result<String> {
        std::env::var(&self.embedding.api_key_env).map_err(|_| {
            Error::Config(format!(
                "Embedding API key not set: export {}",
                self.embedding.api_key_env
            ))
        })
    }

    /// Read the chat API key from the configured environment variable
    pub fn chat_api_key(&self) -> Result<String> {
        std::env::var(&self.chat.api_key_env).map_err(|_| {
            Error::Config(format!(
                "Chat API key not set: export {}",
                self.chat.api_key_env
            ))
        })
    }
}
