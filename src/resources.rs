//! Process-wide resource wiring
//!
//! Embedders, vector store handles, and retrieval chains are built on
//! first use and shared through keyed single-flight caches. The key
//! types capture every parameter that affects construction, so a
//! config change that matters produces a new key and a fresh instance
//! while repeated lookups share one.

use crate::cache::ResourceCache;
use crate::chain::RetrievalChain;
use crate::config::{Config, EmbeddingConfig};
use crate::embed::{create_embedder, Embedder};
use crate::error::{Error, Result};
use crate::llm::create_chat_model;
use crate::store::VectorStore;
use std::sync::Arc;

/// Identity of an embedding client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmbedderKey {
    pub api_key: String,
    pub model: String,
    pub dimensionality: Option<usize>,
}

impl EmbedderKey {
    /// Build the key from config, resolving the API key from the
    /// configured environment variable
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            api_key: config.embedding_api_key()?,
            model: config.embedding.model.clone(),
            dimensionality: config.embedding.dimensionality,
        })
    }
}

/// Identity of a vector store handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub url: String,
    pub collection: String,
    pub dimension: usize,
}

/// Identity of a retrieval chain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainKey {
    pub embedder: EmbedderKey,
    pub api_key: String,
    pub model: String,
}

impl ChainKey {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            embedder: EmbedderKey::from_config(config)?,
            api_key: config.chat_api_key()?,
            model: config.chat.model.clone(),
        })
    }
}

/// Shared, lazily-built clients for one process
pub struct Resources {
    config: Config,
    embedders: ResourceCache<EmbedderKey, dyn Embedder>,
    stores: ResourceCache<StoreKey, VectorStore>,
    chains: ResourceCache<ChainKey, RetrievalChain>,
}

impl Resources {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            embedders: ResourceCache::new(),
            stores: ResourceCache::new(),
            chains: ResourceCache::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn embedding_config_for(&self, key: &EmbedderKey) -> EmbeddingConfig {
        let mut config = self.config.embedding.clone();
        config.model = key.model.clone();
        config.dimensionality = key.dimensionality;
        config
    }

    /// Get or build the embedder for a key
    pub async fn embedder(&self, key: &EmbedderKey) -> Result<Arc<dyn Embedder>> {
        let config = self.embedding_config_for(key);
        let api_key = key.api_key.clone();
        self.embedders
            .get_or_create(key, || async move { create_embedder(&config, &api_key) })
            .await
    }

    /// Get or build the vector store handle matching a key's dimension
    pub async fn vector_store(&self, key: &EmbedderKey) -> Result<Arc<VectorStore>> {
        let dimension = self.embedding_config_for(key).resolved_dimension()?;
        let store_key = StoreKey {
            url: self.config.qdrant_url.clone(),
            collection: self.config.collection_name.clone(),
            dimension,
        };

        let url = store_key.url.clone();
        let collection = store_key.collection.clone();
        self.stores
            .get_or_create(&store_key, || async move {
                Ok(Arc::new(VectorStore::connect(&url, &collection, dimension)?))
            })
            .await
    }

    /// Get or build the retrieval chain for a key
    ///
    /// Any construction failure is reported as a chain init error so
    /// callers see a single failure mode; the failed build is not
    /// cached and a later call retries.
    pub async fn chain(&self, key: &ChainKey) -> Result<Arc<RetrievalChain>> {
        let embedder = self.embedder(&key.embedder).await.map_err(chain_init)?;
        let store = self.vector_store(&key.embedder).await.map_err(chain_init)?;

        let chat_config = {
            let mut config = self.config.chat.clone();
            config.model = key.model.clone();
            config
        };
        let api_key = key.api_key.clone();
        let top_k = self.config.retrieval.top_k;

        self.chains
            .get_or_create(key, || async move {
                let llm = create_chat_model(&chat_config, &api_key).map_err(chain_init)?;
                Ok(Arc::new(RetrievalChain::new(embedder, store, llm, top_k)))
            })
            .await
    }
}

fn chain_init(e: Error) -> Error {
    match e {
        Error::ChainInit(_) => e,
        other => Error::ChainInit(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_resources() -> Resources {
        let mut config = Config::default();
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

    #[tokio::test]
    async fn test_embedder_shared_for_same_key() {
        let resources = test_resources();
        let key = test_key();

        let first = resources.embedder(&key).await.unwrap();
        let second = resources.embedder(&key).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_distinct_models_get_distinct_embedders() {
        let resources = test_resources();
        let key = test_key();
        let other = EmbedderKey {
            model: "nomic-embed-text-v1".to_string(),
            ..test_key()
        };

        let first = resources.embedder(&key).await.unwrap();
        let second = resources.embedder(&other).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_missing_api_key_not_cached() {
        let resources = test_resources();
        let bad = EmbedderKey {
            api_key: String::new(),
            ..test_key()
        };

        assert!(resources.embedder(&bad).await.is_err());
        // The failed build leaves no usable entry; a good key still works
        let good = resources.embedder(&test_key()).await;
        assert!(good.is_ok());
    }

    #[tokio::test]
    async fn test_chain_failure_maps_to_chain_init() {
        let resources = test_resources();
        let key = ChainKey {
            embedder: EmbedderKey {
                api_key: String::new(),
                ..test_key()
            },
            api_key: "chat-key".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
        };

        let err = resources.chain(&key).await.unwrap_err();
        assert!(matches!(err, Error::ChainInit(_)));
    }
}
