//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::logstore::LogStore;
use crate::store::VectorStore;
use std::path::PathBuf;
use tracing::{info, warn};

/// Initialize ragchat configuration, database, and collection
///
/// The Qdrant collection is created on a best-effort basis; init still
/// succeeds when Qdrant is not reachable yet.
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<Config> {
    let base = base_dir.unwrap_or_else(Config::default_base_dir);
    let config = Config::with_base_dir(base);

    if config.paths.config_file.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config.paths.config_file.display()
        )));
    }

    config.validate()?;
    config.save()?;
    info!("Created config at {:?}", config.paths.config_file);

    let db = LogStore::connect(&config.paths.db_file).await?;
    db.init_schema().await?;
    info!("Created database at {:?}", config.paths.db_file);

    match config.embedding.resolved_dimension() {
        Ok(dimension) => {
            match VectorStore::connect(&config.qdrant_url, &config.collection_name, dimension) {
                Ok(store) => match store.ensure_collection().await {
                    Ok(()) => info!("Qdrant collection '{}' ready", config.collection_name),
                    Err(e) => warn!(
                        "Could not create Qdrant collection: {}. It will be created on first upload.",
                        e
                    ),
                },
                Err(e) => warn!(
                    "Could not connect to Qdrant at {}: {}. Make sure Qdrant is running.",
                    config.qdrant_url, e
                ),
            }
        }
        Err(e) => warn!("Skipping collection creation: {}", e),
    }

    Ok(config)
}

/// Print init summary to console
pub fn print_init_summary(config: &Config) {
    println!("✓ Initialized ragchat at {:?}", config.paths.base_dir);
    println!("\nConfiguration: {:?}", config.paths.config_file);
    println!("Database: {:?}", config.paths.db_file);
    println!("\nNext steps:");
    println!("  1. Start Qdrant: docker run -p 6334:6334 qdrant/qdrant");
    println!(
        "  2. Export API keys: {} and {}",
        config.embedding.api_key_env, config.chat.api_key_env
    );
    println!("  3. Upload a document: ragchat upload report.pdf");
    println!("  4. Ask a question: ragchat ask \"what does the report say about X?\"");
}
