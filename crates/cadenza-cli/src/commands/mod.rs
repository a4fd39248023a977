pub mod config;
pub mod embed;
pub mod ingest;
pub mod query;
pub mod status;
pub mod upload;

pub use embed::run_embed;
pub use ingest::run_ingest;
pub use query::run_query;
pub use status::show_status;
pub use upload::run_upload;

use anyhow::{Context, Result};
use cadenza_embed::Config;
use cadenza_search::{PineconeIndex, SimilarityIndex};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Build the similarity index client from configuration.
fn similarity_index(config: &Config) -> Result<Arc<dyn SimilarityIndex>> {
    let url = config.index_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!(
            "No similarity index configured\n\n\
             Set it with 'cadenza config set index_url <url>' or CADENZA_INDEX_URL."
        )
    })?;

    let index = PineconeIndex::new(url, config.index_api_key.clone(), request_timeout(config))
        .context("Failed to create similarity index client")?;
    Ok(Arc::new(index))
}

fn request_timeout(config: &Config) -> Duration {
    Duration::from_secs(config.request_timeout_secs)
}

fn read_audio(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}
