use anyhow::{Context, Result};
use backon::{ExponentialBuilder, Retryable};
use cadenza_core::{EmbeddingVector, Namespace, TrackMetadata};
use cadenza_embed::scan::read_title;
use cadenza_embed::{discover_audio_files, Config, EmbeddingPool};
use cadenza_search::{IngestCoordinator, SearchError};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub namespace: Namespace,
    pub url: Option<String>,
    pub retries: usize,
}

pub async fn run_ingest(path: &Path, config: &Config, options: IngestOptions) -> Result<()> {
    let coordinator = IngestCoordinator::new(
        super::similarity_index(config)?,
        EmbeddingPool::from_config(config),
    );

    if !path.is_dir() {
        let url = options.url.clone().unwrap_or_else(|| source_url(path));
        let metadata =
            TrackMetadata::new(options.namespace.clone(), url).with_extra("title", read_title(path));
        let bytes = super::read_audio(path)?;

        ingest_with_retry(&coordinator, bytes, metadata, options.retries)
            .await
            .with_context(|| format!("Failed to ingest {}", path.display()))?;

        println!("✓ Ingested {} into '{}'", path.display(), options.namespace);
        return Ok(());
    }

    if options.url.is_some() {
        anyhow::bail!("--url applies to a single file, not a directory");
    }

    let files = discover_audio_files(path);
    println!("\n🎵 Ingesting {} audio files from {}\n", files.len(), path.display());

    let mut ingested = 0usize;
    let mut skipped = 0usize;
    for file in &files {
        let metadata = TrackMetadata::new(options.namespace.clone(), source_url(&file.path))
            .with_extra("title", file.title.as_str());

        let outcome = match super::read_audio(&file.path) {
            Ok(bytes) => ingest_with_retry(&coordinator, bytes, metadata, options.retries)
                .await
                .map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(_) => {
                ingested += 1;
                println!("  ✓ {}", file.path.display());
            }
            Err(e) => {
                skipped += 1;
                log::warn!("Skipping {}: {:#}", file.path.display(), e);
                eprintln!("  ✗ {}: {:#}", file.path.display(), e);
            }
        }
    }

    println!(
        "\n✓ Ingested {} file(s) into '{}', skipped {}",
        ingested, options.namespace, skipped
    );
    Ok(())
}

/// Ingest once, retrying only failures the index reports as transient.
async fn ingest_with_retry(
    coordinator: &IngestCoordinator,
    bytes: Vec<u8>,
    metadata: TrackMetadata,
    retries: usize,
) -> Result<EmbeddingVector, SearchError> {
    (|| async { coordinator.ingest(bytes.clone(), metadata.clone()).await })
        .retry(ExponentialBuilder::default().with_max_times(retries))
        .when(SearchError::is_transient)
        .notify(|e: &SearchError, after: Duration| {
            log::warn!("Transient failure ({}), retrying in {:?}", e, after);
        })
        .await
}

/// `file://` URL of a local file, absolute when the path resolves.
fn source_url(path: &Path) -> String {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", resolved.display())
}
