use anyhow::{Context, Result};
use cadenza_embed::{Config, EmbeddingPool};
use std::path::Path;

pub async fn run_embed(path: &Path, config: &Config, json: bool) -> Result<()> {
    let bytes = super::read_audio(path)?;
    let pool = EmbeddingPool::from_config(config);

    let embedding = pool
        .embed(bytes)
        .await
        .with_context(|| format!("Failed to embed {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string(&embedding.vector)?);
        return Ok(());
    }

    println!("\n🎵 {}\n", path.display());
    println!("  Duration: {:.2}s", embedding.duration_secs);
    println!("  Samples: {} @ {} Hz", embedding.sample_count, embedding.sample_rate);
    println!("  Dimension: {}", embedding.vector.len());
    println!("  Norm: {:.6}", embedding.vector.norm());

    Ok(())
}
