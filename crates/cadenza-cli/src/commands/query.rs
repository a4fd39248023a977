use anyhow::{Context, Result};
use cadenza_core::{Namespace, SimilarityMatch};
use cadenza_embed::{Config, EmbeddingPool};
use cadenza_search::{HttpFetcher, QueryCoordinator, QuerySource};
use std::path::Path;
use std::sync::Arc;

pub async fn run_query(
    target: &str,
    namespace: &Namespace,
    top_k: usize,
    json: bool,
    config: &Config,
) -> Result<()> {
    let source = if is_remote(target) {
        QuerySource::Url(target.to_string())
    } else {
        QuerySource::Bytes(super::read_audio(Path::new(target))?)
    };

    let max_bytes = u64::try_from(config.max_input_bytes).unwrap_or(u64::MAX);
    let fetcher = HttpFetcher::new(max_bytes, super::request_timeout(config))
        .context("Failed to create HTTP client")?;
    let coordinator = QueryCoordinator::new(
        super::similarity_index(config)?,
        EmbeddingPool::from_config(config),
        Arc::new(fetcher),
    );

    let matches = match coordinator.query(source, namespace, top_k).await {
        Ok(matches) => matches,
        Err(e) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&e.report())?);
            }
            return Err(e).with_context(|| format!("Query for {target} failed"));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    print_matches(target, namespace, &matches);
    Ok(())
}

fn is_remote(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

fn print_matches(target: &str, namespace: &Namespace, matches: &[SimilarityMatch]) {
    println!("\n🔍 Tracks similar to {target} in '{namespace}'\n");

    if matches.is_empty() {
        println!("  No matches");
        return;
    }

    for (rank, m) in matches.iter().enumerate() {
        let title = m.metadata.get("title").and_then(|v| v.as_str());
        let url = m.url().unwrap_or("<no url>");
        match title {
            Some(title) => println!("  {:>2}. {:.4}  {}  ({})", rank + 1, m.score, title, url),
            None => println!("  {:>2}. {:.4}  {}", rank + 1, m.score, url),
        }
    }
}
