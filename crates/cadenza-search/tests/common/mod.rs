//! Shared fixtures and in-memory doubles for the coordinator tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use cadenza_embed::{DecodeLimits, EmbeddingPool};
use cadenza_core::SimilarityMatch;
use cadenza_search::{
    IndexItem, IndexQuery, QueryResponse, RemoteFetch, SearchError, SearchResult,
    SimilarityIndex, UpsertAck,
};

pub const RATE: u32 = 8000;

/// Brute-force index scoring by dot product.
///
/// Results come back worst-first so callers must do their own ordering.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    items: Mutex<Vec<IndexItem>>,
    upserts: AtomicUsize,
}

impl InMemoryIndex {
    pub fn upsert_calls(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn items(&self) -> Vec<IndexItem> {
        self.items.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimilarityIndex for InMemoryIndex {
    async fn upsert(&self, items: Vec<IndexItem>) -> SearchResult<UpsertAck> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let upserted_count = items.len();
        self.items.lock().unwrap().extend(items);
        Ok(UpsertAck { upserted_count })
    }

    async fn query(&self, query: IndexQuery) -> SearchResult<QueryResponse> {
        let items = self.items.lock().unwrap();
        let mut matches: Vec<SimilarityMatch> = items
            .iter()
            .filter(|item| query.filter.matches(&item.metadata))
            .map(|item| {
                let score: f32 = item
                    .values
                    .iter()
                    .zip(&query.vector)
                    .map(|(a, b)| a * b)
                    .sum();
                let mut m = SimilarityMatch::new(score, item.metadata.clone());
                m.id = Some(item.id.to_string());
                m
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(query.top_k);
        matches.reverse();
        Ok(QueryResponse { matches })
    }
}

/// Index that is never reachable.
#[derive(Debug, Default)]
pub struct UnreachableIndex;

#[async_trait]
impl SimilarityIndex for UnreachableIndex {
    async fn upsert(&self, _items: Vec<IndexItem>) -> SearchResult<UpsertAck> {
        Err(SearchError::Retrieval {
            message: "connection refused".into(),
            transient: true,
        })
    }

    async fn query(&self, _query: IndexQuery) -> SearchResult<QueryResponse> {
        Err(SearchError::Retrieval {
            message: "connection refused".into(),
            transient: true,
        })
    }
}

/// Index whose first `failures` upserts fail transiently.
#[derive(Debug, Default)]
pub struct FlakyIndex {
    failures: AtomicUsize,
    inner: InMemoryIndex,
}

impl FlakyIndex {
    pub fn failing(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            inner: InMemoryIndex::default(),
        }
    }

    pub fn items(&self) -> Vec<IndexItem> {
        self.inner.items()
    }
}

#[async_trait]
impl SimilarityIndex for FlakyIndex {
    async fn upsert(&self, items: Vec<IndexItem>) -> SearchResult<UpsertAck> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SearchError::Retrieval {
                message: "503 Service Unavailable".into(),
                transient: true,
            });
        }
        self.inner.upsert(items).await
    }

    async fn query(&self, query: IndexQuery) -> SearchResult<QueryResponse> {
        self.inner.query(query).await
    }
}

/// Fetcher serving canned bodies by URL.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    bodies: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    pub fn with(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }
}

#[async_trait]
impl RemoteFetch for StaticFetcher {
    async fn fetch(&self, url: &str) -> SearchResult<Vec<u8>> {
        self.bodies.get(url).cloned().ok_or_else(|| SearchError::UpstreamFetch {
            url: url.to_string(),
            message: "404 Not Found".into(),
        })
    }
}

pub fn pool() -> EmbeddingPool {
    EmbeddingPool::new(2, 8, DecodeLimits::default())
}

/// Encode interleaved 16-bit samples as WAV.
pub fn wav_bytes(samples: &[i16], channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// One second of a mix of sines at the given frequencies.
pub fn tones(freqs: &[f64], amplitude: f64) -> Vec<i16> {
    (0..RATE)
        .map(|i| {
            let t = f64::from(i) / f64::from(RATE);
            let v: f64 = freqs
                .iter()
                .map(|f| (2.0 * std::f64::consts::PI * f * t).sin())
                .sum::<f64>()
                / freqs.len() as f64;
            (v * amplitude).round() as i16
        })
        .collect()
}

/// Add a small deterministic wobble to a waveform.
pub fn perturb(samples: &[i16], depth: i16) -> Vec<i16> {
    samples
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let wobble = match i % 3 {
                0 => depth,
                1 => -depth,
                _ => 0,
            };
            s.saturating_add(wobble)
        })
        .collect()
}
