//! Integration tests for ingestion, query and upload against in-memory
//! collaborators.

mod common;

use std::sync::Arc;

use cadenza_core::schema::{AssetFilter, AssetStore, Database, SqliteAssetStore};
use cadenza_core::{Namespace, TrackMetadata, EMBEDDING_DIM};
use cadenza_search::{
    FsBlobStore, IngestCoordinator, QueryCoordinator, QuerySource, SearchError,
    UploadCoordinator, UploadRequest, DEFAULT_TOP_K,
};
use common::{
    perturb, pool, tones, wav_bytes, FlakyIndex, InMemoryIndex, StaticFetcher, UnreachableIndex,
};
use tempfile::TempDir;

fn coordinators(index: Arc<InMemoryIndex>, fetcher: StaticFetcher) -> (IngestCoordinator, QueryCoordinator) {
    let ingest = IngestCoordinator::new(index.clone(), pool());
    let query = QueryCoordinator::new(index, pool(), Arc::new(fetcher));
    (ingest, query)
}

fn track(url: &str) -> TrackMetadata {
    TrackMetadata::new(Namespace::audio_tracks(), url)
}

#[tokio::test]
async fn test_near_duplicate_ranks_above_unrelated() {
    let index = Arc::new(InMemoryIndex::default());
    let (ingest, query) = coordinators(index.clone(), StaticFetcher::default());

    let a = tones(&[440.0, 880.0], 12_000.0);
    let b = perturb(&a, 150);
    let c = tones(&[1230.0, 3210.0], 12_000.0);

    for (url, samples) in [("a", &a), ("b", &b), ("c", &c)] {
        ingest.ingest(wav_bytes(samples, 1), track(url)).await.unwrap();
    }
    assert_eq!(index.upsert_calls(), 3);

    let matches = query
        .query(QuerySource::Bytes(wav_bytes(&a, 1)), &Namespace::audio_tracks(), DEFAULT_TOP_K)
        .await
        .unwrap();

    let urls: Vec<_> = matches.iter().filter_map(|m| m.url()).collect();
    assert_eq!(urls, vec!["a", "b", "c"]);
    assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(matches[1].score > matches[2].score);
    assert!(matches[1].score > 0.99);
}

#[tokio::test]
async fn test_query_is_scoped_to_namespace() {
    let index = Arc::new(InMemoryIndex::default());
    let (ingest, query) = coordinators(index, StaticFetcher::default());
    let audio = wav_bytes(&tones(&[440.0], 10_000.0), 1);

    let hhmc = Namespace::new("hhmc").unwrap();
    ingest
        .ingest(audio.clone(), TrackMetadata::new(hhmc.clone(), "v1"))
        .await
        .unwrap();

    let other = query
        .query(QuerySource::Bytes(audio.clone()), &Namespace::audio_tracks(), 5)
        .await
        .unwrap();
    assert!(other.is_empty());

    let same = query.query(QuerySource::Bytes(audio), &hhmc, 5).await.unwrap();
    assert_eq!(same.len(), 1);
}

#[tokio::test]
async fn test_results_are_limited_to_top_k() {
    let index = Arc::new(InMemoryIndex::default());
    let (ingest, query) = coordinators(index, StaticFetcher::default());

    for (i, f) in [200.0, 300.0, 400.0, 500.0].iter().enumerate() {
        let audio = wav_bytes(&tones(&[*f], 9_000.0), 1);
        ingest.ingest(audio, track(&format!("t{i}"))).await.unwrap();
    }

    let audio = wav_bytes(&tones(&[300.0], 9_000.0), 1);
    let matches = query
        .query(QuerySource::Bytes(audio), &Namespace::audio_tracks(), 2)
        .await
        .unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].url(), Some("t1"));
}

#[tokio::test]
async fn test_ingest_fills_duration_from_audio() {
    let index = Arc::new(InMemoryIndex::default());
    let (ingest, _) = coordinators(index.clone(), StaticFetcher::default());

    let vector = ingest
        .ingest(wav_bytes(&tones(&[440.0], 8_000.0), 1), track("one-second"))
        .await
        .unwrap();
    assert_eq!(vector.len(), EMBEDDING_DIM);

    let items = index.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].metadata["duration"], 1);
    assert_eq!(items[0].metadata["namespace"], "audio_tracks");
    assert_eq!(items[0].values, vector.as_slice());
}

#[tokio::test]
async fn test_explicit_duration_is_kept() {
    let index = Arc::new(InMemoryIndex::default());
    let (ingest, _) = coordinators(index.clone(), StaticFetcher::default());

    ingest
        .ingest(wav_bytes(&tones(&[440.0], 8_000.0), 1), track("x").with_duration(250))
        .await
        .unwrap();
    assert_eq!(index.items()[0].metadata["duration"], 250);
}

#[tokio::test]
async fn test_invalid_metadata_never_reaches_index() {
    let index = Arc::new(InMemoryIndex::default());
    let (ingest, _) = coordinators(index.clone(), StaticFetcher::default());
    let audio = wav_bytes(&tones(&[440.0], 8_000.0), 1);

    let err = ingest.ingest(audio.clone(), track("  ")).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_input");

    let shadowing = track("x").with_extra("url", "other");
    let err = ingest.ingest(audio, shadowing).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_input");

    assert_eq!(index.upsert_calls(), 0);
}

#[tokio::test]
async fn test_decode_failure_is_passed_through() {
    let index = Arc::new(InMemoryIndex::default());
    let (ingest, query) = coordinators(index.clone(), StaticFetcher::default());

    let err = ingest
        .ingest(b"definitely not audio".to_vec(), track("junk"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Embed(_)));
    assert_eq!(err.kind(), "decode");
    assert_eq!(index.upsert_calls(), 0);

    let err = query
        .query(QuerySource::Bytes(vec![0u8; 64]), &Namespace::audio_tracks(), 3)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "decode");
}

#[tokio::test]
async fn test_too_short_audio_is_insufficient_samples() {
    let index = Arc::new(InMemoryIndex::default());
    let (ingest, _) = coordinators(index.clone(), StaticFetcher::default());

    let short: Vec<i16> = tones(&[440.0], 8_000.0).into_iter().take(500).collect();
    let err = ingest.ingest(wav_bytes(&short, 1), track("short")).await.unwrap_err();
    assert_eq!(err.kind(), "insufficient_samples");
    assert_eq!(index.upsert_calls(), 0);
}

#[tokio::test]
async fn test_batch_ingest_is_one_upsert() {
    let index = Arc::new(InMemoryIndex::default());
    let (ingest, query) = coordinators(index.clone(), StaticFetcher::default());

    let pool = ingest.pool().clone();
    let mut vectors = Vec::new();
    for f in [250.0, 500.0, 750.0] {
        let embedding = pool.embed(wav_bytes(&tones(&[f], 9_000.0), 1)).await.unwrap();
        vectors.push(embedding.vector);
    }

    let hhmc = Namespace::new("hhmc").unwrap();
    let meta = TrackMetadata::new(hhmc.clone(), "https://video.example/v1").with_duration(120);
    let ids = ingest.ingest_batch(&vectors, &meta).await.unwrap();

    assert_eq!(ids.len(), 3);
    assert_eq!(index.upsert_calls(), 1);
    assert!(index
        .items()
        .iter()
        .all(|item| item.metadata["url"] == "https://video.example/v1"));

    let matches = query
        .query(QuerySource::Bytes(wav_bytes(&tones(&[500.0], 9_000.0), 1)), &hhmc, 10)
        .await
        .unwrap();
    assert_eq!(matches.len(), 3);

    let err = ingest.ingest_batch(&[], &meta).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_input");
}

#[tokio::test]
async fn test_query_by_url_uses_fetcher() {
    let index = Arc::new(InMemoryIndex::default());
    let audio = wav_bytes(&tones(&[440.0, 660.0], 10_000.0), 1);
    let fetcher = StaticFetcher::default().with("https://cdn.example/q.wav", audio.clone());
    let (ingest, query) = coordinators(index, fetcher);

    ingest.ingest(audio, track("stored")).await.unwrap();

    let matches = query
        .query(
            QuerySource::Url("https://cdn.example/q.wav".into()),
            &Namespace::audio_tracks(),
            DEFAULT_TOP_K,
        )
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert!(matches[0].score > 0.999);

    let err = query
        .query(
            QuerySource::Url("https://cdn.example/missing.wav".into()),
            &Namespace::audio_tracks(),
            DEFAULT_TOP_K,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "upstream_fetch");
}

#[tokio::test]
async fn test_zero_top_k_is_rejected() {
    let index = Arc::new(InMemoryIndex::default());
    let (_, query) = coordinators(index, StaticFetcher::default());
    let err = query
        .query(QuerySource::Bytes(Vec::new()), &Namespace::audio_tracks(), 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_input");
}

#[tokio::test]
async fn test_unreachable_index_is_transient_retrieval_error() {
    let index = Arc::new(UnreachableIndex);
    let ingest = IngestCoordinator::new(index.clone(), pool());
    let query = QueryCoordinator::new(index, pool(), Arc::new(StaticFetcher::default()));
    let audio = wav_bytes(&tones(&[440.0], 8_000.0), 1);

    let err = ingest.ingest(audio.clone(), track("x")).await.unwrap_err();
    assert_eq!(err.kind(), "retrieval");
    assert!(err.is_transient());

    let err = query
        .query(QuerySource::Bytes(audio), &Namespace::audio_tracks(), 3)
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_upload_records_and_indexes_asset() {
    let blobs_dir = TempDir::new().unwrap();
    let index = Arc::new(InMemoryIndex::default());
    let assets = Arc::new(SqliteAssetStore::from_database(Database::open_in_memory().unwrap()));
    let blobs = Arc::new(FsBlobStore::new(
        blobs_dir.path(),
        Some("https://cdn.example/audio".into()),
    ));
    let upload = UploadCoordinator::new(
        blobs,
        assets.clone(),
        IngestCoordinator::new(index.clone(), pool()),
    );

    let audio = wav_bytes(&tones(&[440.0], 8_000.0), 1);
    let request = UploadRequest {
        owner: "u1".into(),
        playlist: "mix".into(),
        file_name: "a.wav".into(),
        title: None,
        bytes: audio.clone(),
    };
    let asset = upload.upload(request.clone()).await.unwrap();

    assert_eq!(asset.url, "https://cdn.example/audio/u1/mix/a.wav");
    assert_eq!(asset.blob_key, "u1/mix/a.wav");
    assert_eq!(asset.title, "a.wav");
    assert_eq!(asset.duration_secs, 1);
    assert_eq!(std::fs::read(blobs_dir.path().join("u1/mix/a.wav")).unwrap(), audio);

    let stored = assets.find_by_url(&asset.url).unwrap().unwrap();
    assert_eq!(stored.id, asset.id);

    let items = index.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].metadata["user"], "u1");
    assert_eq!(items[0].metadata["playlist"], "mix");
    assert_eq!(items[0].metadata["id"], asset.id.to_string());

    let err = upload.upload(request).await.unwrap_err();
    assert_eq!(err.kind(), "asset");
    assert!(err.to_string().contains("already exists"));
    assert_eq!(index.upsert_calls(), 1);
    assert_eq!(assets.list(&AssetFilter::default()).unwrap().len(), 1);
}

#[tokio::test]
async fn test_upload_rejects_path_traversal() {
    let blobs_dir = TempDir::new().unwrap();
    let index = Arc::new(InMemoryIndex::default());
    let upload = UploadCoordinator::new(
        Arc::new(FsBlobStore::new(blobs_dir.path(), None)),
        Arc::new(SqliteAssetStore::from_database(Database::open_in_memory().unwrap())),
        IngestCoordinator::new(index.clone(), pool()),
    );

    let err = upload
        .upload(UploadRequest {
            owner: "u1".into(),
            playlist: "..".into(),
            file_name: "a.wav".into(),
            title: None,
            bytes: wav_bytes(&tones(&[440.0], 8_000.0), 1),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_input");
    assert_eq!(index.upsert_calls(), 0);
}

fn upload_request(file_name: &str, bytes: Vec<u8>) -> UploadRequest {
    UploadRequest {
        owner: "u1".into(),
        playlist: "mix".into(),
        file_name: file_name.into(),
        title: None,
        bytes,
    }
}

#[tokio::test]
async fn test_rejected_duplicate_keeps_original_blob() {
    let blobs_dir = TempDir::new().unwrap();
    let index = Arc::new(InMemoryIndex::default());
    let upload = UploadCoordinator::new(
        Arc::new(FsBlobStore::new(blobs_dir.path(), None)),
        Arc::new(SqliteAssetStore::from_database(Database::open_in_memory().unwrap())),
        IngestCoordinator::new(index.clone(), pool()),
    );

    let original = wav_bytes(&tones(&[440.0], 8_000.0), 1);
    upload.upload(upload_request("a.wav", original.clone())).await.unwrap();

    let replacement = wav_bytes(&tones(&[1_250.0], 8_000.0), 1);
    let err = upload
        .upload(upload_request("a.wav", replacement))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "asset");
    assert_eq!(std::fs::read(blobs_dir.path().join("u1/mix/a.wav")).unwrap(), original);
    assert_eq!(index.upsert_calls(), 1);
}

#[tokio::test]
async fn test_upload_can_be_retried_after_transient_index_failure() {
    let blobs_dir = TempDir::new().unwrap();
    let index = Arc::new(FlakyIndex::failing(1));
    let assets = Arc::new(SqliteAssetStore::from_database(Database::open_in_memory().unwrap()));
    let upload = UploadCoordinator::new(
        Arc::new(FsBlobStore::new(blobs_dir.path(), None)),
        assets.clone(),
        IngestCoordinator::new(index.clone(), pool()),
    );
    let request = upload_request("a.wav", wav_bytes(&tones(&[440.0], 8_000.0), 1));

    let err = upload.upload(request.clone()).await.unwrap_err();
    assert_eq!(err.kind(), "retrieval");
    assert!(err.is_transient());
    assert!(assets.list(&AssetFilter::default()).unwrap().is_empty());

    let asset = upload.upload(request).await.unwrap();
    assert_eq!(assets.list(&AssetFilter::default()).unwrap().len(), 1);
    let items = index.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].metadata["id"], asset.id.to_string());
}

#[tokio::test]
async fn test_undecodable_upload_leaves_no_blob_or_record() {
    let blobs_dir = TempDir::new().unwrap();
    let assets = Arc::new(SqliteAssetStore::from_database(Database::open_in_memory().unwrap()));
    let upload = UploadCoordinator::new(
        Arc::new(FsBlobStore::new(blobs_dir.path(), None)),
        assets.clone(),
        IngestCoordinator::new(Arc::new(UnreachableIndex), pool()),
    );

    let err = upload
        .upload(upload_request("a.wav", b"not audio at all".to_vec()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "decode");
    assert!(!blobs_dir.path().join("u1").exists());
    assert!(assets.list(&AssetFilter::default()).unwrap().is_empty());
}
