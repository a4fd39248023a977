/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Uploaded audio tracks
CREATE TABLE IF NOT EXISTS audio_assets (
    id TEXT PRIMARY KEY,
    owner TEXT NOT NULL,
    playlist TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    duration_secs INTEGER NOT NULL,
    blob_key TEXT NOT NULL,
    namespace TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audio_assets_owner ON audio_assets(owner);
CREATE INDEX IF NOT EXISTS idx_audio_assets_playlist ON audio_assets(playlist);
CREATE INDEX IF NOT EXISTS idx_audio_assets_duration ON audio_assets(duration_secs);
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "audio_assets",
    sql: MIGRATION_001,
}];
