use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{AssetId, AudioAsset, Namespace};

use super::migrations::MIGRATIONS;

const ASSET_COLUMNS: &str =
    "id, owner, playlist, url, title, duration_secs, blob_key, namespace, created_at";

/// Optional filters for [`Database::list_assets`].
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub owner: Option<String>,
    pub playlist: Option<String>,
}

/// A database connection with CRUD methods for audio assets.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }
}

// Asset CRUD
impl Database {
    /// Insert a new asset.
    ///
    /// Fails with [`Error::AlreadyExists`] when another asset has the same URL.
    pub fn insert_asset(&self, asset: &AudioAsset) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO audio_assets (
                id, owner, playlist, url, title, duration_secs, blob_key, namespace, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                asset.id.to_string(),
                asset.owner,
                asset.playlist,
                asset.url,
                asset.title,
                i64::try_from(asset.duration_secs).unwrap_or(i64::MAX),
                asset.blob_key,
                asset.namespace.as_str(),
                asset.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::AlreadyExists {
                    entity: "audio asset",
                    field: "url",
                    value: asset.url.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an asset record.
    ///
    /// Fails with [`Error::NotFound`] when no asset has this id.
    pub fn delete_asset(&self, id: &AssetId) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM audio_assets WHERE id = ?1", [id.to_string()])?;
        if deleted == 0 {
            return Err(Error::NotFound {
                entity: "audio asset",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Look up an asset by its unique URL.
    pub fn find_asset_by_url(&self, url: &str) -> Result<Option<AudioAsset>> {
        let asset = self
            .conn
            .query_row(
                &format!("SELECT {ASSET_COLUMNS} FROM audio_assets WHERE url = ?1"),
                [url],
                row_to_asset,
            )
            .optional()?;
        Ok(asset)
    }

    /// List assets, oldest first.
    pub fn list_assets(&self, filter: &AssetFilter) -> Result<Vec<AudioAsset>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ASSET_COLUMNS}
             FROM audio_assets
             WHERE (?1 IS NULL OR owner = ?1) AND (?2 IS NULL OR playlist = ?2)
             ORDER BY created_at, url"
        ))?;

        let assets = stmt
            .query_map(
                rusqlite::params![filter.owner, filter.playlist],
                row_to_asset,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(assets)
    }

    /// Number of assets per playlist, ordered by playlist name.
    pub fn playlist_counts(&self) -> Result<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT playlist, COUNT(*) FROM audio_assets GROUP BY playlist ORDER BY playlist",
        )?;

        let counts = stmt
            .query_map([], |row| {
                let playlist: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((playlist, u64::try_from(count).unwrap_or(0)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(counts)
    }
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn row_to_asset(row: &rusqlite::Row) -> rusqlite::Result<AudioAsset> {
    let id: String = row.get(0)?;
    let duration: i64 = row.get(5)?;
    let namespace: String = row.get(7)?;
    let created_at: String = row.get(8)?;

    Ok(AudioAsset {
        id: id.parse().map_err(|e| conversion_error(0, e))?,
        owner: row.get(1)?,
        playlist: row.get(2)?,
        url: row.get(3)?,
        title: row.get(4)?,
        duration_secs: u64::try_from(duration).map_err(|e| conversion_error(5, e))?,
        blob_key: row.get(6)?,
        namespace: Namespace::new(namespace).map_err(|e| conversion_error(7, e))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| conversion_error(8, e))?,
    })
}
