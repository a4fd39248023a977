use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::model::{AssetId, AudioAsset};

use super::db::{AssetFilter, Database};

/// Primary record store for uploaded assets.
///
/// Implementations are shared between concurrent requests, so they must
/// be `Send + Sync`.
pub trait AssetStore: Send + Sync + std::fmt::Debug {
    /// Persist a new asset. URLs are globally unique.
    fn create(&self, asset: &AudioAsset) -> Result<()>;

    fn find_by_url(&self, url: &str) -> Result<Option<AudioAsset>>;

    fn list(&self, filter: &AssetFilter) -> Result<Vec<AudioAsset>>;

    /// Remove an asset whose upload could not be completed.
    fn delete(&self, id: &AssetId) -> Result<()>;
}

/// [`AssetStore`] over a single SQLite connection.
#[derive(Debug)]
pub struct SqliteAssetStore {
    db: Mutex<Database>,
}

impl SqliteAssetStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_database(Database::open(path)?))
    }

    #[must_use]
    pub fn from_database(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| Error::LockPoisoned)
    }
}

impl AssetStore for SqliteAssetStore {
    fn create(&self, asset: &AudioAsset) -> Result<()> {
        self.db()?.insert_asset(asset)
    }

    fn find_by_url(&self, url: &str) -> Result<Option<AudioAsset>> {
        self.db()?.find_asset_by_url(url)
    }

    fn list(&self, filter: &AssetFilter) -> Result<Vec<AudioAsset>> {
        self.db()?.list_assets(filter)
    }

    fn delete(&self, id: &AssetId) -> Result<()> {
        self.db()?.delete_asset(id)
    }
}
