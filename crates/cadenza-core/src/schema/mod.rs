mod db;
mod migrations;
mod store;

pub use db::{AssetFilter, Database};
pub use migrations::{Migration, MIGRATIONS};
pub use store::{AssetStore, SqliteAssetStore};
