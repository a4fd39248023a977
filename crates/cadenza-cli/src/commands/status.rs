use anyhow::Result;
use cadenza_core::schema::Database;
use std::path::Path;

pub fn show_status(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::open(db_path)?;
    let counts = db.playlist_counts()?;
    let total: u64 = counts.iter().map(|(_, n)| n).sum();

    println!("\n📊 Cadenza Status\n");
    println!("  Database: {}", db_path.display());
    println!("  Uploaded assets: {}", total);

    if counts.is_empty() {
        println!("\n  Run `cadenza upload` to add tracks");
        return Ok(());
    }

    println!();
    for (playlist, count) in &counts {
        println!("  {playlist:<30} {count:>6}");
    }

    Ok(())
}
