//! Discover audio files on disk for batch ingestion.

use lofty::file::TaggedFileExt;
use lofty::tag::Accessor;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// An audio file found while walking a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Embedded title tag, or the file stem when there is none.
    pub title: String,
    pub file_size: u64,
}

/// Returns `true` for extensions the decoder handles.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        matches!(
            ext.to_string_lossy().to_lowercase().as_ref(),
            "flac" | "mp3" | "ogg" | "oga" | "wav" | "m4a" | "aac"
        )
    })
}

/// Title from embedded tags, falling back to the file stem.
pub fn read_title(path: &Path) -> String {
    let tagged = match lofty::read_from_path(path) {
        Ok(tagged) => Some(tagged),
        Err(e) => {
            log::debug!("No readable tags in {}: {}", path.display(), e);
            None
        }
    };

    tagged
        .as_ref()
        .and_then(|t| t.primary_tag().or_else(|| t.first_tag()))
        .and_then(|tag| tag.title().map(|s| s.to_string()))
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| file_stem(path))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Walk `dir` and return every audio file, sorted by path.
///
/// Unreadable entries are logged and skipped.
pub fn discover_audio_files(dir: &Path) -> Vec<DiscoveredFile> {
    let mut files: Vec<DiscoveredFile> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_audio_file(entry.path()))
        .map(|entry| {
            let path = entry.path().to_path_buf();
            let file_size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            DiscoveredFile {
                title: read_title(&path),
                path,
                file_size,
            }
        })
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("/music/test.flac")));
        assert!(is_audio_file(Path::new("/music/test.MP3")));
        assert!(is_audio_file(Path::new("/music/test.ogg")));
        assert!(!is_audio_file(Path::new("/music/test.txt")));
        assert!(!is_audio_file(Path::new("/music/test")));
    }

    #[test]
    fn test_discover_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert!(discover_audio_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_discover_skips_non_audio_and_recurses() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("album");
        fs::create_dir(&nested).unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "not audio").unwrap();
        fs::write(nested.join("b-side.wav"), b"RIFF").unwrap();
        fs::write(temp_dir.path().join("a-side.mp3"), b"ID3").unwrap();

        let files = discover_audio_files(temp_dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].path.ends_with("a-side.mp3"));
        assert!(files[1].path.ends_with("album/b-side.wav"));
        // Untagged files fall back to their stem.
        assert_eq!(files[0].title, "a-side");
        assert_eq!(files[1].title, "b-side");
        assert_eq!(files[0].file_size, 3);
    }
}
