//! Music library discovery.
//!
//! Lists the immediate entries of a music directory and keeps those whose
//! name carries the audio extension. The listing is never sorted: tracks
//! appear in directory enumeration order.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

/// Errors that can occur while listing a music directory.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("Failed to read music directory {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Audio file names discovered in a music directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MusicLibrary {
    tracks: Vec<String>,
}

impl MusicLibrary {
    /// Create a library from known track names.
    pub fn new(tracks: Vec<String>) -> Self {
        Self { tracks }
    }

    /// Scan `dir` for entries whose lowercased name ends with `extension`.
    ///
    /// A missing directory yields an empty library. Any other I/O failure is
    /// returned to the caller.
    pub fn scan(dir: &Path, extension: &str) -> Result<Self, LibraryError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Music directory not found: {}", dir.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(read_error(dir, e)),
        };

        let extension = extension.to_lowercase();
        let mut tracks = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| read_error(dir, e))?;

            let Ok(name) = entry.file_name().into_string() else {
                tracing::debug!(
                    "Skipping entry with non UTF-8 name in {}",
                    dir.display()
                );
                continue;
            };

            if name.to_lowercase().ends_with(&extension) {
                tracks.push(name);
            }
        }

        tracing::debug!("Found {} tracks in {}", tracks.len(), dir.display());

        Ok(Self { tracks })
    }

    /// Track file names in enumeration order.
    pub fn tracks(&self) -> &[String] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Serialize the track list as a JSON array that is safe to embed in a
    /// `<script>` element.
    ///
    /// `</` is written as `<\/`, which JSON and JavaScript both read back as
    /// `</`, so a file name can never close the surrounding element.
    pub fn to_script_json(&self) -> String {
        serde_json::to_string(&self.tracks)
            .unwrap_or_else(|_| "[]".to_string())
            .replace("</", "<\\/")
    }
}

fn read_error(dir: &Path, source: io::Error) -> LibraryError {
    LibraryError::Read {
        path: dir.display().to_string(),
        source,
    }
}

/// Modification state of a music directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirStamp {
    Missing,
    Modified(SystemTime),
    /// Directory exists but the platform reports no mtime; never cached.
    Unknown,
}

impl DirStamp {
    fn read(dir: &Path) -> Result<Self, LibraryError> {
        match fs::metadata(dir) {
            Ok(meta) => Ok(meta
                .modified()
                .map(Self::Modified)
                .unwrap_or(Self::Unknown)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::Missing),
            Err(e) => Err(read_error(dir, e)),
        }
    }
}

#[derive(Debug)]
struct CachedLibrary {
    stamp: DirStamp,
    extension: String,
    library: MusicLibrary,
}

impl CachedLibrary {
    fn is_fresh(&self, stamp: DirStamp, extension: &str) -> bool {
        stamp != DirStamp::Unknown && self.stamp == stamp && self.extension == extension
    }
}

/// Music library cache keyed by directory and its modification time.
///
/// Adding, removing or renaming a file updates the directory mtime, so a
/// lookup re-scans exactly when the listing may have changed. The cache is
/// owned by its caller; nothing is shared process-wide.
#[derive(Debug, Default)]
pub struct LibraryCache {
    entries: HashMap<PathBuf, CachedLibrary>,
    scans: usize,
}

impl LibraryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the library for `dir`, scanning only if the cached listing is stale.
    pub fn get(&mut self, dir: &Path, extension: &str) -> Result<MusicLibrary, LibraryError> {
        let stamp = DirStamp::read(dir)?;

        if let Some(cached) = self.entries.get(dir) {
            if cached.is_fresh(stamp, extension) {
                tracing::debug!("Music library cache hit for {}", dir.display());
                return Ok(cached.library.clone());
            }
        }

        let library = MusicLibrary::scan(dir, extension)?;
        self.scans += 1;

        self.entries.insert(
            dir.to_path_buf(),
            CachedLibrary {
                stamp,
                extension: extension.to_string(),
                library: library.clone(),
            },
        );

        Ok(library)
    }

    /// Number of directory scans performed so far.
    pub fn scans(&self) -> usize {
        self.scans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn backdate(dir: &Path) {
        fs::File::open(dir)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000))
            .unwrap();
    }

    fn sorted(library: &MusicLibrary) -> Vec<String> {
        let mut tracks = library.tracks().to_vec();
        tracks.sort();
        tracks
    }

    #[test]
    fn keeps_only_audio_files() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.mp3"), b"").unwrap();
        fs::write(temp.path().join("B.MP3"), b"").unwrap();
        fs::write(temp.path().join("notes.txt"), b"").unwrap();
        fs::write(temp.path().join("cover.mp3.jpg"), b"").unwrap();

        let library = MusicLibrary::scan(temp.path(), ".mp3").unwrap();

        assert_eq!(library.len(), 2);
        assert_eq!(sorted(&library), vec!["B.MP3", "a.mp3"]);
    }

    #[test]
    fn preserves_enumeration_order() {
        let temp = tempdir().unwrap();
        for name in ["one.mp3", "two.mp3", "three.mp3"] {
            fs::write(temp.path().join(name), b"").unwrap();
        }

        let expected: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();

        let library = MusicLibrary::scan(temp.path(), ".mp3").unwrap();

        assert_eq!(library.tracks(), expected.as_slice());
    }

    #[test]
    fn missing_directory_is_empty() {
        let temp = tempdir().unwrap();

        let library = MusicLibrary::scan(&temp.path().join("music"), ".mp3").unwrap();

        assert!(library.is_empty());
        assert_eq!(library.to_script_json(), "[]");
    }

    #[test]
    fn file_in_place_of_directory_is_an_error() {
        let temp = tempdir().unwrap();
        let not_a_dir = temp.path().join("music");
        fs::write(&not_a_dir, b"").unwrap();

        let result = MusicLibrary::scan(&not_a_dir, ".mp3");

        assert!(matches!(result, Err(LibraryError::Read { .. })));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("Song.Mp3"), b"").unwrap();

        let library = MusicLibrary::scan(temp.path(), ".MP3").unwrap();

        assert_eq!(library.tracks(), ["Song.Mp3".to_string()]);
    }

    #[test]
    fn script_json_escapes_closing_tags() {
        let library = MusicLibrary::new(vec![
            "晴天.mp3".to_string(),
            "</script><b>.mp3".to_string(),
        ]);

        let json = library.to_script_json();

        assert!(!json.contains("</"));
        assert!(json.contains("晴天.mp3"));

        let decoded: Vec<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, library.tracks());
    }

    #[test]
    fn cache_reuses_unchanged_listing() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.mp3"), b"").unwrap();

        let mut cache = LibraryCache::new();
        let first = cache.get(temp.path(), ".mp3").unwrap();
        let second = cache.get(temp.path(), ".mp3").unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.scans(), 1);
    }

    #[test]
    fn cache_rescans_when_directory_appears() {
        let temp = tempdir().unwrap();
        let music = temp.path().join("music");

        let mut cache = LibraryCache::new();
        assert!(cache.get(&music, ".mp3").unwrap().is_empty());

        fs::create_dir(&music).unwrap();
        fs::write(music.join("a.mp3"), b"").unwrap();

        let library = cache.get(&music, ".mp3").unwrap();

        assert_eq!(library.tracks(), ["a.mp3".to_string()]);
        assert_eq!(cache.scans(), 2);
    }

    #[test]
    fn cache_rescans_for_other_extension() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.mp3"), b"").unwrap();
        fs::write(temp.path().join("b.ogg"), b"").unwrap();

        let mut cache = LibraryCache::new();
        cache.get(temp.path(), ".mp3").unwrap();
        let ogg = cache.get(temp.path(), ".ogg").unwrap();

        assert_eq!(ogg.tracks(), ["b.ogg".to_string()]);
        assert_eq!(cache.scans(), 2);
    }

    #[test]
    fn cache_rescans_when_file_is_added() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.mp3"), b"").unwrap();
        backdate(temp.path());

        let mut cache = LibraryCache::new();
        assert_eq!(cache.get(temp.path(), ".mp3").unwrap().len(), 1);

        fs::write(temp.path().join("b.mp3"), b"").unwrap();

        let library = cache.get(temp.path(), ".mp3").unwrap();

        assert_eq!(sorted(&library), vec!["a.mp3", "b.mp3"]);
        assert_eq!(cache.scans(), 2);
    }

    #[test]
    fn cache_keeps_listing_while_mtime_is_unchanged() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.mp3"), b"").unwrap();
        backdate(temp.path());

        let mut cache = LibraryCache::new();
        cache.get(temp.path(), ".mp3").unwrap();

        // Same mtime after the write, so the stale listing is served
        fs::write(temp.path().join("b.mp3"), b"").unwrap();
        backdate(temp.path());

        let library = cache.get(temp.path(), ".mp3").unwrap();

        assert_eq!(library.tracks(), ["a.mp3".to_string()]);
        assert_eq!(cache.scans(), 1);
    }
}
