//! Playlist inspection command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cadence_inject::PageInjector;

use super::config::load_config;

/// Run the playlist command.
pub async fn run(config_path: &Path, docs: Option<PathBuf>) -> Result<()> {
    let file_config = load_config(config_path)?;
    let docs_dir = docs.unwrap_or_else(|| PathBuf::from(&file_config.site.docs_dir));

    let injector = PageInjector::new(file_config.inject_config())?;
    let music_dir = injector.music_dir(&docs_dir);

    let library = injector
        .scan(&docs_dir)
        .with_context(|| format!("Failed to list {}", music_dir.display()))?;

    tracing::info!("Found {} tracks in {}", library.len(), music_dir.display());

    println!("{}", serde_json::to_string_pretty(&library)?);

    Ok(())
}
