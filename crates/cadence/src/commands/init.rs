//! Initialize cadence in a documentation project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::config::load_config;

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing cadence...");

    if config_path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
    } else {
        fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        tracing::info!("Created {}", config_path.display());
    }

    let config = load_config(config_path)?;
    let music_dir = Path::new(&config.site.docs_dir).join(&config.player.music_dir);

    if !music_dir.exists() {
        fs::create_dir_all(&music_dir).context("Failed to create music directory")?;
        tracing::info!("Created {}", music_dir.display());
    }

    tracing::info!("Initialization complete!");
    tracing::info!(
        "Add {} files to {}, build your site, then run 'cadence inject'.",
        config.player.extension,
        music_dir.display()
    );

    Ok(())
}

pub(crate) const DEFAULT_CONFIG: &str = r#"# Cadence Configuration

[site]
# Documentation source directory
docs_dir = "docs"

# Built site directory
site_dir = "site"

[player]
# Music directory, relative to docs_dir
music_dir = "music"

# Audio file extension (case-insensitive)
extension = ".mp3"

# Player script, relative to each page
script_src = "assets/music_player.js"

# Global variable holding the playlist
playlist_var = "musicFileList"

# Log injection details to the browser console
debug_script = true

# Prefix script_src with ../ for nested pages
relative_to_page = false
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn creates_config_and_music_dir() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("cadence.toml");

        // Relative docs_dir resolves against the working directory; point it
        // at the temp dir instead.
        let config = DEFAULT_CONFIG.replace(
            "docs_dir = \"docs\"",
            &format!("docs_dir = {:?}", temp.path().join("docs").display().to_string()),
        );
        fs::write(&config_path, config).unwrap();

        run(&config_path, false).await.unwrap();

        assert!(temp.path().join("docs").join("music").is_dir());
        let written = fs::read_to_string(&config_path).unwrap();
        assert!(!written.contains("docs_dir = \"docs\""));
    }

    #[tokio::test]
    async fn writes_default_config_when_missing() {
        let temp = tempdir().unwrap();

        // DEFAULT_CONFIG uses a relative docs_dir
        std::env::set_current_dir(temp.path()).unwrap();

        run(Path::new("cadence.toml"), false).await.unwrap();

        let written = fs::read_to_string(temp.path().join("cadence.toml")).unwrap();
        assert_eq!(written, DEFAULT_CONFIG);
        assert!(temp.path().join("docs").join("music").is_dir());
    }
}
