//! Configuration file (cadence.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cadence_inject::config::{
    DEFAULT_EXTENSION, DEFAULT_MUSIC_DIR, DEFAULT_PLAYLIST_VAR, DEFAULT_SCRIPT_SRC,
};
use cadence_inject::InjectConfig;
use cadence_static::SiteConfig;
use serde::Deserialize;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub player: PlayerSection,
}

#[derive(Debug, Deserialize)]
pub struct SiteSection {
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,
    #[serde(default = "default_site_dir")]
    pub site_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct PlayerSection {
    #[serde(default = "default_music_dir")]
    pub music_dir: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_script_src")]
    pub script_src: String,
    #[serde(default = "default_playlist_var")]
    pub playlist_var: String,
    #[serde(default = "default_true")]
    pub debug_script: bool,
    #[serde(default)]
    pub relative_to_page: bool,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            site_dir: default_site_dir(),
        }
    }
}

impl Default for PlayerSection {
    fn default() -> Self {
        Self {
            music_dir: default_music_dir(),
            extension: default_extension(),
            script_src: default_script_src(),
            playlist_var: default_playlist_var(),
            debug_script: true,
            relative_to_page: false,
        }
    }
}

fn default_docs_dir() -> String {
    "docs".to_string()
}
fn default_site_dir() -> String {
    "site".to_string()
}
fn default_music_dir() -> String {
    DEFAULT_MUSIC_DIR.to_string()
}
fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}
fn default_script_src() -> String {
    DEFAULT_SCRIPT_SRC.to_string()
}
fn default_playlist_var() -> String {
    DEFAULT_PLAYLIST_VAR.to_string()
}
fn default_true() -> bool {
    true
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        tracing::debug!("No {} found, using defaults", path.display());
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

fn parse_config(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(content)?)
}

impl ConfigFile {
    /// Injector settings from the `[player]` section.
    pub fn inject_config(&self) -> InjectConfig {
        InjectConfig {
            music_dir: self.player.music_dir.clone(),
            extension: self.player.extension.clone(),
            script_src: self.player.script_src.clone(),
            playlist_var: self.player.playlist_var.clone(),
            debug_script: self.player.debug_script,
            relative_to_page: self.player.relative_to_page,
        }
    }

    /// Site settings, with command line overrides taking precedence.
    pub fn site_config(
        &self,
        site_dir: Option<PathBuf>,
        docs_dir: Option<PathBuf>,
        dry_run: bool,
    ) -> SiteConfig {
        SiteConfig {
            docs_dir: docs_dir.unwrap_or_else(|| PathBuf::from(&self.site.docs_dir)),
            site_dir: site_dir.unwrap_or_else(|| PathBuf::from(&self.site.site_dir)),
            inject: self.inject_config(),
            dry_run,
        }
    }
}
