//! Injector configuration.

use std::path::Path;

/// Subdirectory of the docs directory that holds audio files.
pub const DEFAULT_MUSIC_DIR: &str = "music";

/// Audio file extension, compared case-insensitively.
pub const DEFAULT_EXTENSION: &str = ".mp3";

/// Player script reference, relative to the page.
pub const DEFAULT_SCRIPT_SRC: &str = "assets/music_player.js";

/// Global variable the player reads the playlist from.
pub const DEFAULT_PLAYLIST_VAR: &str = "musicFileList";

/// Configuration for a [`PageInjector`](crate::PageInjector).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectConfig {
    /// Music directory, relative to the docs directory
    pub music_dir: String,

    /// Audio file extension including the leading dot
    pub extension: String,

    /// Player script path, relative to the page
    pub script_src: String,

    /// Name of the `window` global holding the playlist
    pub playlist_var: String,

    /// Emit the console diagnostic script
    pub debug_script: bool,

    /// Prefix `script_src` with one `../` per directory level of the page URL
    pub relative_to_page: bool,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            music_dir: DEFAULT_MUSIC_DIR.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            script_src: DEFAULT_SCRIPT_SRC.to_string(),
            playlist_var: DEFAULT_PLAYLIST_VAR.to_string(),
            debug_script: true,
            relative_to_page: false,
        }
    }
}

/// Errors in an injector configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Script path must be relative to the page: {0}")]
    AbsoluteScriptSrc(String),

    #[error("Script path has no file name: {0:?}")]
    MissingScriptName(String),

    #[error("Script path contains characters not allowed in an attribute: {0}")]
    UnsafeScriptSrc(String),

    #[error("Invalid playlist variable name: {0:?}")]
    InvalidPlaylistVar(String),

    #[error("Audio extension must not be empty")]
    EmptyExtension,
}

impl InjectConfig {
    /// Check that the configuration produces a well-formed payload.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let src = self.script_src.as_str();

        if src.starts_with('/') || src.starts_with('\\') || src.contains("://") {
            return Err(ConfigError::AbsoluteScriptSrc(self.script_src.clone()));
        }

        if src
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>'))
        {
            return Err(ConfigError::UnsafeScriptSrc(self.script_src.clone()));
        }

        if self.marker().is_empty() {
            return Err(ConfigError::MissingScriptName(self.script_src.clone()));
        }

        if !is_js_identifier(&self.playlist_var) {
            return Err(ConfigError::InvalidPlaylistVar(self.playlist_var.clone()));
        }

        if self.extension.trim().is_empty() {
            return Err(ConfigError::EmptyExtension);
        }

        Ok(())
    }

    /// Substring whose presence marks a page as already injected.
    ///
    /// This is the file name component of `script_src`.
    pub fn marker(&self) -> &str {
        Path::new(&self.script_src)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
    }
}

/// Check for a plain (non-dotted) JavaScript identifier.
fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}
