//! Page injector.
//!
//! Inserts the playlist and player script into a rendered page unless the
//! page already references the player script.

use std::path::{Path, PathBuf};

use crate::config::{ConfigError, InjectConfig};
use crate::library::{LibraryError, MusicLibrary};
use crate::payload::{PayloadContext, PayloadRenderer};

const BODY_CLOSE: &str = "</body>";

/// Outcome of injecting a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    /// The page already contained the injection marker
    Skipped,

    /// The payload was inserted
    Injected {
        /// Modified page HTML
        html: String,
        /// Number of tracks in the injected playlist
        tracks: usize,
    },
}

/// Errors that can occur while injecting a page.
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error("Failed to render payload: {0}")]
    Render(String),
}

/// Injects the music playlist and player script into rendered pages.
///
/// The injector holds no per-page state; the music directory is listed on
/// every call to [`inject`](Self::inject) and [`try_inject`](Self::try_inject).
pub struct PageInjector {
    config: InjectConfig,
    renderer: PayloadRenderer,
}

impl PageInjector {
    /// Create an injector from a validated configuration.
    pub fn new(config: InjectConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            renderer: PayloadRenderer::new(),
        })
    }

    pub fn config(&self) -> &InjectConfig {
        &self.config
    }

    /// Substring that marks a page as already injected.
    pub fn marker(&self) -> &str {
        self.config.marker()
    }

    /// Whether `html` already references the player script.
    pub fn is_injected(&self, html: &str) -> bool {
        html.contains(self.marker())
    }

    /// Music directory for a docs directory.
    pub fn music_dir(&self, docs_dir: &Path) -> PathBuf {
        docs_dir.join(&self.config.music_dir)
    }

    /// List the music library under `docs_dir`.
    pub fn scan(&self, docs_dir: &Path) -> Result<MusicLibrary, LibraryError> {
        MusicLibrary::scan(&self.music_dir(docs_dir), &self.config.extension)
    }

    /// Inject the playlist and player script into `html`.
    ///
    /// Never fails: a music directory that cannot be read is logged and
    /// treated as empty, and a page that already contains the marker is
    /// returned unchanged.
    pub fn inject(&self, html: &str, page_url: &str, docs_dir: &Path) -> String {
        tracing::debug!("Processing page: {}", page_url);

        if self.is_injected(html) {
            tracing::debug!("Page already contains {}, skipping", self.marker());
            return html.to_string();
        }

        let library = self.scan(docs_dir).unwrap_or_else(|e| {
            tracing::warn!("{}; injecting an empty playlist into {}", e, page_url);
            MusicLibrary::default()
        });

        match self.inject_library(html, page_url, &library) {
            Ok(Injection::Injected { html, .. }) => html,
            Ok(Injection::Skipped) => html.to_string(),
            Err(e) => {
                tracing::warn!("Leaving {} unchanged: {}", page_url, e);
                html.to_string()
            }
        }
    }

    /// Inject into `html`, returning the outcome and any read failure.
    pub fn try_inject(
        &self,
        html: &str,
        page_url: &str,
        docs_dir: &Path,
    ) -> Result<Injection, InjectError> {
        if self.is_injected(html) {
            return Ok(Injection::Skipped);
        }

        let library = self.scan(docs_dir)?;
        self.inject_library(html, page_url, &library)
    }

    /// Inject an already listed library into `html`.
    pub fn inject_library(
        &self,
        html: &str,
        page_url: &str,
        library: &MusicLibrary,
    ) -> Result<Injection, InjectError> {
        if self.is_injected(html) {
            tracing::debug!("{} already injected", page_url);
            return Ok(Injection::Skipped);
        }

        let script_src = self.script_src_for(page_url);
        tracing::debug!(
            "Injecting {} tracks into {} with script {}",
            library.len(),
            page_url,
            script_src
        );

        let payload = self
            .renderer
            .render(&PayloadContext {
                playlist_var: self.config.playlist_var.clone(),
                playlist_json: library.to_script_json(),
                script_src,
                debug_script: self.config.debug_script,
            })
            .map_err(|e| InjectError::Render(e.to_string()))?;

        Ok(Injection::Injected {
            html: insert_payload(html, &payload),
            tracks: library.len(),
        })
    }

    /// Player script reference for a page.
    ///
    /// Always relative. With `relative_to_page`, one `../` is prepended per
    /// directory level of `page_url` (`guide/setup/` has two).
    pub fn script_src_for(&self, page_url: &str) -> String {
        if !self.config.relative_to_page {
            return self.config.script_src.clone();
        }

        let path = page_url
            .split(['?', '#'])
            .next()
            .unwrap_or("")
            .trim_start_matches('/');
        let depth = path.matches('/').count();

        format!("{}{}", "../".repeat(depth), self.config.script_src)
    }
}

impl Default for PageInjector {
    fn default() -> Self {
        Self {
            config: InjectConfig::default(),
            renderer: PayloadRenderer::new(),
        }
    }
}

/// Place the payload before a trailing `</body>`, or append it.
fn insert_payload(html: &str, payload: &str) -> String {
    let html = html.trim_end();

    match html.strip_suffix(BODY_CLOSE) {
        Some(head) => {
            tracing::debug!("Inserting payload before {}", BODY_CLOSE);
            format!("{head}\n{payload}\n{BODY_CLOSE}")
        }
        None => {
            tracing::debug!("No trailing {}, appending payload", BODY_CLOSE);
            format!("{html}\n{payload}\n")
        }
    }
}
