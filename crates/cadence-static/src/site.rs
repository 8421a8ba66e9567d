//! Site-wide injection pass.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use walkdir::WalkDir;

use cadence_inject::{
    ConfigError, InjectConfig, Injection, LibraryCache, MusicLibrary, PageInjector,
};

/// Configuration for injecting a built site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Documentation source directory (holds the music directory)
    pub docs_dir: PathBuf,

    /// Built site directory containing the rendered pages
    pub site_dir: PathBuf,

    /// Injector settings
    pub inject: InjectConfig,

    /// Report what would change without writing pages
    pub dry_run: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            site_dir: PathBuf::from("site"),
            inject: InjectConfig::default(),
            dry_run: false,
        }
    }
}

/// Result of an injection pass.
#[derive(Debug)]
pub struct InjectReport {
    /// Number of HTML pages found
    pub pages: usize,

    /// Number of pages that received the payload
    pub injected: usize,

    /// Number of pages that already contained it
    pub skipped: usize,

    /// Number of tracks in the playlist
    pub tracks: usize,

    /// Total time in milliseconds
    pub duration_ms: u64,

    /// Site directory
    pub site_dir: PathBuf,
}

/// Errors that can occur during an injection pass.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Site directory not found: {0}")]
    SiteNotFound(String),

    #[error("Failed to read page {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to inject page {path}: {message}")]
    Inject { path: String, message: String },

    #[error("Failed to write page {path}: {message}")]
    Write { path: String, message: String },
}

/// A rendered page in the site directory.
#[derive(Debug)]
struct PageInfo {
    /// File path
    path: PathBuf,

    /// Site-relative URL
    url: String,
}

/// Injects the music playlist into every page of a built site.
pub struct SiteInjector {
    config: SiteConfig,
    injector: PageInjector,
    cache: LibraryCache,
}

impl SiteInjector {
    /// Create a new site injector.
    pub fn new(config: SiteConfig) -> Result<Self, SiteError> {
        let injector = PageInjector::new(config.inject.clone())?;

        Ok(Self {
            config,
            injector,
            cache: LibraryCache::new(),
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Music directory this injector reads.
    pub fn music_dir(&self) -> PathBuf {
        self.injector.music_dir(&self.config.docs_dir)
    }

    /// Run one pass over the site.
    ///
    /// The music library is listed once per pass and reused across passes
    /// until the music directory changes.
    pub fn run(&mut self) -> Result<InjectReport, SiteError> {
        let start = Instant::now();

        if !self.config.site_dir.is_dir() {
            return Err(SiteError::SiteNotFound(
                self.config.site_dir.display().to_string(),
            ));
        }

        let library = self.library();
        let pages = self.discover_pages();

        tracing::debug!(
            "Injecting {} tracks into {} pages under {}",
            library.len(),
            pages.len(),
            self.config.site_dir.display()
        );

        let results: Vec<Result<bool, SiteError>> = pages
            .par_iter()
            .map(|page| self.inject_page(page, &library))
            .collect();

        let mut injected = 0;
        for result in results {
            if result? {
                injected += 1;
            }
        }

        let duration = start.elapsed();

        Ok(InjectReport {
            pages: pages.len(),
            injected,
            skipped: pages.len() - injected,
            tracks: library.len(),
            duration_ms: duration.as_millis() as u64,
            site_dir: self.config.site_dir.clone(),
        })
    }

    /// List the music library, degrading to an empty playlist on read errors.
    fn library(&mut self) -> MusicLibrary {
        let music_dir = self.music_dir();

        match self.cache.get(&music_dir, &self.config.inject.extension) {
            Ok(library) => library,
            Err(e) => {
                tracing::warn!("{}; injecting an empty playlist", e);
                MusicLibrary::default()
            }
        }
    }

    /// Discover all HTML pages in the site directory.
    fn discover_pages(&self) -> Vec<PageInfo> {
        WalkDir::new(&self.config.site_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                let ext = entry.path().extension().and_then(|e| e.to_str()).unwrap_or("");
                ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm")
            })
            .map(|entry| {
                let path = entry.into_path();
                let relative = path
                    .strip_prefix(&self.config.site_dir)
                    .unwrap_or(&path)
                    .to_path_buf();

                PageInfo {
                    url: page_url(&relative),
                    path,
                }
            })
            .collect()
    }

    /// Inject a single page. Returns whether the page changed.
    fn inject_page(&self, page: &PageInfo, library: &MusicLibrary) -> Result<bool, SiteError> {
        let html = fs::read_to_string(&page.path).map_err(|e| SiteError::Read {
            path: page.path.display().to_string(),
            message: e.to_string(),
        })?;

        let injection = self
            .injector
            .inject_library(&html, &page.url, library)
            .map_err(|e| SiteError::Inject {
                path: page.path.display().to_string(),
                message: e.to_string(),
            })?;

        let Injection::Injected { html, .. } = injection else {
            tracing::debug!("Skipped {}", page.url);
            return Ok(false);
        };

        if self.config.dry_run {
            tracing::info!("Would inject {}", page.path.display());
            return Ok(true);
        }

        fs::write(&page.path, html).map_err(|e| SiteError::Write {
            path: page.path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(true)
    }
}

/// Convert a site-relative page path to its URL.
///
/// `index.html` maps to its directory (`guide/index.html` -> `guide/`,
/// `index.html` -> empty); every other page keeps its file name.
fn page_url(relative: &Path) -> String {
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();

    match parts.split_last() {
        Some((file, dirs)) if file == "index.html" => {
            if dirs.is_empty() {
                String::new()
            } else {
                format!("{}/", dirs.join("/"))
            }
        }
        _ => parts.join("/"),
    }
}
