//! Post-build pass for static documentation sites.
//!
//! Walks a built site directory and injects the music playlist into every
//! HTML page, optionally re-running whenever the site is rebuilt.

pub mod site;
pub mod watcher;

pub use site::{InjectReport, SiteConfig, SiteError, SiteInjector};
pub use watcher::{SiteWatcher, WatchEvent};
