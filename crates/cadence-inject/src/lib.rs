//! Music playlist injection for rendered documentation pages.
//!
//! Scans a docs `music` directory for audio files and injects the resulting
//! playlist, plus a reference to the client-side player script, into each
//! rendered HTML page.

pub mod config;
pub mod injector;
pub mod library;
pub mod payload;

pub use config::{ConfigError, InjectConfig};
pub use injector::{InjectError, Injection, PageInjector};
pub use library::{LibraryCache, LibraryError, MusicLibrary};
pub use payload::{PayloadContext, PayloadRenderer};
