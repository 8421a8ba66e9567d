//! Site injection command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use cadence_static::{InjectReport, SiteInjector, SiteWatcher, WatchEvent};

use super::config::load_config;

/// Time to let a rebuild finish before re-injecting.
const SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Run the inject command.
pub async fn run(
    config_path: &Path,
    site: Option<PathBuf>,
    docs: Option<PathBuf>,
    dry_run: bool,
    watch: bool,
) -> Result<()> {
    let file_config = load_config(config_path)?;
    let config = file_config.site_config(site, docs, dry_run);

    let mut injector = SiteInjector::new(config)?;

    tracing::info!(
        "Injecting playlist into {}...",
        injector.config().site_dir.display()
    );
    log_report(&injector.run()?, dry_run);

    if watch {
        watch_site(&mut injector).await?;
    }

    Ok(())
}

/// Re-run the pass whenever pages or music files change.
async fn watch_site(injector: &mut SiteInjector) -> Result<()> {
    let site_dir = injector.config().site_dir.clone();
    let music_dir = injector.music_dir();

    let (watcher, mut rx) =
        SiteWatcher::new(&site_dir, &music_dir).context("Failed to start file watcher")?;

    tracing::info!("Watching {} for rebuilds (Ctrl+C to stop)", site_dir.display());

    while let Some(event) = rx.recv().await {
        match &event {
            WatchEvent::PageChanged(path) => {
                tracing::debug!("Page changed: {}", path.display());
            }
            WatchEvent::MusicChanged(path) => {
                tracing::info!(
                    "Music changed: {}; rebuilt pages will get the new playlist",
                    path.display()
                );
            }
        }

        // Coalesce the rest of the rebuild into one pass
        tokio::time::sleep(SETTLE_DELAY).await;
        while rx.try_recv().is_ok() {}

        match injector.run() {
            Ok(report) if report.injected > 0 => log_report(&report, injector.config().dry_run),
            Ok(_) => tracing::debug!("No pages needed injection"),
            Err(e) => tracing::error!("Injection failed: {}", e),
        }
    }

    drop(watcher);
    Ok(())
}

fn log_report(report: &InjectReport, dry_run: bool) {
    let verb = if dry_run { "Would inject" } else { "Injected" };

    tracing::info!(
        "{} {} of {} pages ({} already injected) with {} tracks in {}ms",
        verb,
        report.injected,
        report.pages,
        report.skipped,
        report.tracks,
        report.duration_ms
    );
}
