//! File watching for re-injecting rebuilt sites.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the site watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// An HTML page was written or created
    PageChanged(PathBuf),

    /// The music directory gained, lost or changed a file
    MusicChanged(PathBuf),
}

/// Watches a site directory and its music directory.
pub struct SiteWatcher {
    _watcher: RecommendedWatcher,
}

/// Quiet period that ends a burst of events.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Longest a burst is held back before its events are forwarded anyway.
const MAX_BATCH: Duration = Duration::from_secs(1);

impl SiteWatcher {
    /// Create a watcher for `site_dir` and `music_dir`.
    ///
    /// Relative paths are resolved against the working directory, since
    /// notify reports absolute event paths. Paths that do not exist yet are
    /// not watched. Returns the watcher and a channel to receive events.
    pub fn new(
        site_dir: &Path,
        music_dir: &Path,
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let site_dir = absolute_path(site_dir)?;
        let music_dir = absolute_path(music_dir)?;

        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in [&site_dir, &music_dir] {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            } else {
                tracing::debug!("Not watching missing path {}", path.display());
            }
        }

        std::thread::spawn(move || {
            let mut pending: Vec<WatchEvent> = Vec::new();
            let mut batch_start = Instant::now();

            loop {
                // Coalesce bursts from a generator rewriting many pages
                match sync_rx.recv_timeout(DEBOUNCE) {
                    Ok(event) => {
                        if pending.is_empty() {
                            batch_start = Instant::now();
                        }
                        for path in event.paths {
                            if let Some(e) = classify_event(&path, &event.kind, &music_dir) {
                                if !pending.contains(&e) {
                                    pending.push(e);
                                }
                            }
                        }
                        if batch_start.elapsed() < MAX_BATCH {
                            continue;
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }

                for e in pending.drain(..) {
                    if async_tx.blocking_send(e).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Resolve `path` against the working directory without touching the filesystem.
fn absolute_path(path: &Path) -> Result<PathBuf, std::io::Error> {
    std::path::absolute(path)
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &notify::EventKind, music_dir: &Path) -> Option<WatchEvent> {
    use notify::EventKind;

    if !matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return None;
    }

    if path.starts_with(music_dir) {
        return Some(WatchEvent::MusicChanged(path.to_path_buf()));
    }

    if matches!(kind, EventKind::Remove(_)) {
        return None;
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") {
        Some(WatchEvent::PageChanged(path.to_path_buf()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use notify::EventKind;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn classifies_events() {
        let music = Path::new("/docs/music");

        assert_eq!(
            classify_event(
                Path::new("/site/guide/index.html"),
                &EventKind::Modify(ModifyKind::Any),
                music
            ),
            Some(WatchEvent::PageChanged(PathBuf::from("/site/guide/index.html")))
        );
        assert_eq!(
            classify_event(
                Path::new("/docs/music/a.mp3"),
                &EventKind::Remove(RemoveKind::File),
                music
            ),
            Some(WatchEvent::MusicChanged(PathBuf::from("/docs/music/a.mp3")))
        );
        assert_eq!(
            classify_event(
                Path::new("/site/assets/main.css"),
                &EventKind::Create(CreateKind::File),
                music
            ),
            None
        );
        assert_eq!(
            classify_event(
                Path::new("/site/old.html"),
                &EventKind::Remove(RemoveKind::File),
                music
            ),
            None
        );
    }

    #[tokio::test]
    async fn watches_page_writes() {
        let temp = tempdir().unwrap();
        let site = temp.path().join("site");
        fs::create_dir_all(&site).unwrap();

        let (watcher, mut rx) = SiteWatcher::new(&site, &temp.path().join("music")).unwrap();

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(150)).await;

        fs::write(site.join("index.html"), "<body></body>").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;

        drop(watcher);

        assert!(event.is_ok(), "timeout waiting for file watch event");
        assert!(matches!(
            event.unwrap(),
            Some(WatchEvent::PageChanged(_))
        ));
    }

    #[tokio::test]
    async fn forwards_every_page_in_a_burst() {
        let temp = tempdir().unwrap();
        let site = temp.path().join("site");
        fs::create_dir_all(&site).unwrap();

        let (watcher, mut rx) = SiteWatcher::new(&site, &temp.path().join("music")).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        let names = ["a.html", "b.html", "c.html", "d.html", "e.html"];
        for name in names {
            fs::write(site.join(name), "<body></body>").unwrap();
        }

        let mut seen = Vec::new();
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_secs(2), rx.recv()).await
        {
            if let WatchEvent::PageChanged(path) = event {
                seen.push(path.file_name().unwrap().to_string_lossy().to_string());
            }
            if names.iter().all(|n| seen.iter().any(|s| s == n)) {
                break;
            }
        }

        drop(watcher);

        for name in names {
            assert!(seen.iter().any(|s| s == name), "missing event for {name}");
        }
    }

    #[tokio::test]
    async fn reports_music_changes_for_relative_paths() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("site")).unwrap();
        fs::create_dir_all(temp.path().join("docs").join("music")).unwrap();

        // Default config paths are relative to the working directory
        std::env::set_current_dir(temp.path()).unwrap();

        let (watcher, mut rx) =
            SiteWatcher::new(Path::new("site"), Path::new("docs/music")).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        fs::write(temp.path().join("docs").join("music").join("a.mp3"), b"").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;

        drop(watcher);

        assert!(
            matches!(event, Ok(Some(WatchEvent::MusicChanged(_)))),
            "unexpected event: {event:?}"
        );
    }
}
