//! Preview server command.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::Router;
use cadence_static::SiteInjector;
use tower_http::services::ServeDir;

use super::config::load_config;

/// Run the serve command.
pub async fn run(
    config_path: &Path,
    port: u16,
    dir: Option<PathBuf>,
    inject: bool,
    open_browser: bool,
) -> Result<()> {
    let file_config = load_config(config_path)?;
    let config = file_config.site_config(dir, None, false);
    let dir = config.site_dir.clone();

    if !dir.exists() {
        anyhow::bail!(
            "Directory not found: {}. Build your site first.",
            dir.display()
        );
    }

    if inject {
        let report = SiteInjector::new(config)?.run()?;
        tracing::info!(
            "Injected {} of {} pages with {} tracks",
            report.injected,
            report.pages,
            report.tracks
        );
    }

    let addr: SocketAddr = format!("127.0.0.1:{}", port)
        .parse()
        .context("Invalid address")?;

    tracing::info!("Serving {} at http://{}", dir.display(), addr);

    let app = Router::new().fallback_service(ServeDir::new(&dir));

    let listener = tokio::net::TcpListener::bind(addr).await?;

    if open_browser {
        let url = format!("http://{}", addr);
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;

    Ok(())
}
