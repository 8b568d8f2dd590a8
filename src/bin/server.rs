//! Trademark Search - HTTP server
//!
//! Environment variables:
//! - `TMSEARCH_PORT` - Server port (default: 3000)
//! - `RUST_LOG` - Log filter (default: info)

use std::sync::Arc;

use tracing::info;

use trademark_search::{web, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = trademark_search::init_logging();

    info!("Starting trademark search server");

    if let Some(dir) = trademark_search::log_dir() {
        info!("Log files saved to: {}", dir.display());
    }

    let port: u16 = std::env::var("TMSEARCH_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let mut config = AppConfig::load();

    // Without a display the browser cannot come up headed; force
    // headless rather than failing the launch.
    let has_display = std::env::var("DISPLAY").map(|d| !d.is_empty()).unwrap_or(false);
    if !config.headless && !has_display {
        info!("No DISPLAY available - forcing headless mode");
        config.headless = true;
    }

    let state = Arc::new(AppState::with_config(config));

    // Bring the browser up before accepting requests so the first search
    // does not pay the launch cost (and a broken Chrome fails fast).
    state.browser.launch().await?;
    info!("Browser ready");

    web::start_server(state, port).await?;

    Ok(())
}
