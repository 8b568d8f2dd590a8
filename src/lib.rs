//! Trademark Search
//!
//! An HTTP facade over the UK IPO trademark text search form. The
//! registry exposes no public API, so every search drives the remote
//! multi-page form through a shared Chromium instance; a throttled job
//! queue bounds how many of those workflows run at once.

pub mod browser;
pub mod queue;
pub mod stats;
pub mod trademarks;
pub mod web;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use browser::{BrowserSession, BrowserSessionConfig};
use queue::{QueueConfig, SearchQueue};
use stats::GlobalStats;

/// Application configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Run the browser headless
    pub headless: bool,
    /// Explicit Chrome/Chromium path (auto-detected when unset)
    #[serde(default)]
    pub chrome_path: Option<String>,
    /// Persistent browser profile directory; unset means an ephemeral
    /// instance per launch
    #[serde(default)]
    pub profile_dir: Option<String>,
    /// Search queue limits
    #[serde(default)]
    pub queue: QueueConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_path: None,
            profile_dir: None,
            queue: QueueConfig::default(),
        }
    }
}

/// Get log directory path (shared across modules)
pub fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("trademark-search").join("logs"))
}

impl AppConfig {
    /// Get config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("trademark-search").join("config.json"))
    }

    /// Load config from file
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(content) => match serde_json::from_str(&content) {
                        Ok(config) => {
                            info!("Loaded config from {:?}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file: {}", e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file: {}", e);
                    }
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    error!("Failed to create config directory: {}", e);
                    return;
                }
            }

            match serde_json::to_string_pretty(self) {
                Ok(content) => {
                    if let Err(e) = std::fs::write(&path, content) {
                        error!("Failed to save config: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize config: {}", e);
                }
            }
        }
    }
}

/// Application state shared across the app.
///
/// Built once, in dependency order, and handed around as `Arc<AppState>`.
/// The browser's actual launch is a separate explicit step so the binary
/// controls when Chrome comes up.
pub struct AppState {
    /// Shared browser session
    pub browser: Arc<BrowserSession>,
    /// Search job queue
    pub queue: Arc<SearchQueue>,
    /// Global statistics
    pub stats: Arc<GlobalStats>,
    /// Application configuration
    pub config: Arc<RwLock<AppConfig>>,
}

impl AppState {
    /// Create application state from the saved config
    pub fn new() -> Self {
        Self::with_config(AppConfig::load())
    }

    /// Create application state from an explicit config
    pub fn with_config(config: AppConfig) -> Self {
        let browser_config = BrowserSessionConfig::default()
            .headless(config.headless)
            .chrome_path(config.chrome_path.clone())
            .user_data_dir(config.profile_dir.clone());

        Self {
            browser: Arc::new(BrowserSession::new(browser_config)),
            queue: Arc::new(SearchQueue::new(config.queue.clone())),
            stats: Arc::new(GlobalStats::new()),
            config: Arc::new(RwLock::new(config)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize logging
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "trademark-search.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}
