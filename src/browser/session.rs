//! Browser session management
//!
//! Owns the single long-lived Chromium instance shared by every search
//! workflow and hands out isolated page handles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::BrowserError;

/// Find Chrome/Chromium executable on the system
fn find_chrome() -> Option<std::path::PathBuf> {
    let candidates: Vec<std::path::PathBuf> = if cfg!(target_os = "windows") {
        let mut paths = vec![
            std::path::PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            std::path::PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            paths.push(std::path::PathBuf::from(format!(
                r"{}\Google\Chrome\Application\chrome.exe",
                local
            )));
        }
        paths
    } else if cfg!(target_os = "macos") {
        vec![
            std::path::PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            std::path::PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    } else {
        vec![
            std::path::PathBuf::from("/usr/bin/google-chrome"),
            std::path::PathBuf::from("/usr/bin/google-chrome-stable"),
            std::path::PathBuf::from("/usr/bin/chromium"),
            std::path::PathBuf::from("/usr/bin/chromium-browser"),
        ]
    };

    candidates.into_iter().find(|p| p.exists())
}

/// Configuration for the browser session
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserSessionConfig {
    /// Path to Chrome/Chromium executable
    pub chrome_path: Option<String>,
    /// Run in headless mode
    pub headless: bool,
    /// User data directory. When set the browser runs against a persistent
    /// profile; when unset every launch starts from a clean ephemeral one.
    pub user_data_dir: Option<String>,
    /// Launch timeout in seconds
    pub launch_timeout_secs: u64,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
}

impl Default for BrowserSessionConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            user_data_dir: None,
            launch_timeout_secs: 45,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

impl BrowserSessionConfig {
    /// Set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set Chrome path
    pub fn chrome_path(mut self, path: Option<String>) -> Self {
        self.chrome_path = path;
        self
    }

    /// Set user data directory (persistent profile)
    pub fn user_data_dir(mut self, dir: Option<String>) -> Self {
        self.user_data_dir = dir;
        self
    }
}

/// The shared browser session.
///
/// `launch()` is lazy and idempotent; `new_page()` hands out an isolated
/// tab owned exclusively by one workflow; `close()` tears the instance
/// down and resets the session so it can be launched again.
pub struct BrowserSession {
    config: BrowserSessionConfig,
    browser: RwLock<Option<Browser>>,
    alive: Arc<AtomicBool>,
}

impl BrowserSession {
    /// Create a new, unlaunched session with the given config
    pub fn new(config: BrowserSessionConfig) -> Self {
        Self {
            config,
            browser: RwLock::new(None),
            alive: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the underlying Chrome process is still connected
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Launch the browser instance.
    ///
    /// Repeated calls before `close()` return the existing instance.
    pub async fn launch(&self) -> Result<(), BrowserError> {
        {
            let guard = self.browser.read().await;
            if guard.is_some() {
                debug!("Browser already launched");
                return Ok(());
            }
        }

        let mut guard = self.browser.write().await;
        // A concurrent caller may have won the race while we waited
        if guard.is_some() {
            return Ok(());
        }

        if self.config.chrome_path.is_none() && find_chrome().is_none() {
            return Err(BrowserError::LaunchFailed(
                "No Chrome/Chromium executable found. Install Chrome or set chromePath.".to_string(),
            ));
        }

        let mut builder = BrowserConfig::builder();

        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = self.config.chrome_path {
            builder = builder.chrome_executable(path);
        } else if let Some(chrome_path) = find_chrome() {
            info!("Auto-detected Chrome at: {}", chrome_path.display());
            builder = builder.chrome_executable(chrome_path);
        }

        if let Some(ref dir) = self.config.user_data_dir {
            let _ = std::fs::create_dir_all(dir);
            info!("Using persistent profile at {}", dir);
            builder = builder.user_data_dir(dir);
        }

        builder = builder
            .window_size(self.config.window_width, self.config.window_height)
            .args(vec![
                "--disable-dev-shm-usage",
                "--disable-notifications",
                "--no-default-browser-check",
                "--no-first-run",
                // Required when running as root (e.g., in Docker or on a VPS)
                "--no-sandbox",
            ]);

        let browser_config = builder
            .build()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        info!("Launching browser (headless: {})", self.config.headless);

        let (browser, mut handler) = tokio::time::timeout(
            Duration::from_secs(self.config.launch_timeout_secs),
            Browser::launch(browser_config),
        )
        .await
        .map_err(|_| BrowserError::Timeout("Browser launch timed out".into()))?
        .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // Drive CDP events in the background; when the handler stream ends
        // Chrome has disconnected or crashed.
        self.alive.store(true, Ordering::Relaxed);
        let alive_for_handler = self.alive.clone();
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error: {}", e);
                }
            }
            warn!("Chrome disconnected (event handler ended)");
            alive_for_handler.store(false, Ordering::Relaxed);
        });

        *guard = Some(browser);
        info!("Browser session launched");
        Ok(())
    }

    /// Open a fresh, isolated page handle.
    ///
    /// Fails with `NotInitialized` before `launch()` has completed. The
    /// caller owns the page and is responsible for closing it.
    pub async fn new_page(&self) -> Result<Page, BrowserError> {
        let guard = self.browser.read().await;
        let browser = guard.as_ref().ok_or(BrowserError::NotInitialized)?;

        browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))
    }

    /// Close the browser instance and reset initialization state
    pub async fn close(&self) -> Result<(), BrowserError> {
        self.alive.store(false, Ordering::Relaxed);

        let mut guard = self.browser.write().await;
        if let Some(mut browser) = guard.take() {
            // Graceful close first, then force kill so no Chrome child
            // processes outlive us.
            let _ = browser.close().await;
            tokio::time::sleep(Duration::from_millis(500)).await;
            let _ = browser.kill().await;
            info!("Browser session closed");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_ephemeral() {
        let config = BrowserSessionConfig::default();
        assert!(config.user_data_dir.is_none());
        assert!(config.headless);
    }

    #[tokio::test]
    async fn new_page_before_launch_is_rejected() {
        let session = BrowserSession::new(BrowserSessionConfig::default());
        let err = session.new_page().await.unwrap_err();
        assert!(matches!(err, BrowserError::NotInitialized));
    }

    #[tokio::test]
    async fn close_without_launch_is_a_noop() {
        let session = BrowserSession::new(BrowserSessionConfig::default());
        assert!(session.close().await.is_ok());
        assert!(!session.is_alive());
    }
}
