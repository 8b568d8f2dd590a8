//! Polling helpers for page state.
//!
//! CDP exposes no waitForSelector/waitForURL primitives, so waits are
//! bounded poll loops over small script evaluations.

use std::time::{Duration, Instant};

use chromiumoxide::Page;

use crate::browser::BrowserError;

/// Poll interval for all bounded waits
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn quote(value: &str) -> Result<String, BrowserError> {
    serde_json::to_string(value).map_err(|e| BrowserError::JavaScriptError(e.to_string()))
}

/// Evaluate a script expected to produce a boolean
pub(crate) async fn eval_bool(page: &Page, script: &str) -> Result<bool, BrowserError> {
    let result = page
        .evaluate(script)
        .await
        .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;
    Ok(result.into_value::<bool>().unwrap_or(false))
}

/// Evaluate a script expected to produce a string
pub(crate) async fn eval_string(page: &Page, script: &str) -> Result<String, BrowserError> {
    let result = page
        .evaluate(script)
        .await
        .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;
    Ok(result.into_value::<String>().unwrap_or_default())
}

/// Whether an element matching the selector exists and is rendered
pub(crate) async fn is_visible(page: &Page, selector: &str) -> Result<bool, BrowserError> {
    let sel = quote(selector)?;
    let script = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            const style = window.getComputedStyle(el);
            return style.display !== 'none' && style.visibility !== 'hidden' && el.offsetHeight > 0;
        }})()"#
    );
    eval_bool(page, &script).await
}

/// Trimmed text content of the first element matching the selector
pub(crate) async fn text_content(page: &Page, selector: &str) -> Result<String, BrowserError> {
    let sel = quote(selector)?;
    let script = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            return el ? (el.textContent || '').trim() : '';
        }})()"#
    );
    eval_string(page, &script).await
}

/// Whether the page body contains the given literal text
pub(crate) async fn body_contains(page: &Page, text: &str) -> Result<bool, BrowserError> {
    let needle = quote(text)?;
    let script = format!(
        r#"(() => document.body ? document.body.innerText.includes({needle}) : false)()"#
    );
    eval_bool(page, &script).await
}

/// Current page URL
pub(crate) async fn current_url(page: &Page) -> Result<String, BrowserError> {
    page.url()
        .await
        .map_err(|e| BrowserError::ConnectionLost(e.to_string()))?
        .ok_or_else(|| BrowserError::ConnectionLost("page has no URL".into()))
}

/// Wait until an element is visible, up to `timeout`
pub(crate) async fn wait_for_visible(
    page: &Page,
    selector: &str,
    timeout: Duration,
) -> Result<(), BrowserError> {
    let deadline = Instant::now() + timeout;
    loop {
        if is_visible(page, selector).await? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(BrowserError::Timeout(format!(
                "element {selector:?} not visible after {}ms",
                timeout.as_millis()
            )));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Wait until the page URL contains `fragment`, up to `timeout`
pub(crate) async fn wait_for_url_contains(
    page: &Page,
    fragment: &str,
    timeout: Duration,
) -> Result<(), BrowserError> {
    let deadline = Instant::now() + timeout;
    loop {
        if current_url(page).await?.contains(fragment) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(BrowserError::Timeout(format!(
                "navigation to {fragment:?} not observed after {}ms",
                timeout.as_millis()
            )));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
