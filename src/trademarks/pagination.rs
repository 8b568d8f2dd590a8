//! Pagination over the result set.
//!
//! The results view shows a pagination strip whose first entry reads
//! "Page <n> of <total>". The walker repeats extraction across every
//! page, never revisiting one and never advancing past the last.

use chromiumoxide::Page;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::browser::BrowserError;

use super::extract::extract_trademark_results;
use super::submit::{NAVIGATION_TIMEOUT, RESULTS_CONTAINER, RESULTS_URL_FRAGMENT, RESULTS_VISIBLE_TIMEOUT};
use super::types::Trademark;
use super::wait;

const NEXT_PAGE_LINK: &str = ".pagination-alt2 a.fa-angle-right";
const PAGINATION_LABEL: &str = ".pagination-alt2 li:nth-child(1)";

static PAGE_OF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Page \d+ of (\d+)").unwrap());

/// Whether a next-page affordance is present
pub(crate) async fn has_next_page(page: &Page) -> Result<bool, BrowserError> {
    let script =
        format!(r#"(() => document.querySelectorAll('{NEXT_PAGE_LINK}').length > 0)()"#);
    wait::eval_bool(page, &script).await
}

/// Total page count from the pagination label; unparseable labels count
/// as a single page rather than failing the workflow
pub(crate) async fn total_pages(page: &Page) -> Result<u32, BrowserError> {
    let text = wait::text_content(page, PAGINATION_LABEL).await?;
    Ok(parse_total_pages(&text))
}

fn parse_total_pages(text: &str) -> u32 {
    PAGE_OF_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1)
}

/// Click through to the next results page.
///
/// Callers must check `has_next_page` first; advancing without one is a
/// fatal error, not a silent no-op.
pub(crate) async fn go_to_next_page(page: &Page) -> Result<(), BrowserError> {
    if !has_next_page(page).await? {
        return Err(BrowserError::InvalidState("no next page available".into()));
    }

    let link = page
        .find_element(NEXT_PAGE_LINK)
        .await
        .map_err(|_| BrowserError::ElementNotFound(NEXT_PAGE_LINK.to_string()))?;
    link.click()
        .await
        .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;

    wait::wait_for_url_contains(page, RESULTS_URL_FRAGMENT, NAVIGATION_TIMEOUT).await?;
    wait::wait_for_visible(page, RESULTS_CONTAINER, RESULTS_VISIBLE_TIMEOUT).await?;
    Ok(())
}

/// Extract every page of results, in visitation order
pub(crate) async fn collect_all_results(page: &Page) -> Result<Vec<Trademark>, BrowserError> {
    let mut all_results = extract_trademark_results(page).await?;

    let total = total_pages(page).await?;
    let mut current = 1;

    while current < total && has_next_page(page).await? {
        go_to_next_page(page).await?;
        current += 1;
        let page_results = extract_trademark_results(page).await?;
        all_results.extend(page_results);
    }

    Ok(all_results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_total_from_the_label() {
        assert_eq!(parse_total_pages("Page 2 of 7"), 7);
        assert_eq!(parse_total_pages("Page 1 of 1"), 1);
        assert_eq!(parse_total_pages(" Page 10 of 42 \n"), 42);
    }

    #[test]
    fn unparseable_labels_default_to_one_page() {
        assert_eq!(parse_total_pages(""), 1);
        assert_eq!(parse_total_pages("Pages: 3"), 1);
        assert_eq!(parse_total_pages("Page of"), 1);
        // Overflowing totals are treated as unparseable
        assert_eq!(parse_total_pages("Page 1 of 99999999999"), 1);
    }
}
