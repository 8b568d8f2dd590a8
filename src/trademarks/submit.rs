//! Form submission and outcome classification.
//!
//! Submitting the search form can end four different ways: navigation to
//! a results page, a validation error summary, an explicit "no matching
//! records" message, or nothing at all. The registry renders empty result
//! sets without raising a validation error, so every failure path
//! re-checks the no-results sentinel before surfacing.

use std::time::{Duration, Instant};

use chromiumoxide::Page;
use tracing::warn;

use crate::browser::BrowserError;

use super::types::SearchOutcome;
use super::wait;

const SUBMIT_BUTTON: &str = r#"button#button[type="submit"]"#;
const ERROR_SUMMARY: &str = ".error-summary, .validation-summary-errors";
const NO_RESULTS_TEXT: &str = "No trade marks matching your search criteria were found";

pub(crate) const RESULTS_URL_FRAGMENT: &str = "page/Results";
pub(crate) const RESULTS_CONTAINER: &str = ".search-results";

/// Shared deadline for the submission outcome race
pub(crate) const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Deadline for the results container to render after navigation
pub(crate) const RESULTS_VISIBLE_TIMEOUT: Duration = Duration::from_secs(5);

/// What a submission resolved to, before any records are extracted
#[derive(Debug)]
pub(crate) enum Submission {
    /// Navigated to a results page with a visible results container
    ResultsReady,
    /// The form rejected the criteria
    ValidationError(String),
    /// The registry explicitly reported no matches
    NoResults,
}

/// Submit the configured form and resolve the outcome.
///
/// Raw failures (timeouts, missing elements) are returned as errors only
/// after confirming the page is not actually showing an empty result set.
pub(crate) async fn submit_search_form(page: &Page) -> Result<Submission, BrowserError> {
    let button = page
        .find_element(SUBMIT_BUTTON)
        .await
        .map_err(|_| BrowserError::ElementNotFound(SUBMIT_BUTTON.to_string()))?;
    button
        .click()
        .await
        .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;

    match resolve_submission(page).await {
        Ok(submission) => Ok(submission),
        Err(err) => {
            // An error-looking failure that is actually an empty result
            // set must not be misclassified.
            if wait::body_contains(page, NO_RESULTS_TEXT).await.unwrap_or(false) {
                Ok(Submission::NoResults)
            } else {
                Err(err)
            }
        }
    }
}

/// Race the three observable conditions under one shared deadline
async fn resolve_submission(page: &Page) -> Result<Submission, BrowserError> {
    let deadline = Instant::now() + NAVIGATION_TIMEOUT;

    loop {
        if wait::is_visible(page, ERROR_SUMMARY).await? {
            let text = wait::text_content(page, ERROR_SUMMARY).await?;
            return Ok(Submission::ValidationError(text));
        }

        if wait::body_contains(page, NO_RESULTS_TEXT).await? {
            return Ok(Submission::NoResults);
        }

        if wait::current_url(page).await?.contains(RESULTS_URL_FRAGMENT) {
            break;
        }

        if Instant::now() >= deadline {
            return Err(BrowserError::Timeout(format!(
                "no submission outcome observed after {}ms",
                NAVIGATION_TIMEOUT.as_millis()
            )));
        }

        tokio::time::sleep(wait::POLL_INTERVAL).await;
    }

    // Navigation happened, but the results page can still carry the
    // no-results message instead of a results list.
    if wait::body_contains(page, NO_RESULTS_TEXT).await? {
        return Ok(Submission::NoResults);
    }

    wait::wait_for_visible(page, RESULTS_CONTAINER, RESULTS_VISIBLE_TIMEOUT).await?;
    Ok(Submission::ResultsReady)
}

/// Convert a raw automation failure into a search outcome.
///
/// This is the only place such conversion happens; layers above pass the
/// classified outcome through unchanged.
pub(crate) fn classify_failure(err: BrowserError) -> SearchOutcome {
    match err {
        BrowserError::Timeout(msg) => {
            warn!("search workflow timed out: {}", msg);
            SearchOutcome::Timeout
        }
        other => SearchOutcome::GenericFailure(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_classify_as_timeout() {
        let outcome = classify_failure(BrowserError::Timeout("deadline".into()));
        assert!(matches!(outcome, SearchOutcome::Timeout));
    }

    #[test]
    fn missing_elements_classify_as_generic_failure() {
        let outcome =
            classify_failure(BrowserError::ElementNotFound("input[name=\"x\"]".into()));
        match outcome {
            SearchOutcome::GenericFailure(msg) => assert!(msg.contains("Element not found")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn walker_invalid_state_keeps_its_message() {
        let outcome = classify_failure(BrowserError::InvalidState("no next page available".into()));
        match outcome {
            SearchOutcome::GenericFailure(msg) => assert_eq!(msg, "no next page available"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
