//! Trademark search workflows.
//!
//! One workflow drives the registry's multi-page search form end to end:
//! configure the fields, submit, classify the outcome, and on success
//! walk every results page. The caller supplies an exclusively owned
//! page handle and closes it afterwards; the workflow never does.

pub mod classes;
mod extract;
mod form;
mod pagination;
mod submit;
mod types;
mod wait;

use chromiumoxide::Page;
use tracing::debug;

use crate::browser::BrowserError;

pub use classes::{default_trademark_classes, get_trademark_classes};
pub use types::{
    LegalStatus, SearchCriteria, SearchOutcome, SearchType, Trademark, TrademarkClass,
    WordMatchType,
};

/// The registry's trademark text search form
pub const TRADEMARKS_URL: &str = "https://trademarks.ipo.gov.uk/ipo-tmtext";

const SEARCH_FORM_URL_FRAGMENT: &str = "ipo-tmtext";

/// Run one complete search workflow on the given page.
///
/// All raw automation failures are classified here; callers receive a
/// `SearchOutcome`, never an error.
pub async fn perform_trademark_search(page: Page, criteria: SearchCriteria) -> SearchOutcome {
    debug!("starting trademark search for {:?}", criteria.search_words);

    match run_workflow(&page, &criteria).await {
        Ok(outcome) => outcome,
        Err(err) => submit::classify_failure(err),
    }
}

async fn run_workflow(
    page: &Page,
    criteria: &SearchCriteria,
) -> Result<SearchOutcome, BrowserError> {
    if !wait::current_url(page).await?.contains(SEARCH_FORM_URL_FRAGMENT) {
        page.goto(TRADEMARKS_URL)
            .await
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
    }

    form::set_word_match_type(page, criteria.word_match_type).await?;
    form::set_search_type(page, criteria.search_type).await?;
    form::set_search_words(page, &criteria.search_words).await?;

    form::select_trademark_classes(page, &criteria.class_ids).await?;

    form::set_filed_date_range(page, criteria.filed_from, criteria.filed_to).await?;
    form::set_legal_status(page, criteria.legal_status).await?;
    form::set_results_per_page(page, criteria.results_per_page).await?;

    match submit::submit_search_form(page).await? {
        submit::Submission::ValidationError(message) => {
            Ok(SearchOutcome::ValidationError(message))
        }
        submit::Submission::NoResults => Ok(SearchOutcome::NoResults),
        submit::Submission::ResultsReady => {
            let records = pagination::collect_all_results(page).await?;
            Ok(SearchOutcome::Success(records))
        }
    }
}
