//! HTTP route handlers.
//!
//! Thin facade over the search workflow: validate query parameters,
//! obtain a page handle, run the workflow through the queue, map the
//! outcome to an HTTP response. The page handle is closed on every path.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::trademarks::{
    default_trademark_classes, get_trademark_classes, perform_trademark_search, LegalStatus,
    SearchCriteria, SearchOutcome, SearchType, Trademark, TrademarkClass, WordMatchType,
    TRADEMARKS_URL,
};
use crate::AppState;

/// JSON error response helper
fn err_response(status: StatusCode, msg: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": "Internal server error", "message": msg })),
    )
        .into_response()
}

/// Build the API router with all endpoints.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/classes", get(classes))
        .route("/stats", get(stats))
        .layer(Extension(state))
}

// ========== Search ==========

/// Raw query parameters; everything arrives as strings so validation
/// failures become 400s rather than extractor rejections.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    words: Option<String>,
    #[serde(rename = "type")]
    search_type: Option<String>,
    word_match_type: Option<String>,
    status: Option<String>,
    per_page: Option<String>,
    classes: Option<String>,
    from_date: Option<String>,
    to_date: Option<String>,
}

fn parse_date_param(value: Option<&str>, name: &str) -> Result<Option<NaiveDate>, String> {
    let Some(raw) = value else {
        return Ok(None);
    };
    // Strict DD-MM-YYYY: zero-padded, nothing else accepted
    match NaiveDate::parse_from_str(raw, "%d-%m-%Y") {
        Ok(date) if raw.len() == 10 => Ok(Some(date)),
        _ => Err(format!("{name}: invalid date format. Use DD-MM-YYYY")),
    }
}

fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

impl SearchParams {
    /// Validate into criteria, collecting every problem found
    fn into_criteria(self) -> Result<SearchCriteria, Vec<String>> {
        let mut errors = Vec::new();
        let mut criteria = SearchCriteria::default();

        match self.words.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                criteria.search_words = comma_list(raw);
                if criteria.search_words.is_empty() {
                    errors.push("Search words are required".to_string());
                }
            }
            _ => errors.push("Search words are required".to_string()),
        }

        if let Some(raw) = self.search_type.as_deref() {
            match raw.parse::<SearchType>() {
                Ok(value) => criteria.search_type = value,
                Err(err) => errors.push(err),
            }
        }

        if let Some(raw) = self.word_match_type.as_deref() {
            match raw.parse::<WordMatchType>() {
                Ok(value) => criteria.word_match_type = value,
                Err(err) => errors.push(err),
            }
        }

        if let Some(raw) = self.status.as_deref() {
            match raw.parse::<LegalStatus>() {
                Ok(value) => criteria.legal_status = value,
                Err(err) => errors.push(err),
            }
        }

        if let Some(raw) = self.per_page.as_deref() {
            match raw.parse::<u32>() {
                Ok(count) if count > 0 => criteria.results_per_page = count,
                _ => errors.push("perPage must be a positive integer".to_string()),
            }
        }

        if let Some(raw) = self.classes.as_deref() {
            criteria.class_ids = comma_list(raw);
        }

        match parse_date_param(self.from_date.as_deref(), "fromDate") {
            Ok(date) => criteria.filed_from = date,
            Err(err) => errors.push(err),
        }
        match parse_date_param(self.to_date.as_deref(), "toDate") {
            Ok(date) => criteria.filed_to = date,
            Err(err) => errors.push(err),
        }

        if errors.is_empty() {
            Ok(criteria)
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchMeta {
    count: usize,
    search_words: Vec<String>,
    search_type: SearchType,
    legal_status: LegalStatus,
    results_per_page: u32,
    class_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_date: Option<String>,
}

fn search_response(results: Vec<Trademark>, criteria: &SearchCriteria) -> Response {
    let meta = SearchMeta {
        count: results.len(),
        search_words: criteria.search_words.clone(),
        search_type: criteria.search_type,
        legal_status: criteria.legal_status,
        results_per_page: criteria.results_per_page,
        class_ids: criteria.class_ids.clone(),
        from_date: criteria.filed_from.map(|d| d.format("%d-%m-%Y").to_string()),
        to_date: criteria.filed_to.map(|d| d.format("%d-%m-%Y").to_string()),
    };
    Json(serde_json::json!({ "results": results, "meta": meta })).into_response()
}

async fn search(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let criteria = match params.into_criteria() {
        Ok(criteria) => criteria,
        Err(details) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "Invalid parameters", "details": details })),
            )
                .into_response();
        }
    };

    info!("search request for {:?}", criteria.search_words);
    let started = Instant::now();

    let page = match state.browser.new_page().await {
        Ok(page) => page,
        Err(err) => {
            state.stats.record_failure(started.elapsed().as_millis() as u64);
            return err_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
        }
    };

    let outcome = state
        .queue
        .run(perform_trademark_search(page.clone(), criteria.clone()))
        .await;

    // The page is released on both success and failure paths; this also
    // tears down any navigation an abandoned job left in flight.
    if let Err(err) = page.close().await {
        warn!("failed to close search page: {}", err);
    }

    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(outcome) => {
            state.stats.record_outcome(&outcome, duration_ms);
            match outcome {
                SearchOutcome::Success(results) => search_response(results, &criteria),
                SearchOutcome::NoResults => search_response(Vec::new(), &criteria),
                SearchOutcome::ValidationError(message) => (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                        "error": "Invalid search criteria",
                        "message": message,
                    })),
                )
                    .into_response(),
                SearchOutcome::Timeout => {
                    err_response(StatusCode::INTERNAL_SERVER_ERROR, "search timed out")
                }
                SearchOutcome::GenericFailure(message) => {
                    err_response(StatusCode::INTERNAL_SERVER_ERROR, &message)
                }
            }
        }
        Err(err) => {
            state.stats.record_failure(duration_ms);
            err_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

// ========== Classes ==========

async fn classes(Extension(state): Extension<Arc<AppState>>) -> Response {
    let results = live_classes(&state)
        .await
        .unwrap_or_else(default_trademark_classes);

    Json(serde_json::json!({
        "results": results,
        "meta": { "count": results.len() },
    }))
    .into_response()
}

/// Scrape the live catalog; any failure yields `None` so the caller
/// falls back to the default catalog instead of erroring.
async fn live_classes(state: &AppState) -> Option<Vec<TrademarkClass>> {
    let page = match state.browser.new_page().await {
        Ok(page) => page,
        Err(err) => {
            warn!("cannot open page for class catalog: {}", err);
            return None;
        }
    };

    let classes = match page.goto(TRADEMARKS_URL).await {
        Ok(_) => {
            let _ = page.wait_for_navigation().await;
            Some(get_trademark_classes(&page).await)
        }
        Err(err) => {
            warn!("cannot navigate to the search form: {}", err);
            None
        }
    };

    if let Err(err) = page.close().await {
        warn!("failed to close class catalog page: {}", err);
    }

    classes
}

// ========== Stats ==========

async fn stats(Extension(state): Extension<Arc<AppState>>) -> Response {
    Json(state.stats.snapshot()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(words: Option<&str>) -> SearchParams {
        SearchParams {
            words: words.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn words_are_required() {
        let errors = params(None).into_criteria().unwrap_err();
        assert_eq!(errors, vec!["Search words are required"]);

        let errors = params(Some("  ")).into_criteria().unwrap_err();
        assert_eq!(errors, vec!["Search words are required"]);
    }

    #[test]
    fn defaults_apply_when_only_words_are_given() {
        let criteria = params(Some("nike")).into_criteria().unwrap();
        assert_eq!(criteria.search_words, vec!["nike"]);
        assert_eq!(criteria.search_type, SearchType::Exact);
        assert_eq!(criteria.word_match_type, WordMatchType::AnyWords);
        assert_eq!(criteria.legal_status, LegalStatus::All);
        assert_eq!(criteria.results_per_page, 10);
    }

    #[test]
    fn comma_lists_are_split_and_trimmed() {
        let mut p = params(Some("nike, adidas ,,puma"));
        p.classes = Some("9,42".to_string());
        let criteria = p.into_criteria().unwrap();
        assert_eq!(criteria.search_words, vec!["nike", "adidas", "puma"]);
        assert_eq!(criteria.class_ids, vec!["9", "42"]);
    }

    #[test]
    fn dates_must_be_strict_dd_mm_yyyy() {
        let mut p = params(Some("nike"));
        p.from_date = Some("01-02-2020".to_string());
        p.to_date = Some("28-02-2021".to_string());
        let criteria = p.into_criteria().unwrap();
        assert_eq!(
            criteria.filed_from,
            NaiveDate::from_ymd_opt(2020, 2, 1)
        );
        assert_eq!(criteria.filed_to, NaiveDate::from_ymd_opt(2021, 2, 28));

        for bad in ["2020-02-01", "1-2-2020", "32-01-2020", "garbage"] {
            let mut p = params(Some("nike"));
            p.from_date = Some(bad.to_string());
            let errors = p.into_criteria().unwrap_err();
            assert!(errors[0].contains("DD-MM-YYYY"), "accepted {bad:?}");
        }
    }

    #[test]
    fn per_page_must_be_a_positive_integer() {
        for bad in ["0", "-3", "ten", "2.5"] {
            let mut p = params(Some("nike"));
            p.per_page = Some(bad.to_string());
            let errors = p.into_criteria().unwrap_err();
            assert!(errors[0].contains("perPage"), "accepted {bad:?}");
        }

        let mut p = params(Some("nike"));
        p.per_page = Some("50".to_string());
        assert_eq!(p.into_criteria().unwrap().results_per_page, 50);
    }

    #[test]
    fn bad_enum_values_collect_errors() {
        let mut p = params(Some("nike"));
        p.search_type = Some("FUZZY".to_string());
        p.status = Some("live".to_string());
        let errors = p.into_criteria().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn meta_omits_absent_dates() {
        let criteria = params(Some("nike")).into_criteria().unwrap();
        let response = SearchMeta {
            count: 0,
            search_words: criteria.search_words.clone(),
            search_type: criteria.search_type,
            legal_status: criteria.legal_status,
            results_per_page: criteria.results_per_page,
            class_ids: criteria.class_ids.clone(),
            from_date: None,
            to_date: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("fromDate").is_none());
        assert_eq!(json["searchType"], "EXACT");
        assert_eq!(json["legalStatus"], "ALLLEGALSTATUSES");
    }
}
