//! Search form driver.
//!
//! Translates a `SearchCriteria` into field writes against the registry
//! form. Each operation is idempotent and independently invocable; all of
//! them leave submission to the classifier.

use std::time::Duration;

use chromiumoxide::Page;
use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::browser::BrowserError;

use super::types::{LegalStatus, SearchType, WordMatchType};
use super::wait;

const SEARCH_TYPE_SELECT: &str = r#"select[name="wordSearchType"]"#;
const SEARCH_PHRASE_INPUT: &str = r#"input[name="wordSearchPhrase"]"#;
const LEGAL_STATUS_SELECT: &str = r#"select[name="legalStatus"]"#;
const PAGE_SIZE_SELECT: &str = r#"select[name="pageSize"]"#;
const CLASS_SELECT: &str = "select.chosen-select";
const CLASS_CLEAR_ALL: &str = "#clearAll";
const CLASS_CHOICE_CHIP: &str = ".chosen-choices .search-choice";

/// How long to wait for the chosen widget to reflect a class selection
const CLASS_FEEDBACK_TIMEOUT: Duration = Duration::from_secs(3);

fn quote(value: &str) -> Result<String, BrowserError> {
    serde_json::to_string(value).map_err(|e| BrowserError::JavaScriptError(e.to_string()))
}

/// Set a `<select>` control's value and notify listeners
async fn select_value(page: &Page, selector: &str, value: &str) -> Result<(), BrowserError> {
    let sel = quote(selector)?;
    let val = quote(value)?;
    let script = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            el.value = {val};
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"#
    );
    if wait::eval_bool(page, &script).await? {
        Ok(())
    } else {
        Err(BrowserError::ElementNotFound(selector.to_string()))
    }
}

/// Set a text input's value and notify listeners
async fn fill_value(page: &Page, selector: &str, value: &str) -> Result<(), BrowserError> {
    let sel = quote(selector)?;
    let val = quote(value)?;
    let script = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            el.value = {val};
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"#
    );
    if wait::eval_bool(page, &script).await? {
        Ok(())
    } else {
        Err(BrowserError::ElementNotFound(selector.to_string()))
    }
}

/// Select the word-match mode radio and verify it took
pub async fn set_word_match_type(page: &Page, option: WordMatchType) -> Result<(), BrowserError> {
    let selector = format!(
        r#"input[name="wordSearchMatchType"][value="{}"]"#,
        option.as_str()
    );

    let radio = page
        .find_element(selector.as_str())
        .await
        .map_err(|_| BrowserError::ElementNotFound(selector.clone()))?;
    radio
        .click()
        .await
        .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;

    let sel = quote(&selector)?;
    let script = format!(
        r#"(() => {{ const el = document.querySelector({sel}); return el ? el.checked : false; }})()"#
    );
    if !wait::eval_bool(page, &script).await? {
        return Err(BrowserError::InvalidState(format!(
            "radio input for \"{}\" did not register as checked",
            option.as_str()
        )));
    }
    Ok(())
}

/// Set the search type dropdown
pub async fn set_search_type(page: &Page, value: SearchType) -> Result<(), BrowserError> {
    select_value(page, SEARCH_TYPE_SELECT, value.as_str()).await
}

/// Write the search words, joined by whitespace
pub async fn set_search_words(page: &Page, words: &[String]) -> Result<(), BrowserError> {
    fill_value(page, SEARCH_PHRASE_INPUT, &words.join(" ")).await
}

/// Set the legal status dropdown
pub async fn set_legal_status(page: &Page, status: LegalStatus) -> Result<(), BrowserError> {
    select_value(page, LEGAL_STATUS_SELECT, status.as_str()).await
}

/// Set the results-per-page dropdown
pub async fn set_results_per_page(page: &Page, count: u32) -> Result<(), BrowserError> {
    select_value(page, PAGE_SIZE_SELECT, &count.to_string()).await
}

/// Normalize one date sub-field: non-numeric or non-positive values
/// collapse to "01", single digits are zero-padded.
fn normalize_stringified_number(data: &str) -> String {
    let data = data.trim().to_lowercase();

    match data.parse::<i64>() {
        Ok(n) if n > 0 => {
            if data.len() == 1 {
                format!("0{data}")
            } else {
                data
            }
        }
        _ => "01".to_string(),
    }
}

/// Decompose a date into the form's day/month/year sub-field values.
///
/// The day component is derived from the day-of-week (Sunday = 0), which
/// reproduces the behavior of the system this replaces.
fn date_components(date: NaiveDate) -> (String, String, String) {
    let day = normalize_stringified_number(&date.weekday().num_days_from_sunday().to_string());
    let month = normalize_stringified_number(&date.month().to_string());
    let year = normalize_stringified_number(&date.year().to_string());
    (day, month, year)
}

async fn write_date_side(page: &Page, field: &str, date: NaiveDate) -> Result<(), BrowserError> {
    let (day, month, year) = date_components(date);
    fill_value(page, &format!(r#"input[name="{field}.day"]"#), &day).await?;
    fill_value(page, &format!(r#"input[name="{field}.month"]"#), &month).await?;
    // The year lives in the field carrying the bare name
    fill_value(page, &format!(r#"input[name="{field}"]"#), &year).await?;
    Ok(())
}

/// Write the filed-date range; each side is written only when present
pub async fn set_filed_date_range(
    page: &Page,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<(), BrowserError> {
    if let Some(from) = from {
        write_date_side(page, "filedFrom", from).await?;
    }
    if let Some(to) = to {
        write_date_side(page, "filedTo", to).await?;
    }
    Ok(())
}

/// Select the requested registry classes on the multi-select.
///
/// The chosen widget layered over the control keeps its own view of the
/// selection, so after writing the underlying `<select>` we dispatch a
/// change event and trigger `chosen:updated`, then wait for a selection
/// chip to appear. A missing chip is tolerated: the underlying control
/// state is what the form submits.
pub async fn select_trademark_classes(page: &Page, class_ids: &[String]) -> Result<(), BrowserError> {
    if class_ids.is_empty() {
        return Ok(());
    }

    let clear = page
        .find_element(CLASS_CLEAR_ALL)
        .await
        .map_err(|_| BrowserError::ElementNotFound(CLASS_CLEAR_ALL.to_string()))?;
    clear
        .click()
        .await
        .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;

    let ids_json =
        serde_json::to_string(class_ids).map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;
    let sel = quote(CLASS_SELECT)?;
    let script = format!(
        r#"(() => {{
            const select = document.querySelector({sel});
            if (!select) return JSON.stringify([]);

            const requested = {ids_json};
            const selected = [];

            for (const option of Array.from(select.options)) {{
                option.selected = false;
            }}

            for (const id of requested) {{
                for (const option of Array.from(select.options)) {{
                    if (option.value === id) {{
                        option.selected = true;
                        selected.push(id);
                        break;
                    }}
                }}
            }}

            select.dispatchEvent(new Event('change', {{ bubbles: true }}));

            if (typeof $ !== 'undefined') {{
                $({sel}).trigger('chosen:updated');
            }}

            return JSON.stringify(selected);
        }})()"#
    );

    let selected_json = wait::eval_string(page, &script).await?;
    let actually_selected: Vec<String> = serde_json::from_str(&selected_json)
        .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;

    if !actually_selected.is_empty() {
        if let Err(err) = wait::wait_for_visible(page, CLASS_CHOICE_CHIP, CLASS_FEEDBACK_TIMEOUT).await
        {
            match err {
                BrowserError::Timeout(_) => {
                    debug!("chosen widget did not reflect class selection: {}", err);
                }
                other => return Err(other),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_table() {
        assert_eq!(normalize_stringified_number("0"), "01");
        assert_eq!(normalize_stringified_number("7"), "07");
        assert_eq!(normalize_stringified_number("23"), "23");
        assert_eq!(normalize_stringified_number("-5"), "01");
        assert_eq!(normalize_stringified_number("abc"), "01");
        assert_eq!(normalize_stringified_number("  9 "), "09");
        assert_eq!(normalize_stringified_number("2023"), "2023");
    }

    #[test]
    fn day_component_comes_from_the_weekday() {
        // 2023-05-10 was a Wednesday (weekday index 3), not the 10th
        let (day, month, year) = date_components(NaiveDate::from_ymd_opt(2023, 5, 10).unwrap());
        assert_eq!(day, "03");
        assert_eq!(month, "05");
        assert_eq!(year, "2023");
    }

    #[test]
    fn sunday_collapses_to_01() {
        // 2023-05-07 was a Sunday; index 0 normalizes to "01"
        let (day, _, _) = date_components(NaiveDate::from_ymd_opt(2023, 5, 7).unwrap());
        assert_eq!(day, "01");
    }
}
