//! Result extraction.
//!
//! Reads one rendered results page into structured records. The page
//! renders one `.search-results` container per record plus a leading
//! summary block, which is always skipped. Each field is read from the
//! data cell next to its label and is independently optional; a record
//! without an identifier is dropped entirely.

use chromiumoxide::Page;

use crate::browser::BrowserError;

use super::submit::RESULTS_CONTAINER;
use super::types::Trademark;

/// Extract all valid records from the page currently showing results
pub(crate) async fn extract_trademark_results(page: &Page) -> Result<Vec<Trademark>, BrowserError> {
    let script = format!(
        r#"(() => {{
            const containers = Array.from(document.querySelectorAll('{RESULTS_CONTAINER}'));
            const records = containers.slice(1).map((container) => {{
                const link = container.querySelector('.bold-medium a');
                const field = (label) => {{
                    const match = Array.from(container.querySelectorAll('.results-field'))
                        .find((el) => (el.textContent || '').includes(label));
                    const data = match ? match.querySelector('.data') : null;
                    return data ? (data.textContent || '').trim() : '';
                }};
                return {{
                    id: link ? (link.id || '') : '',
                    status: field('Status:'),
                    markText: field('Mark text:'),
                    fileDate: field('File date:'),
                    classes: field('Classes:'),
                }};
            }});
            return JSON.stringify(records);
        }})()"#
    );

    let result = page
        .evaluate(script)
        .await
        .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;
    let json: String = result
        .into_value()
        .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;

    parse_extracted(&json)
}

/// Parse the extraction script's JSON payload, dropping invalid records
fn parse_extracted(json: &str) -> Result<Vec<Trademark>, BrowserError> {
    let records: Vec<Trademark> =
        serde_json::from_str(json).map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;
    Ok(records.into_iter().filter(|r| !r.id.is_empty()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_json(id: &str, mark: &str) -> String {
        format!(
            r#"{{"id":"{id}","status":"Registered","markText":"{mark}","fileDate":"","classes":"9"}}"#
        )
    }

    #[test]
    fn records_keep_page_order() {
        let json = format!(
            "[{},{},{}]",
            record_json("UK1", "alpha"),
            record_json("UK2", "beta"),
            record_json("UK3", "gamma")
        );
        let records = parse_extracted(&json).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["UK1", "UK2", "UK3"]);
    }

    #[test]
    fn empty_identifier_drops_the_record() {
        let json = format!(
            "[{},{},{}]",
            record_json("UK1", "alpha"),
            record_json("", "ghost"),
            record_json("UK3", "gamma")
        );
        let records = parse_extracted(&json).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.id.is_empty()));
    }

    #[test]
    fn missing_fields_stay_empty_strings() {
        let json = r#"[{"id":"UK1","status":"","markText":"","fileDate":"","classes":""}]"#;
        let records = parse_extracted(json).unwrap();
        assert_eq!(records[0].status, "");
        assert_eq!(records[0].classes, "");
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(parse_extracted("not json").is_err());
    }
}
