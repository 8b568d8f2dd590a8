//! Data model for trademark searches.
//!
//! Wire values mirror the registry form's own option values so the same
//! literals flow from the HTTP facade through to the form controls.

use chrono::NaiveDate;

/// How multiple search words are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WordMatchType {
    #[serde(rename = "ALLWORDS")]
    AllWords,
    #[serde(rename = "ANYWORDS")]
    AnyWords,
}

impl WordMatchType {
    /// The registry form's option value
    pub fn as_str(&self) -> &'static str {
        match self {
            WordMatchType::AllWords => "ALLWORDS",
            WordMatchType::AnyWords => "ANYWORDS",
        }
    }
}

impl std::str::FromStr for WordMatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALLWORDS" => Ok(WordMatchType::AllWords),
            "ANYWORDS" => Ok(WordMatchType::AnyWords),
            other => Err(format!("unknown word match type: {other}")),
        }
    }
}

/// How the search words are matched against mark text
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SearchType {
    #[serde(rename = "SIMILAR")]
    Similar,
    #[serde(rename = "EXACT")]
    Exact,
    #[serde(rename = "CONTAINSSTRING")]
    ContainsString,
    #[serde(rename = "CONTAINSWORD")]
    ContainsWord,
    #[serde(rename = "STARTSWITH")]
    StartsWith,
}

impl SearchType {
    /// The registry form's option value
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Similar => "SIMILAR",
            SearchType::Exact => "EXACT",
            SearchType::ContainsString => "CONTAINSSTRING",
            SearchType::ContainsWord => "CONTAINSWORD",
            SearchType::StartsWith => "STARTSWITH",
        }
    }
}

impl std::str::FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SIMILAR" => Ok(SearchType::Similar),
            "EXACT" => Ok(SearchType::Exact),
            "CONTAINSSTRING" => Ok(SearchType::ContainsString),
            "CONTAINSWORD" => Ok(SearchType::ContainsWord),
            "STARTSWITH" => Ok(SearchType::StartsWith),
            other => Err(format!("unknown search type: {other}")),
        }
    }
}

/// Legal status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LegalStatus {
    #[serde(rename = "ALLLEGALSTATUSES")]
    All,
    #[serde(rename = "LIVELEGALSTATUS")]
    Live,
    #[serde(rename = "DEADLEGALSTATUS")]
    Dead,
}

impl LegalStatus {
    /// The registry form's option value
    pub fn as_str(&self) -> &'static str {
        match self {
            LegalStatus::All => "ALLLEGALSTATUSES",
            LegalStatus::Live => "LIVELEGALSTATUS",
            LegalStatus::Dead => "DEADLEGALSTATUS",
        }
    }
}

impl std::str::FromStr for LegalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALLLEGALSTATUSES" => Ok(LegalStatus::All),
            "LIVELEGALSTATUS" => Ok(LegalStatus::Live),
            "DEADLEGALSTATUS" => Ok(LegalStatus::Dead),
            other => Err(format!("unknown legal status: {other}")),
        }
    }
}

/// Everything one search workflow needs. Immutable once the workflow
/// starts; built and validated by the facade.
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    pub search_words: Vec<String>,
    pub word_match_type: WordMatchType,
    pub search_type: SearchType,
    pub legal_status: LegalStatus,
    pub results_per_page: u32,
    pub class_ids: Vec<String>,
    pub filed_from: Option<NaiveDate>,
    pub filed_to: Option<NaiveDate>,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            search_words: Vec::new(),
            word_match_type: WordMatchType::AnyWords,
            search_type: SearchType::Exact,
            legal_status: LegalStatus::All,
            results_per_page: 10,
            class_ids: Vec::new(),
            filed_from: None,
            filed_to: None,
        }
    }
}

/// One extracted trademark record
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trademark {
    pub id: String,
    pub status: String,
    pub mark_text: String,
    pub file_date: String,
    pub classes: String,
}

/// A registry class (Nice classification entry)
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrademarkClass {
    pub id: String,
    pub name: String,
}

/// Discriminated result of one submission attempt.
///
/// Exactly one of these holds for every completed workflow; the facade
/// maps them to HTTP responses without inspecting error strings.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// The registry returned records (possibly across multiple pages)
    Success(Vec<Trademark>),
    /// The form rejected the criteria; message is the remote error summary
    ValidationError(String),
    /// The registry explicitly reported no matching records
    NoResults,
    /// A navigation or visibility deadline was exceeded
    Timeout,
    /// Any other automation failure
    GenericFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn enum_wire_values_round_trip() {
        for s in ["SIMILAR", "EXACT", "CONTAINSSTRING", "CONTAINSWORD", "STARTSWITH"] {
            assert_eq!(SearchType::from_str(s).unwrap().as_str(), s);
        }
        for s in ["ALLLEGALSTATUSES", "LIVELEGALSTATUS", "DEADLEGALSTATUS"] {
            assert_eq!(LegalStatus::from_str(s).unwrap().as_str(), s);
        }
        for s in ["ALLWORDS", "ANYWORDS"] {
            assert_eq!(WordMatchType::from_str(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn unknown_wire_values_are_rejected() {
        assert!(SearchType::from_str("FUZZY").is_err());
        assert!(LegalStatus::from_str("live").is_err());
        assert!(WordMatchType::from_str("").is_err());
    }

    #[test]
    fn criteria_defaults_match_the_registry_form() {
        let criteria = SearchCriteria::default();
        assert_eq!(criteria.word_match_type, WordMatchType::AnyWords);
        assert_eq!(criteria.search_type, SearchType::Exact);
        assert_eq!(criteria.legal_status, LegalStatus::All);
        assert_eq!(criteria.results_per_page, 10);
        assert!(criteria.class_ids.is_empty());
    }

    #[test]
    fn trademark_serializes_camel_case() {
        let record = Trademark {
            id: "UK00001".into(),
            status: "Registered".into(),
            mark_text: "NIKE".into(),
            file_date: "01 January 2020".into(),
            classes: "9, 42".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("markText").is_some());
        assert!(json.get("fileDate").is_some());
        assert!(json.get("mark_text").is_none());
    }
}
