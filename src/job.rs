use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ScrapeError;

pub const MULTIPLE_LOCATIONS: &str = "Multiple Locations";

/// One search result, kept as the raw object the board sent so every field
/// survives into the snapshot untouched.
///
/// ```text
/// { "PositionID": "JV-17-JEH-1938937", "DocumentID": "467314300",
///   "Title": "Nurse Manager - Cardiology Service", "Location": "Decatur, Georgia",
///   "SalaryDisplay": "Starting at $71,466 (VN 00)", "LocationLatitude": 33.7740173, ... }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobSummary(Map<String, Value>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub name: String,
    pub lat: String,
    pub lng: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Pager {
    pub current_page_index: i64,
    pub last_page_index: i64,
    pub next_page_index: i64,
}

impl Pager {
    /// The page reported as next still falls within the result set.
    pub fn has_more(&self) -> bool {
        self.current_page_index <= self.last_page_index && self.next_page_index <= self.last_page_index
    }
}

/// Body of `/Search/ExecuteSearch`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "Jobs")]
    pub jobs: Vec<JobSummary>,
    #[serde(rename = "Pager")]
    pub pager: Pager,
}

impl JobSummary {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Canonical key for dedup: `PositionID`, or `DocumentID` when that is missing.
    pub fn id(&self) -> Result<String, ScrapeError> {
        self.text_field("PositionID")
            .or_else(|| self.text_field("DocumentID"))
            .ok_or(ScrapeError::MissingIdentifier)
    }

    /// Key used by the detail page URL. The site addresses details by `DocumentID`.
    pub fn detail_id(&self) -> Result<String, ScrapeError> {
        self.text_field("DocumentID")
            .or_else(|| self.text_field("PositionID"))
            .ok_or(ScrapeError::MissingIdentifier)
    }

    pub fn title(&self) -> &str {
        self.0.get("Title").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn location(&self) -> &str {
        self.0.get("Location").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn is_multi_location(&self) -> bool {
        self.location() == MULTIPLE_LOCATIONS
    }

    pub fn detail_html(&self) -> Option<&str> {
        self.0.get("html").and_then(Value::as_str)
    }

    pub fn set_detail_html(&mut self, html: String) {
        self.0.insert("html".to_string(), Value::String(html));
    }

    pub fn locations(&self) -> Option<Vec<LocationEntry>> {
        self.0
            .get("Locations")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set_locations(&mut self, locations: &[LocationEntry]) {
        let value = locations
            .iter()
            .map(|l| {
                let mut entry = Map::new();
                entry.insert("name".into(), Value::String(l.name.clone()));
                entry.insert("lat".into(), Value::String(l.lat.clone()));
                entry.insert("lng".into(), Value::String(l.lng.clone()));
                Value::Object(entry)
            })
            .collect();
        self.0.insert("Locations".to_string(), Value::Array(value));
    }

    fn text_field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
