use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tabled::Tabled;

/// One CSV row as it comes off disk, before any validation.
#[derive(Debug, Deserialize)]
pub struct RawRecord {
    pub medium: Option<String>,
    pub country: Option<String>,
    pub topic: Option<String>,
    #[serde(default)]
    pub space: Option<String>,
    #[serde(default)]
    pub source_sex: Option<String>,
    #[serde(default)]
    pub journalist_sex: Option<String>,
}

/// A coded observation belonging to one medium.
///
/// `sources` and `journalists` hold one entry per attached person: that
/// person's sex id, or `None` when it was not recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub medium: String,
    pub country: String,
    pub topic: Option<u32>,
    pub space: Option<u32>,
    pub sources: Vec<Option<u32>>,
    pub journalists: Vec<Option<u32>>,
}

/// An entry of a closed enumeration (topic, gender, space).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: u32,
    pub label: String,
}

impl Choice {
    pub fn new(id: u32, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

/// The countries a report run covers, in caller order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountrySet {
    codes: Vec<String>,
    index: HashSet<String>,
}

impl CountrySet {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for code in codes {
            let code = code.into().trim().to_uppercase();
            if !code.is_empty() && set.index.insert(code.clone()) {
                set.codes.push(code);
            }
        }
        set
    }

    /// Parse a comma separated list such as `"KE, UG"`.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains(code)
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Long-form export of one (row, column group) cell pair.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TidyRow {
    #[serde(rename = "Worksheet")]
    pub worksheet: String,
    #[serde(rename = "Row")]
    pub row: String,
    #[serde(rename = "Column")]
    pub column: String,
    #[serde(rename = "N")]
    pub count: u64,
    #[serde(rename = "Percent")]
    pub percent: f64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WorksheetSummaryRow {
    #[serde(rename = "Worksheet")]
    #[tabled(rename = "Worksheet")]
    pub worksheet: String,
    #[serde(rename = "Rows")]
    #[tabled(rename = "Rows")]
    pub rows: usize,
    #[serde(rename = "Columns")]
    #[tabled(rename = "Columns")]
    pub columns: usize,
    #[serde(rename = "TotalCount")]
    #[tabled(rename = "TotalCount")]
    pub total_count: String,
}

#[derive(Debug, Serialize)]
pub struct BuildSummary {
    pub year: String,
    pub countries: Vec<String>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub worksheets: Vec<WorksheetSummaryRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_set_keeps_first_occurrence_order() {
        let set = CountrySet::parse("ke, UG,,ke ,za");
        assert_eq!(set.codes(), &["KE", "UG", "ZA"]);
        assert!(set.contains("UG"));
        assert!(!set.contains("ug"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn empty_country_set() {
        let set = CountrySet::parse("");
        assert!(set.is_empty());
    }
}
