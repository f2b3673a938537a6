//! Report configuration: the closed enumerations, the ordered media registry
//! and the handful of policy switches a build needs.
//!
//! Everything here is injected into [`crate::reports::ReportBuilder`]; there
//! are no module-level lookups at build time. The built-in defaults are the
//! monitoring project's standard lists and can be overridden field by field
//! from a JSON file.

use crate::error::{ReportError, Result};
use crate::source::Field;
use crate::types::Choice;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

static DEFAULT_MEDIA: Lazy<Vec<MediumSpec>> = Lazy::new(|| {
    ["Internet News", "Print", "Radio", "Television", "Twitter"]
        .into_iter()
        .map(MediumSpec::new)
        .collect()
});

static DEFAULT_TOPICS: Lazy<Vec<Choice>> = Lazy::new(|| {
    vec![
        Choice::new(1, "Politics and Government"),
        Choice::new(2, "Economy"),
        Choice::new(3, "Science and Health"),
        Choice::new(4, "Social and Legal"),
        Choice::new(5, "Crime and Violence"),
        Choice::new(6, "Gender and Related"),
        Choice::new(7, "Celebrity, Arts and Media, Sports"),
        Choice::new(8, "Other"),
    ]
});

static DEFAULT_GENDERS: Lazy<Vec<Choice>> = Lazy::new(|| {
    vec![
        Choice::new(1, "Female"),
        Choice::new(2, "Male"),
        Choice::new(3, "Other: transgender, transsexual"),
        Choice::new(4, "Do not know"),
    ]
});

static DEFAULT_SPACES: Lazy<Vec<Choice>> = Lazy::new(|| {
    vec![
        Choice::new(1, "Full page"),
        Choice::new(2, "Half page"),
        Choice::new(3, "One third page"),
        Choice::new(4, "Quarter page"),
        Choice::new(5, "Less than quarter page"),
    ]
});

/// A person role attached to an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Source,
    Journalist,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Journalist => "journalist",
        }
    }
}

/// Which roles a medium's records carry.
///
/// Sex-based reports ask the descriptor for the grouping field instead of
/// assuming every medium has both people attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediumSpec {
    pub label: String,
    #[serde(default = "yes")]
    pub source_role: bool,
    #[serde(default = "yes")]
    pub journalist_role: bool,
}

fn yes() -> bool {
    true
}

impl MediumSpec {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            source_role: true,
            journalist_role: true,
        }
    }

    pub fn without_role(mut self, role: Role) -> Self {
        match role {
            Role::Source => self.source_role = false,
            Role::Journalist => self.journalist_role = false,
        }
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        match role {
            Role::Source => self.source_role,
            Role::Journalist => self.journalist_role,
        }
    }

    /// The field holding the sex of `role` for this medium, if it has one.
    pub fn sex_field(&self, role: Role) -> Option<Field> {
        self.has_role(role).then_some(Field::Sex(role))
    }
}

/// What a sex-based report does with a medium that lacks the role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingRolePolicy {
    /// Leave the medium out of that report.
    #[default]
    Skip,
    /// Abort the build.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Ordered media registry; order is column order everywhere.
    pub media: Vec<MediumSpec>,
    pub topics: Vec<Choice>,
    pub genders: Vec<Choice>,
    pub spaces: Vec<Choice>,
    /// Medium queried by the space-per-topic report.
    pub print_medium: String,
    pub missing_role: MissingRolePolicy,
    /// Written above the row labels of the country and topic-by-region sheets.
    pub region_label: String,
    /// Display names for country codes; unknown codes print as themselves.
    /// Keys are upper-cased on load to match `CountrySet`.
    #[serde(deserialize_with = "upper_case_keys")]
    pub country_names: BTreeMap<String, String>,
}

fn upper_case_keys<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = BTreeMap::<String, String>::deserialize(deserializer)?;
    Ok(names
        .into_iter()
        .map(|(code, name)| (code.trim().to_uppercase(), name))
        .collect())
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            media: DEFAULT_MEDIA.clone(),
            topics: DEFAULT_TOPICS.clone(),
            genders: DEFAULT_GENDERS.clone(),
            spaces: DEFAULT_SPACES.clone(),
            print_medium: "Print".to_string(),
            missing_role: MissingRolePolicy::Skip,
            region_label: "All regions".to_string(),
            country_names: BTreeMap::new(),
        }
    }
}

impl ReportConfig {
    /// Read a JSON override file; fields it omits keep their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ReportConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.media.is_empty() {
            return Err(ReportError::InvalidConfig("media registry is empty".into()));
        }
        let mut labels = HashSet::new();
        for medium in &self.media {
            if !labels.insert(medium.label.as_str()) {
                return Err(ReportError::InvalidConfig(format!(
                    "medium {} listed twice",
                    medium.label
                )));
            }
        }
        for (name, list) in [
            ("topics", &self.topics),
            ("genders", &self.genders),
            ("spaces", &self.spaces),
        ] {
            let mut ids = HashSet::new();
            for choice in list {
                if !ids.insert(choice.id) {
                    return Err(ReportError::InvalidConfig(format!(
                        "duplicate id {} in {}",
                        choice.id, name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn medium(&self, label: &str) -> Option<&MediumSpec> {
        self.media.iter().find(|m| m.label == label)
    }

    pub fn country_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.country_names
            .get(code)
            .map(String::as_str)
            .unwrap_or(code)
    }
}
