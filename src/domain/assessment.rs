//! Assessment records in their loose (scraped/cleaned JSON) and strict forms.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::processing::cleaning::{extract_duration, map_test_types};

/// Canonical assessment category.
///
/// Variants are declared alphabetically so that `Ord` (and therefore any
/// `BTreeSet<Category>`) sorts the same way as the lowercase names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Behavioral,
    Cognitive,
    Personality,
    Simulation,
    Situational,
    Technical,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Behavioral,
        Category::Cognitive,
        Category::Personality,
        Category::Simulation,
        Category::Situational,
        Category::Technical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Behavioral => "behavioral",
            Category::Cognitive => "cognitive",
            Category::Personality => "personality",
            Category::Simulation => "simulation",
            Category::Situational => "situational",
            Category::Technical => "technical",
        }
    }

    /// Lowercase substrings of a free-text label that imply this category.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Behavioral => &["competencies", "competency"],
            Category::Cognitive => &["ability", "aptitude", "g+", "verify"],
            Category::Personality => &["personality", "behavior", "behaviour"],
            Category::Simulation => &["simulation"],
            Category::Situational => &["situational judgement", "biodata"],
            Category::Technical => &["knowledge", "skills", "developer", "engineering"],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| UnknownCategory(value.to_string()))
    }
}

/// `Duration` as it appears in catalog JSON: minutes once cleaned, free text
/// (`"N/A"`, `"Approximate Completion Time in minutes = 30"`) before.
///
/// Any other JSON value lands in `Other` so one odd record never fails the
/// whole file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationField {
    Minutes(u32),
    Text(String),
    Other(Value),
}

impl DurationField {
    pub fn minutes(&self) -> Option<u32> {
        match self {
            DurationField::Minutes(minutes) => Some(*minutes),
            DurationField::Text(text) => extract_duration(text),
            DurationField::Other(Value::Number(number)) => extract_duration(&number.to_string()),
            DurationField::Other(_) => None,
        }
    }
}

/// `Test Type` as it appears in catalog JSON: canonical tags once cleaned,
/// the scraped label list before.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestTypeField {
    Tags(Vec<String>),
    Text(String),
    Other(Value),
}

impl TestTypeField {
    /// Canonical categories; unknown tags and non-string entries are dropped.
    pub fn categories(&self) -> BTreeSet<Category> {
        match self {
            TestTypeField::Tags(tags) => tags.iter().filter_map(|tag| tag.parse().ok()).collect(),
            TestTypeField::Text(text) => map_test_types(text),
            TestTypeField::Other(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|tag| tag.parse().ok())
                .collect(),
            TestTypeField::Other(_) => BTreeSet::new(),
        }
    }
}

/// `"Yes"`/`"No"` from the crawler, or a plain boolean.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SupportFlag {
    Flag(bool),
    Text(String),
}

impl SupportFlag {
    pub fn from_bool(value: bool) -> Self {
        SupportFlag::Text(if value { "Yes" } else { "No" }.to_string())
    }

    pub fn is_supported(&self) -> bool {
        match self {
            SupportFlag::Flag(value) => *value,
            SupportFlag::Text(text) => text.trim().eq_ignore_ascii_case("yes"),
        }
    }
}

/// A catalog entry as persisted by the crawler and rewritten by the cleaner.
///
/// Every field is optional: detail pages fail, listing links lack titles, and
/// hand-edited files drop keys. Validation happens when converting into
/// [`Assessment`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    #[serde(
        rename = "Assessment Name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(rename = "URL", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "Duration", default)]
    pub duration: Option<DurationField>,
    #[serde(rename = "Test Type", default)]
    pub test_type: Option<TestTypeField>,
    #[serde(
        rename = "Original Test Type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub original_test_type: Option<String>,
    #[serde(
        rename = "Remote Testing Support",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub remote_support: Option<SupportFlag>,
    #[serde(
        rename = "Adaptive/IRT Support",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub adaptive_support: Option<SupportFlag>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("missing field `{0}`")]
pub struct MissingField(pub &'static str);

/// A validated assessment, ready to be embedded and served.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub name: String,
    pub url: String,
    pub duration_minutes: Option<u32>,
    pub categories: BTreeSet<Category>,
    pub original_test_type: Option<String>,
    pub remote_support: bool,
    pub adaptive_support: bool,
}

impl Assessment {
    /// Whether any of `required` is among this assessment's categories.
    pub fn matches_any(&self, required: &[Category]) -> bool {
        required
            .iter()
            .any(|category| self.categories.contains(category))
    }
}

impl TryFrom<&AssessmentRecord> for Assessment {
    type Error = MissingField;

    fn try_from(record: &AssessmentRecord) -> Result<Self, Self::Error> {
        let name = record
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(MissingField("Assessment Name"))?;
        let url = record
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(MissingField("URL"))?;

        let original_test_type = match (&record.original_test_type, &record.test_type) {
            (Some(original), _) => Some(original.clone()),
            (None, Some(TestTypeField::Text(text))) => Some(text.clone()),
            _ => None,
        };

        Ok(Self {
            name: name.to_string(),
            url: url.to_string(),
            duration_minutes: record.duration.as_ref().and_then(DurationField::minutes),
            categories: record
                .test_type
                .as_ref()
                .map(TestTypeField::categories)
                .unwrap_or_default(),
            original_test_type,
            remote_support: record
                .remote_support
                .as_ref()
                .is_some_and(SupportFlag::is_supported),
            adaptive_support: record
                .adaptive_support
                .as_ref()
                .is_some_and(SupportFlag::is_supported),
        })
    }
}
