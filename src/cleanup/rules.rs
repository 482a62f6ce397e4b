//! Rule table classifying editor documents as mock data.

use std::collections::HashSet;

use regex::Regex;
use serde::Serialize;

use crate::config::CleanupConfig;
use crate::store::Document;

/// Why a document was classified as mock data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchReason {
    /// Name is one of the known placeholder names.
    MockName,
    /// ID carries a synthetic prefix such as `web-`.
    SyntheticId,
    /// City and state are both unknown.
    UnknownLocation,
    /// Every professional field and the city are unknown.
    UnknownProfile,
}

impl MatchReason {
    /// Human-readable explanation.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::MockName => "known mock name",
            Self::SyntheticId => "synthetic id prefix",
            Self::UnknownLocation => "unknown city and state",
            Self::UnknownProfile => "unknown professional details and city",
        }
    }
}

/// Predicate over a raw editor document.
pub type Predicate = fn(&CleanupRules, &Document) -> bool;

/// One entry of the rule table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub reason: MatchReason,
    pub predicate: Predicate,
}

/// Rules in evaluation order; the first match wins.
pub const RULES: [Rule; 4] = [
    Rule {
        reason: MatchReason::MockName,
        predicate: has_mock_name,
    },
    Rule {
        reason: MatchReason::SyntheticId,
        predicate: has_synthetic_id,
    },
    Rule {
        reason: MatchReason::UnknownLocation,
        predicate: has_unknown_location,
    },
    Rule {
        reason: MatchReason::UnknownProfile,
        predicate: has_unknown_profile,
    },
];

const PROFESSIONAL_FIELDS: [&str; 3] = [
    "professional.union",
    "professional.experienceLevel",
    "professional.availability",
];

/// Missing, blank, and "unknown" (any case) all count as unknown.
fn is_unknown(value: Option<&str>) -> bool {
    value.map_or(true, |v| {
        let v = v.trim();
        v.is_empty() || v.eq_ignore_ascii_case("unknown")
    })
}

fn has_mock_name(rules: &CleanupRules, doc: &Document) -> bool {
    doc.str_field("name")
        .is_some_and(|name| rules.mock_names.contains(name.trim()))
}

fn has_synthetic_id(rules: &CleanupRules, doc: &Document) -> bool {
    rules
        .synthetic_id
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(&doc.id))
}

fn has_unknown_location(_rules: &CleanupRules, doc: &Document) -> bool {
    is_unknown(doc.str_field("location.city")) && is_unknown(doc.str_field("location.state"))
}

fn has_unknown_profile(_rules: &CleanupRules, doc: &Document) -> bool {
    PROFESSIONAL_FIELDS
        .iter()
        .all(|field| is_unknown(doc.str_field(field)))
        && is_unknown(doc.str_field("location.city"))
}

/// Parameters the rule table is evaluated with.
#[derive(Debug, Clone)]
pub struct CleanupRules {
    mock_names: HashSet<String>,
    synthetic_id: Option<Regex>,
}

impl CleanupRules {
    /// Build rules from mock names and synthetic ID prefixes.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix pattern cannot be compiled.
    pub fn new<I, S>(mock_names: I, id_prefixes: &[String]) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = id_prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| regex::escape(p))
            .collect();
        let synthetic_id = if prefixes.is_empty() {
            None
        } else {
            Some(Regex::new(&format!("^(?:{})", prefixes.join("|")))?)
        };

        Ok(Self {
            mock_names: mock_names.into_iter().map(Into::into).collect(),
            synthetic_id,
        })
    }

    /// Build rules from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix pattern cannot be compiled.
    pub fn from_config(config: &CleanupConfig) -> Result<Self, regex::Error> {
        Self::new(config.mock_names.iter().cloned(), &config.synthetic_id_prefixes)
    }

    /// The rule table in evaluation order.
    #[must_use]
    pub fn table(&self) -> &'static [Rule] {
        &RULES
    }

    /// First rule the document matches, if any.
    #[must_use]
    pub fn classify(&self, doc: &Document) -> Option<MatchReason> {
        RULES
            .iter()
            .find(|rule| (rule.predicate)(self, doc))
            .map(|rule| rule.reason)
    }
}

impl Default for CleanupRules {
    fn default() -> Self {
        let config = CleanupConfig::default();
        Self::from_config(&config).unwrap_or_else(|_| Self {
            mock_names: config.mock_names.iter().cloned().collect(),
            synthetic_id: None,
        })
    }
}
