//! Editor, credit, and award records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DirectoryError;
use crate::store::Fields;

fn unknown() -> String {
    "unknown".to_string()
}

fn default_role() -> String {
    "Editor".to_string()
}

/// Where an editor is based.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub city: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Location {
    /// Location with city and state.
    #[must_use]
    pub fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
            country: None,
        }
    }
}

/// Professional standing of an editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    /// Guild membership, e.g. `MPEG`.
    #[serde(default = "unknown")]
    pub union: String,
    #[serde(default = "unknown")]
    pub experience_level: String,
    #[serde(default = "unknown")]
    pub availability: String,
}

impl Default for Professional {
    fn default() -> Self {
        Self {
            union: unknown(),
            experience_level: unknown(),
            availability: unknown(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_url: Option<String>,
}

/// Core profile of a television editor, stored at `editors/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Editor {
    pub id: String,
    pub name: String,
    pub location: Location,
    #[serde(default)]
    pub professional: Professional,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub networks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// Provider or import that supplied the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating or importing an editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewEditor {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub location: Location,
    #[serde(default)]
    pub professional: Professional,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub networks: Vec<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub contact: Option<Contact>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Check that an ID can address a document.
///
/// # Errors
///
/// Returns `Invalid` for empty IDs or IDs containing `/`.
pub fn validate_id(kind: &str, id: &str) -> Result<(), DirectoryError> {
    if id.trim().is_empty() || id.contains('/') {
        return Err(DirectoryError::Invalid(format!("{kind} id '{id}' is not addressable")));
    }
    Ok(())
}

impl NewEditor {
    /// Minimal editor with a name and location.
    #[must_use]
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            id: None,
            name: name.into(),
            location,
            professional: Professional::default(),
            genres: Vec::new(),
            networks: Vec::new(),
            bio: None,
            contact: None,
            source: None,
        }
    }

    /// Set an explicit ID (builder pattern).
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Explicit ID, or one derived from name, city, and state.
    ///
    /// The derived form is stable, so importing the same bundle again finds
    /// the record written the first time.
    #[must_use]
    pub fn resolved_id(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }
        slug(&format!(
            "{} {} {}",
            self.name, self.location.city, self.location.state
        ))
    }

    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the name is blank or the ID is not addressable.
    pub fn validate(&self) -> Result<(), DirectoryError> {
        if self.name.trim().is_empty() {
            return Err(DirectoryError::Invalid("editor name is required".to_string()));
        }
        if let Some(id) = &self.id {
            validate_id("editor", id)?;
        }
        Ok(())
    }

    /// Build the stored record.
    #[must_use]
    pub fn into_editor(self, id: String, now: DateTime<Utc>) -> Editor {
        Editor {
            id,
            name: self.name.trim().to_string(),
            location: self.location,
            professional: self.professional,
            genres: self.genres,
            networks: self.networks,
            bio: self.bio,
            contact: self.contact,
            source: self.source,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A show an editor cut.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credit {
    pub id: String,
    pub editor_id: String,
    pub show_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<u32>,
    #[serde(default = "default_role")]
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewCredit {
    #[serde(default)]
    pub id: Option<String>,
    pub show_title: String,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub episode_count: Option<u32>,
    #[serde(default)]
    pub role: Option<String>,
}

impl NewCredit {
    /// Credit for a show title.
    #[must_use]
    pub fn new(show_title: impl Into<String>) -> Self {
        Self {
            id: None,
            show_title: show_title.into(),
            network: None,
            season: None,
            year: None,
            episode_count: None,
            role: None,
        }
    }

    /// ID to store the credit under: the explicit one, or a stable slug so
    /// re-importing the same credit does not duplicate it.
    #[must_use]
    pub fn resolved_id(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }
        let mut parts = vec![self.show_title.clone()];
        if let Some(year) = self.year {
            parts.push(year.to_string());
        }
        if let Some(season) = self.season {
            parts.push(format!("s{season}"));
        }
        slug(&parts.join(" "))
    }

    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the title is blank or the ID is not addressable.
    pub fn validate(&self) -> Result<(), DirectoryError> {
        if self.show_title.trim().is_empty() {
            return Err(DirectoryError::Invalid("credit showTitle is required".to_string()));
        }
        validate_id("credit", &self.resolved_id())
    }

    /// Build the stored record.
    #[must_use]
    pub fn into_credit(self, editor_id: &str) -> Credit {
        Credit {
            id: self.resolved_id(),
            editor_id: editor_id.to_string(),
            show_title: self.show_title,
            network: self.network,
            season: self.season,
            year: self.year,
            episode_count: self.episode_count,
            role: self.role.unwrap_or_else(default_role),
        }
    }
}

/// Outcome of an award nomination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AwardResult {
    Won,
    #[default]
    Nominated,
}

/// An award or nomination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    pub id: String,
    pub editor_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub result: AwardResult,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewAward {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub result: AwardResult,
}

impl NewAward {
    /// Nomination for a named award.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            category: None,
            year: None,
            result: AwardResult::Nominated,
        }
    }

    /// ID to store the award under: the explicit one, or a stable slug.
    #[must_use]
    pub fn resolved_id(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }
        let mut parts = vec![self.name.clone()];
        if let Some(category) = &self.category {
            parts.push(category.clone());
        }
        if let Some(year) = self.year {
            parts.push(year.to_string());
        }
        slug(&parts.join(" "))
    }

    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the name is blank or the ID is not addressable.
    pub fn validate(&self) -> Result<(), DirectoryError> {
        if self.name.trim().is_empty() {
            return Err(DirectoryError::Invalid("award name is required".to_string()));
        }
        validate_id("award", &self.resolved_id())
    }

    /// Build the stored record.
    #[must_use]
    pub fn into_award(self, editor_id: &str) -> Award {
        Award {
            id: self.resolved_id(),
            editor_id: editor_id.to_string(),
            name: self.name,
            category: self.category,
            year: self.year,
            result: self.result,
        }
    }
}

/// Editor with their credits and awards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditorProfile {
    #[serde(flatten)]
    pub editor: Editor,
    pub credits: Vec<Credit>,
    pub awards: Vec<Award>,
}

/// Filters for listing editors. Results are sorted by name, not ranked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditorFilter {
    /// Case-insensitive substring of the editor name.
    pub q: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub limit: Option<usize>,
}

/// An editor with credits and awards as found in import files and feeds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditorBundle {
    #[serde(flatten)]
    pub editor: NewEditor,
    #[serde(default)]
    pub credits: Vec<NewCredit>,
    #[serde(default)]
    pub awards: Vec<NewAward>,
    /// Editor fields present in the raw input. `None` for bundles built in
    /// code, which count as supplying every field.
    #[serde(skip)]
    pub provided: Option<Fields>,
}

/// Bundle keys that never reach the editor document.
const BUNDLE_ONLY_FIELDS: [&str; 5] = ["id", "credits", "awards", "createdAt", "updatedAt"];

impl EditorBundle {
    /// Parse a bundle, remembering which editor fields the input supplied.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not describe a bundle.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let provided = value.as_object().map(|map| {
            map.iter()
                .filter(|(key, _)| !BUNDLE_ONLY_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Fields>()
        });
        let mut bundle: Self = serde_json::from_value(value)?;
        bundle.provided = provided;
        Ok(bundle)
    }
}

/// Lowercase ASCII slug with single dashes between words.
#[must_use]
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
