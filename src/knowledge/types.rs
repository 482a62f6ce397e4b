//! Knowledge record types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an editor sits in their career.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CareerStage {
    #[default]
    Emerging,
    Established,
    Veteran,
}

/// Known rate range for an editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub currency: String,
    /// Billing unit (`week`, `day`, `episode`).
    pub unit: String,
    pub last_updated: DateTime<Utc>,
}

/// Narrative summary of an editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSummary {
    pub career_stage: CareerStage,
    pub availability_pattern: String,
    pub rate_range: RateRange,
    pub strengths: Vec<String>,
    pub specialties: Vec<String>,
    pub preferred_project_types: Vec<String>,
    pub working_style: Vec<String>,
    pub communication_style: String,
    pub last_known_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimeMetrics {
    pub average_hours: f64,
    pub reliability: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCompletionMetrics {
    pub on_time_rate: f64,
    pub budget_adherence: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationMetrics {
    pub rating: f64,
    pub repeat_clients: u32,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSkillMetrics {
    /// Tool name to proficiency score.
    pub software_proficiency: BTreeMap<String, f64>,
    pub last_updated: DateTime<Utc>,
}

/// Numeric scorecards for an editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeMetrics {
    pub response_time: ResponseTimeMetrics,
    pub project_completion: ProjectCompletionMetrics,
    pub collaboration: CollaborationMetrics,
    pub technical_skills: TechnicalSkillMetrics,
}

/// Aggregated intelligence profile for one editor.
///
/// Stored at `editorKnowledge/{editorId}`. Element shapes of the record
/// sequences are free-form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditorKnowledge {
    pub summary: KnowledgeSummary,
    pub insights: Vec<serde_json::Value>,
    pub connections: Vec<serde_json::Value>,
    pub opportunities: Vec<serde_json::Value>,
    pub risks: Vec<serde_json::Value>,
    pub metrics: KnowledgeMetrics,
    pub last_updated: DateTime<Utc>,
    /// Share of the profile that has been populated, in `[0, 1]`.
    pub completeness: f64,
}

impl EditorKnowledge {
    /// A not-yet-enriched record with every field at its default.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            summary: KnowledgeSummary {
                career_stage: CareerStage::Emerging,
                availability_pattern: "unknown".to_string(),
                rate_range: RateRange {
                    min: None,
                    max: None,
                    currency: "USD".to_string(),
                    unit: "week".to_string(),
                    last_updated: now,
                },
                strengths: Vec::new(),
                specialties: Vec::new(),
                preferred_project_types: Vec::new(),
                working_style: Vec::new(),
                communication_style: "unknown".to_string(),
                last_known_status: "unknown".to_string(),
            },
            insights: Vec::new(),
            connections: Vec::new(),
            opportunities: Vec::new(),
            risks: Vec::new(),
            metrics: KnowledgeMetrics {
                response_time: ResponseTimeMetrics {
                    average_hours: 0.0,
                    reliability: 0.0,
                    last_updated: now,
                },
                project_completion: ProjectCompletionMetrics {
                    on_time_rate: 0.0,
                    budget_adherence: 0.0,
                    last_updated: now,
                },
                collaboration: CollaborationMetrics {
                    rating: 0.0,
                    repeat_clients: 0,
                    last_updated: now,
                },
                technical_skills: TechnicalSkillMetrics {
                    software_proficiency: BTreeMap::new(),
                    last_updated: now,
                },
            },
            last_updated: now,
            completeness: 0.0,
        }
    }

    /// Whether nothing has been learned about the editor yet.
    #[must_use]
    pub fn is_unenriched(&self) -> bool {
        let mut defaults = Self::new(self.last_updated);
        defaults.summary.rate_range.last_updated = self.summary.rate_range.last_updated;
        defaults.metrics.response_time.last_updated = self.metrics.response_time.last_updated;
        defaults.metrics.project_completion.last_updated =
            self.metrics.project_completion.last_updated;
        defaults.metrics.collaboration.last_updated = self.metrics.collaboration.last_updated;
        defaults.metrics.technical_skills.last_updated =
            self.metrics.technical_skills.last_updated;
        *self == defaults
    }
}

/// Mutation requested through the knowledge POST route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnowledgeAction {
    /// Merge caller-supplied fields into the record.
    Update,
    /// Rebuild the record from source data. Reserved.
    Regenerate,
}

impl KnowledgeAction {
    /// Wire names of every accepted action.
    pub const ACCEPTED: [&'static str; 2] = ["update", "regenerate"];

    /// Parse a wire action name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "update" => Some(Self::Update),
            "regenerate" => Some(Self::Regenerate),
            _ => None,
        }
    }

    /// Wire name of the action.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Regenerate => "regenerate",
        }
    }
}

/// Result of applying a knowledge action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The record was updated.
    Updated(Box<EditorKnowledge>),
    /// The action was accepted but is not available yet; nothing changed.
    NotImplemented { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shape() {
        let now = Utc::now();
        let knowledge = EditorKnowledge::new(now);

        assert_eq!(knowledge.summary.career_stage, CareerStage::Emerging);
        assert_eq!(knowledge.summary.availability_pattern, "unknown");
        assert!(knowledge.summary.strengths.is_empty());
        assert!(knowledge.summary.working_style.is_empty());
        assert!(knowledge.insights.is_empty());
        assert!(knowledge.risks.is_empty());
        assert!(knowledge
            .metrics
            .technical_skills
            .software_proficiency
            .is_empty());
        assert!(knowledge.completeness.abs() < f64::EPSILON);
        assert_eq!(knowledge.last_updated, now);
        assert!(knowledge.is_unenriched());
    }

    #[test]
    fn test_serializes_camel_case() {
        let knowledge = EditorKnowledge::new(Utc::now());
        let json = serde_json::to_value(&knowledge).unwrap();

        assert_eq!(json["summary"]["careerStage"], "emerging");
        assert_eq!(json["summary"]["rateRange"]["currency"], "USD");
        assert!(json["summary"]["rateRange"].get("min").is_none());
        assert_eq!(json["metrics"]["collaboration"]["repeatClients"], 0);
        assert!(json["metrics"]["technicalSkills"]["softwareProficiency"]
            .as_object()
            .unwrap()
            .is_empty());
        assert!(json["lastUpdated"].is_string());
    }

    #[test]
    fn test_enriched_record_detected() {
        let mut knowledge = EditorKnowledge::new(Utc::now());
        knowledge.summary.strengths.push("comedy timing".to_string());
        assert!(!knowledge.is_unenriched());
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(KnowledgeAction::parse("update"), Some(KnowledgeAction::Update));
        assert_eq!(
            KnowledgeAction::parse("regenerate"),
            Some(KnowledgeAction::Regenerate)
        );
        assert_eq!(KnowledgeAction::parse("delete-everything"), None);
        assert_eq!(KnowledgeAction::Regenerate.as_str(), "regenerate");
    }
}
