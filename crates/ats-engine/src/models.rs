//! Value objects produced by one evaluation.
//!
//! Everything here serializes to the JSON shape shared by the local and remote
//! backends: camelCase fields, snake_case enum values.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Enums
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCategory {
    HardSkill,
    Tool,
    Concept,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementTier {
    #[default]
    Required,
    Preferred,
}

/// JD zone a line belongs to, set by headings such as `Requirements` or `Benefits`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JdSection {
    #[default]
    Unspecified,
    Requirements,
    Preferred,
    Responsibilities,
    Informational,
}

impl JdSection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Requirements => "requirements",
            Self::Preferred => "preferred",
            Self::Responsibilities => "responsibilities",
            Self::Informational => "informational",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    Partial,
    Missing,
}

/// Ordered so that `Critical > Warning > Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

// ────────────────────────────────────────────────────────────────────────────
// Job description
// ────────────────────────────────────────────────────────────────────────────

/// A keyword extracted from the JD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdKeyword {
    /// Surface form as first written in the JD.
    pub text: String,
    pub normalized_text: String,
    pub category: KeywordCategory,
    /// Always > 0.
    pub weight: f64,
    pub requirement_tier: RequirementTier,
    pub frequency: u32,
    /// Zone of the first occurrence.
    pub jd_section: JdSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptionModel {
    pub raw_text: String,
    pub role_title: Option<String>,
    /// Zone name → its lines, heading labels removed. Only non-empty zones appear.
    pub sections: BTreeMap<String, String>,
    pub keywords: Vec<JdKeyword>,
    pub catalog_version: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Resume
// ────────────────────────────────────────────────────────────────────────────

/// Section name plus line ordinal inside it; serialized as `"experience:3"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location {
    pub section: String,
    pub index: usize,
}

impl Location {
    pub fn new(section: impl Into<String>, index: usize) -> Self {
        Self {
            section: section.into(),
            index,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.section, self.index)
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.to_string()
    }
}

impl TryFrom<String> for Location {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (section, index) = value
            .rsplit_once(':')
            .ok_or_else(|| format!("location '{value}' has no ':' separator"))?;
        let index = index
            .parse::<usize>()
            .map_err(|_| format!("location '{value}' has a non-numeric index"))?;
        if section.is_empty() {
            return Err(format!("location '{value}' has an empty section"));
        }
        Ok(Location::new(section, index))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeToken {
    pub text: String,
    pub normalized_text: String,
    pub location: Location,
}

impl ResumeToken {
    pub fn word_count(&self) -> usize {
        self.normalized_text.split(' ').count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeCanonicalModel {
    /// Section name → raw section text.
    pub sections: BTreeMap<String, String>,
    pub tokens: Vec<ResumeToken>,
    /// Detected role/title line, if any.
    pub title: Option<String>,
}

impl ResumeCanonicalModel {
    pub fn has_section(&self, name: &str) -> bool {
        self.sections
            .get(name)
            .map(|text| !text.trim().is_empty())
            .unwrap_or(false)
    }

    /// Non-empty lines of a section, in order; the position is the location index.
    pub fn section_lines(&self, name: &str) -> Vec<&str> {
        self.sections
            .get(name)
            .map(|text| {
                text.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Matching, scoring, recommendations
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultModel {
    pub keyword: String,
    pub category: KeywordCategory,
    pub requirement_tier: RequirementTier,
    pub weight: f64,
    pub status: MatchStatus,
    /// In `[0, 1]`: 1.0 matched, `[0.5, 0.9]` partial, 0.0 missing.
    pub confidence: f64,
    /// Deduplicated, in resume order; empty iff `status == Missing`.
    pub locations: Vec<Location>,
    /// `weight * confidence`.
    pub score_contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ATSScoreBreakdown {
    pub hard_skill_score: f64,
    pub tools_score: f64,
    pub concept_score: f64,
    pub role_title_score: f64,
    pub structure_score: f64,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Name-based UUID: stable across evaluations of the same inputs.
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
    /// `"skills"`, `"summary"`, `"experience"` or `"experience:N"`.
    pub target_location: String,
    pub related_keyword: Option<String>,
    pub category: Option<KeywordCategory>,
}

/// The single payload `evaluate` returns, identical across backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ATSEvaluationResponse {
    pub score_breakdown: ATSScoreBreakdown,
    pub match_results: Vec<MatchResultModel>,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_serializes_as_string() {
        let json = serde_json::to_string(&Location::new("experience", 3)).unwrap();
        assert_eq!(json, r#""experience:3""#);
    }

    #[test]
    fn test_location_rejects_malformed_strings() {
        assert!(serde_json::from_str::<Location>(r#""experience""#).is_err());
        assert!(serde_json::from_str::<Location>(r#""skills:x""#).is_err());
        assert!(serde_json::from_str::<Location>(r#"":2""#).is_err());
    }

    #[test]
    fn test_enum_wire_values_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&KeywordCategory::HardSkill).unwrap(),
            r#""hard_skill""#
        );
        assert_eq!(
            serde_json::to_string(&RequirementTier::Preferred).unwrap(),
            r#""preferred""#
        );
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), r#""critical""#);
    }

    #[test]
    fn test_jd_section_names_match_serde() {
        for section in [
            JdSection::Unspecified,
            JdSection::Requirements,
            JdSection::Preferred,
            JdSection::Responsibilities,
            JdSection::Informational,
        ] {
            assert_eq!(
                serde_json::to_string(&section).unwrap(),
                format!("\"{}\"", section.as_str())
            );
        }
    }

    #[test]
    fn test_severity_orders_critical_highest() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_breakdown_uses_camel_case_fields() {
        let breakdown = ATSScoreBreakdown {
            hard_skill_score: 50.0,
            tools_score: 0.0,
            concept_score: 0.0,
            role_title_score: 0.0,
            structure_score: 20.0,
            total: 21,
        };
        let value = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(value["hardSkillScore"], 50.0);
        assert_eq!(value["total"], 21);
    }
}
