//! Score calculator: folds match results, role-title similarity and structure
//! checks into an `ATSScoreBreakdown`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strsim::sorensen_dice;

use crate::errors::EngineError;
use crate::models::{ATSScoreBreakdown, KeywordCategory, MatchResultModel, ResumeCanonicalModel};
use crate::structure::{structure_checks, structure_score};
use crate::text::{is_stop_word, normalize_phrase, round_to};

/// Blend weights for the total score, as fractions summing to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    pub hard_skill: f64,
    pub tools: f64,
    pub concept: f64,
    pub role_title: f64,
    pub structure: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            hard_skill: 0.40,
            tools: 0.25,
            concept: 0.20,
            role_title: 0.10,
            structure: 0.05,
        }
    }
}

impl ScoringWeights {
    const SUM_TOLERANCE: f64 = 1e-6;

    /// Builds weights from five integer percentages, e.g. `[40, 25, 20, 10, 5]`.
    pub fn from_percentages(percentages: [u32; 5]) -> Result<Self, EngineError> {
        let [hard_skill, tools, concept, role_title, structure] =
            percentages.map(|p| f64::from(p) / 100.0);
        let weights = Self {
            hard_skill,
            tools,
            concept,
            role_title,
            structure,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let parts = [
            self.hard_skill,
            self.tools,
            self.concept,
            self.role_title,
            self.structure,
        ];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EngineError::Config(
                "score weights must be finite and non-negative".to_string(),
            ));
        }
        let sum: f64 = parts.iter().sum();
        if (sum - 1.0).abs() > Self::SUM_TOLERANCE {
            return Err(EngineError::Config(format!(
                "score weights must sum to 100%, got {:.1}%",
                sum * 100.0
            )));
        }
        Ok(())
    }
}

/// Computes the full breakdown for one evaluation.
pub fn compute_breakdown(
    results: &[MatchResultModel],
    jd_title: Option<&str>,
    resume: &ResumeCanonicalModel,
    weights: &ScoringWeights,
) -> ATSScoreBreakdown {
    let coverage = overall_coverage(results);
    let hard_skill = category_score(results, KeywordCategory::HardSkill).unwrap_or(coverage);
    let tools = category_score(results, KeywordCategory::Tool).unwrap_or(coverage);
    let concept = category_score(results, KeywordCategory::Concept).unwrap_or(coverage);
    let role_title = role_title_score(jd_title, resume.title.as_deref(), coverage);
    let structure = structure_score(&structure_checks(resume));

    let blended = weights.hard_skill * hard_skill
        + weights.tools * tools
        + weights.concept * concept
        + weights.role_title * role_title
        + weights.structure * structure;

    ATSScoreBreakdown {
        hard_skill_score: round_to(hard_skill, 2),
        tools_score: round_to(tools, 2),
        concept_score: round_to(concept, 2),
        role_title_score: round_to(role_title, 2),
        structure_score: round_to(structure, 2),
        total: blended.round().clamp(0.0, 100.0) as u32,
    }
}

/// `100 × Σ(w·c) / Σw` over one category; `None` when the JD has none.
pub fn category_score(results: &[MatchResultModel], category: KeywordCategory) -> Option<f64> {
    weighted_coverage(results.iter().filter(|r| r.category == category))
}

/// Coverage over every keyword; 0 when the JD has no keywords.
pub fn overall_coverage(results: &[MatchResultModel]) -> f64 {
    weighted_coverage(results.iter()).unwrap_or(0.0)
}

fn weighted_coverage<'a>(results: impl Iterator<Item = &'a MatchResultModel>) -> Option<f64> {
    let (earned, total) = results.fold((0.0_f64, 0.0_f64), |(earned, total), r| {
        (earned + r.weight * r.confidence, total + r.weight)
    });
    (total > 0.0).then(|| (100.0 * earned / total).clamp(0.0, 100.0))
}

/// Textual similarity between JD and resume titles, in `[0, 100]`.
///
/// Without a JD title the score follows keyword coverage; without a resume
/// title it is 0.
pub fn role_title_score(jd_title: Option<&str>, resume_title: Option<&str>, coverage: f64) -> f64 {
    let Some(jd_title) = jd_title else {
        return coverage;
    };
    let Some(resume_title) = resume_title else {
        return 0.0;
    };

    let word_overlap = word_dice(jd_title, resume_title);
    let char_overlap = sorensen_dice(&jd_title.to_lowercase(), &resume_title.to_lowercase());
    (100.0 * (0.6 * word_overlap + 0.4 * char_overlap)).clamp(0.0, 100.0)
}

fn word_dice(a: &str, b: &str) -> f64 {
    let words = |s: &str| -> HashSet<String> {
        normalize_phrase(s)
            .split(' ')
            .filter(|w| !w.is_empty() && !is_stop_word(w))
            .map(str::to_string)
            .collect()
    };
    let (a, b) = (words(a), words(b));
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(&b).count();
    2.0 * shared as f64 / (a.len() + b.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, MatchStatus, RequirementTier};

    fn result(category: KeywordCategory, weight: f64, confidence: f64) -> MatchResultModel {
        let status = if confidence >= 1.0 {
            MatchStatus::Matched
        } else if confidence > 0.0 {
            MatchStatus::Partial
        } else {
            MatchStatus::Missing
        };
        MatchResultModel {
            keyword: "k".to_string(),
            category,
            requirement_tier: RequirementTier::Required,
            weight,
            status,
            confidence,
            locations: if confidence > 0.0 {
                vec![Location::new("skills", 0)]
            } else {
                vec![]
            },
            score_contribution: weight * confidence,
        }
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!(ScoringWeights::default().validate().is_ok());
    }

    #[test]
    fn test_from_percentages() {
        let w = ScoringWeights::from_percentages([50, 20, 20, 5, 5]).unwrap();
        assert!((w.hard_skill - 0.5).abs() < 1e-9);
        assert!(ScoringWeights::from_percentages([50, 50, 50, 0, 0]).is_err());
    }

    #[test]
    fn test_negative_weights_rejected() {
        let w = ScoringWeights {
            hard_skill: 1.2,
            tools: -0.2,
            concept: 0.0,
            role_title: 0.0,
            structure: 0.0,
        };
        assert!(matches!(w.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_category_score_is_weighted() {
        let results = vec![
            result(KeywordCategory::HardSkill, 2.0, 1.0),
            result(KeywordCategory::HardSkill, 1.0, 1.0),
            result(KeywordCategory::HardSkill, 1.0, 0.0),
            result(KeywordCategory::HardSkill, 0.5, 0.0),
        ];
        let score = category_score(&results, KeywordCategory::HardSkill).unwrap();
        assert!((score - 66.666).abs() < 0.01, "{score}");
        assert!(category_score(&results, KeywordCategory::Tool).is_none());
    }

    #[test]
    fn test_empty_category_inherits_coverage() {
        let results = vec![result(KeywordCategory::Tool, 1.0, 0.5)];
        let resume = ResumeCanonicalModel {
            sections: Default::default(),
            tokens: vec![],
            title: None,
        };
        let breakdown = compute_breakdown(&results, None, &resume, &ScoringWeights::default());
        assert_eq!(breakdown.tools_score, 50.0);
        assert_eq!(breakdown.hard_skill_score, 50.0);
        assert_eq!(breakdown.concept_score, 50.0);
        assert_eq!(breakdown.role_title_score, 50.0);
    }

    #[test]
    fn test_no_keywords_scores_zero() {
        let resume = ResumeCanonicalModel {
            sections: Default::default(),
            tokens: vec![],
            title: Some("Engineer".to_string()),
        };
        let breakdown = compute_breakdown(&[], None, &resume, &ScoringWeights::default());
        assert_eq!(breakdown.total, 0);
        assert_eq!(breakdown.hard_skill_score, 0.0);
    }

    #[test]
    fn test_role_title_score() {
        assert_eq!(
            role_title_score(Some("Senior React Developer"), Some("Senior React Developer"), 0.0),
            100.0
        );
        assert_eq!(role_title_score(Some("Senior React Developer"), None, 80.0), 0.0);
        assert_eq!(role_title_score(None, Some("Engineer"), 42.0), 42.0);

        let close = role_title_score(Some("Senior React Developer"), Some("React Developer"), 0.0);
        let far = role_title_score(Some("Senior React Developer"), Some("Data Scientist"), 0.0);
        assert!(close > far, "{close} vs {far}");
    }

    #[test]
    fn test_total_is_clamped_and_rounded() {
        let results = vec![result(KeywordCategory::HardSkill, 1.0, 1.0)];
        let resume = ResumeCanonicalModel {
            sections: Default::default(),
            tokens: vec![],
            title: None,
        };
        let breakdown = compute_breakdown(&results, None, &resume, &ScoringWeights::default());
        // 0.4·100 + 0.25·100 + 0.2·100 + 0.1·100 + 0.05·0
        assert_eq!(breakdown.total, 95);
        assert!(breakdown.total <= 100);
    }
}
