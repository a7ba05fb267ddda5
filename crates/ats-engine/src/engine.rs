//! The evaluation pipeline: JD parse → resume canonicalization → matching →
//! scoring → recommendations.
//!
//! `Engine` is a plain value object: no I/O, no global state. Both execution
//! backends run this exact code, which is what keeps their JSON identical.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canonicalizer::canonicalize;
use crate::catalog::KeywordCatalog;
use crate::errors::EngineError;
use crate::jd_parser::parse_jd;
use crate::matcher::{match_keywords, MatchThresholds};
use crate::models::{ATSEvaluationResponse, JobDescriptionModel, ResumeCanonicalModel};
use crate::recommendations::generate_recommendations;
use crate::scoring::{compute_breakdown, ScoringWeights};

pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 10;

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub weights: ScoringWeights,
    pub thresholds: MatchThresholds,
    pub max_recommendations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            thresholds: MatchThresholds::default(),
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.weights.validate()?;

        let t = &self.thresholds;
        let unit = 0.0..=1.0;
        if !unit.contains(&t.edit_similarity)
            || !unit.contains(&t.prefix_ratio)
            || !(0.5..=0.9).contains(&t.synonym_confidence)
        {
            return Err(EngineError::Config(format!(
                "match thresholds out of range: {t:?}"
            )));
        }
        if self.max_recommendations == 0 {
            return Err(EngineError::Config(
                "max_recommendations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rejects missing inputs before any parsing happens.
pub fn validate_inputs(resume_text: &str, jd_text: &str) -> Result<(), EngineError> {
    if resume_text.trim().is_empty() {
        return Err(EngineError::Validation("resumeText is required".to_string()));
    }
    if jd_text.trim().is_empty() {
        return Err(EngineError::Validation(
            "jobDescriptionText is required".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Engine {
    catalog: Arc<KeywordCatalog>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(catalog: Arc<KeywordCatalog>, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { catalog, config })
    }

    /// Bundled catalog, default tuning.
    pub fn with_defaults() -> Result<Self, EngineError> {
        Self::new(Arc::new(KeywordCatalog::bundled()?), EngineConfig::default())
    }

    pub fn catalog(&self) -> &KeywordCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn parse_job_description(&self, jd_text: &str) -> Result<JobDescriptionModel, EngineError> {
        if jd_text.trim().is_empty() {
            return Err(EngineError::Validation("rawText is required".to_string()));
        }
        parse_jd(jd_text, &self.catalog)
    }

    pub fn canonicalize_resume(&self, resume_text: &str) -> Result<ResumeCanonicalModel, EngineError> {
        if resume_text.trim().is_empty() {
            return Err(EngineError::Validation("resumeText is required".to_string()));
        }
        canonicalize(resume_text)
    }

    /// Full evaluation of one resume against one job description.
    pub fn evaluate(
        &self,
        resume_text: &str,
        jd_text: &str,
    ) -> Result<ATSEvaluationResponse, EngineError> {
        validate_inputs(resume_text, jd_text)?;
        let resume = canonicalize(resume_text)?;
        self.evaluate_with_resume(&resume, jd_text)
    }

    /// Evaluation against an already canonicalized resume.
    pub fn evaluate_with_resume(
        &self,
        resume: &ResumeCanonicalModel,
        jd_text: &str,
    ) -> Result<ATSEvaluationResponse, EngineError> {
        if jd_text.trim().is_empty() {
            return Err(EngineError::Validation(
                "jobDescriptionText is required".to_string(),
            ));
        }

        let jd = parse_jd(jd_text, &self.catalog)?;
        let match_results = match_keywords(&jd, resume, &self.catalog, &self.config.thresholds);
        let score_breakdown = compute_breakdown(
            &match_results,
            jd.role_title.as_deref(),
            resume,
            &self.config.weights,
        );
        let recommendations = generate_recommendations(
            &match_results,
            resume,
            jd.role_title.as_deref(),
            &score_breakdown,
            &self.catalog,
            self.config.max_recommendations,
        );

        debug!(
            "Evaluation complete: total={}, {} keywords, {} recommendations",
            score_breakdown.total,
            match_results.len(),
            recommendations.len()
        );

        Ok(ATSEvaluationResponse {
            score_breakdown,
            match_results,
            recommendations,
        })
    }
}
