//! Deterministic resume ↔ job-description matching.
//!
//! The crate is pure computation: text in, `ATSEvaluationResponse` out. Hosts
//! (the HTTP service, the in-process sandbox worker) wrap an [`Engine`].

pub mod canonicalizer;
pub mod catalog;
pub mod engine;
pub mod errors;
pub mod jd_parser;
pub mod matcher;
pub mod models;
pub mod recommendations;
pub mod scoring;
pub mod structure;
pub mod text;

pub use catalog::KeywordCatalog;
pub use engine::{validate_inputs, Engine, EngineConfig};
pub use errors::EngineError;
pub use matcher::MatchThresholds;
pub use models::{
    ATSEvaluationResponse, ATSScoreBreakdown, JdKeyword, JdSection, JobDescriptionModel,
    KeywordCategory, MatchResultModel, MatchStatus, Recommendation, RequirementTier,
    ResumeCanonicalModel, Severity,
};
pub use scoring::ScoringWeights;
