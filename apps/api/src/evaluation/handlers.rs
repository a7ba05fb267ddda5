//! Axum route handlers for the ATS API.

use anyhow::Context;
use ats_engine::{validate_inputs, ATSEvaluationResponse, JobDescriptionModel};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Missing fields deserialize as empty so they surface as validation errors.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvaluateRequest {
    pub resume_text: String,
    pub job_description_text: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseJdRequest {
    pub raw_text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/ats/evaluate
///
/// Runs the full pipeline for one resume against one job description.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<ATSEvaluationResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    validate_inputs(&request.resume_text, &request.job_description_text)?;

    debug!(
        "Evaluating resume ({} chars) against JD ({} chars)",
        request.resume_text.len(),
        request.job_description_text.len()
    );

    let engine = state.engine.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        engine.evaluate(&request.resume_text, &request.job_description_text)
    })
    .await
    .context("evaluation task failed")?;
    let response = outcome?;

    info!(
        "Evaluation served: total={}, keywords={}",
        response.score_breakdown.total,
        response.match_results.len()
    );

    Ok(Json(response))
}

/// POST /api/v1/ats/parse-jd
///
/// Parses a raw job description. Useful for previewing extracted keywords.
pub async fn handle_parse_jd(
    State(state): State<AppState>,
    payload: Result<Json<ParseJdRequest>, JsonRejection>,
) -> Result<Json<JobDescriptionModel>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let engine = state.engine.clone();
    let outcome = tokio::task::spawn_blocking(move || engine.parse_job_description(&request.raw_text))
        .await
        .context("parse task failed")?;
    let model = outcome?;

    debug!("Parsed JD: {} keywords", model.keywords.len());

    Ok(Json(model))
}
