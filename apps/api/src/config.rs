use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use ats_engine::engine::DEFAULT_MAX_RECOMMENDATIONS;
use ats_engine::{Engine, EngineConfig, KeywordCatalog, ScoringWeights};
use axum::http::HeaderValue;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
/// Every variable is optional; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Overrides the bundled keyword catalog.
    pub catalog_path: Option<PathBuf>,
    /// Base URL of the remote evaluation service used as the router fallback.
    /// Read by `ExecutionRouter::from_config`; the HTTP service itself always
    /// evaluates in-process.
    pub remote_url: Option<String>,
    pub remote_timeout: Duration,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            None => DEFAULT_PORT,
        };

        let remote_timeout_secs = match lookup("ATS_REMOTE_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context("ATS_REMOTE_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_REMOTE_TIMEOUT_SECS,
        };
        if remote_timeout_secs == 0 {
            bail!("ATS_REMOTE_TIMEOUT_SECS must be at least 1");
        }

        let max_recommendations = match lookup("ATS_MAX_RECOMMENDATIONS") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .context("ATS_MAX_RECOMMENDATIONS must be a positive integer")?,
            None => DEFAULT_MAX_RECOMMENDATIONS,
        };

        let weights = match lookup("ATS_SCORE_WEIGHTS") {
            Some(raw) => parse_weights(&raw)?,
            None => ScoringWeights::default(),
        };

        let cors_origins = match lookup("ATS_CORS_ORIGINS") {
            Some(raw) => parse_origins(&raw)?,
            None => Vec::new(),
        };

        let engine = EngineConfig {
            weights,
            max_recommendations,
            ..EngineConfig::default()
        };
        engine.validate().context("invalid engine configuration")?;

        Ok(Config {
            port,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            catalog_path: non_empty(lookup("ATS_CATALOG_PATH")).map(PathBuf::from),
            remote_url: non_empty(lookup("ATS_REMOTE_URL"))
                .map(|url| url.trim_end_matches('/').to_string()),
            remote_timeout: Duration::from_secs(remote_timeout_secs),
            cors_origins,
            engine,
        })
    }

    /// Loads the catalog (bundled or overridden) and builds the engine.
    pub fn load_engine(&self) -> Result<Engine> {
        let catalog = match &self.catalog_path {
            Some(path) => KeywordCatalog::from_path(path)
                .with_context(|| format!("failed to load catalog from {}", path.display()))?,
            None => KeywordCatalog::bundled().context("bundled catalog is invalid")?,
        };
        Engine::new(Arc::new(catalog), self.engine.clone()).context("failed to build engine")
    }
}

/// Parses `"40,25,20,10,5"` into blend weights.
fn parse_weights(raw: &str) -> Result<ScoringWeights> {
    let parts = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .with_context(|| format!("ATS_SCORE_WEIGHTS entry '{}' is not a percentage", part.trim()))
        })
        .collect::<Result<Vec<_>>>()?;

    let percentages: [u32; 5] = parts.try_into().map_err(|parts: Vec<u32>| {
        anyhow::anyhow!(
            "ATS_SCORE_WEIGHTS needs 5 percentages (hard skill, tools, concept, role title, structure), got {}",
            parts.len()
        )
    })?;

    ScoringWeights::from_percentages(percentages).context("ATS_SCORE_WEIGHTS is invalid")
}

/// Parses `"https://a.example, https://b.example"` into explicit origins.
fn parse_origins(raw: &str) -> Result<Vec<String>> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect();

    for origin in &origins {
        if origin == "*" {
            bail!("ATS_CORS_ORIGINS must list explicit origins; leave it unset to allow any");
        }
        HeaderValue::from_str(origin)
            .with_context(|| format!("ATS_CORS_ORIGINS entry '{origin}' is not a valid origin"))?;
    }
    Ok(origins)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
