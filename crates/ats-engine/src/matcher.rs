//! Keyword matcher: decides, for every JD keyword, whether the resume covers it
//! exactly, in some related form, or not at all.
//!
//! Algorithm, per keyword in JD order:
//! 1. exact normalized token match anywhere → `matched`, confidence 1.0
//!    (case-sensitive catalog terms also need the exact surface casing)
//! 2. otherwise the best fuzzy equivalent → `partial`, confidence in `[0.5, 0.9]`
//!    - catalog synonym (alias of the same term) → `synonym_confidence`
//!    - bounded edit similarity between same-length phrases → proportional
//!    - shared-stem prefix between single words → proportional
//! 3. otherwise → `missing`, confidence 0.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strsim::normalized_damerau_levenshtein;
use tracing::debug;

use crate::catalog::{KeywordCatalog, TermId};
use crate::models::{
    JdKeyword, JobDescriptionModel, Location, MatchResultModel, MatchStatus,
    ResumeCanonicalModel, ResumeToken,
};
use crate::text::round_to;

const PARTIAL_FLOOR: f64 = 0.5;
const PARTIAL_CEILING: f64 = 0.9;

/// Tunable fuzzy-match thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchThresholds {
    /// Minimum normalized Damerau-Levenshtein similarity.
    pub edit_similarity: f64,
    /// Both sides must be at least this many characters for edit similarity.
    pub edit_min_len: usize,
    /// Minimum `shorter / longer` length ratio for a prefix match.
    pub prefix_ratio: f64,
    pub prefix_min_stem: usize,
    pub synonym_confidence: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            edit_similarity: 0.80,
            edit_min_len: 5,
            prefix_ratio: 0.60,
            prefix_min_stem: 4,
            synonym_confidence: 0.90,
        }
    }
}

/// Resume tokens indexed for exact lookup.
struct TokenIndex<'a> {
    tokens: &'a [ResumeToken],
    exact: HashMap<&'a str, Vec<usize>>,
}

impl<'a> TokenIndex<'a> {
    fn build(resume: &'a ResumeCanonicalModel) -> Self {
        let mut exact: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, token) in resume.tokens.iter().enumerate() {
            exact.entry(token.normalized_text.as_str()).or_default().push(idx);
        }
        Self {
            tokens: &resume.tokens,
            exact,
        }
    }
}

/// Matches every JD keyword against the resume, preserving JD order.
pub fn match_keywords(
    jd: &JobDescriptionModel,
    resume: &ResumeCanonicalModel,
    catalog: &KeywordCatalog,
    thresholds: &MatchThresholds,
) -> Vec<MatchResultModel> {
    let index = TokenIndex::build(resume);
    let results: Vec<MatchResultModel> = jd
        .keywords
        .iter()
        .map(|keyword| match_keyword(keyword, &index, catalog, thresholds))
        .collect();

    debug!(
        "Matched {} keywords: {} matched, {} partial",
        results.len(),
        results.iter().filter(|r| r.status == MatchStatus::Matched).count(),
        results.iter().filter(|r| r.status == MatchStatus::Partial).count()
    );

    results
}

fn match_keyword(
    keyword: &JdKeyword,
    index: &TokenIndex<'_>,
    catalog: &KeywordCatalog,
    thresholds: &MatchThresholds,
) -> MatchResultModel {
    let term = catalog.lookup(&keyword.normalized_text, &keyword.text);
    // "Go" the language must not match "go" the verb.
    let cased_term = term.filter(|t| catalog.term(*t).case_sensitive);

    let exact: Vec<&Location> = index
        .exact
        .get(keyword.normalized_text.as_str())
        .into_iter()
        .flatten()
        .map(|&i| &index.tokens[i])
        .filter(|token| {
            cased_term.map_or(true, |t| {
                catalog.lookup(&token.normalized_text, &token.text) == Some(t)
            })
        })
        .map(|token| &token.location)
        .collect();
    if !exact.is_empty() {
        let locations = distinct_locations(exact.into_iter());
        return build_result(keyword, MatchStatus::Matched, 1.0, locations);
    }

    let word_count = keyword.normalized_text.split(' ').count();

    let mut best = 0.0_f64;
    let mut hits = Vec::new();
    for token in index.tokens {
        let confidence = fuzzy_confidence(keyword, term, word_count, token, catalog, thresholds);
        if confidence > 0.0 {
            best = best.max(confidence);
            hits.push(&token.location);
        }
    }

    if hits.is_empty() {
        build_result(keyword, MatchStatus::Missing, 0.0, Vec::new())
    } else {
        let confidence = best.clamp(PARTIAL_FLOOR, PARTIAL_CEILING);
        build_result(
            keyword,
            MatchStatus::Partial,
            confidence,
            distinct_locations(hits.into_iter()),
        )
    }
}

/// Best fuzzy confidence of one token, 0.0 when it is not an equivalent.
fn fuzzy_confidence(
    keyword: &JdKeyword,
    term: Option<TermId>,
    word_count: usize,
    token: &ResumeToken,
    catalog: &KeywordCatalog,
    thresholds: &MatchThresholds,
) -> f64 {
    let synonym = term
        .filter(|t| catalog.lookup(&token.normalized_text, &token.text) == Some(*t))
        .map(|_| thresholds.synonym_confidence)
        .unwrap_or(0.0);

    if token.word_count() != word_count {
        return synonym;
    }

    let edit = edit_confidence(&keyword.normalized_text, &token.normalized_text, thresholds);
    let prefix = if word_count == 1 {
        prefix_confidence(&keyword.normalized_text, &token.normalized_text, thresholds)
    } else {
        0.0
    };

    synonym.max(edit).max(prefix)
}

/// Maps similarity in `[threshold, 1]` onto `[0.5, 0.9]`.
fn scale(value: f64, threshold: f64) -> f64 {
    if threshold >= 1.0 {
        return PARTIAL_CEILING;
    }
    let t = ((value - threshold) / (1.0 - threshold)).clamp(0.0, 1.0);
    PARTIAL_FLOOR + (PARTIAL_CEILING - PARTIAL_FLOOR) * t
}

fn edit_confidence(keyword: &str, token: &str, thresholds: &MatchThresholds) -> f64 {
    if keyword.chars().count() < thresholds.edit_min_len
        || token.chars().count() < thresholds.edit_min_len
    {
        return 0.0;
    }
    let similarity = normalized_damerau_levenshtein(keyword, token);
    if similarity >= thresholds.edit_similarity {
        scale(similarity, thresholds.edit_similarity)
    } else {
        0.0
    }
}

fn prefix_confidence(keyword: &str, token: &str, thresholds: &MatchThresholds) -> f64 {
    let (short, long) = if keyword.len() <= token.len() {
        (keyword, token)
    } else {
        (token, keyword)
    };
    let short_len = short.chars().count();
    if short_len < thresholds.prefix_min_stem || !long.starts_with(short) {
        return 0.0;
    }
    let ratio = short_len as f64 / long.chars().count() as f64;
    if ratio >= thresholds.prefix_ratio {
        scale(ratio, thresholds.prefix_ratio)
    } else {
        0.0
    }
}

fn distinct_locations<'a>(locations: impl Iterator<Item = &'a Location>) -> Vec<Location> {
    let mut out: Vec<Location> = Vec::new();
    for location in locations {
        if !out.contains(location) {
            out.push(location.clone());
        }
    }
    out
}

fn build_result(
    keyword: &JdKeyword,
    status: MatchStatus,
    confidence: f64,
    locations: Vec<Location>,
) -> MatchResultModel {
    let confidence = round_to(confidence, 3);
    MatchResultModel {
        keyword: keyword.text.clone(),
        category: keyword.category,
        requirement_tier: keyword.requirement_tier,
        weight: keyword.weight,
        status,
        confidence,
        locations,
        score_contribution: round_to(keyword.weight * confidence, 4),
    }
}
