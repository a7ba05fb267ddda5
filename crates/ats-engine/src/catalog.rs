//! Keyword catalog: the versioned dictionary of technical terms, their
//! categories and aliases.
//!
//! The catalog is data, not code. The bundled copy lives in
//! `data/keyword_catalog.json`; hosts may load a replacement from disk.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::EngineError;
use crate::models::KeywordCategory;
use crate::text::normalize_phrase;

const BUNDLED_CATALOG: &str = include_str!("../data/keyword_catalog.json");

/// Longest surface form (in words) the n-gram scanners will look up.
pub const MAX_TERM_WORDS: usize = 3;

pub type TermId = usize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTerm {
    pub name: String,
    pub category: KeywordCategory,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Match only the exact surface casing ("Go", "R", "Express").
    #[serde(default)]
    pub case_sensitive: bool,
    /// Soft skills, industries, methodologies: routed to the summary.
    #[serde(default)]
    pub generic: bool,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: String,
    terms: Vec<CatalogTerm>,
}

#[derive(Debug, Clone)]
struct Surface {
    term: TermId,
    text: String,
}

#[derive(Debug, Clone)]
pub struct KeywordCatalog {
    version: String,
    terms: Vec<CatalogTerm>,
    /// Normalized surface → candidate terms.
    index: HashMap<String, Vec<Surface>>,
}

impl KeywordCatalog {
    /// The catalog compiled into the binary.
    pub fn bundled() -> Result<Self, EngineError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn from_path(path: &Path) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Catalog(format!("cannot read catalog {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| EngineError::Catalog(format!("invalid catalog JSON: {e}")))?;
        Self::from_terms(file.version, file.terms)
    }

    pub fn from_terms(version: String, terms: Vec<CatalogTerm>) -> Result<Self, EngineError> {
        if version.trim().is_empty() {
            return Err(EngineError::Catalog("catalog version is empty".to_string()));
        }
        if terms.is_empty() {
            return Err(EngineError::Catalog("catalog has no terms".to_string()));
        }

        let mut index: HashMap<String, Vec<Surface>> = HashMap::new();
        let mut seen_names = HashSet::new();

        for (id, term) in terms.iter().enumerate() {
            if !seen_names.insert(term.name.to_lowercase()) {
                return Err(EngineError::Catalog(format!(
                    "duplicate catalog term '{}'",
                    term.name
                )));
            }

            for surface in std::iter::once(&term.name).chain(term.aliases.iter()) {
                let key = normalize_phrase(surface);
                if key.is_empty() {
                    return Err(EngineError::Catalog(format!(
                        "term '{}' has an empty surface form",
                        term.name
                    )));
                }
                if key.split(' ').count() > MAX_TERM_WORDS {
                    return Err(EngineError::Catalog(format!(
                        "surface '{surface}' exceeds {MAX_TERM_WORDS} words"
                    )));
                }
                index.entry(key).or_default().push(Surface {
                    term: id,
                    text: surface.clone(),
                });
            }
        }

        debug!(
            "Keyword catalog {} loaded: {} terms, {} surfaces",
            version,
            terms.len(),
            index.len()
        );

        Ok(Self {
            version,
            terms,
            index,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn term(&self, id: TermId) -> &CatalogTerm {
        &self.terms[id]
    }

    /// Resolves a normalized phrase to a catalog term.
    ///
    /// Case-sensitive terms only resolve when `surface` carries the exact casing.
    pub fn lookup(&self, normalized: &str, surface: &str) -> Option<TermId> {
        self.index
            .get(normalized)?
            .iter()
            .find(|s| !self.terms[s.term].case_sensitive || s.text == surface.trim())
            .map(|s| s.term)
    }
}
