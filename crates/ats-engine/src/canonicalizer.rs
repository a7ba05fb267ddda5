//! Resume canonicalizer: splits a resume into named sections and location-tagged,
//! normalized 1 to 3 word tokens.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::catalog::MAX_TERM_WORDS;
use crate::errors::EngineError;
use crate::models::{Location, ResumeCanonicalModel, ResumeToken};
use crate::text::{
    ends_clause, ensure_parseable, find_title_span, normalize_word, section_heading, span_text,
    tokenize_words, SECTION_BODY, SECTION_EXPERIENCE,
};

static TITLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:current title|title|role|position|headline)\s*:\s*(?P<title>\S.*)$")
        .unwrap()
});

/// How many leading body lines may carry the candidate's headline.
const TITLE_SCAN_LINES: usize = 3;

/// Canonicalizes raw resume text.
///
/// Returns `EngineError::Parse` for empty or undecodable text. A resume with
/// no recognizable headings is valid; all of it lands in `body`.
pub fn canonicalize(resume_text: &str) -> Result<ResumeCanonicalModel, EngineError> {
    ensure_parseable(resume_text, "resume")?;

    let mut section_lines: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut tokens = Vec::new();
    let mut current = SECTION_BODY;

    for raw_line in resume_text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let content = match section_heading(line) {
            Some(heading) => {
                current = heading.section;
                section_lines.entry(current.to_string()).or_default();
                match heading.rest {
                    Some(rest) => rest,
                    None => continue,
                }
            }
            None => line,
        };

        let lines = section_lines.entry(current.to_string()).or_default();
        let location = Location::new(current, lines.len());
        tokens.extend(line_tokens(content, &location));
        lines.push(content.to_string());
    }

    let title = detect_title(&section_lines);
    let sections: BTreeMap<String, String> = section_lines
        .into_iter()
        .map(|(name, lines)| (name, lines.join("\n")))
        .collect();

    debug!(
        "Resume canonicalized: sections={:?}, {} tokens, title {:?}",
        sections.keys().collect::<Vec<_>>(),
        tokens.len(),
        title
    );

    Ok(ResumeCanonicalModel {
        sections,
        tokens,
        title,
    })
}

/// All 1 to 3 word n-grams of a line that stay within one clause.
fn line_tokens(line: &str, location: &Location) -> Vec<ResumeToken> {
    let words = tokenize_words(line);
    let normalized: Vec<String> = words.iter().map(|w| normalize_word(w.text)).collect();
    let mut out = Vec::new();

    for first in 0..words.len() {
        for last in first..(first + MAX_TERM_WORDS).min(words.len()) {
            if last > first && ends_clause(line, &words[last - 1], words[last].start) {
                break;
            }
            out.push(ResumeToken {
                text: line[words[first].text_start..words[last].text_end].to_string(),
                normalized_text: normalized[first..=last].join(" "),
                location: location.clone(),
            });
        }
    }

    out
}

/// Explicit `Title:` line, else the role-noun phrase of the first body lines,
/// else of the first experience line that has one.
fn detect_title(sections: &BTreeMap<String, Vec<String>>) -> Option<String> {
    let explicit = sections.values().flatten().find_map(|line| {
        TITLE_LINE.captures(line).and_then(|caps| {
            let value = caps.name("title")?.as_str().trim().trim_end_matches(['.', ',']);
            (!value.is_empty()).then(|| value.to_string())
        })
    });
    if explicit.is_some() {
        return explicit;
    }

    let body = sections
        .get(SECTION_BODY)
        .into_iter()
        .flatten()
        .take(TITLE_SCAN_LINES);
    let experience = sections.get(SECTION_EXPERIENCE).into_iter().flatten();

    body.chain(experience).find_map(|line| {
        let words = tokenize_words(line);
        find_title_span(line, &words).map(|span| span_text(&words, span))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::normalize_phrase;

    const RESUME: &str = r#"
Jane Doe
Senior Backend Engineer

Summary
Backend engineer focused on distributed systems.

EXPERIENCE
- Led migration to Kubernetes, cutting infra costs by 30%
- Built REST APIs in Rust

Skills: Rust, Go, PostgreSQL

Education
B.Sc. Computer Science
"#;

    fn locations_of<'a>(model: &'a ResumeCanonicalModel, phrase: &str) -> Vec<String> {
        let normalized = normalize_phrase(phrase);
        model
            .tokens
            .iter()
            .filter(|t| t.normalized_text == normalized)
            .map(|t| t.location.to_string())
            .collect()
    }

    #[test]
    fn test_canonicalize_splits_sections() {
        let model = canonicalize(RESUME).unwrap();

        let names: Vec<&str> = model.sections.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["body", "education", "experience", "skills", "summary"]);
        assert_eq!(model.section_lines("body"), vec!["Jane Doe", "Senior Backend Engineer"]);
        assert_eq!(model.sections["skills"], "Rust, Go, PostgreSQL");
        assert_eq!(model.section_lines("experience").len(), 2);
    }

    #[test]
    fn test_tokens_carry_section_and_line_ordinal() {
        let model = canonicalize(RESUME).unwrap();
        assert_eq!(locations_of(&model, "Kubernetes"), vec!["experience:0"]);
        assert_eq!(locations_of(&model, "Rust"), vec!["experience:1", "skills:0"]);
        assert_eq!(locations_of(&model, "REST APIs"), vec!["experience:1"]);
    }

    #[test]
    fn test_ngrams_do_not_cross_clause_boundaries() {
        let model = canonicalize(RESUME).unwrap();
        assert!(locations_of(&model, "Rust Go").is_empty());
        assert!(!locations_of(&model, "distributed systems").is_empty());
    }

    #[test]
    fn test_title_from_leading_body_lines() {
        let model = canonicalize(RESUME).unwrap();
        assert_eq!(model.title.as_deref(), Some("Senior Backend Engineer"));
    }

    #[test]
    fn test_explicit_title_line_wins() {
        let text = "Jane Doe\nHeadline: Platform Architect\nExperience\nSoftware Engineer at Acme";
        let model = canonicalize(text).unwrap();
        assert_eq!(model.title.as_deref(), Some("Platform Architect"));
    }

    #[test]
    fn test_title_falls_back_to_experience() {
        let text = "Jane Doe\njane@example.com\n\nExperience\nAcme Corp\nData Scientist, 2019 to 2023";
        let model = canonicalize(text).unwrap();
        assert_eq!(model.title.as_deref(), Some("Data Scientist"));
    }

    #[test]
    fn test_no_headings_lands_in_body() {
        let model = canonicalize("React and TypeScript developer").unwrap();
        assert_eq!(model.sections.len(), 1);
        assert!(model.has_section("body"));
        assert!(!model.has_section("skills"));
    }

    #[test]
    fn test_repeated_headings_accumulate() {
        let text = "Skills\nRust\nExperience\nAcme\nSkills\nGo";
        let model = canonicalize(text).unwrap();
        assert_eq!(model.section_lines("skills"), vec!["Rust", "Go"]);
        assert_eq!(locations_of(&model, "Go"), vec!["skills:1"]);
    }

    #[test]
    fn test_empty_and_garbage_resumes_fail_to_parse() {
        assert!(matches!(canonicalize(""), Err(EngineError::Parse(_))));
        assert!(matches!(canonicalize("••• ---"), Err(EngineError::Parse(_))));
        assert!(matches!(
            canonicalize("\u{0}\u{1}\u{2}\u{3}ab"),
            Err(EngineError::Parse(_))
        ));
    }
}
