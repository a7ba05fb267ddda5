//! JD Parser: extracts the role title and weighted, tiered keywords from a raw job description.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::catalog::{KeywordCatalog, TermId, MAX_TERM_WORDS};
use crate::errors::EngineError;
use crate::models::{
    JdKeyword, JdSection, JobDescriptionModel, KeywordCategory, RequirementTier,
};
use crate::text::{
    ends_clause, ends_sentence, ensure_parseable, find_title_span, is_role_noun, is_stop_word,
    normalize_phrase, normalize_word, round_to, section_heading, span_text, tokenize_words,
    TitleSpan, Word,
};

// ────────────────────────────────────────────────────────────────────────────
// Weighting constants
// ────────────────────────────────────────────────────────────────────────────

const TITLE_EMPHASIS: f64 = 2.0;
const BULLET_LEAD_EMPHASIS: f64 = 1.5;
const BULLET_EMPHASIS: f64 = 1.25;
const PROSE_EMPHASIS: f64 = 1.0;
/// "About us", "Benefits" and similar zones.
const INFORMATIONAL_DAMPING: f64 = 0.5;
/// Added per repeated occurrence.
const OCCURRENCE_BONUS: f64 = 0.25;
const MAX_EMPHASIS: f64 = 4.0;
const PREFERRED_FACTOR: f64 = 0.5;

// ────────────────────────────────────────────────────────────────────────────
// Cue tables
// ────────────────────────────────────────────────────────────────────────────

const REQUIREMENT_HEADINGS: &str = r"requirements|required skills|required qualifications|required|minimum qualifications|basic qualifications|qualifications|must[ -]haves?|what you['’]ll need|what you need|what we['’]re looking for|who you are|you have|technical skills|skills";
const PREFERRED_HEADINGS: &str = r"preferred qualifications|preferred skills|preferred|nice[ -]to[ -]haves?|bonus points|bonus|pluses|good to have|desired skills|desirable";
const RESPONSIBILITY_HEADINGS: &str = r"about the role|about the job|key responsibilities|responsibilities|what you['’]ll do|what you will do|your role|the role|duties|day[ -]to[ -]day";
const INFORMATIONAL_HEADINGS: &str = r"about us|about the company|about the team|about|benefits|perks|what we offer|compensation|our culture|why join us|equal opportunity";

static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:(?P<req>{})|(?P<pref>{})|(?P<resp>{})|(?P<info>{}))\s*:?$",
        REQUIREMENT_HEADINGS, PREFERRED_HEADINGS, RESPONSIBILITY_HEADINGS, INFORMATIONAL_HEADINGS
    ))
    .unwrap()
});

/// `Preferred: Kubernetes, Kafka` style cue inside a line.
static HEADING_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:(?P<req>{})|(?P<pref>{})|(?P<resp>{})|(?P<info>{}))\s*:",
        REQUIREMENT_HEADINGS, PREFERRED_HEADINGS, RESPONSIBILITY_HEADINGS, INFORMATIONAL_HEADINGS
    ))
    .unwrap()
});

static TITLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:job title|title|position|role)\s*:\s*(?P<title>\S.*)$").unwrap()
});

static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[•·▪►●]\s*|[-*–]\s+|\d{1,2}[.)]\s+)").unwrap()
});

static REQUIRED_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:required|requires?|must|mandatory|essential|minimum of|at least)\b")
        .unwrap()
});

static PREFERRED_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:preferred|prefer|nice[ -]to[ -]have|(?:a|big|huge) plus|bonus|desired|desirable|ideally|familiarity with|familiar with|exposure to|good to have|optional)\b",
    )
    .unwrap()
});

static ACRONYM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9&]{1,5}s?$").unwrap());

/// `OAuth2`, `IPv6`, `ES6.1`.
static VERSIONED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z.+#-]*[A-Za-z]\d{1,3}(?:\.\d+)*$").unwrap()
});

/// The `11` of `Windows 11`; years are excluded by the digit cap.
static VERSION_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?\d{1,3}(?:\.\d+)*$").unwrap());

/// Uppercase tokens that are not technical terms.
const ACRONYM_STOP_LIST: &[&str] = &[
    "US", "USA", "UK", "EU", "NYC", "SF", "LA", "OK", "EOE", "TBD", "FAQ", "CEO", "CTO", "CFO",
    "COO", "VP", "HR", "PTO", "USD", "EUR", "GBP", "AM", "PM", "ETA", "FTE", "YOE", "ASAP", "BS",
    "BA", "MS", "MBA", "PHD", "WE", "OUR", "YOU", "AND", "THE", "FOR", "WITH",
];

const SENIORITY_WORDS: &[&str] = &[
    "senior", "junior", "staff", "principal", "mid", "entry", "sr", "jr", "associate", "chief",
];

/// Capitalized words that never start or extend an out-of-catalog term.
const GENERIC_CAPITALIZED: &[&str] = &[
    "experience", "knowledge", "understanding", "strong", "excellent", "proven", "ability",
    "years", "year", "team", "teams", "company", "familiarity", "background", "expertise",
    "proficiency", "solid", "deep", "hands", "plus", "bonus", "new", "great", "good", "ideal",
    "candidate", "candidates", "opportunity", "benefits", "responsibilities", "requirements",
    "qualifications", "skills", "role", "position", "title", "salary", "remote", "hybrid",
    "office", "full", "time", "required", "preferred", "nice", "must", "ideally", "desired",
    "optional", "exposure", "familiar", "minimum", "degree", "bachelor", "master", "equivalent",
    "build", "develop", "own", "drive", "work", "join", "please", "apply",
];

// ────────────────────────────────────────────────────────────────────────────
// Line context
// ────────────────────────────────────────────────────────────────────────────

impl JdSection {
    fn tier(self) -> RequirementTier {
        match self {
            JdSection::Preferred => RequirementTier::Preferred,
            JdSection::Unspecified
            | JdSection::Requirements
            | JdSection::Responsibilities
            | JdSection::Informational => RequirementTier::Required,
        }
    }

    fn damping(self) -> f64 {
        if self == JdSection::Informational {
            INFORMATIONAL_DAMPING
        } else {
            1.0
        }
    }

    fn from_captures(caps: &Captures<'_>) -> JdSection {
        if caps.name("req").is_some() {
            JdSection::Requirements
        } else if caps.name("pref").is_some() {
            JdSection::Preferred
        } else if caps.name("resp").is_some() {
            JdSection::Responsibilities
        } else {
            JdSection::Informational
        }
    }
}

/// Where the role title sits inside the text.
#[derive(Debug, Clone)]
struct TitleSite {
    line: usize,
    span: TitleSpan,
    text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeywordKey {
    Term(TermId),
    Text(String),
}

/// One keyword hit inside a line, before aggregation.
#[derive(Debug, Clone)]
struct Candidate {
    key: KeywordKey,
    text: String,
    normalized: String,
    category: KeywordCategory,
    /// Index of the first word of the hit.
    word: usize,
}

#[derive(Debug, Clone)]
struct Aggregate {
    text: String,
    normalized: String,
    category: KeywordCategory,
    tier: RequirementTier,
    section: JdSection,
    max_emphasis: f64,
    frequency: u32,
}

impl Aggregate {
    fn weight(&self) -> f64 {
        let bonus = OCCURRENCE_BONUS * f64::from(self.frequency.saturating_sub(1));
        let emphasis = (self.max_emphasis + bonus).min(MAX_EMPHASIS);
        let factor = match self.tier {
            RequirementTier::Required => 1.0,
            RequirementTier::Preferred => PREFERRED_FACTOR,
        };
        round_to(emphasis * factor, 2)
    }
}

/// Keyword aggregation in JD order.
#[derive(Debug, Default)]
struct Inventory {
    entries: Vec<Aggregate>,
    by_key: HashMap<KeywordKey, usize>,
    by_text: HashMap<String, usize>,
}

impl Inventory {
    fn record(
        &mut self,
        candidate: Candidate,
        emphasis: f64,
        tier: RequirementTier,
        section: JdSection,
    ) {
        let lower = candidate.text.to_lowercase();
        let existing = self
            .by_key
            .get(&candidate.key)
            .or_else(|| self.by_text.get(&lower))
            .copied();

        match existing {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.frequency += 1;
                entry.max_emphasis = entry.max_emphasis.max(emphasis);
                self.by_key.entry(candidate.key).or_insert(idx);
            }
            None => {
                let idx = self.entries.len();
                self.entries.push(Aggregate {
                    text: candidate.text,
                    normalized: candidate.normalized,
                    category: candidate.category,
                    tier,
                    section,
                    max_emphasis: emphasis,
                    frequency: 1,
                });
                self.by_key.insert(candidate.key, idx);
                self.by_text.insert(lower, idx);
            }
        }
    }

    fn into_keywords(self) -> Vec<JdKeyword> {
        self.entries
            .into_iter()
            .map(|entry| JdKeyword {
                weight: entry.weight(),
                text: entry.text,
                normalized_text: entry.normalized,
                category: entry.category,
                requirement_tier: entry.tier,
                frequency: entry.frequency,
                jd_section: entry.section,
            })
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Parser
// ────────────────────────────────────────────────────────────────────────────

/// Parses a job description into its role title and keyword inventory.
///
/// Returns `EngineError::Parse` for empty or undecodable text. A JD without
/// recognizable keywords is valid and yields an empty inventory.
pub fn parse_jd(jd_text: &str, catalog: &KeywordCatalog) -> Result<JobDescriptionModel, EngineError> {
    ensure_parseable(jd_text, "job description")?;

    let lines: Vec<&str> = jd_text.lines().collect();
    let title = locate_title(&lines);

    let mut inventory = Inventory::default();
    let mut sections: BTreeMap<JdSection, Vec<&str>> = BTreeMap::new();
    let mut zone = JdSection::Unspecified;

    for (line_idx, raw_line) in lines.iter().enumerate() {
        let line = raw_line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        if let Some(heading_zone) = heading_zone(line) {
            zone = heading_zone;
            continue;
        }

        // Resume section labels (`Tech Stack`, `Work History`) never become keywords.
        let label = section_heading(line.trim());
        if label.is_some_and(|h| h.rest.is_none()) {
            continue;
        }
        let lead = line.len() - line.trim_start().len();
        let layout = LineLayout::new(line, label.map_or(0, |h| lead + h.label_end));

        for (segment_zone, text) in layout.segments(line, zone) {
            sections.entry(segment_zone).or_default().push(text);
        }

        let title_span = title
            .as_ref()
            .filter(|t| t.line == line_idx)
            .map(|t| t.span);
        zone = scan_line(line, zone, &layout, title_span, catalog, &mut inventory);
    }

    let keywords = inventory.into_keywords();
    let role_title = title.map(|t| t.text);

    debug!(
        "JD parsed: {} keywords, role title {:?}",
        keywords.len(),
        role_title
    );

    Ok(JobDescriptionModel {
        raw_text: jd_text.to_string(),
        role_title,
        sections: sections
            .into_iter()
            .map(|(zone, lines)| (zone.as_str().to_string(), lines.join("\n")))
            .collect(),
        keywords,
        catalog_version: catalog.version().to_string(),
    })
}

/// Zone switched to by a bare heading line such as `Nice to have:`.
fn heading_zone(line: &str) -> Option<JdSection> {
    let stripped = line
        .trim()
        .trim_start_matches(['#', '*', '-', '•', '▪', '►', '●', ' '])
        .trim_end_matches(['*', ' '])
        .trim();
    HEADING_LINE
        .captures(stripped)
        .map(|caps| JdSection::from_captures(&caps))
}

/// An explicit `Title:` line wins; otherwise the role-noun phrase of the first line.
fn locate_title(lines: &[&str]) -> Option<TitleSite> {
    for (idx, line) in lines.iter().enumerate() {
        let Some(caps) = TITLE_LINE.captures(line) else {
            continue;
        };
        let Some(value) = caps.name("title") else {
            continue;
        };
        let words = tokenize_words(line);
        let Some(first) = words.iter().position(|w| w.start >= value.start()) else {
            continue;
        };
        let text = value
            .as_str()
            .trim()
            .trim_end_matches(['.', ',', ';'])
            .to_string();
        if text.is_empty() {
            continue;
        }
        return Some(TitleSite {
            line: idx,
            span: TitleSpan {
                first,
                last: words.len() - 1,
            },
            text,
        });
    }

    let (idx, line) = lines
        .iter()
        .enumerate()
        .find(|(_, l)| !l.trim().is_empty())?;
    if heading_zone(line).is_some() || section_heading(line.trim()).is_some() {
        return None;
    }
    let words = tokenize_words(line);
    let span = find_title_span(line, &words)?;
    Some(TitleSite {
        line: idx,
        span,
        text: span_text(&words, span),
    })
}

/// Inline zone switches and the leading section label of one line.
struct LineLayout {
    /// `(start, end, zone)` of each inline cue such as `Nice to have:`.
    switches: Vec<(usize, usize, JdSection)>,
    /// Byte offset where a resume-style `Tech Stack:` label ends, else 0.
    label_end: usize,
}

impl LineLayout {
    fn new(line: &str, label_end: usize) -> Self {
        let switches = HEADING_INLINE
            .captures_iter(line)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some((whole.start(), whole.end(), JdSection::from_captures(&caps)))
            })
            .collect();
        Self {
            switches,
            label_end,
        }
    }

    /// Inline cues switch the zone from their position onward.
    fn zone_at(&self, offset: usize, line_zone: JdSection) -> JdSection {
        self.switches
            .iter()
            .filter(|(start, _, _)| *start <= offset)
            .last()
            .map(|(_, _, zone)| *zone)
            .unwrap_or(line_zone)
    }

    fn end_zone(&self, line_zone: JdSection) -> JdSection {
        self.switches
            .last()
            .map(|(_, _, zone)| *zone)
            .unwrap_or(line_zone)
    }

    /// Cue and label words are not keywords.
    fn is_label(&self, word: &Word<'_>) -> bool {
        word.text_end <= self.label_end
            || self
                .switches
                .iter()
                .any(|(start, end, _)| word.text_start >= *start && word.text_end <= *end)
    }

    /// The line's text split by zone, labels removed.
    fn segments<'a>(&self, line: &'a str, line_zone: JdSection) -> Vec<(JdSection, &'a str)> {
        let mut bounds = vec![(self.label_end, line_zone)];
        bounds.extend(self.switches.iter().map(|(_, end, zone)| (*end, *zone)));

        let mut out = Vec::new();
        for (idx, (start, zone)) in bounds.iter().enumerate() {
            let end = self
                .switches
                .get(idx)
                .map_or(line.len(), |(next_start, _, _)| *next_start);
            let start = (*start).max(self.label_end);
            if start >= end {
                continue;
            }
            let text = line[start..end].trim();
            if !text.is_empty() {
                out.push((*zone, text));
            }
        }
        out
    }
}

/// Extracts every keyword hit of one line into the inventory and returns the
/// zone in effect at the end of the line.
fn scan_line(
    line: &str,
    line_zone: JdSection,
    layout: &LineLayout,
    title_span: Option<TitleSpan>,
    catalog: &KeywordCatalog,
    inventory: &mut Inventory,
) -> JdSection {
    let words = tokenize_words(line);
    if words.is_empty() {
        return line_zone;
    }

    let mut consumed: Vec<bool> = words.iter().map(|w| layout.is_label(w)).collect();
    if let Some(span) = title_span {
        if TITLE_LINE.is_match(line) {
            // The `Title:` label itself.
            consumed[..span.first].fill(true);
        }
    }

    let segments = Segments::new(line, &words);
    let in_title = |idx: usize| title_span.is_some_and(|s| idx >= s.first && idx <= s.last);

    let mut candidates = scan_catalog(line, &words, &segments, catalog, &mut consumed);
    for (idx, flag) in consumed.iter_mut().enumerate() {
        *flag = *flag || in_title(idx);
    }
    candidates.extend(scan_heuristics(line, &words, &segments, &mut consumed));
    candidates.sort_by_key(|c| c.word);

    let is_bullet = BULLET.is_match(line);
    for (position, candidate) in candidates.into_iter().enumerate() {
        let word = &words[candidate.word];
        let zone = layout.zone_at(word.text_start, line_zone);
        let emphasis = if in_title(candidate.word) {
            TITLE_EMPHASIS
        } else {
            let base = match (is_bullet, position) {
                (true, 0) => BULLET_LEAD_EMPHASIS,
                (true, _) => BULLET_EMPHASIS,
                (false, _) => PROSE_EMPHASIS,
            };
            base * zone.damping()
        };
        let tier = segments.tier_at(line, candidate.word, zone);
        inventory.record(candidate, emphasis, tier, zone);
    }

    layout.end_zone(line_zone)
}

/// Greedy longest-first catalog lookup over 1 to 3 word windows.
fn scan_catalog(
    line: &str,
    words: &[Word<'_>],
    segments: &Segments,
    catalog: &KeywordCatalog,
    consumed: &mut [bool],
) -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < words.len() {
        if consumed[i] {
            i += 1;
            continue;
        }

        let mut hit = None;
        for len in (1..=MAX_TERM_WORDS).rev() {
            let last = i + len - 1;
            if last >= words.len() || !segments.same_clause(i, last) {
                continue;
            }
            if consumed[i..=last].iter().any(|c| *c) {
                continue;
            }
            let normalized = words[i..=last]
                .iter()
                .map(|w| normalize_word(w.text))
                .collect::<Vec<_>>()
                .join(" ");
            let surface = &line[words[i].text_start..words[last].text_end];
            if let Some(term) = catalog.lookup(&normalized, surface) {
                hit = Some((len, term, surface.to_string(), normalized));
                break;
            }
        }

        match hit {
            Some((len, term, surface, normalized)) => {
                out.push(Candidate {
                    key: KeywordKey::Term(term),
                    text: surface,
                    normalized,
                    category: catalog.term(term).category,
                    word: i,
                });
                consumed[i..i + len].iter_mut().for_each(|c| *c = true);
                i += len;
            }
            None => i += 1,
        }
    }

    out
}

/// Out-of-catalog terms: versioned tokens, acronyms, capitalized multi-word phrases.
fn scan_heuristics(
    line: &str,
    words: &[Word<'_>],
    segments: &Segments,
    consumed: &mut [bool],
) -> Vec<Candidate> {
    let mut out = Vec::new();
    let push = |out: &mut Vec<Candidate>, first: usize, last: usize| {
        let text = line[words[first].text_start..words[last].text_end].to_string();
        let normalized = normalize_phrase(&text);
        out.push(Candidate {
            key: KeywordKey::Text(normalized.clone()),
            text,
            normalized,
            category: KeywordCategory::Concept,
            word: first,
        });
    };

    // Versioned tokens: `OAuth2`, `Windows 11`.
    for i in 0..words.len() {
        if consumed[i] {
            continue;
        }
        if VERSIONED_TOKEN.is_match(words[i].text) {
            push(&mut out, i, i);
            consumed[i] = true;
            continue;
        }
        let next = i + 1;
        if next < words.len()
            && !consumed[next]
            && segments.same_clause(i, next)
            && is_term_word(words[i].text)
            && VERSION_NUMBER.is_match(words[next].text)
        {
            push(&mut out, i, next);
            consumed[i] = true;
            consumed[next] = true;
        }
    }

    // Acronyms.
    for i in 0..words.len() {
        if consumed[i] || !is_acronym(words[i].text) {
            continue;
        }
        push(&mut out, i, i);
        consumed[i] = true;
    }

    // Capitalized runs of two or three words.
    let mut i = 0;
    while i < words.len() {
        if consumed[i] || !is_term_word(words[i].text) {
            i += 1;
            continue;
        }
        let mut end = i;
        while end + 1 < words.len()
            && !consumed[end + 1]
            && segments.same_clause(end, end + 1)
            && is_term_word(words[end + 1].text)
        {
            end += 1;
        }
        let len = end - i + 1;
        if (2..=3).contains(&len) {
            push(&mut out, i, end);
            consumed[i..=end].iter_mut().for_each(|c| *c = true);
        }
        i = end + 1;
    }

    out
}

/// Title-cased word that may belong to an out-of-catalog term.
fn is_term_word(word: &str) -> bool {
    let mut chars = word.chars();
    let starts_upper = chars.next().is_some_and(char::is_uppercase);
    let lower = word.to_lowercase();
    starts_upper
        && word.chars().any(char::is_lowercase)
        && word.chars().all(|c| c.is_alphabetic() || c == '-' || c == '.')
        && !is_stop_word(word)
        && !is_role_noun(word)
        && !SENIORITY_WORDS.contains(&lower.as_str())
        && !GENERIC_CAPITALIZED.contains(&lower.as_str())
}

fn is_acronym(word: &str) -> bool {
    let base = word.strip_suffix('s').unwrap_or(word);
    let uppercase = base.chars().filter(char::is_ascii_uppercase).count();
    ACRONYM.is_match(word)
        && uppercase >= 2
        && !ACRONYM_STOP_LIST.contains(&base)
        && !is_stop_word(word)
}

// ────────────────────────────────────────────────────────────────────────────
// Sentence / clause segmentation
// ────────────────────────────────────────────────────────────────────────────

/// Sentence and clause membership of every word in a line.
#[derive(Debug)]
struct Segments {
    sentence_of: Vec<usize>,
    clause_of: Vec<usize>,
    /// Byte ranges, indexed by sentence / clause id.
    sentences: Vec<(usize, usize)>,
    clauses: Vec<(usize, usize)>,
}

impl Segments {
    fn new(line: &str, words: &[Word<'_>]) -> Self {
        let mut sentence_of = Vec::with_capacity(words.len());
        let mut clause_of = Vec::with_capacity(words.len());
        let mut sentences = Vec::new();
        let mut clauses = Vec::new();
        let mut sentence_start = 0;
        let mut clause_start = 0;

        for (i, word) in words.iter().enumerate() {
            sentence_of.push(sentences.len());
            clause_of.push(clauses.len());

            let boundary = words.get(i + 1).map(|next| next.start);
            let (sentence_ends, clause_ends) = match boundary {
                Some(next_start) => (
                    ends_sentence(line, word, next_start),
                    ends_clause(line, word, next_start),
                ),
                None => (true, true),
            };
            if clause_ends {
                clauses.push((words[clause_start].start, word.end));
                clause_start = i + 1;
            }
            if sentence_ends {
                sentences.push((words[sentence_start].start, word.end));
                sentence_start = i + 1;
            }
        }

        Self {
            sentence_of,
            clause_of,
            sentences,
            clauses,
        }
    }

    fn same_clause(&self, a: usize, b: usize) -> bool {
        self.clause_of[a] == self.clause_of[b]
    }

    /// Clause cue, then sentence cue, then the zone; conflicting cues defer outward.
    fn tier_at(&self, line: &str, word: usize, zone: JdSection) -> RequirementTier {
        let (cs, ce) = self.clauses[self.clause_of[word]];
        let (ss, se) = self.sentences[self.sentence_of[word]];
        cue_tier(&line[cs..ce])
            .or_else(|| cue_tier(&line[ss..se]))
            .unwrap_or_else(|| zone.tier())
    }
}

fn cue_tier(text: &str) -> Option<RequirementTier> {
    match (REQUIRED_CUE.is_match(text), PREFERRED_CUE.is_match(text)) {
        (true, false) => Some(RequirementTier::Required),
        (false, true) => Some(RequirementTier::Preferred),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_JD: &str = "Senior React Developer with TypeScript and AWS experience required. Familiarity with Docker preferred.";

    // JD fixture: enterprise posting with headed sections
    const ENTERPRISE_JD: &str = r#"
Software Engineer, Platform Team
Join our collaborative team to contribute to our microservices platform.

Requirements
- Java and Spring Boot in production
- Strong SQL skills

Nice to have:
- Kubernetes
- Experience with Kafka

About us
We run Terraform everywhere.
"#;

    fn catalog() -> KeywordCatalog {
        KeywordCatalog::bundled().unwrap()
    }

    fn keyword<'a>(model: &'a JobDescriptionModel, text: &str) -> &'a JdKeyword {
        model
            .keywords
            .iter()
            .find(|k| k.text.eq_ignore_ascii_case(text))
            .unwrap_or_else(|| panic!("keyword {text} not extracted: {:?}", model.keywords))
    }

    #[test]
    fn test_parse_jd_scenario_weights_and_tiers() {
        let model = parse_jd(SCENARIO_JD, &catalog()).unwrap();

        assert_eq!(model.role_title.as_deref(), Some("Senior React Developer"));
        assert_eq!(model.keywords.len(), 4, "{:?}", model.keywords);

        let react = keyword(&model, "React");
        assert_eq!(react.category, KeywordCategory::HardSkill);
        assert_eq!(react.requirement_tier, RequirementTier::Required);
        assert_eq!(react.weight, 2.0);

        assert_eq!(keyword(&model, "TypeScript").weight, 1.0);
        assert_eq!(keyword(&model, "AWS").requirement_tier, RequirementTier::Required);

        let docker = keyword(&model, "Docker");
        assert_eq!(docker.requirement_tier, RequirementTier::Preferred);
        assert_eq!(docker.weight, 0.5);
    }

    #[test]
    fn test_parse_jd_keywords_in_jd_order() {
        let model = parse_jd(SCENARIO_JD, &catalog()).unwrap();
        let texts: Vec<&str> = model.keywords.iter().map(|k| k.text.as_str()).collect();
        assert_eq!(texts, vec!["React", "TypeScript", "AWS", "Docker"]);
    }

    #[test]
    fn test_heading_zones_drive_tiers() {
        let model = parse_jd(ENTERPRISE_JD, &catalog()).unwrap();

        assert_eq!(model.role_title.as_deref(), Some("Software Engineer"));
        assert_eq!(keyword(&model, "Java").requirement_tier, RequirementTier::Required);
        assert_eq!(keyword(&model, "SQL").requirement_tier, RequirementTier::Required);
        assert_eq!(
            keyword(&model, "Kubernetes").requirement_tier,
            RequirementTier::Preferred
        );
        assert_eq!(keyword(&model, "Kafka").requirement_tier, RequirementTier::Preferred);
    }

    #[test]
    fn test_bullet_lead_outweighs_later_bullet_keywords() {
        let model = parse_jd(ENTERPRISE_JD, &catalog()).unwrap();
        assert_eq!(keyword(&model, "Java").weight, 1.5);
        assert_eq!(keyword(&model, "Spring Boot").weight, 1.25);
    }

    #[test]
    fn test_informational_zone_is_damped() {
        let model = parse_jd(ENTERPRISE_JD, &catalog()).unwrap();
        assert_eq!(keyword(&model, "Terraform").weight, 0.5);
    }

    #[test]
    fn test_inline_cues_switch_tier_mid_line() {
        let jd = "Backend Engineer\nRequired: Java, Spring Boot, SQL. Preferred: Kubernetes, CI/CD experience.";
        let model = parse_jd(jd, &catalog()).unwrap();
        assert_eq!(keyword(&model, "Spring Boot").requirement_tier, RequirementTier::Required);
        assert_eq!(
            keyword(&model, "Kubernetes").requirement_tier,
            RequirementTier::Preferred
        );
        assert_eq!(keyword(&model, "CI/CD").requirement_tier, RequirementTier::Preferred);
        assert!(model.keywords.iter().all(|k| !k.text.eq_ignore_ascii_case("required")));
    }

    #[test]
    fn test_sections_follow_zones() {
        let model = parse_jd(ENTERPRISE_JD, &catalog()).unwrap();

        let names: Vec<&str> = model.sections.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["informational", "preferred", "requirements", "unspecified"]);
        assert_eq!(
            model.sections["requirements"],
            "- Java and Spring Boot in production\n- Strong SQL skills"
        );
        assert_eq!(model.sections["preferred"], "- Kubernetes\n- Experience with Kafka");
        assert_eq!(model.sections["informational"], "We run Terraform everywhere.");
        assert!(model.sections["unspecified"].starts_with("Software Engineer, Platform Team\n"));

        assert_eq!(keyword(&model, "Java").jd_section, JdSection::Requirements);
        assert_eq!(keyword(&model, "Kafka").jd_section, JdSection::Preferred);
        assert_eq!(keyword(&model, "Terraform").jd_section, JdSection::Informational);
    }

    #[test]
    fn test_inline_cues_split_sections() {
        let jd = "Backend Engineer\nRequired: Java, Spring Boot, SQL. Preferred: Kubernetes, CI/CD experience.";
        let model = parse_jd(jd, &catalog()).unwrap();

        assert_eq!(model.sections["unspecified"], "Backend Engineer");
        assert_eq!(model.sections["requirements"], "Java, Spring Boot, SQL.");
        assert_eq!(model.sections["preferred"], "Kubernetes, CI/CD experience.");
        assert_eq!(keyword(&model, "SQL").jd_section, JdSection::Requirements);
        assert_eq!(keyword(&model, "CI/CD").jd_section, JdSection::Preferred);
    }

    #[test]
    fn test_resume_section_labels_are_not_keywords() {
        let jd = "Backend Engineer\nTech Stack: Rust, Kafka\nCore Competencies\n- Event sourcing\nProfessional Summary:\nPostgreSQL required.";
        let model = parse_jd(jd, &catalog()).unwrap();

        for label in ["Tech Stack", "Tech", "Stack", "Core Competencies", "Professional Summary"] {
            assert!(
                model.keywords.iter().all(|k| !k.text.eq_ignore_ascii_case(label)),
                "{label} extracted: {:?}",
                model.keywords
            );
        }
        assert_eq!(keyword(&model, "Rust").jd_section, JdSection::Unspecified);
        keyword(&model, "Kafka");
        keyword(&model, "PostgreSQL");
        assert_eq!(model.sections["unspecified"].lines().nth(1), Some("Rust, Kafka"));
    }

    #[test]
    fn test_resume_heading_first_line_is_not_a_title() {
        let model = parse_jd("Work History\nRust engineer wanted", &catalog()).unwrap();
        assert_eq!(model.role_title, None);
        assert!(model.keywords.iter().all(|k| !k.text.eq_ignore_ascii_case("Work History")));
    }

    #[test]
    fn test_sentence_cue_overrides_zone() {
        let jd = "Nice to have\n- Go; Linux is required";
        let model = parse_jd(jd, &catalog()).unwrap();
        assert_eq!(keyword(&model, "Go").requirement_tier, RequirementTier::Preferred);
        assert_eq!(keyword(&model, "Linux").requirement_tier, RequirementTier::Required);
    }

    #[test]
    fn test_clause_cue_beats_conflicting_sentence() {
        let jd = "Python required, Docker a plus.";
        let model = parse_jd(jd, &catalog()).unwrap();
        assert_eq!(keyword(&model, "Python").requirement_tier, RequirementTier::Required);
        assert_eq!(keyword(&model, "Docker").requirement_tier, RequirementTier::Preferred);
    }

    #[test]
    fn test_aliases_collapse_onto_one_keyword() {
        let jd = "Strong JavaScript skills. JS experience required.";
        let model = parse_jd(jd, &catalog()).unwrap();
        let js: Vec<_> = model
            .keywords
            .iter()
            .filter(|k| k.normalized_text == "javascript" || k.normalized_text == "js")
            .collect();
        assert_eq!(js.len(), 1);
        assert_eq!(js[0].text, "JavaScript");
        assert_eq!(js[0].frequency, 2);
        assert_eq!(js[0].weight, 1.25);
    }

    #[test]
    fn test_case_sensitive_terms_ignore_plain_words() {
        let jd = "We go fast. Experience with Go required.";
        let model = parse_jd(jd, &catalog()).unwrap();
        let go = keyword(&model, "Go");
        assert_eq!(go.text, "Go");
        assert_eq!(go.frequency, 1);
    }

    #[test]
    fn test_heuristics_extract_out_of_catalog_terms() {
        let jd = "Experience with OAuth2 and Windows 11 required. Knowledge of GDPR. Background in Domain Driven Design is a plus.";
        let model = parse_jd(jd, &catalog()).unwrap();

        for text in ["OAuth2", "Windows 11", "GDPR", "Domain Driven Design"] {
            assert_eq!(keyword(&model, text).category, KeywordCategory::Concept);
        }
        assert_eq!(
            keyword(&model, "Domain Driven Design").requirement_tier,
            RequirementTier::Preferred
        );
        assert!(model
            .keywords
            .iter()
            .all(|k| k.text != "Experience" && k.text != "Knowledge"));
    }

    #[test]
    fn test_explicit_title_line_wins() {
        let jd = "We are growing fast.\nTitle: Staff Data Engineer\nPython required.";
        let model = parse_jd(jd, &catalog()).unwrap();
        assert_eq!(model.role_title.as_deref(), Some("Staff Data Engineer"));
        assert!(model.keywords.iter().all(|k| k.text != "Title"));
    }

    #[test]
    fn test_no_title_without_role_noun() {
        let model = parse_jd("Python, Docker and Kubernetes.", &catalog()).unwrap();
        assert!(model.role_title.is_none());
        assert_eq!(model.keywords.len(), 3);
    }

    #[test]
    fn test_low_information_jd_is_valid() {
        let model = parse_jd("we are a friendly bunch", &catalog()).unwrap();
        assert!(model.keywords.is_empty());
        assert!(model.role_title.is_none());
    }

    #[test]
    fn test_empty_and_garbage_are_parse_errors() {
        assert!(matches!(parse_jd("  \n ", &catalog()), Err(EngineError::Parse(_))));
        assert!(matches!(
            parse_jd("\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}ab", &catalog()),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn test_weights_are_positive_and_capped() {
        let jd = "Rust Engineer\n".to_string() + &"Rust is required. ".repeat(20);
        let model = parse_jd(&jd, &catalog()).unwrap();
        assert!(model.keywords.iter().all(|k| k.weight > 0.0));
        assert_eq!(keyword(&model, "Rust").weight, MAX_EMPHASIS);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = parse_jd(ENTERPRISE_JD, &catalog()).unwrap();
        let b = parse_jd(ENTERPRISE_JD, &catalog()).unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}
