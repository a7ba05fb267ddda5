//! Text primitives shared by the JD parser and the resume canonicalizer.
//!
//! Both sides of a match must agree on word boundaries and normalization, so
//! every tokenizing path in the engine goes through [`tokenize_words`] and
//! [`normalize`] / [`normalize_phrase`].

use crate::errors::EngineError;

/// Above this share of replacement/control characters the text is undecodable.
const MAX_GARBAGE_RATIO: f64 = 0.3;

/// Characters that always separate words.
const SEPARATORS: &[char] = &[
    ',', ';', ':', '(', ')', '[', ']', '{', '}', '|', '/', '\\', '"', '•', '·', '–', '—', '!',
    '?', '…', '<', '>', '*', '=', '~', '▪', '►', '●',
];

/// Characters that end a sentence when they close a word or sit between words.
const SENTENCE_ENDERS: &[char] = &['.', '!', '?', ';'];

const ABBREVIATIONS: &[&str] = &["sr.", "jr.", "mr.", "ms.", "mrs.", "dr.", "e.g.", "i.e.", "vs."];

const TRAILING_TRIM: &[char] = &['.', '\'', '-', '`', '’', '‘', '“', '”'];
const LEADING_TRIM: &[char] = &['\'', '-', '`', '‘', '“', '’'];

/// Catch-all section for text before the first recognized heading.
pub const SECTION_BODY: &str = "body";
pub const SECTION_SUMMARY: &str = "summary";
pub const SECTION_EXPERIENCE: &str = "experience";
pub const SECTION_SKILLS: &str = "skills";
pub const SECTION_EDUCATION: &str = "education";
pub const SECTION_PROJECTS: &str = "projects";
pub const SECTION_CERTIFICATIONS: &str = "certifications";
pub const SECTION_ACHIEVEMENTS: &str = "achievements";

/// Canonical section name → heading synonyms (lowercase).
const SECTION_HEADINGS: &[(&str, &[&str])] = &[
    (
        SECTION_SUMMARY,
        &[
            "summary",
            "professional summary",
            "career summary",
            "executive summary",
            "objective",
            "career objective",
            "profile",
            "professional profile",
            "about",
            "about me",
        ],
    ),
    (
        SECTION_EXPERIENCE,
        &[
            "experience",
            "professional experience",
            "work experience",
            "relevant experience",
            "employment",
            "employment history",
            "work history",
            "career history",
        ],
    ),
    (
        SECTION_SKILLS,
        &[
            "skills",
            "technical skills",
            "core skills",
            "key skills",
            "skills & tools",
            "skills and tools",
            "competencies",
            "core competencies",
            "technologies",
            "tech stack",
            "expertise",
            "tools",
        ],
    ),
    (
        SECTION_EDUCATION,
        &["education", "academic background", "academics", "academic", "degrees"],
    ),
    (
        SECTION_PROJECTS,
        &["projects", "personal projects", "side projects", "selected projects", "portfolio"],
    ),
    (
        SECTION_CERTIFICATIONS,
        &["certifications", "certificates", "licenses", "credentials"],
    ),
    (
        SECTION_ACHIEVEMENTS,
        &["achievements", "awards", "honors", "accomplishments"],
    ),
];

/// Words that never start or extend a title phrase, never form capitalized terms.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "be", "been", "have", "has", "had", "do", "does",
    "will", "would", "could", "should", "may", "might", "must", "that", "which", "who", "this",
    "these", "those", "it", "its", "their", "our", "your", "my", "we", "they", "you", "i", "he",
    "she", "can", "all", "each", "such", "what", "when", "where", "how", "why", "very", "also",
    "more", "about", "into", "through", "join", "looking", "hiring", "seeking", "if", "than",
    "so", "not", "only", "us", "am", "help", "work", "working",
];

/// Nouns that anchor a job title ("Senior Platform *Engineer*").
pub const ROLE_NOUNS: &[&str] = &[
    "engineer", "developer", "programmer", "architect", "manager", "designer", "analyst",
    "scientist", "administrator", "consultant", "specialist", "lead", "director", "intern",
    "technician", "officer", "coordinator", "strategist", "researcher", "head", "recruiter",
    "tester", "writer", "owner",
];

/// A word with its byte span inside the source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word<'a> {
    /// Word text with surrounding quote/period noise trimmed.
    pub text: &'a str,
    /// Raw span, trailing punctuation included.
    pub start: usize,
    pub end: usize,
    /// Span of `text` alone.
    pub text_start: usize,
    pub text_end: usize,
}

/// Splits a single line into words, keeping `+`, `#`, `.`, `-` inside words.
pub fn tokenize_words(line: &str) -> Vec<Word<'_>> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in line.char_indices() {
        let is_break = ch.is_whitespace() || SEPARATORS.contains(&ch);
        match (is_break, start) {
            (true, Some(s)) => {
                push_word(line, s, idx, &mut words);
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        push_word(line, s, line.len(), &mut words);
    }

    words
}

fn push_word<'a>(line: &'a str, start: usize, end: usize, out: &mut Vec<Word<'a>>) {
    let raw = &line[start..end];
    let head = raw.trim_end_matches(TRAILING_TRIM);
    let text = head.trim_start_matches(LEADING_TRIM);
    if text.chars().any(|c| c.is_alphanumeric()) {
        let text_start = start + (head.len() - text.len());
        out.push(Word {
            text,
            start,
            end,
            text_start,
            text_end: text_start + text.len(),
        });
    }
}

/// True if a sentence boundary lies between `prev` and the word that follows it.
pub fn ends_sentence(line: &str, prev: &Word<'_>, next_start: usize) -> bool {
    let raw = &line[prev.start..prev.end];
    let closes = raw
        .trim_end_matches(['\'', '"', ')', '’', '”'])
        .ends_with(SENTENCE_ENDERS);
    // "Node.js" keeps its dot; only a trailing dot ends the sentence.
    let abbreviation = ABBREVIATIONS.iter().any(|a| raw.eq_ignore_ascii_case(a));
    (closes && !abbreviation) || line[prev.end..next_start].contains(SENTENCE_ENDERS)
}

/// True if a clause boundary (comma, semicolon, colon or sentence end) lies between the words.
pub fn ends_clause(line: &str, prev: &Word<'_>, next_start: usize) -> bool {
    ends_sentence(line, prev, next_start) || line[prev.end..next_start].contains([',', ':', ';'])
}

/// Normalizes one token: lowercase, punctuation stripped (except `+` and `#`),
/// suffix-stemmed to a fixpoint. Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(token: &str) -> String {
    token
        .split_whitespace()
        .map(normalize_word)
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes a multi-word phrase exactly as the canonicalizer normalizes its n-grams.
pub fn normalize_phrase(phrase: &str) -> String {
    tokenize_words(phrase)
        .iter()
        .map(|w| normalize_word(w.text))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes a single word.
pub fn normalize_word(word: &str) -> String {
    let cleaned: String = word
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || *c == '+' || *c == '#')
        .collect();
    stem(&cleaned)
}

/// Suffix-stripping table applied until nothing changes.
///
/// Every rule shortens the word, so the loop terminates.
fn stem(word: &str) -> String {
    let mut current = word.to_string();
    if current.chars().any(|c| c.is_ascii_digit() || c == '+' || c == '#') {
        return current;
    }

    loop {
        let next = stem_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn stem_once(word: &str) -> String {
    let len = word.chars().count();

    if len > 4 {
        if let Some(base) = word.strip_suffix("ies") {
            return format!("{base}y");
        }
    }
    if len > 4 {
        for suffix in ["sses", "shes", "ches", "xes", "zes"] {
            if word.ends_with(suffix) {
                return word[..word.len() - 2].to_string();
            }
        }
    }
    if len >= 7 {
        if let Some(base) = word.strip_suffix("ing") {
            return base.to_string();
        }
    }
    if len >= 6 {
        if let Some(base) = word.strip_suffix("ed") {
            return base.to_string();
        }
    }
    if len > 3 && word.ends_with('s') {
        let keep = match word.chars().rev().nth(1) {
            Some('s' | 'u' | 'j' | 'o') => true,
            Some('i') => len > 4,
            _ => false,
        };
        if !keep {
            return word[..word.len() - 1].to_string();
        }
    }

    word.to_string()
}

/// A recognized resume section heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeading<'a> {
    pub section: &'static str,
    /// Content after an inline `Heading:` label.
    pub rest: Option<&'a str>,
    /// Byte offset where the heading label ends in the line.
    pub label_end: usize,
}

/// Recognizes `Experience`, `## SKILLS`, `Skills: Rust, Go`.
/// Shared by the canonicalizer and the JD parser.
pub fn section_heading(line: &str) -> Option<SectionHeading<'_>> {
    let body = line.trim_start_matches(['#', '*', '•', '-', ' ']);
    let offset = line.len() - body.len();
    let stripped = body.trim_end_matches(['*', ' ']);

    let bare = stripped.trim_end_matches(':').trim();
    if let Some(section) = section_for_heading(bare) {
        return Some(SectionHeading {
            section,
            rest: None,
            label_end: line.len(),
        });
    }

    let (head, rest) = stripped.split_once(':')?;
    let section = section_for_heading(head.trim())?;
    let rest = rest.trim();
    Some(SectionHeading {
        section,
        rest: (!rest.is_empty()).then_some(rest),
        label_end: offset + head.len() + 1,
    })
}

/// Canonical section for a heading synonym, case-insensitive.
pub fn section_for_heading(candidate: &str) -> Option<&'static str> {
    if candidate.is_empty() {
        return None;
    }
    let lower = candidate.to_lowercase();
    SECTION_HEADINGS
        .iter()
        .find(|(_, synonyms)| synonyms.contains(&lower.as_str()))
        .map(|(section, _)| *section)
}

/// True if the word (any case, plural tolerated) is a role noun.
pub fn is_role_noun(word: &str) -> bool {
    let lower = word.to_lowercase();
    let singular = lower.strip_suffix('s').unwrap_or(&lower);
    ROLE_NOUNS.contains(&lower.as_str()) || ROLE_NOUNS.contains(&singular)
}

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word.to_lowercase().as_str())
}

/// Word-index span of a title phrase inside a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleSpan {
    pub first: usize,
    pub last: usize,
}

/// Finds the role-noun phrase in the first sentence of `line`.
///
/// The phrase ends at the last role noun of the first run of role nouns
/// ("Lead Engineer") and reaches back over up to three non-stop-words.
pub fn find_title_span(line: &str, words: &[Word<'_>]) -> Option<TitleSpan> {
    let mut sentence_end = words.len();
    for i in 0..words.len().saturating_sub(1) {
        if ends_sentence(line, &words[i], words[i + 1].start) {
            sentence_end = i + 1;
            break;
        }
    }
    let sentence = &words[..sentence_end];

    let mut last = sentence.iter().position(|w| is_role_noun(w.text))?;
    while last + 1 < sentence.len()
        && is_role_noun(sentence[last + 1].text)
        && !ends_clause(line, &sentence[last], sentence[last + 1].start)
    {
        last += 1;
    }

    let mut first = last;
    while first > 0 && last - first < 3 {
        let candidate = &sentence[first - 1];
        if is_stop_word(candidate.text)
            || !candidate.text.chars().any(char::is_alphabetic)
            || ends_clause(line, candidate, sentence[first].start)
        {
            break;
        }
        first -= 1;
    }

    Some(TitleSpan { first, last })
}

/// Joins the words of a span with single spaces.
pub fn span_text(words: &[Word<'_>], span: TitleSpan) -> String {
    words[span.first..=span.last]
        .iter()
        .map(|w| w.text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rejects input that is empty, has no word characters, or is mostly
/// replacement/control characters.
pub fn ensure_parseable(text: &str, what: &str) -> Result<(), EngineError> {
    if text.trim().is_empty() {
        return Err(EngineError::Parse(format!("{what} is empty")));
    }
    if !text.chars().any(char::is_alphanumeric) {
        return Err(EngineError::Parse(format!("{what} contains no words")));
    }
    let ratio = garbage_ratio(text);
    if ratio > MAX_GARBAGE_RATIO {
        return Err(EngineError::Parse(format!(
            "{what} looks undecodable ({:.0}% unreadable characters)",
            ratio * 100.0
        )));
    }
    Ok(())
}

/// Share of characters that indicate undecodable input.
pub fn garbage_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut bad = 0usize;
    for ch in text.chars() {
        if ch.is_whitespace() {
            continue;
        }
        total += 1;
        if ch == '\u{FFFD}' || ch.is_control() {
            bad += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        bad as f64 / total as f64
    }
}

/// Rounds to `places` decimals so serialized floats stay stable.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<&str> {
        tokenize_words(line).iter().map(|w| w.text).collect()
    }

    #[test]
    fn test_tokenize_keeps_symbols_inside_words() {
        assert_eq!(
            texts("C++, C#, Node.js and CI/CD."),
            vec!["C++", "C#", "Node.js", "and", "CI", "CD"]
        );
    }

    #[test]
    fn test_tokenize_drops_pure_punctuation() {
        assert_eq!(texts("- React — & TypeScript"), vec!["React", "TypeScript"]);
    }

    #[test]
    fn test_section_heading_detection() {
        let heading = section_heading("## WORK EXPERIENCE").unwrap();
        assert_eq!((heading.section, heading.rest), (SECTION_EXPERIENCE, None));
        assert_eq!(section_heading("Skills:").unwrap().section, SECTION_SKILLS);
        assert_eq!(section_heading("Experience with Rust"), None);

        let line = "- Technical Skills: Rust";
        let heading = section_heading(line).unwrap();
        assert_eq!((heading.section, heading.rest), (SECTION_SKILLS, Some("Rust")));
        assert_eq!(&line[..heading.label_end], "- Technical Skills:");
    }

    #[test]
    fn test_section_for_heading_ignores_case() {
        assert_eq!(section_for_heading("Tech Stack"), Some(SECTION_SKILLS));
        assert_eq!(section_for_heading("PROFESSIONAL SUMMARY"), Some(SECTION_SUMMARY));
        assert_eq!(section_for_heading(""), None);
        assert_eq!(section_for_heading("Backend"), None);
    }

    #[test]
    fn test_normalize_strips_plurals_and_suffixes() {
        assert_eq!(normalize("Technologies"), "technology");
        assert_eq!(normalize("testing"), "test");
        assert_eq!(normalize("tested"), "test");
        assert_eq!(normalize("APIs"), "api");
        assert_eq!(normalize("classes"), "class");
    }

    #[test]
    fn test_normalize_keeps_short_and_symbolic_words() {
        assert_eq!(normalize("AWS"), "aws");
        assert_eq!(normalize("C++"), "c++");
        assert_eq!(normalize("C#"), "c#");
        assert_eq!(normalize("Redis"), "redis");
        assert_eq!(normalize("Node.js"), "nodejs");
        assert_eq!(normalize("HTML5"), "html5");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for word in [
            "settings", "processes", "Kubernetes", "mentoring", "libraries", "needs",
            "required", "preferred", "analytics", "company's", "engineering", "DevOps",
        ] {
            let once = normalize(word);
            assert_eq!(normalize(&once), once, "not idempotent for {word}");
        }
    }

    #[test]
    fn test_normalize_phrase_matches_ngram_normalization() {
        assert_eq!(normalize_phrase("CI/CD"), "ci cd");
        assert_eq!(normalize_phrase("Machine Learning"), "machine learn");
    }

    #[test]
    fn test_sentence_boundary_ignores_inner_dots() {
        let line = "Experience with Node.js required. Docker preferred.";
        let words = tokenize_words(line);
        assert!(!ends_sentence(line, &words[2], words[3].start));
        assert!(ends_sentence(line, &words[3], words[4].start));
    }

    #[test]
    fn test_title_span_walks_back_over_modifiers() {
        let line = "Senior React Developer with TypeScript and AWS experience required.";
        let words = tokenize_words(line);
        let span = find_title_span(line, &words).unwrap();
        assert_eq!(span_text(&words, span), "Senior React Developer");
    }

    #[test]
    fn test_title_span_extends_over_role_noun_runs() {
        let line = "We are hiring a Lead Engineer for our platform";
        let words = tokenize_words(line);
        let span = find_title_span(line, &words).unwrap();
        assert_eq!(span_text(&words, span), "Lead Engineer");
    }

    #[test]
    fn test_title_span_none_without_role_noun() {
        let line = "About our company";
        assert!(find_title_span(line, &tokenize_words(line)).is_none());
    }

    #[test]
    fn test_word_text_span_excludes_trimmed_punctuation() {
        let line = "Use 'Go.' daily";
        let words = tokenize_words(line);
        assert_eq!(&line[words[1].text_start..words[1].text_end], "Go");
    }

    #[test]
    fn test_ensure_parseable() {
        assert!(ensure_parseable("React developer", "resume").is_ok());
        assert!(matches!(ensure_parseable("   ", "resume"), Err(EngineError::Parse(_))));
        assert!(matches!(ensure_parseable("--- ***", "resume"), Err(EngineError::Parse(_))));
        assert!(ensure_parseable("\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}ok", "resume").is_err());
    }

    #[test]
    fn test_garbage_ratio_flags_replacement_chars() {
        assert!(garbage_ratio("\u{FFFD}\u{FFFD}\u{FFFD}ab") > 0.5);
        assert_eq!(garbage_ratio("plain text"), 0.0);
    }
}
