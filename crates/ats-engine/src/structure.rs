//! Structural checks over a canonical resume: expected sections and at least
//! one quantified achievement.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::ResumeCanonicalModel;
use crate::text::{
    SECTION_ACHIEVEMENTS, SECTION_BODY, SECTION_EDUCATION, SECTION_EXPERIENCE, SECTION_PROJECTS,
    SECTION_SKILLS, SECTION_SUMMARY,
};

pub const CHECK_SUMMARY: &str = "summary";
pub const CHECK_EXPERIENCE: &str = "experience";
pub const CHECK_SKILLS: &str = "skills";
pub const CHECK_EDUCATION: &str = "education";
pub const CHECK_QUANTIFIED: &str = "quantified_achievement";

/// One fixed-point structural check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureCheck {
    pub name: String,
    pub points: u32,
    pub passed: bool,
}

const ACTION_VERBS: &[&str] = &[
    "led", "managed", "developed", "created", "designed", "implemented", "built", "architected",
    "engineered", "orchestrated", "spearheaded", "launched", "delivered", "achieved",
    "increased", "reduced", "improved", "optimized", "streamlined", "automated",
    "collaborated", "mentored", "trained", "migrated", "scaled", "shipped", "cut", "grew",
    "saved", "owned", "drove", "decreased", "accelerated", "generated",
];

/// Sections whose lines can carry an achievement.
const ACHIEVEMENT_SECTIONS: &[&str] = &[
    SECTION_EXPERIENCE,
    SECTION_PROJECTS,
    SECTION_ACHIEVEMENTS,
    SECTION_SUMMARY,
    SECTION_BODY,
];

static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:[-*•·▪►●–]|\d{1,2}[.)])\s*").unwrap());

/// A standalone number: not glued to letters, so `HTML5` and `OAuth2` do not count.
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+(?:[.,]\d+)*\b").unwrap());

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:19|20)\d{2}$").unwrap());

/// Evaluates every structural check in a fixed order.
pub fn structure_checks(resume: &ResumeCanonicalModel) -> Vec<StructureCheck> {
    let check = |name: &str, points: u32, passed: bool| StructureCheck {
        name: name.to_string(),
        points,
        passed,
    };

    vec![
        check(CHECK_SUMMARY, 25, resume.has_section(SECTION_SUMMARY)),
        check(CHECK_EXPERIENCE, 25, resume.has_section(SECTION_EXPERIENCE)),
        check(CHECK_SKILLS, 20, resume.has_section(SECTION_SKILLS)),
        check(CHECK_EDUCATION, 10, resume.has_section(SECTION_EDUCATION)),
        check(CHECK_QUANTIFIED, 20, has_quantified_achievement(resume)),
    ]
}

/// Earned points over available points, in `[0, 100]`.
pub fn structure_score(checks: &[StructureCheck]) -> f64 {
    let available: u32 = checks.iter().map(|c| c.points).sum();
    if available == 0 {
        return 0.0;
    }
    let earned: u32 = checks.iter().filter(|c| c.passed).map(|c| c.points).sum();
    100.0 * f64::from(earned) / f64::from(available)
}

fn has_quantified_achievement(resume: &ResumeCanonicalModel) -> bool {
    ACHIEVEMENT_SECTIONS
        .iter()
        .flat_map(|section| resume.section_lines(section))
        .any(|line| is_achievement_line(line) && is_quantified(line))
}

/// Bullet or action-verb-led line.
fn is_achievement_line(line: &str) -> bool {
    if BULLET.is_match(line) {
        return true;
    }
    let first = line
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphabetic()).to_lowercase())
        .unwrap_or_default();
    ACTION_VERBS.contains(&first.as_str())
}

/// Percentages, currency amounts, or any number that is not a bare year.
///
/// PASS examples: `cut costs 30%`, `saved $50k`, `~2 hours`, `3 microservices`.
pub fn is_quantified(line: &str) -> bool {
    if line.contains(['%', '$', '€', '£']) {
        return true;
    }
    NUMBER
        .find_iter(line)
        .any(|m| !YEAR.is_match(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalizer::canonicalize;

    #[test]
    fn test_quantified_with_percentage() {
        assert!(is_quantified("Reduced latency by 40% through caching"));
    }

    #[test]
    fn test_quantified_with_currency() {
        assert!(is_quantified("Saved $50,000 annually by optimizing queries"));
    }

    #[test]
    fn test_quantified_with_count() {
        assert!(is_quantified("Built 3 microservices handling 10k rps"));
    }

    #[test]
    fn test_years_and_versions_are_not_metrics() {
        assert!(!is_quantified("Software Engineer, 2019 - 2023"));
        assert!(!is_quantified("Migrated pages to HTML5 and OAuth2"));
    }

    #[test]
    fn test_full_resume_passes_every_check() {
        let resume = canonicalize(
            "Summary\nEngineer.\nExperience\n- Cut build times by 30%\nSkills\nRust\nEducation\nBSc",
        )
        .unwrap();
        let checks = structure_checks(&resume);
        assert!(checks.iter().all(|c| c.passed), "{checks:?}");
        assert_eq!(structure_score(&checks), 100.0);
    }

    #[test]
    fn test_skills_only_resume_scores_twenty() {
        let resume = canonicalize("Skills: React, TypeScript").unwrap();
        assert_eq!(structure_score(&structure_checks(&resume)), 20.0);
    }

    #[test]
    fn test_number_outside_achievement_line_does_not_count() {
        let resume = canonicalize("Experience\nAcme Corp, 2019 to 2023\nTeam of 5 engineers").unwrap();
        let checks = structure_checks(&resume);
        let quantified = checks.iter().find(|c| c.name == CHECK_QUANTIFIED).unwrap();
        assert!(!quantified.passed);
    }

    #[test]
    fn test_action_verb_line_counts() {
        let resume = canonicalize("Experience\nLed a team of 5 engineers").unwrap();
        let checks = structure_checks(&resume);
        assert!(checks.iter().any(|c| c.name == CHECK_QUANTIFIED && c.passed));
    }

    #[test]
    fn test_empty_checks_score_zero() {
        assert_eq!(structure_score(&[]), 0.0);
    }
}
