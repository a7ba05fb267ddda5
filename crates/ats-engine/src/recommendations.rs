//! Recommendation generator: turns keyword gaps and structural gaps into
//! prioritized, located suggestions.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use uuid::Uuid;

use crate::catalog::KeywordCatalog;
use crate::models::{
    ATSScoreBreakdown, KeywordCategory, MatchResultModel, MatchStatus, Recommendation,
    RequirementTier, ResumeCanonicalModel, Severity,
};
use crate::structure::{structure_checks, CHECK_QUANTIFIED, CHECK_SKILLS, CHECK_SUMMARY};
use crate::text::{normalize_phrase, SECTION_EXPERIENCE, SECTION_SKILLS, SECTION_SUMMARY};

/// Role-title similarity below this earns a headline recommendation.
const WEAK_TITLE_SCORE: f64 = 50.0;

/// A recommendation plus the weight it sorts by.
struct Draft {
    recommendation: Recommendation,
    weight: f64,
}

/// Builds the recommendation list, sorted by severity then keyword weight and
/// truncated to `max`.
pub fn generate_recommendations(
    results: &[MatchResultModel],
    resume: &ResumeCanonicalModel,
    jd_title: Option<&str>,
    breakdown: &ATSScoreBreakdown,
    catalog: &KeywordCatalog,
    max: usize,
) -> Vec<Recommendation> {
    let best_experience = most_relevant_experience(results, resume);

    let mut drafts: Vec<Draft> = results
        .iter()
        .filter(|r| r.status != MatchStatus::Matched)
        .map(|r| keyword_draft(r, resume, catalog, best_experience.as_deref()))
        .collect();
    drafts.extend(structural_drafts(resume, jd_title, breakdown));

    // Stable: equal keys keep JD order, structural gaps last.
    drafts.sort_by(|a, b| {
        b.recommendation
            .severity
            .cmp(&a.recommendation.severity)
            .then_with(|| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal))
    });
    drafts.truncate(max);

    drafts.into_iter().map(|d| d.recommendation).collect()
}

/// Critical for required hard skills; warning for required non-hard-skills and
/// preferred hard skills; info otherwise. Partial matches drop one level.
pub fn keyword_severity(
    tier: RequirementTier,
    category: KeywordCategory,
    status: MatchStatus,
) -> Severity {
    let base = match (tier, category) {
        (RequirementTier::Required, KeywordCategory::HardSkill) => Severity::Critical,
        (RequirementTier::Required, _) | (RequirementTier::Preferred, KeywordCategory::HardSkill) => {
            Severity::Warning
        }
        (RequirementTier::Preferred, _) => Severity::Info,
    };
    if status == MatchStatus::Partial {
        match base {
            Severity::Critical => Severity::Warning,
            Severity::Warning | Severity::Info => Severity::Info,
        }
    } else {
        base
    }
}

fn keyword_draft(
    result: &MatchResultModel,
    resume: &ResumeCanonicalModel,
    catalog: &KeywordCatalog,
    best_experience: Option<&str>,
) -> Draft {
    let normalized = normalize_phrase(&result.keyword);
    let target = keyword_target(result, &normalized, resume, catalog, best_experience);
    let severity = keyword_severity(result.requirement_tier, result.category, result.status);

    let tier = match result.requirement_tier {
        RequirementTier::Required => "required",
        RequirementTier::Preferred => "preferred",
    };
    let kind = match result.category {
        KeywordCategory::HardSkill => "skill",
        KeywordCategory::Tool => "tool",
        KeywordCategory::Concept => "concept",
    };
    let message = match result.status {
        MatchStatus::Partial => format!(
            "Use the exact term \"{}\" in your {}; the resume only mentions a close variant of this {} {}.",
            result.keyword,
            target_label(&target),
            tier,
            kind
        ),
        _ => format!(
            "Add \"{}\" to your {}: the job description lists it as a {} {}.",
            result.keyword,
            target_label(&target),
            tier,
            kind
        ),
    };

    let status = match result.status {
        MatchStatus::Partial => "partial",
        _ => "missing",
    };

    Draft {
        recommendation: Recommendation {
            id: recommendation_id(&format!("keyword:{normalized}:{status}")),
            message,
            severity,
            target_location: target,
            related_keyword: Some(result.keyword.clone()),
            category: Some(result.category),
        },
        weight: result.weight,
    }
}

/// Technology names go to skills, generic concepts to the summary, other
/// concepts to the most relevant experience entry.
fn keyword_target(
    result: &MatchResultModel,
    normalized: &str,
    resume: &ResumeCanonicalModel,
    catalog: &KeywordCatalog,
    best_experience: Option<&str>,
) -> String {
    match result.category {
        KeywordCategory::HardSkill | KeywordCategory::Tool => SECTION_SKILLS.to_string(),
        KeywordCategory::Concept => {
            let generic = catalog
                .lookup(normalized, &result.keyword)
                .is_some_and(|id| catalog.term(id).generic);
            if generic {
                return SECTION_SUMMARY.to_string();
            }

            // A variant already sits in experience: point at it.
            if let Some(location) = result
                .locations
                .iter()
                .find(|l| l.section == SECTION_EXPERIENCE)
            {
                return location.to_string();
            }
            match best_experience {
                Some(location) => location.to_string(),
                None if resume.has_section(SECTION_EXPERIENCE) => {
                    format!("{SECTION_EXPERIENCE}:0")
                }
                None => SECTION_EXPERIENCE.to_string(),
            }
        }
    }
}

/// The experience line carrying the most JD keyword weight, ties to the earliest.
fn most_relevant_experience(
    results: &[MatchResultModel],
    resume: &ResumeCanonicalModel,
) -> Option<String> {
    if !resume.has_section(SECTION_EXPERIENCE) {
        return None;
    }

    let mut relevance: BTreeMap<usize, f64> = BTreeMap::new();
    for result in results {
        for location in result
            .locations
            .iter()
            .filter(|l| l.section == SECTION_EXPERIENCE)
        {
            *relevance.entry(location.index).or_default() += result.weight * result.confidence;
        }
    }

    relevance
        .into_iter()
        .fold(None, |best: Option<(usize, f64)>, (index, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((index, score)),
        })
        .map(|(index, _)| format!("{SECTION_EXPERIENCE}:{index}"))
}

fn structural_drafts(
    resume: &ResumeCanonicalModel,
    jd_title: Option<&str>,
    breakdown: &ATSScoreBreakdown,
) -> Vec<Draft> {
    let mut drafts = Vec::new();
    let structural = |subject: &str, message: String, severity: Severity, target: &str| Draft {
        recommendation: Recommendation {
            id: recommendation_id(&format!("structure:{subject}")),
            message,
            severity,
            target_location: target.to_string(),
            related_keyword: None,
            category: None,
        },
        weight: 0.0,
    };

    for check in structure_checks(resume).iter().filter(|c| !c.passed) {
        match check.name.as_str() {
            CHECK_SUMMARY => drafts.push(structural(
                CHECK_SUMMARY,
                "Add a short summary at the top that names your role and core technologies."
                    .to_string(),
                Severity::Warning,
                SECTION_SUMMARY,
            )),
            CHECK_SKILLS => drafts.push(structural(
                CHECK_SKILLS,
                "Add a dedicated skills section so keyword scanners can find your technologies."
                    .to_string(),
                Severity::Warning,
                SECTION_SKILLS,
            )),
            CHECK_QUANTIFIED => drafts.push(structural(
                CHECK_QUANTIFIED,
                "Quantify at least one achievement: add a number, percentage, or time saved."
                    .to_string(),
                Severity::Info,
                SECTION_EXPERIENCE,
            )),
            _ => {}
        }
    }

    if let Some(title) = jd_title {
        if breakdown.role_title_score < WEAK_TITLE_SCORE {
            drafts.push(structural(
                "role_title",
                format!("Align your headline with the role title \"{title}\"."),
                Severity::Warning,
                SECTION_SUMMARY,
            ));
        }
    }

    drafts
}

/// Name-based id: the same subject always yields the same UUID.
fn recommendation_id(subject: &str) -> Uuid {
    Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("ats-recommendation:{subject}").as_bytes(),
    )
}

fn target_label(target: &str) -> &'static str {
    match target.split(':').next() {
        Some(SECTION_SKILLS) => "skills section",
        Some(SECTION_SUMMARY) => "summary",
        _ => "experience",
    }
}
