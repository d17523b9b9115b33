use crate::evaluation::SectionView;
use crate::section::Section;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceBand {
    Excellent,
    Good,
    Average,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl PerformanceBand {
    pub fn for_score(avg_final: f64) -> Self {
        if avg_final >= 80.0 {
            PerformanceBand::Excellent
        } else if avg_final >= 60.0 {
            PerformanceBand::Good
        } else if avg_final >= 40.0 {
            PerformanceBand::Average
        } else {
            PerformanceBand::NeedsImprovement
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Averages {
    pub final_total: f64,
    pub mcq: f64,
    pub likert: f64,
    pub manual: f64,
}

impl Averages {
    fn of<'a>(views: impl IntoIterator<Item = &'a SectionView>) -> Self {
        let mut n = 0usize;
        let mut sums = [0i64; 4];
        for v in views {
            n += 1;
            sums[0] = sums[0].saturating_add(v.final_total);
            sums[1] = sums[1].saturating_add(v.mcq_total);
            sums[2] = sums[2].saturating_add(v.likert_total);
            sums[3] = sums[3].saturating_add(v.text_total);
        }
        if n == 0 {
            return Averages::default();
        }
        let avg = |s: i64| round_1(s as f64 / n as f64);
        Averages {
            final_total: avg(sums[0]),
            mcq: avg(sums[1]),
            likert: avg(sums[2]),
            manual: avg(sums[3]),
        }
    }
}

fn round_1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPerformance {
    pub section: Section,
    pub submissions: usize,
    pub averages: Averages,
    pub band: PerformanceBand,
    pub insight: &'static str,
}

fn section_insight(section: Section, avg: &Averages) -> &'static str {
    match section {
        Section::Aptitude if avg.mcq >= 15.0 => "Strong analytical thinking demonstrated",
        Section::Aptitude => "Focus on logical reasoning and quantitative skills",
        Section::AdaptabilityLearning if avg.likert >= 20.0 => {
            "Excellent adaptability and learning agility"
        }
        Section::AdaptabilityLearning => "Develop flexibility and change management skills",
        Section::CommunicationObjective if avg.mcq >= 10.0 => "Good command of language basics",
        Section::CommunicationObjective => "Improve grammar and vocabulary fundamentals",
        Section::CommunicationDescriptive if avg.manual >= 15.0 => {
            "Effective written communication skills"
        }
        Section::CommunicationDescriptive => "Practice structured writing and expression",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub title: &'static str,
    pub details: &'static str,
}

const MAX_RECOMMENDATIONS: usize = 3;

fn recommendations(overall: &Averages) -> Vec<Recommendation> {
    let rules: [(bool, &'static str, &'static str); 4] = [
        (
            overall.mcq < 15.0,
            "Strengthen Conceptual Understanding",
            "Through targeted practice tests and analytical exercises",
        ),
        (
            overall.likert < 20.0,
            "Develop Adaptability Skills",
            "Through scenario-based learning and change management training",
        ),
        (
            overall.manual < 10.0,
            "Enhance Communication Skills",
            "With structured writing exercises and expression practice",
        ),
        (
            overall.mcq >= 20.0 && overall.likert >= 25.0,
            "Advanced Skill Development",
            "Focus on advanced topics and complex problem-solving",
        ),
    ];
    let mut out: Vec<Recommendation> = rules
        .into_iter()
        .filter(|(hit, _, _)| *hit)
        .map(|(_, title, details)| Recommendation { title, details })
        .collect();
    if out.is_empty() {
        out.push(Recommendation {
            title: "Maintain Balanced Performance",
            details: "Continue current learning strategies across all areas",
        });
    }
    out.truncate(MAX_RECOMMENDATIONS);
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMastery {
    pub category: &'static str,
    pub score: f64,
    pub max_possible: f64,
    pub percent: f64,
}

fn skill_mastery(overall: &Averages) -> Vec<SkillMastery> {
    [
        ("Analytical Skills", overall.mcq, 30.0),
        ("Adaptability", overall.likert, 40.0),
        ("Communication", overall.manual, 30.0),
    ]
    .into_iter()
    .map(|(category, score, max_possible)| SkillMastery {
        category,
        score,
        max_possible,
        percent: round_1(score / max_possible * 100.0),
    })
    .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub section_filter: Option<Section>,
    pub students: usize,
    pub submissions: usize,
    pub overall: Averages,
    pub sections: Vec<SectionPerformance>,
    pub recommendations: Vec<Recommendation>,
    pub skills: Vec<SkillMastery>,
}

/// Cohort summary over derived section views, optionally limited to one section.
pub fn summarize(views: &[SectionView], section_filter: Option<Section>) -> AnalyticsSummary {
    let selected: Vec<&SectionView> = views
        .iter()
        .filter(|v| section_filter.map_or(true, |s| v.section == s))
        .collect();

    let students: BTreeSet<&str> = selected.iter().map(|v| v.roll.as_str()).collect();
    let overall = Averages::of(selected.iter().copied());

    let mut by_section: BTreeMap<Section, Vec<&SectionView>> = BTreeMap::new();
    for v in &selected {
        by_section.entry(v.section).or_default().push(*v);
    }
    let sections = by_section
        .into_iter()
        .map(|(section, group)| {
            let averages = Averages::of(group.iter().copied());
            SectionPerformance {
                section,
                submissions: group.len(),
                band: PerformanceBand::for_score(averages.final_total),
                insight: section_insight(section, &averages),
                averages,
            }
        })
        .collect();

    let (recommendations, skills) = if selected.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        (recommendations(&overall), skill_mastery(&overall))
    };

    AnalyticsSummary {
        section_filter,
        students: students.len(),
        submissions: selected.len(),
        overall,
        sections,
        recommendations,
        skills,
    }
}
