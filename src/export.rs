use crate::bank::BankSet;
use crate::evaluation::{saturating_sum, section_view};
use crate::section::Section;
use crate::store::Roster;
use serde::{Serialize, Serializer};

pub const REPORT_COLUMNS: [&str; 7] = [
    "Roll Number",
    "Section",
    "MCQ Score",
    "Likert Score",
    "Text Score",
    "Final Score (This Test)",
    "Grand Total (All Tests)",
];

pub const NOT_APPLICABLE: &str = "N/A";

/// A report value. "Not applicable" and a score of 0 are different things.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportCell {
    Score(i64),
    NotApplicable,
    Blank,
}

impl ReportCell {
    fn applicable(applies: bool, score: i64) -> Self {
        if applies {
            ReportCell::Score(score)
        } else {
            ReportCell::NotApplicable
        }
    }

    pub fn to_csv(self) -> String {
        match self {
            ReportCell::Score(v) => v.to_string(),
            ReportCell::NotApplicable => NOT_APPLICABLE.to_string(),
            ReportCell::Blank => String::new(),
        }
    }
}

impl Serialize for ReportCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReportCell::Score(v) => serializer.serialize_i64(*v),
            ReportCell::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
            ReportCell::Blank => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub roll: String,
    pub section: Section,
    pub mcq_score: ReportCell,
    pub likert_score: ReportCell,
    pub text_score: ReportCell,
    pub final_score: ReportCell,
    pub grand_total: ReportCell,
}

/// One row per submission, grouped by roll and in canonical section order.
/// The grand total appears on the first row of each student only.
pub fn build_report(banks: &BankSet, roster: &Roster) -> Vec<ReportRow> {
    let mut rows = Vec::new();
    for (roll, submissions) in roster {
        let mut views: Vec<_> = submissions.iter().map(|s| section_view(banks, s)).collect();
        views.sort_by_key(|v| v.section);
        let grand_total = saturating_sum(views.iter().map(|v| v.final_total));

        for (i, v) in views.iter().enumerate() {
            let any_type = v.has_mcq || v.has_likert || v.has_text;
            rows.push(ReportRow {
                roll: roll.clone(),
                section: v.section,
                mcq_score: ReportCell::applicable(v.has_mcq, v.mcq_total),
                likert_score: ReportCell::applicable(v.has_likert, v.likert_total),
                text_score: ReportCell::applicable(v.has_text, v.text_total),
                final_score: ReportCell::applicable(any_type, v.final_total),
                grand_total: if i == 0 {
                    ReportCell::Score(grand_total)
                } else {
                    ReportCell::Blank
                },
            });
        }
    }
    rows
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn render_csv(rows: &[ReportRow]) -> String {
    let mut csv = REPORT_COLUMNS.join(",");
    csv.push('\n');
    for r in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            csv_quote(&r.roll),
            csv_quote(r.section.name()),
            r.mcq_score.to_csv(),
            r.likert_score.to_csv(),
            r.text_score.to_csv(),
            r.final_score.to_csv(),
            r.grand_total.to_csv(),
        ));
    }
    csv
}
