//! Per-section evaluation records and the student grand total.
//!
//! Auto scores are always recomputed from the bank; only the grader's text
//! marks are carried over from storage. Reads are tolerant of drifted marks
//! (they count as 0), writes are strict (they are rejected).

use crate::bank::{BankSet, QuestionBank, QuestionType};
use crate::error::GradeError;
use crate::scale::{resolve_scale, MarkScale};
use crate::score::{auto_scores, AutoScores};
use crate::section::Section;
use crate::store::{ResponseStore, StoredEvaluation, Submission};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};

pub type TextMarks = BTreeMap<String, i64>;

const NO_ANSWER: &str = "(no answer)";

/// Totals built from stored values must not overflow on corrupt documents.
pub(crate) fn saturating_sum(values: impl IntoIterator<Item = i64>) -> i64 {
    values.into_iter().fold(0, i64::saturating_add)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationState {
    Pending,
    AutoScored,
    Evaluated,
}

/// Totals for one section as they would be (or were) written on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionTotals {
    pub mcq_total: i64,
    pub likert_total: i64,
    pub text_marks: TextMarks,
    pub text_total: i64,
    pub final_total: i64,
}

impl SectionTotals {
    fn new(auto: AutoScores, text_marks: TextMarks) -> Self {
        let text_total = saturating_sum(text_marks.values().copied());
        SectionTotals {
            mcq_total: auto.mcq,
            likert_total: auto.likert,
            text_marks,
            text_total,
            final_total: auto.total().saturating_add(text_total),
        }
    }

    fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("mcq_total".to_string(), json!(self.mcq_total));
        fields.insert("likert_total".to_string(), json!(self.likert_total));
        fields.insert("text_marks".to_string(), json!(self.text_marks));
        fields.insert("text_total".to_string(), json!(self.text_total));
        fields.insert("final_total".to_string(), json!(self.final_total));
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    #[serde(flatten)]
    pub section: SectionTotals,
    pub grand_total: i64,
}

pub fn evaluation_state(stored: &StoredEvaluation) -> EvaluationState {
    if let (Some(marks), Some(text_total), Some(_)) =
        (&stored.text_marks, stored.text_total, stored.final_total)
    {
        // An overflowing sum cannot match, so the record stays unevaluated.
        let sum = marks.values().try_fold(0i64, |acc, m| acc.checked_add(*m));
        if sum == Some(text_total) {
            return EvaluationState::Evaluated;
        }
    }
    if stored.mcq_total.is_some() && stored.likert_total.is_some() {
        EvaluationState::AutoScored
    } else {
        EvaluationState::Pending
    }
}

/// Stored marks for the bank's descriptive questions, each normalized to its scale.
pub fn read_text_marks(bank: &QuestionBank, stored: &StoredEvaluation) -> TextMarks {
    let Some(saved) = stored.text_marks.as_ref() else {
        return TextMarks::new();
    };
    bank.short_questions()
        .filter_map(|q| {
            let mark = *saved.get(&q.question_id)?;
            let scale = q.scale.unwrap_or(MarkScale::BINARY);
            let normalized = scale.normalize_stored(mark);
            if normalized != mark {
                warn!(question_id = %q.question_id, mark, "stored mark outside scale; read as 0");
            }
            Some((q.question_id.clone(), normalized))
        })
        .collect()
}

/// Strict check of grader input. Unmarked descriptive questions are filled with 0.
pub fn validate_text_marks(bank: &QuestionBank, marks: &TextMarks) -> Result<TextMarks, GradeError> {
    let mut out = TextMarks::new();
    for (qid, &mark) in marks {
        let question = bank
            .get(qid)
            .filter(|q| q.qtype == QuestionType::Short)
            .ok_or_else(|| GradeError::UnknownQuestion {
                question_id: qid.clone(),
                section: bank.section().name().to_string(),
            })?;
        let scale = question.scale.unwrap_or(MarkScale::BINARY);
        if !scale.contains(mark) {
            return Err(GradeError::MarkOutOfScale {
                question_id: question.question_id.clone(),
                mark,
                max: scale.max(),
            });
        }
        out.insert(question.question_id.clone(), mark);
    }
    for q in bank.short_questions() {
        out.entry(q.question_id.clone()).or_insert(0);
    }
    Ok(out)
}

/// Fresh totals for a section given the grader's proposed marks.
pub fn compute_section(
    bank: &QuestionBank,
    submission: &Submission,
    text_marks: &TextMarks,
) -> Result<SectionTotals, GradeError> {
    let marks = validate_text_marks(bank, text_marks)?;
    Ok(SectionTotals::new(
        auto_scores(bank, &submission.responses),
        marks,
    ))
}

/// Read-side picture of one submission: fresh auto scores plus last-saved marks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionView {
    pub doc_id: String,
    pub roll: String,
    pub section: Section,
    pub state: EvaluationState,
    pub complete: bool,
    pub has_mcq: bool,
    pub has_likert: bool,
    pub has_text: bool,
    pub mcq_total: i64,
    pub likert_total: i64,
    pub text_marks: TextMarks,
    pub text_total: i64,
    pub final_total: i64,
    pub stored_grand_total: Option<i64>,
}

pub fn section_view(banks: &BankSet, submission: &Submission) -> SectionView {
    let stored = &submission.evaluation;
    let state = evaluation_state(stored);
    let (auto, text_marks, flags) = match banks.get(submission.section) {
        Some(bank) => (
            auto_scores(bank, &submission.responses),
            read_text_marks(bank, stored),
            (
                bank.has_type(QuestionType::Mcq),
                bank.has_type(QuestionType::Likert),
                bank.has_type(QuestionType::Short),
            ),
        ),
        None => {
            warn!(section = %submission.section, doc_id = %submission.doc_id, "no bank; section scored from stored totals");
            let marks: TextMarks = stored
                .text_marks
                .clone()
                .unwrap_or_default()
                .into_iter()
                .map(|(q, m)| {
                    let normalized = resolve_scale(&q).normalize_stored(m);
                    (q, normalized)
                })
                .collect();
            (
                stored_auto_scores(stored),
                marks,
                (
                    stored.mcq_total.is_some(),
                    stored.likert_total.is_some(),
                    stored.text_marks.is_some(),
                ),
            )
        }
    };
    let totals = SectionTotals::new(auto, text_marks);
    let complete = match state {
        EvaluationState::Evaluated => true,
        EvaluationState::AutoScored => !flags.2,
        EvaluationState::Pending => false,
    };
    SectionView {
        doc_id: submission.doc_id.clone(),
        roll: submission.roll.clone(),
        section: submission.section,
        state,
        complete,
        has_mcq: flags.0,
        has_likert: flags.1,
        has_text: flags.2,
        mcq_total: totals.mcq_total,
        likert_total: totals.likert_total,
        text_marks: totals.text_marks,
        text_total: totals.text_total,
        final_total: totals.final_total,
        stored_grand_total: stored.grand_total,
    }
}

/// Last persisted auto scores, used when the section's bank is not loaded.
/// Negative values cannot come from scoring and count as 0.
fn stored_auto_scores(stored: &StoredEvaluation) -> AutoScores {
    let valid = |v: Option<i64>| v.filter(|v| *v >= 0).unwrap_or(0);
    AutoScores {
        mcq: valid(stored.mcq_total),
        likert: valid(stored.likert_total),
    }
}

pub fn find_submission<'s>(
    submissions: &'s [Submission],
    roll: &str,
    section: Section,
) -> Result<&'s Submission, GradeError> {
    let mut matching = submissions.iter().filter(|s| s.section == section);
    let first = matching.next().ok_or_else(|| GradeError::SubmissionNotFound {
        roll: roll.to_string(),
        section: section.name().to_string(),
    })?;
    if matching.next().is_some() {
        warn!(roll, section = %section, doc_id = %first.doc_id, "several documents for one section; using the first");
    }
    Ok(first)
}

/// Saves the grader's marks for one section and rewrites the grand total on
/// every document of the student, all in one transaction.
pub fn save_section_evaluation(
    store: &ResponseStore<'_>,
    banks: &BankSet,
    roll: &str,
    section: Section,
    text_marks: &TextMarks,
) -> Result<Evaluation, GradeError> {
    let submissions = store.submissions_for_roll(roll)?;
    let target = find_submission(&submissions, roll, section)?;
    let bank = banks.require(section)?;
    let totals = compute_section(bank, target, text_marks)?;

    let others: Vec<&Submission> = submissions
        .iter()
        .filter(|s| s.doc_id != target.doc_id)
        .collect();
    // A bankless section without stored auto scores has no known total.
    if let Some(unknown) = others.iter().find(|s| {
        banks.get(s.section).is_none()
            && s.evaluation.mcq_total.is_none()
            && s.evaluation.likert_total.is_none()
    }) {
        banks.require(unknown.section)?;
    }
    let grand_total = totals.final_total.saturating_add(saturating_sum(
        others.iter().map(|s| section_view(banks, s).final_total),
    ));

    let doc_ids: Vec<String> = submissions.iter().map(|s| s.doc_id.clone()).collect();
    store.commit_section_save(&target.doc_id, &totals.to_fields(), &doc_ids, grand_total)?;

    info!(
        roll,
        section = %section,
        final_total = totals.final_total,
        grand_total,
        "section evaluation saved"
    );
    Ok(Evaluation {
        section: totals,
        grand_total,
    })
}

/// Stores fresh auto scores on each of the student's documents that lack
/// them or hold stale ones. Human-entered fields are left alone.
pub fn auto_score_roll(
    store: &ResponseStore<'_>,
    banks: &BankSet,
    roll: &str,
) -> Result<usize, GradeError> {
    let mut updated = 0;
    for sub in store.submissions_for_roll(roll)? {
        let Some(bank) = banks.get(sub.section) else {
            continue;
        };
        let auto = auto_scores(bank, &sub.responses);
        if sub.evaluation.mcq_total == Some(auto.mcq)
            && sub.evaluation.likert_total == Some(auto.likert)
        {
            continue;
        }
        let mut fields = Map::new();
        fields.insert("mcq_total".to_string(), json!(auto.mcq));
        fields.insert("likert_total".to_string(), json!(auto.likert));
        store.merge_evaluation(&sub.doc_id, &fields)?;
        updated += 1;
    }
    Ok(updated)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradableItem {
    pub question_id: String,
    pub question: String,
    pub answer: String,
    pub scale: Vec<i64>,
    pub mark: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingForm {
    pub roll: String,
    pub section: Section,
    pub state: EvaluationState,
    pub mcq_total: i64,
    pub likert_total: i64,
    pub items: Vec<GradableItem>,
    pub text_total: i64,
    pub final_total: i64,
    pub grand_total: Option<i64>,
}

/// Descriptive questions of a section with the student's answer and the mark to pre-select.
pub fn grading_form(bank: &QuestionBank, submission: &Submission) -> GradingForm {
    let marks = read_text_marks(bank, &submission.evaluation);
    let items: Vec<GradableItem> = bank
        .short_questions()
        .map(|q| GradableItem {
            question_id: q.question_id.clone(),
            question: q.text.clone(),
            answer: submission
                .response_for(&q.question_id)
                .and_then(|r| r.response.clone())
                .unwrap_or_else(|| NO_ANSWER.to_string()),
            scale: q.scale.unwrap_or(MarkScale::BINARY).values(),
            mark: marks.get(&q.question_id).copied().unwrap_or(0),
        })
        .collect();
    let totals = SectionTotals::new(auto_scores(bank, &submission.responses), marks);
    GradingForm {
        roll: submission.roll.clone(),
        section: submission.section,
        state: evaluation_state(&submission.evaluation),
        mcq_total: totals.mcq_total,
        likert_total: totals.likert_total,
        items,
        text_total: totals.text_total,
        final_total: totals.final_total,
        grand_total: submission.evaluation.grand_total,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollStatus {
    pub roll: String,
    pub sections: Vec<SectionView>,
    pub grand_total: i64,
    /// True when every document already stores the derived grand total.
    pub grand_total_in_sync: bool,
}

pub fn roll_status(banks: &BankSet, roll: &str, submissions: &[Submission]) -> RollStatus {
    let sections: Vec<SectionView> = submissions.iter().map(|s| section_view(banks, s)).collect();
    let grand_total = saturating_sum(sections.iter().map(|v| v.final_total));
    let grand_total_in_sync = !sections.is_empty()
        && sections
            .iter()
            .all(|v| v.stored_grand_total == Some(grand_total));
    RollStatus {
        roll: roll.to_string(),
        sections,
        grand_total,
        grand_total_in_sync,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::db::open_in_memory;

    fn marks(pairs: &[(&str, i64)]) -> TextMarks {
        pairs.iter().map(|(q, m)| (q.to_string(), *m)).collect()
    }

    fn stored(store: &ResponseStore<'_>, doc_id: &str) -> StoredEvaluation {
        let doc = store.get_document(doc_id).expect("get").expect("doc");
        StoredEvaluation::from_value(doc.evaluation.as_ref())
    }

    #[test]
    fn grand_total_fans_out_to_every_section() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        let banks = banks();
        seed_r1(&store);

        let ev = save_section_evaluation(&store, &banks, "R1", Section::Aptitude, &TextMarks::new())
            .expect("save");
        assert_eq!(ev.section.final_total, 20);
        assert_eq!(ev.grand_total, 60);
        for id in ["r1-adapt", "r1-apt", "r1-obj"] {
            assert_eq!(stored(&store, id).grand_total, Some(60), "doc {id}");
        }
        // Only the saved section gets section-level fields.
        assert_eq!(stored(&store, "r1-obj").final_total, None);
    }

    #[test]
    fn save_is_idempotent() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        let banks = banks();
        seed_r1(&store);

        let input = marks(&[("Q12", 3)]);
        let first = save_section_evaluation(&store, &banks, "R1", Section::Aptitude, &input)
            .expect("first");
        let after_first = stored(&store, "r1-apt");
        let second = save_section_evaluation(&store, &banks, "R1", Section::Aptitude, &input)
            .expect("second");
        assert_eq!(first, second);
        assert_eq!(after_first, stored(&store, "r1-apt"));
        assert_eq!(second.grand_total, 63);
    }

    #[test]
    fn saving_one_section_keeps_other_sections_marks() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        let banks = banks();
        seed_r1(&store);
        insert(&store, "r1-desc", "R1", Section::CommunicationDescriptive, json!([]));

        save_section_evaluation(
            &store,
            &banks,
            "R1",
            Section::CommunicationDescriptive,
            &marks(&[("Q12", 2), ("Q2", 1)]),
        )
        .expect("desc");
        let ev = save_section_evaluation(&store, &banks, "R1", Section::Aptitude, &marks(&[("Q12", 1)]))
            .expect("apt");

        assert_eq!(ev.grand_total, 10 + 21 + 30 + 3);
        let desc = stored(&store, "r1-desc");
        assert_eq!(desc.text_marks, Some(marks(&[("Q12", 2), ("Q2", 1)])));
        assert_eq!(desc.final_total, Some(3));
        assert_eq!(desc.grand_total, Some(64));
    }

    #[test]
    fn out_of_scale_marks_are_rejected_without_writing() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        let banks = banks();
        insert(&store, "d", "R2", Section::CommunicationDescriptive, json!([]));

        let err = save_section_evaluation(
            &store,
            &banks,
            "R2",
            Section::CommunicationDescriptive,
            &marks(&[("Q12", 5)]),
        )
        .expect_err("Q12 allows 0..=3");
        assert!(err.is_validation());

        let err = save_section_evaluation(
            &store,
            &banks,
            "R2",
            Section::CommunicationDescriptive,
            &marks(&[("Q2", 2)]),
        )
        .expect_err("Q2 is binary");
        assert!(matches!(err, GradeError::MarkOutOfScale { max: 1, .. }));

        let err = save_section_evaluation(
            &store,
            &banks,
            "R2",
            Section::CommunicationDescriptive,
            &marks(&[("Q99", 0)]),
        )
        .expect_err("unknown question");
        assert!(matches!(err, GradeError::UnknownQuestion { .. }));

        assert!(stored(&store, "d").is_empty());
    }

    #[test]
    fn saved_marks_round_trip() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        let banks = banks();
        insert(&store, "d", "R3", Section::CommunicationDescriptive, json!([]));

        let input = marks(&[("Q12", 2), ("Q2", 0)]);
        save_section_evaluation(&store, &banks, "R3", Section::CommunicationDescriptive, &input)
            .expect("save");

        let subs = store.submissions_for_roll("R3").expect("reload");
        let bank = banks.get(Section::CommunicationDescriptive).expect("bank");
        let back = read_text_marks(bank, &subs[0].evaluation);
        assert_eq!(back, input);
        assert_eq!(subs[0].evaluation.text_total, Some(2));
        assert_eq!(evaluation_state(&subs[0].evaluation), EvaluationState::Evaluated);
    }

    #[test]
    fn unmarked_questions_default_to_zero() {
        let banks = banks();
        let bank = banks.get(Section::CommunicationDescriptive).expect("bank");
        let full = validate_text_marks(bank, &marks(&[("Q12", 1)])).expect("valid");
        assert_eq!(full, marks(&[("Q12", 1), ("Q2", 0)]));
    }

    #[test]
    fn failed_fan_out_leaves_nothing_written() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        let banks = banks();
        seed_r1(&store);
        conn.execute_batch(
            "CREATE TRIGGER fail_obj BEFORE UPDATE ON student_responses
             WHEN NEW.id = 'r1-obj'
             BEGIN SELECT RAISE(ABORT, 'backend unavailable'); END;",
        )
        .expect("trigger");

        let err = save_section_evaluation(&store, &banks, "R1", Section::Aptitude, &marks(&[("Q12", 2)]))
            .expect_err("fan-out fails");
        assert_eq!(err.code(), "storage_failed");
        assert!(err.is_retryable());
        assert!(stored(&store, "r1-apt").is_empty());
        assert!(stored(&store, "r1-adapt").is_empty());

        conn.execute_batch("DROP TRIGGER fail_obj").expect("drop");
        let ev = save_section_evaluation(&store, &banks, "R1", Section::Aptitude, &marks(&[("Q12", 2)]))
            .expect("retry");
        assert_eq!(ev.grand_total, 62);
    }

    #[test]
    fn state_moves_pending_auto_scored_evaluated() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        let banks = banks();
        seed_r1(&store);

        let status = roll_status(&banks, "R1", &store.submissions_for_roll("R1").expect("subs"));
        assert!(status.sections.iter().all(|v| v.state == EvaluationState::Pending));
        assert!(!status.grand_total_in_sync);
        assert_eq!(status.grand_total, 60);

        assert_eq!(auto_score_roll(&store, &banks, "R1").expect("auto"), 3);
        assert_eq!(auto_score_roll(&store, &banks, "R1").expect("auto again"), 0);
        let status = roll_status(&banks, "R1", &store.submissions_for_roll("R1").expect("subs"));
        let adapt = &status.sections[0];
        assert_eq!(adapt.section, Section::AdaptabilityLearning);
        assert_eq!(adapt.state, EvaluationState::AutoScored);
        assert!(adapt.complete, "no descriptive questions");
        let apt = &status.sections[1];
        assert_eq!(apt.state, EvaluationState::AutoScored);
        assert!(!apt.complete);

        save_section_evaluation(&store, &banks, "R1", Section::Aptitude, &TextMarks::new())
            .expect("save");
        let status = roll_status(&banks, "R1", &store.submissions_for_roll("R1").expect("subs"));
        assert_eq!(status.sections[1].state, EvaluationState::Evaluated);
        assert!(status.grand_total_in_sync);
    }

    #[test]
    fn form_reads_drifted_marks_as_zero() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        let banks = banks();
        store
            .insert_document(&crate::store::RawDocument {
                id: "d".to_string(),
                roll: Some("R4".to_string()),
                section: Some(Section::CommunicationDescriptive.name().to_string()),
                responses: json!([{ "QuestionID": "Q12", "Response": "We built a robot." }]),
                evaluation: Some(json!({ "text_marks": { "Q12": 3, "Q2": 4 } })),
            })
            .expect("insert");
        let subs = store.submissions_for_roll("R4").expect("subs");
        let bank = banks.get(Section::CommunicationDescriptive).expect("bank");

        let form = grading_form(bank, &subs[0]);
        assert_eq!(form.items.len(), 2);
        assert_eq!(form.items[0].question_id, "Q12");
        assert_eq!(form.items[0].answer, "We built a robot.");
        assert_eq!(form.items[0].scale, vec![0, 1, 2, 3]);
        assert_eq!(form.items[0].mark, 3);
        assert_eq!(form.items[1].answer, NO_ANSWER);
        assert_eq!(form.items[1].mark, 0);
        assert_eq!(form.text_total, 3);
    }

    #[test]
    fn missing_bank_falls_back_to_stored_auto_scores() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        let full = banks();
        seed_r1(&store);
        auto_score_roll(&store, &full, "R1").expect("auto");
        let ev = save_section_evaluation(&store, &full, "R1", Section::Aptitude, &TextMarks::new())
            .expect("save");
        assert_eq!(ev.grand_total, 60);

        let degraded = banks_without(&[Section::CommunicationObjective]);
        let ev = save_section_evaluation(&store, &degraded, "R1", Section::Aptitude, &TextMarks::new())
            .expect("save without objective bank");
        assert_eq!(ev.grand_total, 60);
        assert_eq!(stored(&store, "r1-obj").grand_total, Some(60));

        let status = roll_status(&degraded, "R1", &store.submissions_for_roll("R1").expect("subs"));
        assert_eq!(status.grand_total, 60);
        assert!(status.grand_total_in_sync);
        let obj = &status.sections[2];
        assert_eq!(obj.section, Section::CommunicationObjective);
        assert!(obj.has_mcq);
        assert_eq!(obj.final_total, 30);
    }

    #[test]
    fn save_refuses_when_another_section_total_is_unknown() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        seed_r1(&store);

        let degraded = banks_without(&[Section::CommunicationObjective]);
        let err = save_section_evaluation(&store, &degraded, "R1", Section::Aptitude, &TextMarks::new())
            .expect_err("objective total unknown");
        assert_eq!(err.code(), "bank_unavailable");
        assert!(stored(&store, "r1-apt").is_empty());
        assert!(stored(&store, "r1-obj").is_empty());
    }

    #[test]
    fn extreme_stored_marks_do_not_overflow() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        store
            .insert_document(&crate::store::RawDocument {
                id: "x".to_string(),
                roll: Some("R5".to_string()),
                section: Some(Section::CommunicationDescriptive.name().to_string()),
                responses: json!([]),
                evaluation: Some(json!({
                    "text_marks": { "Q12": i64::MAX, "Q2": 1 },
                    "text_total": 1,
                    "final_total": 1,
                    "mcq_total": i64::MAX,
                    "likert_total": i64::MAX
                })),
            })
            .expect("insert");
        let subs = store.submissions_for_roll("R5").expect("subs");
        assert_eq!(evaluation_state(&subs[0].evaluation), EvaluationState::AutoScored);

        let status = roll_status(&banks(), "R5", &subs);
        assert_eq!(status.sections[0].text_total, 1);
        assert_eq!(status.sections[0].final_total, 1);

        let bankless = banks_without(&[Section::CommunicationDescriptive]);
        let status = roll_status(&bankless, "R5", &subs);
        assert_eq!(status.sections[0].text_marks, marks(&[("Q12", 0), ("Q2", 1)]));
        assert_eq!(status.grand_total, i64::MAX);
    }

    #[test]
    fn missing_submission_is_not_found() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        let err = save_section_evaluation(&store, &banks(), "nobody", Section::Aptitude, &TextMarks::new())
            .expect_err("missing");
        assert_eq!(err.code(), "not_found");
    }
}
