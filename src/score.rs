//! Auto-scoring of objective questions.
//!
//! Both scores are pure functions of a bank and a response list and are
//! recomputed on every read, so corrections to a bank show up immediately.

use crate::bank::{Question, QuestionBank, QuestionType};
use crate::store::ResponseEntry;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScores {
    pub mcq: i64,
    pub likert: i64,
}

impl AutoScores {
    pub fn total(self) -> i64 {
        self.mcq.saturating_add(self.likert)
    }
}

fn matched<'b>(
    bank: &'b QuestionBank,
    entry: &ResponseEntry,
    qtype: QuestionType,
) -> Option<&'b Question> {
    bank.get(&entry.question_id).filter(|q| q.qtype == qtype)
}

/// One point per MCQ answer that matches the key exactly (after trimming).
pub fn score_mcq(bank: &QuestionBank, responses: &[ResponseEntry]) -> i64 {
    responses
        .iter()
        .filter(|entry| {
            let Some(question) = matched(bank, entry, QuestionType::Mcq) else {
                return false;
            };
            let answer = entry.response.as_deref().map(str::trim).unwrap_or("");
            let key = question.correct_answer.as_deref().map(str::trim).unwrap_or("");
            !answer.is_empty() && !key.is_empty() && answer == key
        })
        .count() as i64
}

/// Points for one Likert answer: 1..=5 maps to 0..=4, anything else is `None`.
pub fn likert_points(raw: &str) -> Option<i64> {
    let value: i64 = raw.trim().parse().ok()?;
    (1..=5).contains(&value).then(|| value - 1)
}

pub fn score_likert(bank: &QuestionBank, responses: &[ResponseEntry]) -> i64 {
    let mut total = 0;
    for entry in responses {
        if matched(bank, entry, QuestionType::Likert).is_none() {
            continue;
        }
        let raw = entry.response.as_deref().unwrap_or("");
        match likert_points(raw) {
            Some(points) => total += points,
            None => warn!(
                section = %bank.section(),
                question_id = %entry.question_id,
                response = raw,
                "likert response is not an integer in 1..=5; counted as 0"
            ),
        }
    }
    total
}

pub fn auto_scores(bank: &QuestionBank, responses: &[ResponseEntry]) -> AutoScores {
    AutoScores {
        mcq: score_mcq(bank, responses),
        likert: score_likert(bank, responses),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::Section;

    fn bank(csv: &str) -> QuestionBank {
        QuestionBank::from_csv_str(Section::Aptitude, "inline", csv).expect("bank")
    }

    fn resp(qid: &str, value: Option<&str>) -> ResponseEntry {
        ResponseEntry {
            question_id: qid.to_string(),
            response: value.map(str::to_string),
        }
    }

    #[test]
    fn mcq_exact_match_only() {
        let b = bank("QuestionID,Type,Question,Answer\nQ1,mcq,pick,B\n");
        assert_eq!(score_mcq(&b, &[resp("Q1", Some("B"))]), 1);
        assert_eq!(score_mcq(&b, &[resp("Q1", Some(" B "))]), 1);
        assert_eq!(score_mcq(&b, &[resp("Q1", Some("C"))]), 0);
        assert_eq!(score_mcq(&b, &[resp("Q1", Some("b"))]), 0);
        assert_eq!(score_mcq(&b, &[resp("Q1", None)]), 0);
        assert_eq!(score_mcq(&b, &[]), 0);
    }

    #[test]
    fn mcq_skips_lookup_misses_type_mismatches_and_blank_keys() {
        let b = bank(
            "QuestionID,Type,Question,Answer\nQ1,mcq,a,B\nQ2,likert,b,B\nQ3,mcq,c,\nQ4,mcq,d,A\n",
        );
        let responses = vec![
            resp("Q1", Some("B")),
            resp("Q2", Some("B")),
            resp("Q3", Some("")),
            resp("Q9", Some("B")),
            resp("Q4", Some("A")),
        ];
        assert_eq!(score_mcq(&b, &responses), 2);
    }

    #[test]
    fn likert_maps_one_to_five_onto_zero_to_four() {
        let expected = [("1", 0), ("2", 1), ("3", 2), ("4", 3), ("5", 4)];
        for (raw, points) in expected {
            assert_eq!(likert_points(raw), Some(points), "input {raw}");
        }
        for raw in ["0", "6", "abc", "", "3.5", "-1"] {
            assert_eq!(likert_points(raw), None, "input {raw:?}");
        }
    }

    #[test]
    fn likert_sums_only_likert_rows() {
        let b = bank(
            "QuestionID,Type,Question\nL1,likert,a\nL2,likert,b\nL3,likert,c\nM1,mcq,d\n",
        );
        let responses = vec![
            resp("L1", Some("5")),
            resp("L2", Some("6")),
            resp("L3", Some("2")),
            resp("M1", Some("5")),
            resp("L9", Some("5")),
        ];
        assert_eq!(score_likert(&b, &responses), 5);
        assert_eq!(
            auto_scores(&b, &responses),
            AutoScores { mcq: 0, likert: 5 }
        );
    }
}
