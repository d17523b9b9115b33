use serde::Serialize;

/// Question numbers graded out of 3.
const FOUR_POINT_IDS: [u32; 6] = [12, 13, 14, 16, 17, 18];
/// Question numbers graded out of 2.
const THREE_POINT_IDS: [u32; 8] = [22, 23, 24, 25, 28, 29, 30, 34];

/// Contiguous range of marks `0..=max` a grader may award for one free-text answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkScale {
    max: i64,
}

impl MarkScale {
    pub const BINARY: MarkScale = MarkScale { max: 1 };
    pub const THREE_POINT: MarkScale = MarkScale { max: 2 };
    pub const FOUR_POINT: MarkScale = MarkScale { max: 3 };

    pub fn max(self) -> i64 {
        self.max
    }

    pub fn values(self) -> Vec<i64> {
        (0..=self.max).collect()
    }

    pub fn contains(self, mark: i64) -> bool {
        (0..=self.max).contains(&mark)
    }

    /// Read-side policy: a stored mark that drifted outside the scale counts as 0.
    pub fn normalize_stored(self, mark: i64) -> i64 {
        if self.contains(mark) {
            mark
        } else {
            0
        }
    }
}

/// Numeric part of a question id: `"Q12"` and `"D12"` both give 12.
pub fn question_number(question_id: &str) -> Option<u32> {
    question_id
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .trim()
        .parse()
        .ok()
}

/// Scale for a descriptive question, keyed only by its id so every student
/// is graded on the same range.
pub fn resolve_scale(question_id: &str) -> MarkScale {
    match question_number(question_id) {
        Some(n) if FOUR_POINT_IDS.contains(&n) => MarkScale::FOUR_POINT,
        Some(n) if THREE_POINT_IDS.contains(&n) => MarkScale::THREE_POINT,
        _ => MarkScale::BINARY,
    }
}
