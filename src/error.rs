use serde_json::json;
use thiserror::Error;

/// Failures surfaced by the scoring and aggregation engine.
///
/// Every variant maps to a stable machine code so the host UI can decide
/// whether to show a validation message or offer a retry.
#[derive(Debug, Error)]
pub enum GradeError {
    #[error("mark {mark} for question {question_id} is outside its scale 0..={max}")]
    MarkOutOfScale {
        question_id: String,
        mark: i64,
        max: i64,
    },

    #[error("question {question_id} is not a descriptive question in {section}")]
    UnknownQuestion { question_id: String, section: String },

    #[error("no submission for roll {roll} in section {section}")]
    SubmissionNotFound { roll: String, section: String },

    #[error("question bank for {section} is unavailable: {reason}")]
    BankUnavailable { section: String, reason: String },

    #[error("question bank {path}: {message}")]
    BankFormat { path: String, message: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("document {doc_id} could not be encoded: {source}")]
    Encode {
        doc_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GradeError {
    pub fn code(&self) -> &'static str {
        match self {
            GradeError::MarkOutOfScale { .. } | GradeError::UnknownQuestion { .. } => {
                "validation_failed"
            }
            GradeError::SubmissionNotFound { .. } => "not_found",
            GradeError::BankUnavailable { .. } | GradeError::BankFormat { .. } => {
                "bank_unavailable"
            }
            GradeError::Storage(_) | GradeError::Encode { .. } => "storage_failed",
            GradeError::Io(_) => "io_failed",
        }
    }

    pub fn is_validation(&self) -> bool {
        self.code() == "validation_failed"
    }

    /// Storage failures leave nothing half-written, so the same save can be sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GradeError::Storage(_) | GradeError::Io(_))
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            GradeError::MarkOutOfScale {
                question_id,
                mark,
                max,
            } => Some(json!({
                "questionId": question_id,
                "mark": mark,
                "allowed": (0..=*max).collect::<Vec<_>>(),
            })),
            GradeError::UnknownQuestion {
                question_id,
                section,
            } => Some(json!({ "questionId": question_id, "section": section })),
            GradeError::SubmissionNotFound { roll, section } => {
                Some(json!({ "roll": roll, "section": section }))
            }
            GradeError::BankUnavailable { section, .. } => Some(json!({ "section": section })),
            GradeError::BankFormat { path, .. } => Some(json!({ "path": path })),
            GradeError::Storage(_) | GradeError::Io(_) => Some(json!({ "retryable": true })),
            GradeError::Encode { .. } => None,
        }
    }
}
