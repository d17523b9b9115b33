use crate::config::WorkspaceConfig;
use crate::error::GradeError;
use crate::scale::{resolve_scale, MarkScale};
use crate::section::Section;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Answer-key column names seen across bank exports, in priority order.
pub const ANSWER_COLUMNS: [&str; 6] = [
    "Answer",
    "CorrectAnswer",
    "Correct",
    "Ans",
    "AnswerKey",
    "RightAnswer",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Mcq,
    Likert,
    Short,
}

impl QuestionType {
    pub fn parse(raw: &str) -> Option<QuestionType> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mcq" => Some(QuestionType::Mcq),
            "likert" => Some(QuestionType::Likert),
            "short" | "descriptive" => Some(QuestionType::Short),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: String,
    pub qtype: QuestionType,
    pub text: String,
    pub correct_answer: Option<String>,
    /// Only set for descriptive questions.
    pub scale: Option<MarkScale>,
}

#[derive(Debug, Clone)]
pub struct QuestionBank {
    section: Section,
    questions: Vec<Question>,
    index: HashMap<String, usize>,
    answer_columns: Vec<String>,
    skipped_rows: usize,
}

impl QuestionBank {
    pub fn new(section: Section, questions: Vec<Question>) -> Self {
        let mut kept: Vec<Question> = Vec::with_capacity(questions.len());
        let mut index = HashMap::new();
        let mut skipped_rows = 0usize;
        for q in questions {
            if index.contains_key(&q.question_id) {
                warn!(section = %section, question_id = %q.question_id, "duplicate question id in bank; keeping first");
                skipped_rows += 1;
                continue;
            }
            index.insert(q.question_id.clone(), kept.len());
            kept.push(q);
        }
        QuestionBank {
            section,
            questions: kept,
            index,
            answer_columns: Vec::new(),
            skipped_rows,
        }
    }

    /// Parses a bank table. Header names are trimmed; `Type` is matched case-insensitively.
    pub fn from_csv_str(section: Section, source: &str, text: &str) -> Result<Self, GradeError> {
        let mut lines = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.trim().is_empty());
        let Some(header_line) = lines.next() else {
            return Err(GradeError::BankFormat {
                path: source.to_string(),
                message: "empty file".to_string(),
            });
        };
        let header: Vec<String> = parse_csv_record(header_line.trim_start_matches('\u{feff}'))
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        let col = |name: &str| header.iter().position(|h| h == name);

        let (Some(id_col), Some(type_col)) = (col("QuestionID"), col("Type")) else {
            return Err(GradeError::BankFormat {
                path: source.to_string(),
                message: "missing QuestionID/Type columns".to_string(),
            });
        };
        let text_col = col("Question");
        let answer_cols: Vec<(String, usize)> = ANSWER_COLUMNS
            .iter()
            .filter_map(|name| col(name).map(|i| (name.to_string(), i)))
            .collect();

        let mut questions = Vec::new();
        let mut skipped_rows = 0usize;
        for line in lines {
            let fields = parse_csv_record(line);
            let field = |i: usize| fields.get(i).map(|s| s.trim()).unwrap_or("");

            let question_id = field(id_col).to_string();
            if question_id.is_empty() {
                skipped_rows += 1;
                continue;
            }
            let Some(qtype) = QuestionType::parse(field(type_col)) else {
                warn!(section = %section, question_id = %question_id, kind = field(type_col), "unknown question type; row ignored");
                skipped_rows += 1;
                continue;
            };
            let correct_answer = answer_cols
                .iter()
                .map(|(_, i)| field(*i))
                .find(|v| !v.is_empty())
                .map(|v| v.to_string());
            let scale = (qtype == QuestionType::Short).then(|| resolve_scale(&question_id));

            questions.push(Question {
                question_id,
                qtype,
                text: text_col.map(field).unwrap_or("").to_string(),
                correct_answer,
                scale,
            });
        }

        let mut bank = QuestionBank::new(section, questions);
        bank.answer_columns = answer_cols.into_iter().map(|(n, _)| n).collect();
        bank.skipped_rows += skipped_rows;
        Ok(bank)
    }

    pub fn load_csv(section: Section, path: &Path) -> Result<Self, GradeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_csv_str(section, &path.to_string_lossy(), &text)
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, question_id: &str) -> Option<&Question> {
        self.index
            .get(question_id.trim())
            .map(|&i| &self.questions[i])
    }

    pub fn count(&self, qtype: QuestionType) -> usize {
        self.questions.iter().filter(|q| q.qtype == qtype).count()
    }

    pub fn has_type(&self, qtype: QuestionType) -> bool {
        self.questions.iter().any(|q| q.qtype == qtype)
    }

    pub fn short_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(|q| q.qtype == QuestionType::Short)
    }

    pub fn answer_columns(&self) -> &[String] {
        &self.answer_columns
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

fn parse_csv_record(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => out.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    out.push(buf);
    out
}

/// Banks for every section that loaded, plus the reason for each one that did not.
#[derive(Debug, Default)]
pub struct BankSet {
    banks: HashMap<Section, QuestionBank>,
    errors: BTreeMap<Section, String>,
}

impl BankSet {
    pub fn load(config: &WorkspaceConfig) -> BankSet {
        let mut set = BankSet::default();
        for section in Section::ALL {
            let path = config.bank_path(section);
            match QuestionBank::load_csv(section, &path) {
                Ok(bank) => set.insert(bank),
                Err(e) => {
                    warn!(section = %section, path = %path.display(), error = %e, "question bank not loaded");
                    set.errors.insert(section, e.to_string());
                }
            }
        }
        set
    }

    pub fn insert(&mut self, bank: QuestionBank) {
        self.errors.remove(&bank.section());
        self.banks.insert(bank.section(), bank);
    }

    pub fn get(&self, section: Section) -> Option<&QuestionBank> {
        self.banks.get(&section)
    }

    pub fn require(&self, section: Section) -> Result<&QuestionBank, GradeError> {
        self.banks
            .get(&section)
            .ok_or_else(|| GradeError::BankUnavailable {
                section: section.name().to_string(),
                reason: self
                    .errors
                    .get(&section)
                    .cloned()
                    .unwrap_or_else(|| "not loaded".to_string()),
            })
    }

    pub fn errors(&self) -> &BTreeMap<Section, String> {
        &self.errors
    }
}

type Stamp = (PathBuf, Option<SystemTime>);

/// Read-through cache of the bank set, reloaded when any bank file's mtime
/// changes or after an explicit invalidation.
#[derive(Debug, Default)]
pub struct BankCache {
    set: Option<BankSet>,
    stamps: Vec<Stamp>,
}

impl BankCache {
    pub fn invalidate(&mut self) {
        self.set = None;
        self.stamps.clear();
    }

    pub fn banks(&mut self, config: &WorkspaceConfig) -> &BankSet {
        let stamps: Vec<Stamp> = Section::ALL
            .iter()
            .map(|s| {
                let path = config.bank_path(*s);
                let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
                (path, modified)
            })
            .collect();

        if self.set.is_none() || self.stamps != stamps {
            debug!("question bank cache miss; reloading");
            self.set = Some(BankSet::load(config));
            self.stamps = stamps;
        } else {
            debug!("question bank cache hit");
        }
        self.set.get_or_insert_with(BankSet::default)
    }
}
