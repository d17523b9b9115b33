use crate::error::GradeError;
use crate::section::Section;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A `student_responses` row as stored, before any normalization.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub id: String,
    pub roll: Option<String>,
    pub section: Option<String>,
    pub responses: Value,
    pub evaluation: Option<Value>,
}

impl RawDocument {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let id: String = row.get(0)?;
        let responses_text: String = row.get(3)?;
        let evaluation_text: Option<String> = row.get(4)?;
        Ok(RawDocument {
            roll: row.get(1)?,
            section: row.get(2)?,
            responses: serde_json::from_str(&responses_text).unwrap_or_else(|e| {
                warn!(doc_id = %id, error = %e, "unreadable Responses; treating as empty");
                Value::Null
            }),
            evaluation: evaluation_text.and_then(|t| serde_json::from_str(&t).ok()),
            id,
        })
    }

    /// Accepts an intake document shaped `{id?, Roll, Section, Responses, Evaluation?}`.
    pub fn from_intake(value: &Value) -> Option<RawDocument> {
        let obj = value.as_object()?;
        Some(RawDocument {
            id: obj
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            roll: obj.get("Roll").and_then(scalar_text),
            section: obj.get("Section").and_then(scalar_text),
            responses: obj.get("Responses").cloned().unwrap_or(Value::Null),
            evaluation: obj.get("Evaluation").filter(|v| v.is_object()).cloned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEntry {
    pub question_id: String,
    pub response: Option<String>,
}

/// What a document says about its evaluation. Every field is optional because
/// documents are written piecemeal over the evaluation lifecycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredEvaluation {
    pub mcq_total: Option<i64>,
    pub likert_total: Option<i64>,
    pub text_marks: Option<BTreeMap<String, i64>>,
    pub text_total: Option<i64>,
    pub final_total: Option<i64>,
    pub grand_total: Option<i64>,
}

impl StoredEvaluation {
    pub fn from_value(value: Option<&Value>) -> StoredEvaluation {
        let Some(obj) = value.and_then(Value::as_object) else {
            return StoredEvaluation::default();
        };
        let int = |key: &str| obj.get(key).and_then(lenient_int);
        let text_marks = obj.get("text_marks").and_then(Value::as_object).map(|m| {
            m.iter()
                .map(|(qid, v)| (qid.trim().to_string(), lenient_int(v).unwrap_or(0)))
                .collect()
        });
        StoredEvaluation {
            mcq_total: int("mcq_total"),
            likert_total: int("likert_total"),
            text_marks,
            text_total: int("text_total"),
            final_total: int("final_total"),
            grand_total: int("grand_total"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == StoredEvaluation::default()
    }
}

/// One student's answers for one section, normalized for scoring.
#[derive(Debug, Clone)]
pub struct Submission {
    pub doc_id: String,
    pub roll: String,
    pub section: Section,
    pub responses: Vec<ResponseEntry>,
    pub evaluation: StoredEvaluation,
}

impl Submission {
    /// Returns `None` for documents without a usable roll or section.
    pub fn from_document(doc: &RawDocument) -> Option<Submission> {
        let roll = doc.roll.as_deref().map(str::trim).filter(|r| !r.is_empty());
        let Some(roll) = roll else {
            warn!(doc_id = %doc.id, "document has no Roll; skipped");
            return None;
        };
        let Some(section) = doc.section.as_deref().and_then(Section::from_name) else {
            warn!(doc_id = %doc.id, section = ?doc.section, "document has no known Section; skipped");
            return None;
        };
        Some(Submission {
            doc_id: doc.id.clone(),
            roll: roll.to_string(),
            section,
            responses: normalize_responses(&doc.responses),
            evaluation: StoredEvaluation::from_value(doc.evaluation.as_ref()),
        })
    }

    pub fn response_for(&self, question_id: &str) -> Option<&ResponseEntry> {
        self.responses.iter().find(|r| r.question_id == question_id)
    }
}

/// Submissions grouped by roll number, both levels in a stable order.
pub type Roster = BTreeMap<String, Vec<Submission>>;

fn normalize_responses(value: &Value) -> Vec<ResponseEntry> {
    let Some(items) = value.as_array() else {
        if !value.is_null() {
            warn!("Responses is not a list; treating as empty");
        }
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let question_id = obj
                .get("QuestionID")
                .and_then(scalar_text)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())?;
            Some(ResponseEntry {
                question_id,
                response: obj.get("Response").and_then(scalar_text),
            })
        })
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn merge_fields(existing: Option<Value>, fields: &Map<String, Value>) -> Value {
    let mut obj = match existing {
        Some(Value::Object(m)) => m,
        _ => Map::new(),
    };
    for (k, v) in fields {
        obj.insert(k.clone(), v.clone());
    }
    Value::Object(obj)
}

/// Document-store facade over the workspace database.
pub struct ResponseStore<'a> {
    conn: &'a Connection,
}

const SELECT_COLUMNS: &str = "SELECT id, roll, section, responses, evaluation FROM student_responses";

impl<'a> ResponseStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        ResponseStore { conn }
    }

    /// Every readable document. Rows that fail to decode are logged and left out.
    pub fn list_documents(&self) -> Result<Vec<RawDocument>, GradeError> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id"))?;
        let rows = stmt.query_map([], RawDocument::from_row)?;
        let mut out = Vec::new();
        for row in rows {
            match row {
                Ok(doc) => out.push(doc),
                Err(e) => warn!(error = %e, "unreadable response document skipped"),
            }
        }
        Ok(out)
    }

    pub fn get_document(&self, doc_id: &str) -> Result<Option<RawDocument>, GradeError> {
        let doc = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?"),
                [doc_id],
                RawDocument::from_row,
            )
            .optional()?;
        Ok(doc)
    }

    pub fn load_roster(&self) -> Result<Roster, GradeError> {
        let mut roster = Roster::new();
        for doc in self.list_documents()? {
            if let Some(sub) = Submission::from_document(&doc) {
                roster.entry(sub.roll.clone()).or_default().push(sub);
            }
        }
        for subs in roster.values_mut() {
            subs.sort_by(|a, b| a.section.cmp(&b.section).then_with(|| a.doc_id.cmp(&b.doc_id)));
        }
        debug!(students = roster.len(), "roster loaded");
        Ok(roster)
    }

    /// Matches rolls the same way the roster does: after `str::trim`, which
    /// strips more whitespace than SQLite's `trim()`.
    pub fn submissions_for_roll(&self, roll: &str) -> Result<Vec<Submission>, GradeError> {
        let roll = roll.trim();
        let mut subs: Vec<Submission> = self
            .list_documents()?
            .iter()
            .filter(|doc| doc.roll.as_deref().map(str::trim) == Some(roll))
            .filter_map(Submission::from_document)
            .collect();
        subs.sort_by(|a, b| a.section.cmp(&b.section).then_with(|| a.doc_id.cmp(&b.doc_id)));
        Ok(subs)
    }

    pub fn insert_document(&self, doc: &RawDocument) -> Result<(), GradeError> {
        let responses = serde_json::to_string(&doc.responses).map_err(|source| GradeError::Encode {
            doc_id: doc.id.clone(),
            source,
        })?;
        let evaluation = doc
            .evaluation
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|source| GradeError::Encode {
                doc_id: doc.id.clone(),
                source,
            })?;
        self.conn.execute(
            "INSERT INTO student_responses(id, roll, section, responses, evaluation, updated_at)
             VALUES(?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
               roll = excluded.roll,
               section = excluded.section,
               responses = excluded.responses,
               evaluation = COALESCE(excluded.evaluation, student_responses.evaluation),
               updated_at = excluded.updated_at",
            (
                &doc.id,
                &doc.roll,
                &doc.section,
                &responses,
                &evaluation,
                now_stamp(),
            ),
        )?;
        Ok(())
    }

    /// Merge-writes top-level `Evaluation` keys into one document.
    pub fn merge_evaluation(
        &self,
        doc_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), GradeError> {
        merge_evaluation_on(self.conn, doc_id, fields)
    }

    /// Writes a section's evaluation and fans the grand total out to every
    /// document of the student as one transaction.
    pub fn commit_section_save(
        &self,
        doc_id: &str,
        fields: &Map<String, Value>,
        roll_doc_ids: &[String],
        grand_total: i64,
    ) -> Result<(), GradeError> {
        let tx = self.conn.unchecked_transaction()?;
        merge_evaluation_on(&tx, doc_id, fields)?;
        let mut fan_out = Map::new();
        fan_out.insert("grand_total".to_string(), json!(grand_total));
        for id in roll_doc_ids {
            merge_evaluation_on(&tx, id, &fan_out)?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn merge_evaluation_on(
    conn: &Connection,
    doc_id: &str,
    fields: &Map<String, Value>,
) -> Result<(), GradeError> {
    let existing: Option<Option<String>> = conn
        .query_row(
            "SELECT evaluation FROM student_responses WHERE id = ?",
            [doc_id],
            |r| r.get(0),
        )
        .optional()?;
    let Some(existing) = existing else {
        return Err(GradeError::Storage(rusqlite::Error::QueryReturnedNoRows));
    };
    let merged = merge_fields(
        existing.and_then(|t| serde_json::from_str(&t).ok()),
        fields,
    );
    let text = serde_json::to_string(&merged).map_err(|source| GradeError::Encode {
        doc_id: doc_id.to_string(),
        source,
    })?;
    conn.execute(
        "UPDATE student_responses SET evaluation = ?, updated_at = ? WHERE id = ?",
        (&text, now_stamp(), doc_id),
    )?;
    Ok(())
}

fn now_stamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn doc(id: &str, roll: Option<&str>, section: Option<&str>, responses: Value) -> RawDocument {
        RawDocument {
            id: id.to_string(),
            roll: roll.map(str::to_string),
            section: section.map(str::to_string),
            responses,
            evaluation: None,
        }
    }

    #[test]
    fn roster_skips_documents_missing_roll_or_section() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        store
            .insert_document(&doc("a", Some("R1"), Some("Aptitude Test"), json!([])))
            .expect("insert");
        store
            .insert_document(&doc("b", None, Some("Aptitude Test"), json!([])))
            .expect("insert");
        store
            .insert_document(&doc("c", Some("R2"), Some("Music"), json!([])))
            .expect("insert");
        store
            .insert_document(&doc("d", Some("  "), Some("Aptitude Test"), json!([])))
            .expect("insert");

        let roster = store.load_roster().expect("roster");
        assert_eq!(roster.len(), 1);
        assert_eq!(roster["R1"].len(), 1);
    }

    #[test]
    fn roll_lookup_ignores_surrounding_whitespace_like_the_roster() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        store
            .insert_document(&doc("a", Some("R1\t"), Some("Aptitude Test"), json!([])))
            .expect("insert");
        store
            .insert_document(&doc("b", Some("\nR1 "), Some("Communication Skills - Objective"), json!([])))
            .expect("insert");
        store
            .insert_document(&doc("c", Some("R10"), Some("Aptitude Test"), json!([])))
            .expect("insert");

        let roster = store.load_roster().expect("roster");
        assert_eq!(roster["R1"].len(), 2);
        let subs = store.submissions_for_roll("R1").expect("subs");
        assert_eq!(subs.len(), 2);
        assert!(subs.iter().all(|s| s.roll == "R1"));
        assert_eq!(store.submissions_for_roll(" R1\t").expect("subs").len(), 2);
    }

    #[test]
    fn responses_are_normalized() {
        let raw = doc(
            "a",
            Some("R1"),
            Some("Adaptability & Learning"),
            json!([
                { "QuestionID": " Q1 ", "Response": 4 },
                { "QuestionID": 2, "Response": "B" },
                { "QuestionID": "Q3" },
                { "Response": "orphan" },
                "garbage"
            ]),
        );
        let sub = Submission::from_document(&raw).expect("submission");
        assert_eq!(
            sub.responses,
            vec![
                ResponseEntry { question_id: "Q1".into(), response: Some("4".into()) },
                ResponseEntry { question_id: "2".into(), response: Some("B".into()) },
                ResponseEntry { question_id: "Q3".into(), response: None },
            ]
        );

        let not_a_list = doc("b", Some("R1"), Some("Aptitude Test"), json!({"Q1": "A"}));
        assert!(Submission::from_document(&not_a_list).expect("sub").responses.is_empty());
    }

    #[test]
    fn stored_evaluation_reads_leniently() {
        let ev = StoredEvaluation::from_value(Some(&json!({
            "mcq_total": 3.0,
            "text_marks": { "Q1": 2, "Q2": "x" },
            "text_total": "2",
            "grand_total": null
        })));
        assert_eq!(ev.mcq_total, Some(3));
        assert_eq!(ev.text_total, Some(2));
        assert_eq!(ev.grand_total, None);
        let marks = ev.text_marks.expect("marks");
        assert_eq!(marks.get("Q2"), Some(&0));
        assert!(StoredEvaluation::from_value(Some(&json!("nope"))).is_empty());
    }

    #[test]
    fn merge_keeps_unrelated_fields() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        let mut raw = doc("a", Some("R1"), Some("Aptitude Test"), json!([]));
        raw.evaluation = Some(json!({ "text_total": 4, "text_marks": { "Q12": 3 } }));
        store.insert_document(&raw).expect("insert");

        let mut fields = Map::new();
        fields.insert("mcq_total".to_string(), json!(7));
        store.merge_evaluation("a", &fields).expect("merge");

        let back = store.get_document("a").expect("get").expect("doc");
        let ev = StoredEvaluation::from_value(back.evaluation.as_ref());
        assert_eq!(ev.mcq_total, Some(7));
        assert_eq!(ev.text_total, Some(4));
    }

    #[test]
    fn merge_into_missing_document_fails() {
        let conn = open_in_memory();
        let store = ResponseStore::new(&conn);
        let err = store.merge_evaluation("ghost", &Map::new()).expect_err("missing");
        assert_eq!(err.code(), "storage_failed");
    }

    #[test]
    fn intake_documents_accept_numeric_roll() {
        let raw = RawDocument::from_intake(&json!({
            "Roll": 2301, "Section": "Aptitude Test", "Responses": []
        }))
        .expect("doc");
        assert_eq!(raw.roll.as_deref(), Some("2301"));
        assert!(!raw.id.is_empty());
        assert!(RawDocument::from_intake(&json!([1, 2])).is_none());
    }
}
