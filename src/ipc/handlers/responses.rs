use crate::bank::QuestionType;
use crate::ipc::error::{err, grade_err, ok};
use crate::ipc::helpers::{db_conn, workspace};
use crate::ipc::types::{AppState, Request};
use crate::section::Section;
use crate::store::{RawDocument, ResponseStore};
use serde_json::json;
use tracing::{info, warn};

const IMPORT_MAX_DOCUMENTS: usize = 10_000;

fn handle_responses_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let Some(documents) = req.params.get("documents").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing documents", None);
    };
    if documents.len() > IMPORT_MAX_DOCUMENTS {
        return err(
            &req.id,
            "bad_params",
            "too many documents in one import",
            Some(json!({ "count": documents.len(), "max": IMPORT_MAX_DOCUMENTS })),
        );
    }

    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_tx_failed", e.to_string(), None),
    };
    let store = ResponseStore::new(&tx);
    let mut inserted = 0usize;
    let mut skipped = 0usize;
    for (i, value) in documents.iter().enumerate() {
        let Some(doc) = RawDocument::from_intake(value) else {
            warn!(index = i, "import entry is not an object; skipped");
            skipped += 1;
            continue;
        };
        if let Err(e) = store.insert_document(&doc) {
            return grade_err(&req.id, &e);
        }
        inserted += 1;
    }
    if let Err(e) = tx.commit() {
        return err(&req.id, "db_commit_failed", e.to_string(), None);
    }

    info!(inserted, skipped, "response documents imported");
    ok(&req.id, json!({ "inserted": inserted, "skipped": skipped }))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, banks) = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let roster = match ResponseStore::new(conn).load_roster() {
        Ok(r) => r,
        Err(e) => return grade_err(&req.id, &e),
    };

    let students: Vec<serde_json::Value> = roster
        .iter()
        .map(|(roll, subs)| {
            let sections: Vec<Section> = subs.iter().map(|s| s.section).collect();
            let gradable: Vec<Section> = sections
                .iter()
                .copied()
                .filter(|s| {
                    banks
                        .get(*s)
                        .is_some_and(|b| b.has_type(QuestionType::Short))
                })
                .collect();
            json!({
                "roll": roll,
                "sections": sections,
                "gradableSections": gradable,
            })
        })
        .collect();

    ok(&req.id, json!({ "students": students }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "responses.import" => Some(handle_responses_import(state, req)),
        "students.list" => Some(handle_students_list(state, req)),
        _ => None,
    }
}
