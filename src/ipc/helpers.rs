use crate::bank::BankSet;
use crate::evaluation::TextMarks;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::section::Section;
use rusqlite::Connection;
use serde_json::json;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn section_param(req: &Request, key: &str) -> Result<Section, serde_json::Value> {
    let raw = required_str(req, key)?;
    Section::from_name(&raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            format!("unknown section: {}", raw),
            Some(json!({ "allowed": Section::ALL.map(Section::name) })),
        )
    })
}

pub fn optional_section_param(
    req: &Request,
    key: &str,
) -> Result<Option<Section>, serde_json::Value> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(_) => section_param(req, key).map(Some),
    }
}

/// `textMarks` as `{questionId: integer}`; absent means no marks entered.
pub fn text_marks_param(req: &Request) -> Result<TextMarks, serde_json::Value> {
    let Some(raw) = req.params.get("textMarks") else {
        return Ok(TextMarks::new());
    };
    let Some(obj) = raw.as_object() else {
        return Err(err(&req.id, "bad_params", "textMarks must be an object", None));
    };
    let mut marks = TextMarks::new();
    for (qid, v) in obj {
        let Some(mark) = v.as_i64() else {
            return Err(err(
                &req.id,
                "bad_params",
                "marks must be integers",
                Some(json!({ "questionId": qid, "mark": v })),
            ));
        };
        let key = qid.trim().to_string();
        if marks.insert(key.clone(), mark).is_some() {
            return Err(err(
                &req.id,
                "bad_params",
                "duplicate question id in textMarks",
                Some(json!({ "questionId": key })),
            ));
        }
    }
    Ok(marks)
}

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

/// Database handle plus the current question banks (reloaded if a bank file changed).
pub fn workspace<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<(&'a Connection, &'a BankSet), serde_json::Value> {
    let AppState {
        db, config, banks, ..
    } = state;
    match (db.as_ref(), config.as_ref()) {
        (Some(conn), Some(config)) => Ok((conn, banks.banks(config))),
        _ => Err(err(&req.id, "no_workspace", "select a workspace first", None)),
    }
}
