use crate::evaluation::{
    auto_score_roll, compute_section, find_submission, grading_form, roll_status,
    save_section_evaluation,
};
use crate::ipc::error::{grade_err, ok};
use crate::ipc::helpers::{required_str, section_param, text_marks_param, workspace};
use crate::ipc::types::{AppState, Request};
use crate::store::ResponseStore;
use serde_json::json;
use tracing::{error, warn};

fn handle_evaluation_form(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, banks) = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let roll = match required_str(req, "roll") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let section = match section_param(req, "section") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let result = ResponseStore::new(conn)
        .submissions_for_roll(&roll)
        .and_then(|subs| {
            let sub = find_submission(&subs, &roll, section)?;
            let bank = banks.require(section)?;
            Ok(grading_form(bank, sub))
        });
    match result {
        Ok(form) => ok(&req.id, json!(form)),
        Err(e) => grade_err(&req.id, &e),
    }
}

fn handle_evaluation_preview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, banks) = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let roll = match required_str(req, "roll") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let section = match section_param(req, "section") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let marks = match text_marks_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let result = ResponseStore::new(conn)
        .submissions_for_roll(&roll)
        .and_then(|subs| {
            let sub = find_submission(&subs, &roll, section)?;
            compute_section(banks.require(section)?, sub, &marks)
        });
    match result {
        Ok(totals) => ok(&req.id, json!({ "saved": false, "evaluation": totals })),
        Err(e) => grade_err(&req.id, &e),
    }
}

fn handle_evaluation_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, banks) = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let roll = match required_str(req, "roll") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let section = match section_param(req, "section") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let marks = match text_marks_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let store = ResponseStore::new(conn);
    match save_section_evaluation(&store, banks, &roll, section, &marks) {
        Ok(evaluation) => ok(
            &req.id,
            json!({
                "saved": true,
                "evaluation": evaluation,
                "grandTotal": evaluation.grand_total,
            }),
        ),
        Err(e) => {
            if e.is_retryable() {
                error!(roll = %roll, section = %section, error = %e, "evaluation save failed; nothing written");
            } else if e.is_validation() {
                warn!(roll = %roll, section = %section, error = %e, "evaluation save rejected");
            }
            grade_err(&req.id, &e)
        }
    }
}

fn handle_evaluation_auto_score(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, banks) = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let roll = match required_str(req, "roll") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match auto_score_roll(&ResponseStore::new(conn), banks, &roll) {
        Ok(updated) => ok(&req.id, json!({ "roll": roll, "updated": updated })),
        Err(e) => grade_err(&req.id, &e),
    }
}

fn handle_evaluation_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, banks) = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let roll = match required_str(req, "roll") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match ResponseStore::new(conn).submissions_for_roll(&roll) {
        Ok(subs) => ok(&req.id, json!(roll_status(banks, &roll, &subs))),
        Err(e) => grade_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "evaluation.form" => Some(handle_evaluation_form(state, req)),
        "evaluation.preview" => Some(handle_evaluation_preview(state, req)),
        "evaluation.save" => Some(handle_evaluation_save(state, req)),
        "evaluation.autoScore" => Some(handle_evaluation_auto_score(state, req)),
        "evaluation.status" => Some(handle_evaluation_status(state, req)),
        _ => None,
    }
}
