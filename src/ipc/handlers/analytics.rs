use crate::analytics::summarize;
use crate::evaluation::{section_view, SectionView};
use crate::ipc::error::{grade_err, ok};
use crate::ipc::helpers::{optional_section_param, workspace};
use crate::ipc::types::{AppState, Request};
use crate::store::ResponseStore;
use serde_json::json;

fn handle_analytics_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let section = match optional_section_param(req, "section") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (conn, banks) = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };

    let roster = match ResponseStore::new(conn).load_roster() {
        Ok(r) => r,
        Err(e) => return grade_err(&req.id, &e),
    };
    let views: Vec<SectionView> = roster
        .values()
        .flatten()
        .map(|s| section_view(banks, s))
        .collect();

    ok(&req.id, json!(summarize(&views, section)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.summary" => Some(handle_analytics_summary(state, req)),
        _ => None,
    }
}
