use crate::export::{build_report, render_csv};
use crate::ipc::error::{err, grade_err, ok};
use crate::ipc::helpers::workspace;
use crate::ipc::types::{AppState, Request};
use crate::store::ResponseStore;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn write_text_file(path: &str, contents: &str) -> Result<(), String> {
    let out = PathBuf::from(path);
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    std::fs::write(&out, contents).map_err(|e| e.to_string())
}

fn handle_marks_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, banks) = match workspace(state, req) {
        Ok(w) => w,
        Err(e) => return e,
    };
    let out_path = req
        .params
        .get("outPath")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let roster = match ResponseStore::new(conn).load_roster() {
        Ok(r) => r,
        Err(e) => return grade_err(&req.id, &e),
    };
    let rows = build_report(banks, &roster);
    let csv = render_csv(&rows);

    if let Some(path) = out_path {
        if let Err(e) = write_text_file(path, &csv) {
            return err(
                &req.id,
                "export_failed",
                e,
                Some(json!({ "path": path })),
            );
        }
        info!(path, rows = rows.len(), "marks exported");
    }

    ok(
        &req.id,
        json!({
            "rowCount": rows.len(),
            "studentCount": roster.len(),
            "rows": rows,
            "csv": csv,
            "path": out_path,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.marksExport" => Some(handle_marks_export(state, req)),
        _ => None,
    }
}
