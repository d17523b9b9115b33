use crate::config::WorkspaceConfig;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let conn = match db::open_db(&path) {
        Ok(conn) => conn,
        Err(e) => return err(&req.id, "db_open_failed", format!("{e:#}"), None),
    };
    let config = match WorkspaceConfig::load(&path) {
        Ok(cfg) => cfg,
        Err(e) => return err(&req.id, "config_invalid", format!("{e:#}"), None),
    };

    info!(workspace = %path.display(), bank_dir = %config.bank_dir.display(), "workspace selected");
    let bank_dir = config.bank_dir.to_string_lossy().to_string();
    state.workspace = Some(path.clone());
    state.db = Some(conn);
    state.config = Some(config);
    state.banks.invalidate();

    ok(
        &req.id,
        json!({ "workspacePath": path.to_string_lossy(), "bankDir": bank_dir }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
