use crate::bank::QuestionType;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::section::Section;
use serde_json::json;

fn inventory(state: &mut AppState, req: &Request) -> serde_json::Value {
    let AppState { config, banks, .. } = state;
    let Some(config) = config.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let set = banks.banks(config);

    let rows: Vec<serde_json::Value> = Section::ALL
        .iter()
        .map(|&section| {
            let path = config.bank_path(section).to_string_lossy().to_string();
            match set.get(section) {
                Some(bank) => json!({
                    "section": section,
                    "path": path,
                    "loaded": true,
                    "questionCount": bank.questions().len(),
                    "counts": {
                        "mcq": bank.count(QuestionType::Mcq),
                        "likert": bank.count(QuestionType::Likert),
                        "short": bank.count(QuestionType::Short),
                    },
                    "answerColumns": bank.answer_columns(),
                    "skippedRows": bank.skipped_rows(),
                }),
                None => json!({
                    "section": section,
                    "path": path,
                    "loaded": false,
                    "error": set.errors().get(&section),
                }),
            }
        })
        .collect();

    ok(&req.id, json!({ "banks": rows }))
}

fn handle_banks_reload(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.banks.invalidate();
    inventory(state, req)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "banks.list" => Some(inventory(state, req)),
        "banks.reload" => Some(handle_banks_reload(state, req)),
        _ => None,
    }
}
