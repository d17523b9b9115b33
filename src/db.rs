use anyhow::Context;
use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE: &str = "skillmark.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace.to_string_lossy()
        )
    })?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    // One row per (student, section) document. roll/section stay nullable so
    // malformed intake rows are kept and skipped on read rather than rejected.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_responses(
            id TEXT PRIMARY KEY,
            roll TEXT,
            section TEXT,
            responses TEXT NOT NULL DEFAULT '[]',
            evaluation TEXT,
            updated_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_responses_roll ON student_responses(roll)",
        [],
    )?;
    ensure_updated_at(conn)?;
    Ok(())
}

fn ensure_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "student_responses", "updated_at")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE student_responses ADD COLUMN updated_at TEXT",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
pub fn open_in_memory() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory db");
    init_schema(&conn).expect("schema");
    conn
}
