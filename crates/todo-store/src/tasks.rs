use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::row_helpers;

/// A persisted task. `created_at` serializes as `createdAt` on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    pub id: i64,
    pub name: String,
    pub completed: bool,
    pub created_at: String,
}

/// Insert a task, stamping `created_at`. Returns the generated id.
///
/// Transaction boundaries are the caller's responsibility: every function
/// here takes a `&Connection`, which a `rusqlite::Transaction` derefs to.
pub fn insert(conn: &Connection, name: &str, completed: bool) -> Result<i64, StoreError> {
    let now = Utc::now().to_rfc3339();
    let rows = conn.execute(
        "INSERT INTO tasks (name, completed, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, completed, now],
    )?;
    if rows == 0 {
        return Err(StoreError::Database("insert affected no rows".into()));
    }
    Ok(conn.last_insert_rowid())
}

/// Overwrite name and completed for a task. Returns rows affected.
pub fn update_by_id(
    conn: &Connection,
    id: i64,
    name: &str,
    completed: bool,
) -> Result<usize, StoreError> {
    let rows = conn.execute(
        "UPDATE tasks SET name = ?1, completed = ?2 WHERE id = ?3",
        rusqlite::params![name, completed, id],
    )?;
    Ok(rows)
}

/// Delete a task. Returns rows affected.
pub fn delete_by_id(conn: &Connection, id: i64) -> Result<usize, StoreError> {
    let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
    Ok(rows)
}

/// All tasks in storage-default (rowid) order.
pub fn select_all(conn: &Connection) -> Result<Vec<TaskRow>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, name, completed, created_at FROM tasks")?;
    let mut rows = stmt.query([])?;
    let mut results = Vec::new();
    while let Some(row) = rows.next()? {
        results.push(row_to_task(row)?);
    }
    Ok(results)
}

/// Look up one task by id.
pub fn select_by_id(conn: &Connection, id: i64) -> Result<Option<TaskRow>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT id, name, completed, created_at FROM tasks WHERE id = ?1")?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_task(row)?)),
        None => Ok(None),
    }
}

/// Highest assigned id, or None when the table is empty.
pub fn select_max_id(conn: &Connection) -> Result<Option<i64>, StoreError> {
    let max: Option<i64> = conn.query_row("SELECT MAX(id) FROM tasks", [], |row| row.get(0))?;
    Ok(max)
}

fn row_to_task(row: &rusqlite::Row<'_>) -> Result<TaskRow, StoreError> {
    Ok(TaskRow {
        id: row_helpers::get(row, 0, "tasks", "id")?,
        name: row_helpers::get(row, 1, "tasks", "name")?,
        completed: row_helpers::get(row, 2, "tasks", "completed")?,
        created_at: row_helpers::get(row, 3, "tasks", "created_at")?,
    })
}
