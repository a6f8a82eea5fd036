use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use todo_store::tasks::{self, TaskRow};
use todo_store::{Database, StoreError};

use crate::error::ServiceError;

/// One record of an import payload. A supplied `id` is ignored — the add
/// path assigns a fresh one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImportRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

/// Validation and transactional orchestration over the task table.
/// Holds its storage handle explicitly; callers construct it with the
/// database they want it bound to.
pub struct TaskService {
    db: Database,
}

impl TaskService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a task. Returns the stored row, including the generated id
    /// and the creation timestamp assigned at insert.
    #[instrument(skip(self))]
    pub fn add_task(
        &self,
        name: Option<&str>,
        completed: Option<bool>,
    ) -> Result<TaskRow, ServiceError> {
        let name = validate_name(name)?;
        let task = self
            .db
            .with_tx(|conn| add_in_tx(conn, &name, completed.unwrap_or(false)))?;
        tracing::info!(id = task.id, "added task");
        Ok(task)
    }

    /// Update a task in place. Only supplied fields change. Returns
    /// `Ok(None)` when no task with the given id exists — a normal
    /// outcome, not an error.
    #[instrument(skip(self))]
    pub fn update_task(
        &self,
        id: Option<i64>,
        name: Option<&str>,
        completed: Option<bool>,
    ) -> Result<Option<TaskRow>, ServiceError> {
        let id = id.ok_or_else(|| ServiceError::Validation("Task ID cannot be null".into()))?;
        let name = name.map(|n| validate_name(Some(n))).transpose()?;

        let updated = self
            .db
            .with_tx(|conn| update_in_tx(conn, id, name.as_deref(), completed))?;
        match &updated {
            Some(task) => tracing::info!(id = task.id, "updated task"),
            None => tracing::warn!(id, "task not found"),
        }
        Ok(updated)
    }

    /// Delete a task. Returns `Ok(false)` when no task with the id exists.
    #[instrument(skip(self))]
    pub fn delete_task(&self, id: Option<i64>) -> Result<bool, ServiceError> {
        let id = id.ok_or_else(|| ServiceError::Validation("Task ID cannot be null".into()))?;
        let deleted = self.db.with_tx(|conn| delete_in_tx(conn, id))?;
        tracing::info!(id, deleted, "delete task");
        Ok(deleted)
    }

    /// All tasks as stored, no filtering or pagination.
    #[instrument(skip(self))]
    pub fn list_tasks(&self) -> Result<Vec<TaskRow>, ServiceError> {
        let all = self.db.with_conn(tasks::select_all)?;
        tracing::debug!(count = all.len(), "fetched tasks");
        Ok(all)
    }

    /// Import tasks. Every record goes through the add path with a freshly
    /// generated id; any failure rolls the whole import back.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn import_tasks(&self, records: &[ImportRecord]) -> Result<usize, ServiceError> {
        if records.is_empty() {
            return Err(ServiceError::Validation("No tasks to import".into()));
        }
        let count = self.db.with_tx(|conn| import_in_tx(conn, records))?;
        tracing::info!(count, "imported tasks");
        Ok(count)
    }
}

fn validate_name(name: Option<&str>) -> Result<String, ServiceError> {
    match name.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed.to_string()),
        _ => Err(ServiceError::Validation("Task name cannot be empty".into())),
    }
}

fn add_in_tx(conn: &Connection, name: &str, completed: bool) -> Result<TaskRow, ServiceError> {
    let id = tasks::insert(conn, name, completed)?;
    tasks::select_by_id(conn, id)?
        .ok_or_else(|| StoreError::Database(format!("task {id} missing after insert")).into())
}

fn update_in_tx(
    conn: &Connection,
    id: i64,
    name: Option<&str>,
    completed: Option<bool>,
) -> Result<Option<TaskRow>, ServiceError> {
    let Some(existing) = tasks::select_by_id(conn, id)? else {
        return Ok(None);
    };

    let name = name.unwrap_or(&existing.name);
    let completed = completed.unwrap_or(existing.completed);

    let rows = tasks::update_by_id(conn, id, name, completed)?;
    if rows == 0 {
        return Err(StoreError::Database(format!("update of task {id} affected no rows")).into());
    }

    match tasks::select_by_id(conn, id)? {
        Some(task) => Ok(Some(task)),
        None => Err(StoreError::Database(format!("task {id} missing after update")).into()),
    }
}

fn delete_in_tx(conn: &Connection, id: i64) -> Result<bool, ServiceError> {
    if tasks::select_by_id(conn, id)?.is_none() {
        return Ok(false);
    }
    let rows = tasks::delete_by_id(conn, id)?;
    Ok(rows > 0)
}

fn import_in_tx(conn: &Connection, records: &[ImportRecord]) -> Result<usize, ServiceError> {
    for record in records {
        let name = validate_name(record.name.as_deref())?;
        add_in_tx(conn, &name, record.completed.unwrap_or(false))?;
    }
    Ok(records.len())
}
