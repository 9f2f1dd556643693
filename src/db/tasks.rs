//! Task CRUD. Every read and mutation is scoped to the owning user.

use super::categories::{
    add_task_category, categories_by_task, check_category_ownership,
    get_or_create_category_internal, set_task_categories, task_categories_internal,
};
use super::{Database, from_ms};
use crate::error::AppError;
use crate::types::{DATE_FORMAT, Priority, Task, TaskInput, TaskStatus, parse_date};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

const TASK_COLUMNS: &str = "id, user_id, title, description, due_date, status, priority, \
                            created_at, completed_at, notified";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let due_date: Option<String> = row.get("due_date")?;
    let status: String = row.get("status")?;
    let priority: String = row.get("priority")?;
    let created_at: i64 = row.get("created_at")?;
    let completed_at: Option<i64> = row.get("completed_at")?;

    Ok(Task {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        // Unparseable stored dates behave like a missing date.
        due_date: due_date.as_deref().and_then(parse_date),
        // The schema CHECK constraint limits status to the two known values.
        status: TaskStatus::parse(&status).unwrap_or_default(),
        priority: Priority::parse(&priority),
        categories: Vec::new(),
        created_at: from_ms(created_at),
        completed_at: completed_at.map(from_ms),
        notified: row.get("notified")?,
    })
}

/// Internal helper to get an owned task using an existing connection (avoids deadlock).
fn get_task_internal(conn: &Connection, task_id: i64, user_id: i64) -> Result<Option<Task>> {
    let sql = format!("SELECT {} FROM tasks WHERE id = ?1 AND user_id = ?2", TASK_COLUMNS);
    let task = conn
        .query_row(&sql, params![task_id, user_id], parse_task_row)
        .optional()?;

    match task {
        Some(mut task) => {
            task.categories = task_categories_internal(conn, task.id)?;
            Ok(Some(task))
        }
        None => Ok(None),
    }
}

fn require_task_internal(conn: &Connection, task_id: i64, user_id: i64) -> Result<Task> {
    get_task_internal(conn, task_id, user_id)?
        .ok_or_else(|| AppError::task_not_found(task_id).into())
}

fn format_due_date(input: &TaskInput) -> Option<String> {
    input.due_date.map(|d| d.format(DATE_FORMAT).to_string())
}

/// Attach the optional new category named in `input`.
fn attach_new_category(
    conn: &Connection,
    task_id: i64,
    user_id: i64,
    input: &TaskInput,
) -> Result<()> {
    if let Some(title) = input.new_category.as_deref().filter(|t| !t.is_empty()) {
        let category = get_or_create_category_internal(conn, user_id, title)?;
        add_task_category(conn, task_id, category.id)?;
    }
    Ok(())
}

impl Database {
    /// Create a new PENDING task for `user_id`.
    pub fn create_task(&self, user_id: i64, input: &TaskInput) -> Result<Task> {
        self.create_task_at(user_id, input, Utc::now())
    }

    /// Create a task with an explicit creation time.
    pub fn create_task_at(
        &self,
        user_id: i64,
        input: &TaskInput,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let task = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            check_category_ownership(&tx, user_id, &input.category_ids)?;

            tx.execute(
                "INSERT INTO tasks
                     (user_id, title, description, due_date, status, priority, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user_id,
                    input.title,
                    input.description,
                    format_due_date(input),
                    TaskStatus::Pending.as_str(),
                    input.priority.as_str(),
                    now.timestamp_millis(),
                ],
            )?;
            let task_id = tx.last_insert_rowid();

            set_task_categories(&tx, task_id, &input.category_ids)?;
            attach_new_category(&tx, task_id, user_id, input)?;

            let task = require_task_internal(&tx, task_id, user_id)?;
            tx.commit()?;
            Ok(task)
        })?;

        info!(task_id = task.id, user_id, "Task created");
        Ok(task)
    }

    /// Update an owned task's editable fields and replace its category set.
    pub fn update_task(&self, task_id: i64, user_id: i64, input: &TaskInput) -> Result<Task> {
        let task = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let updated = tx.execute(
                "UPDATE tasks SET title = ?3, description = ?4, due_date = ?5, priority = ?6
                 WHERE id = ?1 AND user_id = ?2",
                params![
                    task_id,
                    user_id,
                    input.title,
                    input.description,
                    format_due_date(input),
                    input.priority.as_str(),
                ],
            )?;
            if updated == 0 {
                return Err(AppError::task_not_found(task_id).into());
            }

            check_category_ownership(&tx, user_id, &input.category_ids)?;
            set_task_categories(&tx, task_id, &input.category_ids)?;
            attach_new_category(&tx, task_id, user_id, input)?;

            let task = require_task_internal(&tx, task_id, user_id)?;
            tx.commit()?;
            Ok(task)
        })?;

        info!(task_id, user_id, "Task updated");
        Ok(task)
    }

    /// Delete an owned task.
    pub fn delete_task(&self, task_id: i64, user_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
                params![task_id, user_id],
            )?;
            if deleted == 0 {
                return Err(AppError::task_not_found(task_id).into());
            }
            Ok(())
        })?;

        info!(task_id, user_id, "Task deleted");
        Ok(())
    }

    /// Mark an owned task COMPLETED now.
    pub fn complete_task(&self, task_id: i64, user_id: i64) -> Result<Task> {
        self.complete_task_at(task_id, user_id, Utc::now())
    }

    /// Mark an owned task COMPLETED at `now`.
    ///
    /// Completing an already completed task overwrites `completed_at`.
    pub fn complete_task_at(
        &self,
        task_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let task = self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE tasks SET status = ?3, completed_at = ?4
                 WHERE id = ?1 AND user_id = ?2",
                params![
                    task_id,
                    user_id,
                    TaskStatus::Completed.as_str(),
                    now.timestamp_millis(),
                ],
            )?;
            if updated == 0 {
                return Err(AppError::task_not_found(task_id).into());
            }
            require_task_internal(conn, task_id, user_id)
        })?;

        info!(task_id, user_id, "Task completed");
        Ok(task)
    }

    /// Get an owned task with its categories.
    pub fn get_task(&self, task_id: i64, user_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id, user_id))
    }

    /// All tasks owned by a user, oldest first, with categories.
    pub fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>> {
        let tasks = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM tasks WHERE user_id = ?1 ORDER BY id",
                TASK_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut tasks = stmt
                .query_map(params![user_id], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut categories = categories_by_task(conn, user_id)?;
            for task in &mut tasks {
                task.categories = categories.remove(&task.id).unwrap_or_default();
            }
            Ok(tasks)
        })?;

        debug!(user_id, count = tasks.len(), "Tasks loaded");
        Ok(tasks)
    }
}
