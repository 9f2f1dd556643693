//! Categories and the task/category join table.

use super::Database;
use crate::error::AppError;
use crate::types::Category;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::{BTreeSet, HashMap};

/// Longest accepted category title.
pub const CATEGORY_TITLE_MAX_LEN: usize = 100;

fn parse_category_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
    })
}

/// Find the owner's category with this title, creating it if absent.
/// When duplicates exist, the oldest one is reused.
pub(crate) fn get_or_create_category_internal(
    conn: &Connection,
    user_id: i64,
    title: &str,
) -> Result<Category> {
    let existing = conn
        .query_row(
            "SELECT id, user_id, title FROM categories
             WHERE user_id = ?1 AND title = ?2
             ORDER BY id LIMIT 1",
            params![user_id, title],
            parse_category_row,
        )
        .optional()?;
    if let Some(category) = existing {
        return Ok(category);
    }

    conn.execute(
        "INSERT INTO categories (user_id, title) VALUES (?1, ?2)",
        params![user_id, title],
    )?;
    Ok(Category {
        id: conn.last_insert_rowid(),
        user_id,
        title: title.to_string(),
    })
}

/// Fail with `CategoryNotFound` unless every id belongs to `user_id`.
pub(crate) fn check_category_ownership(
    conn: &Connection,
    user_id: i64,
    category_ids: &[i64],
) -> Result<()> {
    let mut stmt = conn.prepare("SELECT 1 FROM categories WHERE id = ?1 AND user_id = ?2")?;
    for &id in category_ids {
        if !stmt.exists(params![id, user_id])? {
            return Err(AppError::category_not_found(id).into());
        }
    }
    Ok(())
}

/// Replace a task's category set.
pub(crate) fn set_task_categories(
    conn: &Connection,
    task_id: i64,
    category_ids: &[i64],
) -> Result<()> {
    conn.execute(
        "DELETE FROM task_categories WHERE task_id = ?1",
        params![task_id],
    )?;
    let unique: BTreeSet<i64> = category_ids.iter().copied().collect();
    for category_id in unique {
        add_task_category(conn, task_id, category_id)?;
    }
    Ok(())
}

/// Attach one category to a task (no-op if already attached).
pub(crate) fn add_task_category(conn: &Connection, task_id: i64, category_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO task_categories (task_id, category_id) VALUES (?1, ?2)",
        params![task_id, category_id],
    )?;
    Ok(())
}

/// Categories of every task owned by `user_id`, keyed by task id.
pub(crate) fn categories_by_task(
    conn: &Connection,
    user_id: i64,
) -> Result<HashMap<i64, Vec<Category>>> {
    let mut stmt = conn.prepare(
        "SELECT tc.task_id, c.id, c.user_id, c.title
         FROM task_categories tc
         JOIN categories c ON c.id = tc.category_id
         WHERE c.user_id = ?1
         ORDER BY c.title, c.id",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok((row.get::<_, i64>("task_id")?, parse_category_row(row)?))
    })?;

    let mut map: HashMap<i64, Vec<Category>> = HashMap::new();
    for row in rows {
        let (task_id, category) = row?;
        map.entry(task_id).or_default().push(category);
    }
    Ok(map)
}

/// Categories attached to one task.
pub(crate) fn task_categories_internal(conn: &Connection, task_id: i64) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.user_id, c.title
         FROM task_categories tc
         JOIN categories c ON c.id = tc.category_id
         WHERE tc.task_id = ?1
         ORDER BY c.title, c.id",
    )?;
    let categories = stmt
        .query_map(params![task_id], parse_category_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(categories)
}

impl Database {
    /// All categories owned by a user, alphabetically.
    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title FROM categories
                 WHERE user_id = ?1 ORDER BY title, id",
            )?;
            let categories = stmt
                .query_map(params![user_id], parse_category_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(categories)
        })
    }

    /// Find or create a category by title for a user.
    pub fn get_or_create_category(&self, user_id: i64, title: &str) -> Result<Category> {
        self.with_conn(|conn| get_or_create_category_internal(conn, user_id, title))
    }

    /// Categories attached to a task.
    pub fn task_categories(&self, task_id: i64) -> Result<Vec<Category>> {
        self.with_conn(|conn| task_categories_internal(conn, task_id))
    }
}
