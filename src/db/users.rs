//! User accounts.

use super::{Database, from_ms, now_ms};
use crate::auth::{hash_password, verify_password};
use crate::error::AppError;
use crate::types::User;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

pub fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    let created_at: i64 = row.get("created_at")?;
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        created_at: from_ms(created_at),
    })
}

fn get_user_by_username_internal(conn: &Connection, username: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, email, password_hash, created_at
             FROM users WHERE username = ?1",
            params![username],
            parse_user_row,
        )
        .optional()?;
    Ok(user)
}

impl Database {
    /// Register a new user. Fails with `AlreadyExists` if the username is taken.
    pub fn create_user(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
        password_iterations: u32,
    ) -> Result<User> {
        let password_hash = hash_password(password, password_iterations)?;
        let now = now_ms();

        let user = self.with_conn(|conn| {
            if get_user_by_username_internal(conn, username)?.is_some() {
                return Err(AppError::already_exists(
                    "username",
                    "A user with that username already exists.",
                )
                .into());
            }

            conn.execute(
                "INSERT INTO users (username, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![username, email, password_hash, now],
            )?;

            Ok(User {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                email: email.map(str::to_string),
                password_hash,
                created_at: from_ms(now),
            })
        })?;

        info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Get a user by ID.
    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT id, username, email, password_hash, created_at
                     FROM users WHERE id = ?1",
                    params![user_id],
                    parse_user_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    /// Get a user by username.
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| get_user_by_username_internal(conn, username))
    }

    /// Check credentials. Returns the user on success, `None` otherwise.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let user = self.get_user_by_username(username)?;
        Ok(user.filter(|u| verify_password(password, &u.password_hash)))
    }

    /// Delete a user and, by cascade, everything they own.
    pub fn delete_user(&self, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
            Ok(deleted > 0)
        })
    }
}
