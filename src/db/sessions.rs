//! Login sessions.

use super::users::parse_user_row;
use super::{Database, from_ms};
use crate::auth::generate_session_token;
use crate::types::{Session, User};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{OptionalExtension, params};
use tracing::debug;

impl Database {
    /// Start a session for `user_id` that expires after `ttl`.
    pub fn create_session(&self, user_id: i64, ttl: Duration) -> Result<Session> {
        self.create_session_at(user_id, ttl, Utc::now())
    }

    /// Start a session as of `now`.
    pub fn create_session_at(
        &self,
        user_id: i64,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Session> {
        let token = generate_session_token()?;
        let created_at = now.timestamp_millis();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| {
                anyhow!("Session lifetime out of range: {} hours", ttl.num_hours())
            })?
            .timestamp_millis();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token, user_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![token, user_id, created_at, expires_at],
            )?;
            Ok(())
        })?;

        debug!(user_id, "Session created");
        Ok(Session {
            token,
            user_id,
            created_at: from_ms(created_at),
            expires_at: from_ms(expires_at),
        })
    }

    /// Resolve a session token to its user. Expired sessions are removed.
    pub fn session_user(&self, token: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        let now_ms = now.timestamp_millis();
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT s.expires_at, u.id, u.username, u.email, u.password_hash, u.created_at
                     FROM sessions s
                     JOIN users u ON u.id = s.user_id
                     WHERE s.token = ?1",
                    params![token],
                    |row| Ok((row.get::<_, i64>("expires_at")?, parse_user_row(row)?)),
                )
                .optional()?;

            match found {
                Some((expires_at, user)) if expires_at > now_ms => Ok(Some(user)),
                Some(_) => {
                    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
                    debug!("Expired session removed");
                    Ok(None)
                }
                None => Ok(None),
            }
        })
    }

    /// End a session. Returns whether it existed.
    pub fn delete_session(&self, token: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
            Ok(deleted > 0)
        })
    }

    /// Remove all sessions expired as of `now`. Returns how many were removed.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                params![now.timestamp_millis()],
            )?;
            Ok(deleted)
        })
    }
}
