//! Configuration loading and management.
//!
//! Resolution order: explicit config file, `.taskboard/config.yaml`, built-in
//! defaults; environment variables are applied on top:
//! - `TASKBOARD_DB_PATH` - Database path
//! - `TASKBOARD_HOST` - Bind address
//! - `TASKBOARD_PORT` - Listen port
//! - `TASKBOARD_SESSION_TTL_HOURS` - Session lifetime

use crate::auth::DEFAULT_PASSWORD_ITERATIONS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".taskboard/config.yaml";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".taskboard/taskboard.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Login session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Session lifetime in hours.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_hours: default_ttl_hours(),
        }
    }
}

fn default_cookie_name() -> String {
    "taskboard_session".to_string()
}

fn default_ttl_hours() -> i64 {
    336 // two weeks
}

/// Longest accepted session lifetime, in hours (ten years).
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 10;

impl SessionConfig {
    /// Session lifetime, clamped to between one hour and
    /// [`MAX_SESSION_TTL_HOURS`].
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS))
    }
}

/// Password hashing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_password_iterations")]
    pub password_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_iterations: default_password_iterations(),
        }
    }
}

fn default_password_iterations() -> u32 {
    DEFAULT_PASSWORD_ITERATIONS
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path` if given (must exist), else from the default location
    /// if present, else defaults. Environment overrides are applied last.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = lookup("TASKBOARD_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }

        if let Some(host) = lookup("TASKBOARD_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("TASKBOARD_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => debug!("Ignoring invalid TASKBOARD_PORT: {}", port),
            }
        }

        if let Some(ttl) = lookup("TASKBOARD_SESSION_TTL_HOURS") {
            match ttl.parse::<i64>() {
                Ok(hours) if hours > MAX_SESSION_TTL_HOURS => {
                    debug!(
                        "Clamping TASKBOARD_SESSION_TTL_HOURS {} to {}",
                        hours, MAX_SESSION_TTL_HOURS
                    );
                    self.session.ttl_hours = MAX_SESSION_TTL_HOURS;
                }
                Ok(hours) => self.session.ttl_hours = hours,
                Err(_) => debug!("Ignoring invalid TASKBOARD_SESSION_TTL_HOURS: {}", ttl),
            }
        }
    }

    /// Socket address to bind. The host may be an IP literal (bare IPv6
    /// included) or a name such as `localhost`.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let host = self.server.host.trim_start_matches('[').trim_end_matches(']');
        (host, self.server.port)
            .to_socket_addrs()
            .with_context(|| format!("Invalid bind address {}", host))?
            .next()
            .with_context(|| format!("Bind address {} resolved to nothing", host))
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
