//! Password hashing, session tokens and account field validation.
//!
//! Hashes are stored as `pbkdf2_sha256$<iterations>$<salt hex>$<digest hex>`.

use crate::error::{AppError, AppResult};
use anyhow::{Result, anyhow};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Default number of PBKDF2 rounds per password hash.
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 600_000;

const HASH_SCHEME: &str = "pbkdf2_sha256";
const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;
const TOKEN_LEN: usize = 32;

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| anyhow!("Failed to generate random bytes: {}", e))?;
    Ok(bytes)
}

fn digest(salt: &[u8], password: &str, iterations: u32) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> Result<String> {
    let iterations = iterations.max(1);
    let salt = random_bytes::<SALT_LEN>()?;
    let hash = digest(&salt, password, iterations);
    Ok(format!(
        "{}${}${}${}",
        HASH_SCHEME,
        iterations,
        hex::encode(salt),
        hex::encode(hash)
    ))
}

/// Check a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != HASH_SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    digest(&salt, password, iterations)
        .as_slice()
        .ct_eq(&expected)
        .into()
}

/// Generate an opaque session token.
pub fn generate_session_token() -> Result<String> {
    Ok(hex::encode(random_bytes::<TOKEN_LEN>()?))
}

/// Validate a username: required, bounded, letters/digits and `@.+-_` only.
pub fn validate_username(username: &str) -> AppResult<()> {
    if username.is_empty() {
        return Err(AppError::missing_field("username"));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(AppError::invalid_value(
            "username",
            format!("Username must be at most {} characters.", USERNAME_MAX_LEN),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(AppError::invalid_value(
            "username",
            "Username may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

/// Validate an optional email address.
pub fn validate_email(email: Option<&str>) -> AppResult<()> {
    match email {
        Some(email) if !email.contains('@') || email.starts_with('@') || email.ends_with('@') => {
            Err(AppError::invalid_value("email", "Enter a valid email address."))
        }
        _ => Ok(()),
    }
}

/// Validate a new password and its confirmation.
pub fn validate_new_password(password: &str, confirmation: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::missing_field("password1"));
    }
    if password != confirmation {
        return Err(AppError::invalid_value(
            "password2",
            "The two password fields didn’t match.",
        ));
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AppError::invalid_value(
            "password1",
            format!(
                "This password is too short. It must contain at least {} characters.",
                PASSWORD_MIN_LEN
            ),
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::invalid_value(
            "password1",
            "This password is entirely numeric.",
        ));
    }
    Ok(())
}
