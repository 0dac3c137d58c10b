//! Presenter authentication: shared-secret and issued-token paths.

pub mod rate_limit;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::Rng;
use rusqlite::{OptionalExtension, params};

use crate::db::DbPool;
use crate::errors::AppError;

/// Issued tokens expire after 30 days.
const TOKEN_TTL_DAYS: i64 = 30;

/// Validates the `Authorization: Bearer <value>` credential on every
/// state-mutating request and issues deck-scoped tokens at login.
#[derive(Clone)]
pub struct Authenticator {
    pool: DbPool,
    shared_secret: Option<String>,
    password_hash: Option<String>,
    password_plain: Option<String>,
}

impl Authenticator {
    pub fn new(
        pool: DbPool,
        shared_secret: Option<String>,
        password_hash: Option<String>,
        password_plain: Option<String>,
    ) -> Self {
        Self {
            pool,
            shared_secret,
            password_hash,
            password_plain,
        }
    }

    /// Check a presented credential against the shared secret, then the
    /// token store. Issued tokens only unlock the deck they were scoped to
    /// at login; the shared secret remains the all-decks back-compat path.
    pub fn authorize(&self, header: Option<&str>, deck_id: &str) -> Result<(), AppError> {
        let value = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?;

        if let Some(secret) = &self.shared_secret {
            if constant_time_eq(secret, value) {
                return Ok(());
            }
        }

        let conn = self.pool.get()?;
        let row: Option<(Option<String>, i64)> = conn
            .query_row(
                "SELECT deck_id, valid_until FROM presenter_tokens WHERE token = ?1",
                params![value],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((scope, valid_until)) if valid_until > Utc::now().timestamp() => match scope {
                Some(scoped_deck) if scoped_deck == deck_id => Ok(()),
                Some(_) => Err(AppError::Unauthorized),
                // Legacy unscoped token rows grant every deck.
                None => Ok(()),
            },
            Some(_) => {
                conn.execute(
                    "DELETE FROM presenter_tokens WHERE token = ?1",
                    params![value],
                )?;
                Err(AppError::Unauthorized)
            }
            None => Err(AppError::Unauthorized),
        }
    }

    /// Verify the presenter password for `POST /login`.
    pub fn verify_presenter_password(&self, password: &str) -> bool {
        if let Some(hash) = &self.password_hash {
            return verify_password(password, hash).unwrap_or(false);
        }
        if let Some(plain) = &self.password_plain {
            return constant_time_eq(plain, password);
        }
        false
    }

    /// Mint a token scoped to one deck, valid for [`TOKEN_TTL_DAYS`].
    /// Expired rows are pruned opportunistically on every issue.
    pub fn issue_token(&self, deck_id: &str) -> Result<String, AppError> {
        let token = generate_token();
        let valid_until = (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp();
        let conn = self.pool.get()?;
        conn.execute(
            "DELETE FROM presenter_tokens WHERE valid_until <= ?1",
            params![Utc::now().timestamp()],
        )?;
        conn.execute(
            "INSERT INTO presenter_tokens (token, deck_id, valid_until) VALUES (?1, ?2, ?3)",
            params![token, deck_id, valid_until],
        )?;
        Ok(token)
    }
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate a random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
