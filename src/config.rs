use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::models::policy::{LockoutPolicy, PasswordPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {key} has an invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime configuration, read once at startup. Everything but the
/// database URL and the token secret has a default.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub token_secret: String,
    /// Session cookie lifetime for a plain sign-in, in minutes.
    pub session_minutes: i64,
    /// Session cookie lifetime when the visitor ticked "remember me".
    pub remembered_session_minutes: i64,
    /// Lifetime of the pending tokens bridging two-step sign-ins.
    pub pending_minutes: i64,
    /// Lifetime of the remembered-browser token, in days.
    pub remembered_browser_days: i64,
    pub reset_token_minutes: i64,
    pub two_factor_code_minutes: i64,
    pub password_policy: PasswordPolicy,
    pub lockout_policy: LockoutPolicy,
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parsed_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Read configuration from the environment. `dotenvy` is expected to
    /// have populated it from `.env` already.
    pub fn from_env() -> Result<Self, ConfigError> {
        let password_policy = PasswordPolicy {
            min_length: parsed_or("PASSWORD_MIN_LENGTH", 8)?,
            require_digit: parsed_or("PASSWORD_REQUIRE_DIGIT", true)?,
        };
        let lockout_policy = LockoutPolicy {
            max_failed_attempts: parsed_or("LOCKOUT_MAX_FAILED_ATTEMPTS", 5)?,
            lockout_minutes: parsed_or("LOCKOUT_MINUTES", 15)?,
            reset_window_minutes: parsed_or("LOCKOUT_RESET_WINDOW_MINUTES", 5)?,
        };
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            listen_addr: parsed_or("LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            token_secret: required("TOKEN_SECRET")?,
            session_minutes: parsed_or("SESSION_MINUTES", 60)?,
            remembered_session_minutes: parsed_or("REMEMBERED_SESSION_MINUTES", 60 * 24 * 14)?,
            pending_minutes: parsed_or("PENDING_MINUTES", 10)?,
            remembered_browser_days: parsed_or("REMEMBERED_BROWSER_DAYS", 30)?,
            reset_token_minutes: parsed_or("RESET_TOKEN_MINUTES", 60)?,
            two_factor_code_minutes: parsed_or("TWO_FACTOR_CODE_MINUTES", 5)?,
            password_policy,
            lockout_policy,
        })
    }
}
