pub mod account_admin_handler;
pub mod profile_handler;
pub mod recovery_handler;
pub mod registration_handler;
pub mod session_handler;

use axum::{
    Json,
    http::{HeaderMap, StatusCode, header::COOKIE},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::domain::{
    error::{CredentialError, ValidationErrors},
    models::session::IssuedSession,
};

/* Cookies */

pub const SESSION_COOKIE: &str = "praksa_session";
pub const PENDING_COOKIE: &str = "praksa_pending";
pub const DEVICE_COOKIE: &str = "praksa_device";
pub const EXTERNAL_COOKIE: &str = "praksa_external";

const PENDING_COOKIE_SECONDS: i64 = 10 * 60;
const DEVICE_COOKIE_SECONDS: i64 = 30 * 24 * 60 * 60;
const REMEMBERED_SESSION_SECONDS: i64 = 14 * 24 * 60 * 60;

/// Value of `name` in the request's `Cookie` header, if present.
pub(crate) fn cookie_value<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get(COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
}

/// Build a `Set-Cookie` value. Every cookie is HttpOnly and Lax so it
/// survives top-level redirects but is invisible to scripts.
pub(crate) fn set_cookie(name: &str, value: &str, max_age: Option<i64>) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    cookie
}

pub(crate) fn clear_cookie(name: &str) -> String {
    set_cookie(name, "", Some(0))
}

/// Session cookie for a freshly issued session. Remembered sessions get a
/// persistent cookie; the rest die with the browser.
pub(crate) fn session_cookie(session: &IssuedSession) -> String {
    let max_age = session.remember_me.then_some(REMEMBERED_SESSION_SECONDS);
    set_cookie(SESSION_COOKIE, &session.token, max_age)
}

pub(crate) fn pending_cookie(token: &str) -> String {
    set_cookie(PENDING_COOKIE, token, Some(PENDING_COOKIE_SECONDS))
}

pub(crate) fn device_cookie(token: &str) -> String {
    set_cookie(DEVICE_COOKIE, token, Some(DEVICE_COOKIE_SECONDS))
}

pub(crate) fn external_cookie(token: &str) -> String {
    set_cookie(EXTERNAL_COOKIE, token, Some(PENDING_COOKIE_SECONDS))
}

/* Redirects */

/// Only a same-origin path may be a redirect target. Anything with a
/// scheme, a protocol-relative `//` prefix, or a backslash falls back to
/// the landing page.
pub(crate) fn resolve_return_url(return_url: Option<&str>) -> &str {
    match return_url {
        Some(url) if url.starts_with('/') && !url.starts_with("//") && !url.contains('\\') => url,
        _ => "/",
    }
}

/* Error rendering */

/// json for a rejected form submission: the submitted values (secrets
/// skipped by their serializers) and the field errors to show
#[derive(Serialize)]
pub struct FormRejection<V: Serialize> {
    pub values: V,
    pub errors: ValidationErrors,
}

/// 422 re-render payload for a failed submission.
pub(crate) fn unprocessable<V: Serialize>(values: V, errors: ValidationErrors) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(FormRejection { values, errors }),
    )
        .into_response()
}

/// Place a credential-level rejection on the form field it belongs to.
pub(crate) fn credential_errors(err: &CredentialError) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    match err {
        CredentialError::DuplicateEmail | CredentialError::UnconfirmedEmail => {
            errors.add("email", err.to_string());
        }
        CredentialError::WeakPassword(_) => errors.add("password", err.to_string()),
        CredentialError::InvalidToken => errors.add("token", err.to_string()),
    }
    errors
}

pub(crate) fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json("An error occurred while processing your request."),
    )
        .into_response()
}

pub(crate) fn locked_out() -> Response {
    (
        StatusCode::LOCKED,
        Json("This account has been locked out, please try again later."),
    )
        .into_response()
}
