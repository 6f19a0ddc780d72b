use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    error::ValidationErrors,
    models::{registration::is_valid_email, role::Role},
};

/// A signed session ready to be placed in the auth cookie. `remember_me`
/// drives the cookie lifetime, not the token contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    pub token: String,
    pub remember_me: bool,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub credential_id: Uuid,
    pub email: String,
    pub roles: Vec<Role>,
    pub given_name: Option<String>,
}

/// Claims carried by a short-lived token that bridges a successful password
/// check and the two-factor step. Nothing about the sign-in lives in server
/// session state; the token is the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTwoFactor {
    pub credential_id: Uuid,
    pub remember_me: bool,
}

/// Claims carried by the long-lived browser token that lets a device skip
/// the two-factor step on later sign-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RememberedBrowser {
    pub credential_id: Uuid,
}

/// What an external identity provider asserted about the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalAssertion {
    pub provider: String,
    pub subject: String,
    pub email: Option<String>,
}

/// Outcome of a password sign-in attempt. Invalid identifier, wrong
/// password, and inactive account all collapse into `Failure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    Success(IssuedSession),
    LockedOut,
    RequiresTwoFactor { pending: String },
    Failure,
}

/// Outcome of verifying a two-factor code. On success the caller may also
/// receive a browser token to persist when the visitor asked to remember
/// this device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TwoFactorOutcome {
    Success {
        session: IssuedSession,
        remember_browser: Option<String>,
    },
    LockedOut,
    Failure,
}

/// Outcome of an external provider callback. `NotLinked` carries a pending
/// token encoding the provider assertion so the confirmation step needs no
/// ambient state. A linked but deactivated account reports plain `Failure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalSignInOutcome {
    Success(IssuedSession),
    LockedOut,
    RequiresTwoFactor { pending: String },
    NotLinked {
        pending: String,
        provider: String,
        email: Option<String>,
    },
    Failure,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
    #[serde(default)]
    pub return_url: Option<String>,
}

impl SignInForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.email.trim().is_empty() {
            errors.add("email", "The email field is required.");
        } else if !is_valid_email(self.email.trim()) {
            errors.add("email", "The email address is not valid.");
        }
        if self.password.is_empty() {
            errors.add("password", "The password field is required.");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendCodeForm {
    #[serde(default, skip_serializing)]
    pub pending: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub return_url: Option<String>,
}

impl SendCodeForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.pending.trim().is_empty() {
            errors.add("pending", "The pending field is required.");
        }
        if self.provider.trim().is_empty() {
            errors.add("provider", "The provider field is required.");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyCodeForm {
    #[serde(default, skip_serializing)]
    pub pending: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing)]
    pub code: String,
    #[serde(default)]
    pub remember_browser: bool,
    #[serde(default)]
    pub return_url: Option<String>,
}

impl VerifyCodeForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.pending.trim().is_empty() {
            errors.add("pending", "The pending field is required.");
        }
        if self.provider.trim().is_empty() {
            errors.add("provider", "The provider field is required.");
        }
        if self.code.trim().is_empty() {
            errors.add("code", "The code field is required.");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalConfirmationForm {
    #[serde(default, skip_serializing)]
    pub pending: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub return_url: Option<String>,
}

impl ExternalConfirmationForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.pending.trim().is_empty() {
            errors.add("pending", "The pending field is required.");
        }
        if self.email.trim().is_empty() {
            errors.add("email", "The email field is required.");
        } else if !is_valid_email(self.email.trim()) {
            errors.add("email", "The email address is not valid.");
        }
        errors.into_result()
    }
}
