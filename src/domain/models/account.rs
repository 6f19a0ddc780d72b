use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    error::ValidationErrors,
    models::{policy::PasswordPolicy, registration::is_valid_email},
};

/// Administrative update of a credential: its sign-in email and whether the
/// account may sign in at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditCredentialForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_active: bool,
}

impl EditCredentialForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.email.trim().is_empty() {
            errors.add("email", "The email field is required.");
        } else if !is_valid_email(self.email.trim()) {
            errors.add("email", "The email address is not valid.");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
}

impl ForgotPasswordForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.email.trim().is_empty() {
            errors.add("email", "The email field is required.");
        } else if !is_valid_email(self.email.trim()) {
            errors.add("email", "The email address is not valid.");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default, skip_serializing)]
    pub confirm_password: String,
    #[serde(default, skip_serializing)]
    pub token: String,
}

impl ResetPasswordForm {
    pub fn validate(&self, policy: &PasswordPolicy) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.email.trim().is_empty() {
            errors.add("email", "The email field is required.");
        } else if !is_valid_email(self.email.trim()) {
            errors.add("email", "The email address is not valid.");
        }
        if self.password.is_empty() {
            errors.add("password", "The password field is required.");
        } else if let Err(message) = policy.check(&self.password) {
            errors.add("password", message);
        }
        if self.confirm_password != self.password {
            errors.add(
                "confirm_password",
                "The password and confirmation password do not match.",
            );
        }
        if self.token.trim().is_empty() {
            errors.add("token", "The token field is required.");
        }
        errors.into_result()
    }
}

/// A freshly minted password-reset grant. The token is delivered through the
/// notifier and never exposed in a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetGrant {
    pub credential_id: Uuid,
    pub token: Uuid,
}

/// A freshly minted email-confirmation grant, delivered out of band the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfirmationGrant {
    pub credential_id: Uuid,
    pub token: Uuid,
}
