use async_trait::async_trait;

use crate::domain::{
    error::ServiceError,
    models::account::{EmailConfirmationGrant, PasswordResetGrant},
};

/// Out-of-band delivery of security messages: two-factor codes, password
/// reset links, and email confirmation links.
#[async_trait]
pub trait AccountNotifier: Send + Sync {
    async fn send_two_factor_code(
        &self,
        email: &str,
        provider: &str,
        code: &str,
    ) -> Result<(), ServiceError>;

    async fn send_password_reset(
        &self,
        email: &str,
        grant: &PasswordResetGrant,
    ) -> Result<(), ServiceError>;

    async fn send_email_confirmation(
        &self,
        email: &str,
        grant: &EmailConfirmationGrant,
    ) -> Result<(), ServiceError>;
}
