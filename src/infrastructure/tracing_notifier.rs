use async_trait::async_trait;

use crate::domain::{
    error::ServiceError,
    models::account::{EmailConfirmationGrant, PasswordResetGrant},
    services::notifier::AccountNotifier,
};

/// Stand-in mail sender that writes each message to the log. Swap in a
/// real transport behind the same trait when one is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAccountNotifier;

impl TracingAccountNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AccountNotifier for TracingAccountNotifier {
    async fn send_two_factor_code(
        &self,
        email: &str,
        provider: &str,
        code: &str,
    ) -> Result<(), ServiceError> {
        tracing::info!(email = %email, provider = %provider, code = %code, "two-factor code issued");
        Ok(())
    }

    async fn send_password_reset(
        &self,
        email: &str,
        grant: &PasswordResetGrant,
    ) -> Result<(), ServiceError> {
        tracing::info!(email = %email, token = %grant.token, "password reset link issued");
        Ok(())
    }

    async fn send_email_confirmation(
        &self,
        email: &str,
        grant: &EmailConfirmationGrant,
    ) -> Result<(), ServiceError> {
        tracing::info!(email = %email, token = %grant.token, "email confirmation link issued");
        Ok(())
    }
}
