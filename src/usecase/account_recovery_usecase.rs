use uuid::Uuid;

use crate::domain::{
    error::{CredentialError, RepositoryError, ResetPasswordError},
    models::{
        account::{ForgotPasswordForm, ResetPasswordForm},
        credential::normalize_identifier,
        policy::PasswordPolicy,
    },
    repositories::credential_store::CredentialStore,
    services::notifier::AccountNotifier,
};

/// Password reset and email confirmation. Both reset entry points answer
/// identically whether or not the address belongs to an account, so they
/// cannot be used to probe for registered emails.
pub struct AccountRecoveryUsecase<S: CredentialStore, N: AccountNotifier> {
    credential_store: S,
    notifier: N,
    password_policy: PasswordPolicy,
}

impl<S: CredentialStore, N: AccountNotifier> AccountRecoveryUsecase<S, N> {
    pub fn new(credential_store: S, notifier: N, password_policy: PasswordPolicy) -> Self {
        Self {
            credential_store,
            notifier,
            password_policy,
        }
    }

    /// Mint and deliver a reset token. Unknown and unconfirmed addresses
    /// return success without sending anything.
    pub async fn request_reset(&self, form: ForgotPasswordForm) -> Result<(), ResetPasswordError>
    where
        S: Send + Sync,
        N: Send + Sync,
    {
        form.validate().map_err(ResetPasswordError::Validation)?;

        let identifier = normalize_identifier(&form.email);
        let Some(credential) = self
            .credential_store
            .find_by_identifier(&identifier)
            .await
            .map_err(ResetPasswordError::Repository)?
        else {
            return Ok(());
        };
        if !credential.email_confirmed() {
            return Ok(());
        }

        let grant = self
            .credential_store
            .generate_password_reset_token(credential.id())
            .await
            .map_err(ResetPasswordError::Repository)?;
        // A delivery failure must not turn into an account oracle; the
        // caller sees the same confirmation either way.
        if let Err(err) = self
            .notifier
            .send_password_reset(credential.email(), &grant)
            .await
        {
            tracing::warn!(error = %err, "password reset mail was not sent");
        }
        Ok(())
    }

    /// Complete a reset with the emailed token. An unknown address still
    /// reports success; a bad token for a real account is an error the
    /// submitter can act on.
    pub async fn complete_reset(&self, form: ResetPasswordForm) -> Result<(), ResetPasswordError>
    where
        S: Send + Sync,
        N: Send + Sync,
    {
        form.validate(&self.password_policy)
            .map_err(ResetPasswordError::Validation)?;

        let identifier = normalize_identifier(&form.email);
        let Some(credential) = self
            .credential_store
            .find_by_identifier(&identifier)
            .await
            .map_err(ResetPasswordError::Repository)?
        else {
            return Ok(());
        };

        let token = Uuid::parse_str(form.token.trim())
            .map_err(|_| ResetPasswordError::Credential(CredentialError::InvalidToken))?;
        self.credential_store
            .reset_password(credential.id(), token, &form.password)
            .await?;
        Ok(())
    }

    /// Flip the confirmed flag if the emailed token matches. Returns
    /// whether it did.
    pub async fn confirm_email(
        &self,
        credential_id: Uuid,
        token: Uuid,
    ) -> Result<bool, RepositoryError>
    where
        S: Send + Sync,
        N: Send + Sync,
    {
        self.credential_store.confirm_email(credential_id, token).await
    }
}
