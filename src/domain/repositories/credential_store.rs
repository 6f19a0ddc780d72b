use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    error::{CredentialStoreError, RepositoryError},
    models::{
        account::PasswordResetGrant,
        credential::{Credential, CredentialWithRoles, NewCredential},
        session::ExternalAssertion,
    },
};

/// What the store concluded after recording one more failed sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutStatus {
    /// The attempt pushed the credential over the threshold, or it was
    /// already serving a lockout.
    LockedOut,
    /// Still below the threshold; this many attempts remain.
    AttemptsRemaining(i32),
}

/// Persistence boundary for credentials: lookups, lockout accounting,
/// two-factor codes, external login links, and recovery tokens. Write
/// operations that change a password hash the cleartext themselves, so a
/// hash never crosses this boundary inward.
#[async_trait]
pub trait CredentialStore {
    /// Case-insensitive lookup by the sign-in identifier (the email).
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Credential>, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, RepositoryError>;

    /// Lookup through a linked external provider identity.
    async fn find_by_external_login(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<Credential>, RepositoryError>;

    /// Create a passwordless credential and link the provider identity to
    /// it, atomically.
    async fn create_external(
        &self,
        credential: NewCredential,
        assertion: &ExternalAssertion,
    ) -> Result<Credential, CredentialStoreError>;

    /// Record one failed sign-in attempt. Failures older than the policy
    /// window are discarded before counting.
    async fn record_access_failure(
        &self,
        credential_id: Uuid,
    ) -> Result<LockoutStatus, RepositoryError>;

    /// Clear failure accounting after a fully successful sign-in.
    async fn reset_access_failures(&self, credential_id: Uuid) -> Result<(), RepositoryError>;

    /// The second-factor delivery channels available to this credential.
    async fn two_factor_providers(
        &self,
        credential_id: Uuid,
    ) -> Result<Vec<String>, RepositoryError>;

    /// Mint (and persist) a short-lived numeric code for the given
    /// provider, replacing any previous one.
    async fn generate_two_factor_code(
        &self,
        credential_id: Uuid,
        provider: &str,
    ) -> Result<String, RepositoryError>;

    /// Check a submitted code. A code can be spent at most once.
    async fn verify_two_factor_code(
        &self,
        credential_id: Uuid,
        provider: &str,
        code: &str,
    ) -> Result<bool, RepositoryError>;

    async fn claim_value(
        &self,
        credential_id: Uuid,
        claim_type: &str,
    ) -> Result<Option<String>, RepositoryError>;

    /// Mark the email confirmed if the token matches. Returns whether it
    /// did.
    async fn confirm_email(
        &self,
        credential_id: Uuid,
        token: Uuid,
    ) -> Result<bool, RepositoryError>;

    /// Mint a single-use, expiring password reset token, replacing any
    /// previous one.
    async fn generate_password_reset_token(
        &self,
        credential_id: Uuid,
    ) -> Result<PasswordResetGrant, RepositoryError>;

    /// Replace the password if the token is current. A successful reset
    /// spends the token and clears failure accounting.
    async fn reset_password(
        &self,
        credential_id: Uuid,
        token: Uuid,
        new_password: &str,
    ) -> Result<(), CredentialStoreError>;

    /// Administrative update of the sign-in email and the active flag.
    async fn update_email_and_active(
        &self,
        credential_id: Uuid,
        email: &str,
        is_active: bool,
    ) -> Result<(), CredentialStoreError>;

    /// Every credential joined with its role names, for the account
    /// listing.
    async fn list_with_roles(&self) -> Result<Vec<CredentialWithRoles>, RepositoryError>;
}
