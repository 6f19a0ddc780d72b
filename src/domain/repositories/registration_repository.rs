use async_trait::async_trait;

use crate::domain::{
    error::CredentialStoreError,
    models::{
        credential::NewCredential,
        profile::{NewProfile, RegisteredAccount},
    },
};

/// Repository for account registration. One call writes the credential,
/// its role grant, the kind-specific profile row, and any profile claims
/// in a single transaction; a failure in any step leaves nothing behind.
#[async_trait]
pub trait RegistrationRepository {
    /// Register a new account. The cleartext password is hashed inside
    /// the store after the duplicate check.
    async fn register(
        &self,
        credential: NewCredential,
        password: &str,
        profile: NewProfile,
    ) -> Result<RegisteredAccount, CredentialStoreError>;
}
