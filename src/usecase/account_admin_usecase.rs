use uuid::Uuid;

use crate::domain::{
    error::{EditCredentialError, RepositoryError},
    models::{
        account::EditCredentialForm,
        credential::{Credential, CredentialWithRoles, normalize_identifier},
        profile::ProfileSummary,
        role::ProfileKind,
    },
    repositories::{credential_store::CredentialStore, profile_repository::ProfileRepository},
};

/// Administrative maintenance of credentials: the account listing, the
/// edit form, and the profile directories the app links to after
/// registration.
pub struct AccountAdminUsecase<S: CredentialStore, P: ProfileRepository> {
    credential_store: S,
    profile_repository: P,
}

impl<S: CredentialStore, P: ProfileRepository> AccountAdminUsecase<S, P> {
    pub fn new(credential_store: S, profile_repository: P) -> Self {
        Self {
            credential_store,
            profile_repository,
        }
    }

    /// The credential behind the edit form.
    pub async fn credential(&self, id: Uuid) -> Result<Credential, EditCredentialError>
    where
        S: Send + Sync,
        P: Send + Sync,
    {
        match self.credential_store.find_by_id(id).await {
            Ok(Some(credential)) => Ok(credential),
            Ok(None) => Err(EditCredentialError::NotFound),
            Err(err) => Err(EditCredentialError::Repository(err)),
        }
    }

    /// Update the sign-in email and the active flag. Saving the same
    /// values twice is a no-op, not an error.
    pub async fn edit_credential(
        &self,
        id: Uuid,
        form: EditCredentialForm,
    ) -> Result<(), EditCredentialError>
    where
        S: Send + Sync,
        P: Send + Sync,
    {
        form.validate().map_err(EditCredentialError::Validation)?;
        let email = normalize_identifier(&form.email);
        self.credential_store
            .update_email_and_active(id, &email, form.is_active)
            .await?;
        Ok(())
    }

    pub async fn list_accounts(&self) -> Result<Vec<CredentialWithRoles>, RepositoryError>
    where
        S: Send + Sync,
        P: Send + Sync,
    {
        self.credential_store.list_with_roles().await
    }

    pub async fn profiles(&self, kind: ProfileKind) -> Result<Vec<ProfileSummary>, RepositoryError>
    where
        S: Send + Sync,
        P: Send + Sync,
    {
        self.profile_repository.list(kind).await
    }
}
