use async_trait::async_trait;

use crate::domain::{
    error::RepositoryError,
    models::{profile::ProfileSummary, role::ProfileKind},
};

/// Read access to the kind-specific profile rows created at registration.
#[async_trait]
pub trait ProfileRepository {
    async fn list(&self, kind: ProfileKind) -> Result<Vec<ProfileSummary>, RepositoryError>;
}
