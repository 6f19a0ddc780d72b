use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{error::RepositoryError, models::role::Role};

/// Read-only view of role grants. Granting happens only inside the
/// registration transaction, so this directory exposes no writes.
#[async_trait]
pub trait RoleDirectory {
    async fn roles_for(&self, credential_id: Uuid) -> Result<Vec<Role>, RepositoryError>;
}
