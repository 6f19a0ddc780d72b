use async_trait::async_trait;
use entity::credential_roles;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::domain::{
    error::RepositoryError, models::role::Role, repositories::role_directory::RoleDirectory,
};

#[derive(Clone)]
pub struct PostgresRoleDirectory {
    db: DatabaseConnection,
}

impl PostgresRoleDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleDirectory for PostgresRoleDirectory {
    async fn roles_for(&self, credential_id: Uuid) -> Result<Vec<Role>, RepositoryError> {
        let grants = credential_roles::Entity::find()
            .filter(credential_roles::Column::CredentialId.eq(credential_id))
            .all(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut roles = Vec::with_capacity(grants.len());
        for grant in grants {
            match grant.role.parse::<Role>() {
                Ok(role) => roles.push(role),
                Err(_) => {
                    tracing::warn!(
                        credential_id = %credential_id,
                        role = %grant.role,
                        "skipping unknown role grant"
                    );
                }
            }
        }
        Ok(roles)
    }
}
