use async_trait::async_trait;
use entity::{mentors, persons, professors, students};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::domain::{
    error::RepositoryError,
    models::{profile::ProfileSummary, role::ProfileKind},
    repositories::profile_repository::ProfileRepository,
};

#[derive(Clone)]
pub struct PostgresProfileRepository {
    db: DatabaseConnection,
}

impl PostgresProfileRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn list_students(&self) -> Result<Vec<ProfileSummary>, RepositoryError> {
        let rows = students::Entity::find()
            .order_by_asc(students::Column::LastName)
            .all(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(student_summary).collect())
    }

    async fn list_professors(&self) -> Result<Vec<ProfileSummary>, RepositoryError> {
        let rows = professors::Entity::find()
            .order_by_asc(professors::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(professor_summary).collect())
    }

    async fn list_mentors(&self) -> Result<Vec<ProfileSummary>, RepositoryError> {
        let rows = mentors::Entity::find()
            .order_by_asc(mentors::Column::LastName)
            .all(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(mentor_summary).collect())
    }

    async fn list_persons(&self) -> Result<Vec<ProfileSummary>, RepositoryError> {
        let rows = persons::Entity::find()
            .order_by_asc(persons::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(person_summary).collect())
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn list(&self, kind: ProfileKind) -> Result<Vec<ProfileSummary>, RepositoryError> {
        match kind {
            ProfileKind::Student => self.list_students().await,
            ProfileKind::Professor => self.list_professors().await,
            ProfileKind::Mentor => self.list_mentors().await,
            ProfileKind::Person => self.list_persons().await,
        }
    }
}

fn student_summary(row: students::Model) -> ProfileSummary {
    ProfileSummary {
        id: row.id,
        credential_id: row.credential_id,
        kind: ProfileKind::Student,
        display_name: format!("{} {}", row.first_name, row.last_name),
    }
}

fn professor_summary(row: professors::Model) -> ProfileSummary {
    ProfileSummary {
        id: row.id,
        credential_id: row.credential_id,
        kind: ProfileKind::Professor,
        display_name: row.name,
    }
}

fn mentor_summary(row: mentors::Model) -> ProfileSummary {
    ProfileSummary {
        id: row.id,
        credential_id: row.credential_id,
        kind: ProfileKind::Mentor,
        display_name: format!("{} {}", row.first_name, row.last_name),
    }
}

fn person_summary(row: persons::Model) -> ProfileSummary {
    ProfileSummary {
        id: row.id,
        credential_id: row.credential_id,
        kind: ProfileKind::Person,
        display_name: row.name,
    }
}
