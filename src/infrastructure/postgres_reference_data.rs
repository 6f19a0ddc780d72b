use async_trait::async_trait;
use entity::{cities, faculties, faculty_courses, firms, specializations, year_of_studies};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::domain::{
    error::RepositoryError, models::lookup::LookupItem, repositories::reference_data::ReferenceData,
};

#[derive(Clone)]
pub struct PostgresReferenceData {
    db: DatabaseConnection,
}

impl PostgresReferenceData {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReferenceData for PostgresReferenceData {
    async fn specializations(&self) -> Result<Vec<LookupItem>, RepositoryError> {
        let rows = specializations::Entity::find()
            .order_by_asc(specializations::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|row| LookupItem::new(row.id, row.name))
            .collect())
    }

    async fn cities(&self) -> Result<Vec<LookupItem>, RepositoryError> {
        let rows = cities::Entity::find()
            .order_by_asc(cities::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|row| LookupItem::new(row.id, row.name))
            .collect())
    }

    async fn faculties(&self) -> Result<Vec<LookupItem>, RepositoryError> {
        let rows = faculties::Entity::find()
            .order_by_asc(faculties::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|row| LookupItem::new(row.id, row.name))
            .collect())
    }

    async fn faculty_courses(&self) -> Result<Vec<LookupItem>, RepositoryError> {
        let rows = faculty_courses::Entity::find()
            .order_by_asc(faculty_courses::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|row| LookupItem::new(row.id, row.name))
            .collect())
    }

    async fn years_of_study(&self) -> Result<Vec<LookupItem>, RepositoryError> {
        let rows = year_of_studies::Entity::find()
            .order_by_asc(year_of_studies::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|row| LookupItem::new(row.id, row.name))
            .collect())
    }

    async fn firms(&self) -> Result<Vec<LookupItem>, RepositoryError> {
        let rows = firms::Entity::find()
            .order_by_asc(firms::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|row| LookupItem::new(row.id, row.name))
            .collect())
    }
}
