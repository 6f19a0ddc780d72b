use async_trait::async_trait;

use crate::domain::{error::RepositoryError, models::lookup::LookupItem};

/// The reference tables the registration forms offer as drop-downs.
#[async_trait]
pub trait ReferenceData {
    async fn specializations(&self) -> Result<Vec<LookupItem>, RepositoryError>;

    async fn cities(&self) -> Result<Vec<LookupItem>, RepositoryError>;

    async fn faculties(&self) -> Result<Vec<LookupItem>, RepositoryError>;

    async fn faculty_courses(&self) -> Result<Vec<LookupItem>, RepositoryError>;

    async fn years_of_study(&self) -> Result<Vec<LookupItem>, RepositoryError>;

    async fn firms(&self) -> Result<Vec<LookupItem>, RepositoryError>;
}
