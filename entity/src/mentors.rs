use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "mentors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub credential_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub occupation: String,
    pub email: String,
    pub address: String,
    pub firm_id: i32,
    pub years_of_experience: i32,
    pub competence: String,
    pub cv: Option<String>,
    pub activated: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
