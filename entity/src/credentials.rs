use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "credentials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Absent for accounts created through an external login provider.
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub email_confirmed: bool,
    pub two_factor_enabled: bool,
    pub access_failed_count: i32,
    pub last_access_failure: Option<DateTimeWithTimeZone>,
    pub lockout_end: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
