//! SeaORM Entity for users table

use crate::permission::Role;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    /// Users are never removed; deactivation clears this flag.
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::apartments::Entity")]
    Apartments,
}

impl Related<super::apartments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Apartments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
