//! SeaORM Entity for buildings table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "buildings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub address: String,
    pub floors: i32,
    pub created_at: DateTime,
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
