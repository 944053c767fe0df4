use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Roles are not a strict hierarchy: staff and residents hold
/// disjoint capabilities, so checks match on the variant rather than comparing rank.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[sea_orm(string_value = "SUPER_ADMIN")]
    SuperAdmin,
    #[sea_orm(string_value = "BUILDING_MANAGER")]
    BuildingManager,
    #[sea_orm(string_value = "STAFF")]
    Staff,
    #[sea_orm(string_value = "RESIDENT")]
    #[default]
    Resident,
}

impl Role {
    /// Wire name, identical to the stored value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::BuildingManager => "BUILDING_MANAGER",
            Role::Staff => "STAFF",
            Role::Resident => "RESIDENT",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated identity behind a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: i32,
    pub email: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i32, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            role,
        }
    }
}
