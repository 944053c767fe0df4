//! User directory and administration. Users are never physically removed;
//! deactivation clears `is_active`.

use crate::app_config::UsersConfig;
use crate::constants::{RECENT_COMPLAINTS_PER_USER, RECENT_USERS_IN_STATS};
use crate::db::Store;
use crate::error::ServiceError;
use crate::orm::complaints::Status;
use crate::orm::{apartments, buildings, complaints, users};
use crate::pagination::{PageRequest, Pagination};
use crate::permission::Role;
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    entity::*,
    query::*,
    sea_query::{Expr, Func},
    ActiveValue::Set,
    Condition, DatabaseConnection, DbErr,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Public fields of a user. The password hash never leaves the service layer.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<users::Model> for UserView {
    fn from(u: users::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            role: u.role,
            phone: u.phone,
            is_active: u.is_active,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedApartment {
    pub id: i32,
    pub unit_number: String,
    pub floor: i32,
    pub building_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    #[serde(flatten)]
    pub user: UserView,
    pub apartment_count: u64,
    pub reported_complaint_count: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<UserListItem>,
    pub pagination: Pagination,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentComplaint {
    pub id: i32,
    pub title: String,
    pub status: Status,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: UserView,
    pub apartments: Vec<OwnedApartment>,
    pub reported_complaints: Vec<RecentComplaint>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RoleCount {
    pub role: Role,
    pub count: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: u64,
    pub active_users: u64,
    pub inactive_users: u64,
    pub role_distribution: Vec<RoleCount>,
    pub recent_users: Vec<UserView>,
}

/// `GET /users` query string.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub role: Option<Role>,
    pub search: Option<String>,
}

/// Administrative edit of another user.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    #[validate(length(min = 2, max = 255))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Apartments owned by `owner_id`, with their building's name.
pub async fn load_owned_apartments(
    db: &DatabaseConnection,
    owner_id: i32,
) -> Result<Vec<OwnedApartment>, DbErr> {
    let rows = apartments::Entity::find()
        .filter(apartments::Column::OwnerId.eq(owner_id))
        .find_also_related(buildings::Entity)
        .order_by_asc(apartments::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(apartment, building)| OwnedApartment {
            id: apartment.id,
            unit_number: apartment.unit_number,
            floor: apartment.floor,
            building_name: building.map(|b| b.name),
        })
        .collect())
}

#[derive(Clone, Debug)]
pub struct UserService {
    store: Store,
    settings: UsersConfig,
}

impl UserService {
    pub fn new(store: Store, settings: UsersConfig) -> Self {
        Self { store, settings }
    }

    fn db(&self) -> &DatabaseConnection {
        self.store.conn()
    }

    /// Active users only, newest first.
    pub async fn list(&self, query: UserQuery) -> Result<UserPage, ServiceError> {
        let db = self.db();
        let window = PageRequest::new(
            query.page,
            query.limit,
            self.settings.default_page_size,
            self.settings.max_page_size,
        );

        let mut condition = Condition::all().add(users::Column::IsActive.eq(true));
        if let Some(role) = query.role {
            condition = condition.add(users::Column::Role.eq(role));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            condition = condition.add(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(users::Column::FullName))).like(pattern.as_str()))
                    .add(Expr::expr(Func::lower(Expr::col(users::Column::Email))).like(pattern.as_str())),
            );
        }

        let select = users::Entity::find().filter(condition);
        let total = select.clone().count(db).await?;
        let rows = select
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .offset(window.offset())
            .limit(window.limit)
            .all(db)
            .await?;

        let ids: Vec<i32> = rows.iter().map(|u| u.id).collect();
        let apartment_counts = count_by(
            db,
            apartments::Entity::find(),
            apartments::Column::OwnerId,
            apartments::Column::Id,
            &ids,
        )
        .await?;
        let complaint_counts = count_by(
            db,
            complaints::Entity::find(),
            complaints::Column::ReporterId,
            complaints::Column::Id,
            &ids,
        )
        .await?;

        let users = rows
            .into_iter()
            .map(|u| UserListItem {
                apartment_count: apartment_counts.get(&u.id).copied().unwrap_or(0),
                reported_complaint_count: complaint_counts.get(&u.id).copied().unwrap_or(0),
                user: u.into(),
            })
            .collect();

        Ok(UserPage {
            users,
            pagination: Pagination::new(window, total),
        })
    }

    pub async fn get(&self, id: i32) -> Result<UserDetail, ServiceError> {
        let db = self.db();
        let user = find_user(db, id).await?;
        let apartments = load_owned_apartments(db, id).await?;

        let reported_complaints = complaints::Entity::find()
            .filter(complaints::Column::ReporterId.eq(id))
            .order_by_desc(complaints::Column::CreatedAt)
            .order_by_desc(complaints::Column::Id)
            .limit(RECENT_COMPLAINTS_PER_USER)
            .all(db)
            .await?
            .into_iter()
            .map(|c| RecentComplaint {
                id: c.id,
                title: c.title,
                status: c.status,
                created_at: c.created_at,
            })
            .collect();

        Ok(UserDetail {
            user: user.into(),
            apartments,
            reported_complaints,
        })
    }

    pub async fn update(&self, id: i32, changes: UserChanges) -> Result<UserView, ServiceError> {
        changes.validate()?;

        let db = self.db();
        let mut active: users::ActiveModel = find_user(db, id).await?.into();
        if let Some(full_name) = changes.full_name {
            active.full_name = Set(full_name.trim().to_owned());
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(role) = changes.role {
            active.role = Set(role);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().naive_utc());

        let user = active.update(db).await?;
        log::info!("User {} updated (role {}, active {})", user.id, user.role, user.is_active);

        Ok(user.into())
    }

    /// Soft delete.
    pub async fn deactivate(&self, id: i32) -> Result<(), ServiceError> {
        let db = self.db();
        let mut active: users::ActiveModel = find_user(db, id).await?.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(db).await?;

        log::info!("User {} deactivated", id);
        Ok(())
    }

    pub async fn stats(&self) -> Result<UserStats, ServiceError> {
        let db = self.db();
        let total_users = users::Entity::find().count(db).await?;
        let active_users = users::Entity::find()
            .filter(users::Column::IsActive.eq(true))
            .count(db)
            .await?;

        let distribution: Vec<(Role, i64)> = users::Entity::find()
            .select_only()
            .column(users::Column::Role)
            .column_as(Expr::col(users::Column::Id).count(), "user_count")
            .filter(users::Column::IsActive.eq(true))
            .group_by(users::Column::Role)
            .into_tuple()
            .all(db)
            .await?;

        let recent_users = users::Entity::find()
            .filter(users::Column::IsActive.eq(true))
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .limit(RECENT_USERS_IN_STATS)
            .all(db)
            .await?
            .into_iter()
            .map(UserView::from)
            .collect();

        Ok(UserStats {
            total_users,
            active_users,
            inactive_users: total_users.saturating_sub(active_users),
            role_distribution: distribution
                .into_iter()
                .map(|(role, count)| RoleCount {
                    role,
                    count: count.max(0) as u64,
                })
                .collect(),
            recent_users,
        })
    }
}

async fn find_user(db: &DatabaseConnection, id: i32) -> Result<users::Model, ServiceError> {
    users::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_owned()))
}

/// Row counts of `select` grouped by `key`, restricted to `ids`.
async fn count_by<E, K, C>(
    db: &DatabaseConnection,
    select: Select<E>,
    key: K,
    counted: C,
    ids: &[i32],
) -> Result<HashMap<i32, u64>, DbErr>
where
    E: EntityTrait,
    K: ColumnTrait + 'static,
    C: ColumnTrait + 'static,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, i64)> = select
        .select_only()
        .column(key)
        .column_as(Expr::col(counted).count(), "row_count")
        .filter(key.is_in(ids.iter().copied()))
        .group_by(key)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, count)| (id, count.max(0) as u64))
        .collect())
}
