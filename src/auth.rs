//! Registration, login and the caller's own profile.

use crate::db::Store;
use crate::error::ServiceError;
use crate::orm::users;
use crate::permission::{Actor, Role};
use crate::session::{hash_password, verify_password, TokenKeys};
use crate::user::{load_owned_apartments, OwnedApartment, UserView};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection, DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 1000))]
    pub password: String,
    #[validate(length(min = 2, max = 255))]
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChanges {
    #[validate(length(min = 2, max = 255))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// A user together with a freshly issued bearer token.
#[derive(Clone, Debug, Serialize)]
pub struct AuthGrant {
    pub user: UserView,
    pub token: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(flatten)]
    pub user: UserView,
    pub apartments: Vec<OwnedApartment>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone, Debug)]
pub struct AuthService {
    store: Store,
    keys: TokenKeys,
    allow_role_selection: bool,
}

impl AuthService {
    pub fn new(store: Store, keys: TokenKeys, allow_role_selection: bool) -> Self {
        Self {
            store,
            keys,
            allow_role_selection,
        }
    }

    fn db(&self) -> &DatabaseConnection {
        self.store.conn()
    }

    pub async fn register(&self, form: Registration) -> Result<AuthGrant, ServiceError> {
        form.validate()?;

        let db = self.db();
        let email = normalize_email(&form.email);
        if find_by_email(db, &email).await?.is_some() {
            return Err(ServiceError::Conflict("Email already registered".to_owned()));
        }

        let role = match form.role {
            Some(role) if self.allow_role_selection => role,
            Some(role) => {
                log::warn!("Ignoring requested role {} on registration of {}", role, email);
                Role::Resident
            }
            None => Role::Resident,
        };

        let now = Utc::now().naive_utc();
        let inserted = users::ActiveModel {
            email: Set(email),
            password_hash: Set(hash_password(&form.password)?),
            full_name: Set(form.full_name.trim().to_owned()),
            phone: Set(form.phone),
            role: Set(role),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await;

        // A concurrent registration can still hit the unique index.
        let user = match inserted {
            Ok(user) => user,
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(ServiceError::Conflict("Email already registered".to_owned()))
            }
            Err(err) => return Err(err.into()),
        };

        log::info!("New user registered: {} (user_id: {}, role: {})", user.email, user.id, user.role);

        let token = self.keys.issue(&user)?;
        Ok(AuthGrant {
            user: UserView::from(user),
            token,
        })
    }

    pub async fn login(&self, credentials: Credentials) -> Result<AuthGrant, ServiceError> {
        credentials.validate()?;

        let email = normalize_email(&credentials.email);
        let user = find_by_email(self.db(), &email).await?;

        let user = match user {
            Some(user) if user.is_active && verify_password(&credentials.password, &user.password_hash) => user,
            _ => {
                log::warn!("Failed login for {}", email);
                return Err(ServiceError::Unauthorized("Invalid credentials".to_owned()));
            }
        };

        log::info!("User {} logged in", user.id);

        let token = self.keys.issue(&user)?;
        Ok(AuthGrant {
            user: UserView::from(user),
            token,
        })
    }

    pub async fn profile(&self, actor: &Actor) -> Result<Profile, ServiceError> {
        let db = self.db();
        let user = users::Entity::find_by_id(actor.id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_owned()))?;
        let apartments = load_owned_apartments(db, user.id).await?;

        Ok(Profile {
            user: UserView::from(user),
            apartments,
        })
    }

    /// Only the name and phone number are self-service.
    pub async fn update_profile(
        &self,
        actor: &Actor,
        changes: ProfileChanges,
    ) -> Result<UserView, ServiceError> {
        changes.validate()?;

        let db = self.db();
        let user = users::Entity::find_by_id(actor.id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_owned()))?;

        let mut active: users::ActiveModel = user.into();
        if let Some(full_name) = changes.full_name {
            active.full_name = Set(full_name.trim().to_owned());
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(Some(phone));
        }
        active.updated_at = Set(Utc::now().naive_utc());

        Ok(UserView::from(active.update(db).await?))
    }
}

async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await
}
