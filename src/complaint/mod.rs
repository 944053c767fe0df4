//! Complaint lifecycle: create, list, read, update, assign, delete, comment.
//!
//! Every decision about who may see or change a complaint is delegated to
//! [`crate::permission`]; this module loads rows, applies the decision and
//! shapes the result.

pub mod query;
pub mod view;

pub use query::{ComplaintQuery, SortField, SortOrder};
pub use view::{CommentView, ComplaintDetail, ComplaintListItem, ComplaintPage};

use crate::app_config::ComplaintsConfig;
use crate::db::Store;
use crate::error::ServiceError;
use crate::orm::complaints::{Category, Priority, Status};
use crate::orm::{apartments, comments, complaints, users};
use crate::pagination::{PageRequest, Pagination};
use crate::permission::{self, Actor, Denial};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ActiveValue::Set, DatabaseConnection, DbErr,
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use validator::Validate;
use view::{ApartmentSummary, UserSummary};

const NOT_FOUND: &str = "Complaint not found";
const NOT_FOUND_OR_DENIED: &str = "Complaint not found or access denied";

/// Body of `POST /complaints`. There is no reporter field; the
/// reporter is always the authenticated actor.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewComplaint {
    #[validate(length(min = 3, max = 255))]
    pub title: String,
    #[validate(length(min = 10))]
    pub description: String,
    pub category: Category,
    pub priority: Option<Priority>,
    pub apartment_id: i32,
}

/// Requested field changes for a complaint. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintChanges {
    #[validate(length(min = 3, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 10))]
    pub description: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub assignee_id: Option<i32>,
}

impl ComplaintChanges {
    /// The `resolved_at` value to write alongside these changes, if any.
    /// Only a change that sets status to RESOLVED stamps; nothing clears it.
    pub fn resolution_stamp(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self.status {
            Some(Status::Resolved) => Some(now),
            Some(Status::Pending | Status::InProgress | Status::Closed) | None => None,
        }
    }

    fn apply(self, active: &mut complaints::ActiveModel, now: NaiveDateTime) {
        let resolved_at = self.resolution_stamp(now);

        if let Some(title) = self.title {
            active.title = Set(title);
        }
        if let Some(description) = self.description {
            active.description = Set(description);
        }
        if let Some(category) = self.category {
            active.category = Set(category);
        }
        if let Some(priority) = self.priority {
            active.priority = Set(priority);
        }
        if let Some(status) = self.status {
            active.status = Set(status);
        }
        if let Some(assignee_id) = self.assignee_id {
            active.assignee_id = Set(Some(assignee_id));
        }
        if resolved_at.is_some() {
            active.resolved_at = Set(resolved_at);
        }
        active.updated_at = Set(now);
    }
}

#[derive(Clone, Copy)]
enum Shape {
    Summary,
    Full,
}

#[derive(Clone, Debug)]
pub struct ComplaintService {
    store: Store,
    settings: ComplaintsConfig,
}

impl ComplaintService {
    pub fn new(store: Store, settings: ComplaintsConfig) -> Self {
        Self { store, settings }
    }

    fn db(&self) -> &DatabaseConnection {
        self.store.conn()
    }

    pub async fn create(
        &self,
        actor: &Actor,
        input: NewComplaint,
    ) -> Result<ComplaintDetail, ServiceError> {
        input.validate()?;

        let db = self.db();
        if apartments::Entity::find_by_id(input.apartment_id)
            .one(db)
            .await?
            .is_none()
        {
            return Err(ServiceError::validation(
                "\"apartmentId\" does not reference an apartment",
            ));
        }

        let now = Utc::now().naive_utc();
        let complaint = complaints::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            category: Set(input.category),
            priority: Set(input.priority.unwrap_or_default()),
            status: Set(Status::Pending),
            reporter_id: Set(actor.id),
            apartment_id: Set(input.apartment_id),
            assignee_id: Set(None),
            resolved_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        log::info!(
            "Complaint {} created by user {} for apartment {}",
            complaint.id,
            actor.id,
            complaint.apartment_id
        );

        self.detail(complaint, Shape::Summary).await
    }

    pub async fn list(
        &self,
        actor: &Actor,
        query: ComplaintQuery,
    ) -> Result<ComplaintPage, ServiceError> {
        let db = self.db();
        let window = PageRequest::new(
            query.page,
            query.limit,
            self.settings.default_page_size,
            self.settings.max_page_size,
        );

        let mut condition = permission::scope_for_list(actor).condition();
        if let Some(status) = query.status {
            condition = condition.add(complaints::Column::Status.eq(status));
        }
        if let Some(category) = query.category {
            condition = condition.add(complaints::Column::Category.eq(category));
        }
        if let Some(priority) = query.priority {
            condition = condition.add(complaints::Column::Priority.eq(priority));
        }
        if let Some(assignee_id) = query.assignee_id {
            condition = condition.add(complaints::Column::AssigneeId.eq(assignee_id));
        }

        let select = complaints::Entity::find().filter(condition);
        let total = select.clone().count(db).await?;

        let order = query.sort_order.unwrap_or_default();
        let rows = select
            .order_by(query.sort_by.unwrap_or_default().order_expr(), order.into())
            .order_by(complaints::Column::Id, order.into())
            .offset(window.offset())
            .limit(window.limit)
            .all(db)
            .await?;

        let ids: Vec<i32> = rows.iter().map(|c| c.id).collect();
        let user_ids: HashSet<i32> = rows
            .iter()
            .flat_map(|c| std::iter::once(c.reporter_id).chain(c.assignee_id))
            .collect();
        let apartment_ids: HashSet<i32> = rows.iter().map(|c| c.apartment_id).collect();

        let users = load_users(db, user_ids).await?;
        let apartments = load_apartments(db, apartment_ids).await?;
        let counts = comment_counts(db, ids).await?;

        let complaints = rows
            .into_iter()
            .map(|c| ComplaintListItem {
                reporter: users.get(&c.reporter_id).map(UserSummary::from_model),
                assignee: c
                    .assignee_id
                    .and_then(|id| users.get(&id))
                    .map(UserSummary::from_model),
                apartment: apartments.get(&c.apartment_id).map(ApartmentSummary::from),
                comment_count: counts.get(&c.id).copied().unwrap_or(0),
                complaint: c.into(),
            })
            .collect();

        Ok(ComplaintPage {
            complaints,
            pagination: Pagination::new(window, total),
        })
    }

    /// Missing and invisible complaints produce the same error.
    pub async fn get_by_id(&self, actor: &Actor, id: i32) -> Result<ComplaintDetail, ServiceError> {
        let complaint = complaints::Entity::find_by_id(id).one(self.db()).await?;

        match complaint {
            Some(c) if permission::authorize_read(actor, &c).is_ok() => {
                self.detail(c, Shape::Full).await
            }
            Some(_) => {
                log::debug!("User {} denied read of complaint {}", actor.id, id);
                Err(ServiceError::NotFound(NOT_FOUND_OR_DENIED.to_owned()))
            }
            None => Err(ServiceError::NotFound(NOT_FOUND_OR_DENIED.to_owned())),
        }
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: i32,
        changes: ComplaintChanges,
    ) -> Result<ComplaintDetail, ServiceError> {
        let db = self.db();
        let existing = complaints::Entity::find_by_id(id).one(db).await?;
        let changes = permission::authorize_update(actor, existing.as_ref(), changes)
            .map_err(|denial| refuse(actor, id, "update", denial))?;
        let existing = existing.ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_owned()))?;
        changes.validate()?;

        if let Some(assignee_id) = changes.assignee_id {
            if users::Entity::find_by_id(assignee_id).one(db).await?.is_none() {
                return Err(ServiceError::validation(
                    "\"assigneeId\" does not reference a user",
                ));
            }
        }

        let now = Utc::now().naive_utc();
        let status_change = changes.status;
        let mut active: complaints::ActiveModel = existing.into();
        changes.apply(&mut active, now);
        let updated = active.update(db).await?;

        match status_change {
            Some(status) => log::info!(
                "Complaint {} updated by user {} (status {:?})",
                id,
                actor.id,
                status
            ),
            None => log::info!("Complaint {} updated by user {}", id, actor.id),
        }

        self.detail(updated, Shape::Summary).await
    }

    /// Route-gated update used by the assignment endpoint. Residents are
    /// refused before the complaint is looked up.
    pub async fn assign(
        &self,
        actor: &Actor,
        id: i32,
        changes: ComplaintChanges,
    ) -> Result<ComplaintDetail, ServiceError> {
        permission::authorize_assign_route(actor).map_err(|denial| refuse(actor, id, "assign", denial))?;
        self.update(actor, id, changes).await
    }

    /// Hard delete. Comments go with the complaint.
    pub async fn delete(&self, actor: &Actor, id: i32) -> Result<(), ServiceError> {
        let db = self.db();
        let existing = complaints::Entity::find_by_id(id).one(db).await?;
        permission::authorize_delete(actor, existing.as_ref())
            .map_err(|denial| refuse(actor, id, "delete", denial))?;

        let txn = db.begin().await?;
        comments::Entity::delete_many()
            .filter(comments::Column::ComplaintId.eq(id))
            .exec(&txn)
            .await?;
        complaints::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        log::info!("Complaint {} deleted by user {}", id, actor.id);
        Ok(())
    }

    pub async fn add_comment(
        &self,
        actor: &Actor,
        complaint_id: i32,
        content: &str,
    ) -> Result<CommentView, ServiceError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ServiceError::validation("Comment content is required"));
        }

        let db = self.db();
        let complaint = complaints::Entity::find_by_id(complaint_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_owned()))?;
        permission::authorize_comment(actor, &complaint, self.settings.comment_policy)
            .map_err(|denial| refuse(actor, complaint_id, "comment", denial))?;

        let comment = comments::ActiveModel {
            content: Set(content.to_owned()),
            complaint_id: Set(complaint_id),
            author_id: Set(actor.id),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        log::info!(
            "Comment {} added to complaint {} by user {}",
            comment.id,
            complaint_id,
            actor.id
        );

        let author = users::Entity::find_by_id(actor.id).one(db).await?;
        Ok(CommentView::new(comment, author.as_ref()))
    }

    async fn detail(
        &self,
        complaint: complaints::Model,
        shape: Shape,
    ) -> Result<ComplaintDetail, ServiceError> {
        let db = self.db();
        let user_ids: HashSet<i32> = std::iter::once(complaint.reporter_id)
            .chain(complaint.assignee_id)
            .collect();
        let users = load_users(db, user_ids).await?;
        let apartment = apartments::Entity::find_by_id(complaint.apartment_id)
            .one(db)
            .await?;

        let reporter = users.get(&complaint.reporter_id).map(|u| match shape {
            Shape::Full => UserSummary::with_phone(u),
            Shape::Summary => UserSummary::from_model(u),
        });
        let assignee = complaint
            .assignee_id
            .and_then(|id| users.get(&id))
            .map(UserSummary::from_model);

        let comments = match shape {
            Shape::Full => Some(load_comments(db, complaint.id).await?),
            Shape::Summary => None,
        };

        Ok(ComplaintDetail {
            complaint: complaint.into(),
            reporter,
            assignee,
            apartment: apartment.as_ref().map(ApartmentSummary::from),
            comments,
        })
    }
}

fn refuse(actor: &Actor, complaint_id: i32, action: &str, denial: Denial) -> ServiceError {
    if denial == Denial::Forbidden {
        log::warn!(
            "User {} ({}) refused {} on complaint {}",
            actor.id,
            actor.role,
            action,
            complaint_id
        );
    }
    denial.into()
}

async fn load_users(
    db: &DatabaseConnection,
    ids: HashSet<i32>,
) -> Result<HashMap<i32, users::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect())
}

async fn load_apartments(
    db: &DatabaseConnection,
    ids: HashSet<i32>,
) -> Result<HashMap<i32, apartments::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(apartments::Entity::find()
        .filter(apartments::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect())
}

async fn comment_counts(
    db: &DatabaseConnection,
    complaint_ids: Vec<i32>,
) -> Result<HashMap<i32, u64>, DbErr> {
    if complaint_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, i64)> = comments::Entity::find()
        .select_only()
        .column(comments::Column::ComplaintId)
        .column_as(Expr::col(comments::Column::Id).count(), "comment_count")
        .filter(comments::Column::ComplaintId.is_in(complaint_ids))
        .group_by(comments::Column::ComplaintId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, count)| (id, count.max(0) as u64))
        .collect())
}

/// Comments of one complaint, oldest first, with their authors.
async fn load_comments(db: &DatabaseConnection, complaint_id: i32) -> Result<Vec<CommentView>, DbErr> {
    let rows = comments::Entity::find()
        .filter(comments::Column::ComplaintId.eq(complaint_id))
        .order_by_asc(comments::Column::CreatedAt)
        .order_by_asc(comments::Column::Id)
        .all(db)
        .await?;

    let authors = load_users(db, rows.iter().map(|c| c.author_id).collect()).await?;

    Ok(rows
        .into_iter()
        .map(|c| {
            let author = authors.get(&c.author_id);
            CommentView::new(c, author)
        })
        .collect())
}
