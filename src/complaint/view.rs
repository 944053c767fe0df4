//! Response shapes for complaints and comments.

use crate::orm::complaints::{Category, Priority, Status};
use crate::orm::{apartments, comments, complaints, users};
use crate::pagination::Pagination;
use crate::permission::Role;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UserSummary {
    pub fn from_model(user: &users::Model) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: None,
        }
    }

    pub fn with_phone(user: &users::Model) -> Self {
        Self {
            phone: user.phone.clone(),
            ..Self::from_model(user)
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: i32,
    pub full_name: String,
    pub role: Role,
}

impl From<&users::Model> for AuthorSummary {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            role: user.role,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentSummary {
    pub id: i32,
    pub unit_number: String,
    pub floor: i32,
}

impl From<&apartments::Model> for ApartmentSummary {
    fn from(apartment: &apartments::Model) -> Self {
        Self {
            id: apartment.id,
            unit_number: apartment.unit_number.clone(),
            floor: apartment.floor,
        }
    }
}

/// Column values of a complaint row.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintView {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    pub reporter_id: i32,
    pub apartment_id: i32,
    pub assignee_id: Option<i32>,
    pub resolved_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<complaints::Model> for ComplaintView {
    fn from(c: complaints::Model) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            category: c.category,
            priority: c.priority,
            status: c.status,
            reporter_id: c.reporter_id,
            apartment_id: c.apartment_id,
            assignee_id: c.assignee_id,
            resolved_at: c.resolved_at,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i32,
    pub content: String,
    pub complaint_id: i32,
    pub author_id: i32,
    pub created_at: NaiveDateTime,
    pub author: Option<AuthorSummary>,
}

impl CommentView {
    pub fn new(comment: comments::Model, author: Option<&users::Model>) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            complaint_id: comment.complaint_id,
            author_id: comment.author_id,
            created_at: comment.created_at,
            author: author.map(AuthorSummary::from),
        }
    }
}

/// A single complaint with its related summaries.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintDetail {
    #[serde(flatten)]
    pub complaint: ComplaintView,
    pub reporter: Option<UserSummary>,
    pub assignee: Option<UserSummary>,
    pub apartment: Option<ApartmentSummary>,
    /// Only present on single-record reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentView>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintListItem {
    #[serde(flatten)]
    pub complaint: ComplaintView,
    pub reporter: Option<UserSummary>,
    pub assignee: Option<UserSummary>,
    pub apartment: Option<ApartmentSummary>,
    pub comment_count: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ComplaintPage {
    pub complaints: Vec<ComplaintListItem>,
    pub pagination: Pagination,
}
