//! Access policy for complaints and the administrative surface.
//!
//! Decisions are split in two. A *scope* decision narrows which rows a role
//! may ever see and is applied to list queries before any user filter. A
//! *record* decision says what an actor may do to one already identified row.
//! Record reads deny with [`Denial::NotFound`] so a resident cannot confirm
//! that someone else's complaint exists.
//!
//! Nothing in this module performs I/O.

pub mod role;

pub use role::{Actor, Role};

use crate::complaint::ComplaintChanges;
use crate::orm::complaints;
use sea_orm::{ColumnTrait, Condition};
use serde::{Deserialize, Serialize};

/// Why an operation was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Denial {
    /// The record is absent, or the actor may not learn that it exists.
    NotFound,
    /// The actor is known to be able to see the record but may not act on it.
    Forbidden,
}

/// Pre-filter for complaint listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowFilter {
    Unrestricted,
    ReporterIs(i32),
}

impl RowFilter {
    /// Condition to AND with every other list filter.
    pub fn condition(&self) -> Condition {
        match self {
            RowFilter::Unrestricted => Condition::all(),
            RowFilter::ReporterIs(id) => {
                Condition::all().add(complaints::Column::ReporterId.eq(*id))
            }
        }
    }

    /// In-memory equivalent of [`RowFilter::condition`].
    pub fn admits(&self, complaint: &complaints::Model) -> bool {
        match self {
            RowFilter::Unrestricted => true,
            RowFilter::ReporterIs(id) => complaint.reporter_id == *id,
        }
    }
}

/// Who may comment on a complaint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentPolicy {
    /// Any authenticated user may comment on any complaint, including ones
    /// they cannot read.
    #[default]
    AnyAuthenticated,
    /// Commenting follows the single-record read rule.
    MatchReadScope,
}

fn owns(actor: &Actor, complaint: &complaints::Model) -> bool {
    complaint.reporter_id == actor.id
}

pub fn scope_for_list(actor: &Actor) -> RowFilter {
    match actor.role {
        Role::Resident => RowFilter::ReporterIs(actor.id),
        Role::Staff | Role::BuildingManager | Role::SuperAdmin => RowFilter::Unrestricted,
    }
}

pub fn authorize_read(actor: &Actor, complaint: &complaints::Model) -> Result<(), Denial> {
    match actor.role {
        Role::Resident if !owns(actor, complaint) => Err(Denial::NotFound),
        Role::Resident | Role::Staff | Role::BuildingManager | Role::SuperAdmin => Ok(()),
    }
}

/// Returns the subset of `requested` that may be applied.
///
/// Residents editing their own complaint keep content, category and priority;
/// `status` and `assignee_id` are dropped without failing the request.
pub fn authorize_update(
    actor: &Actor,
    complaint: Option<&complaints::Model>,
    requested: ComplaintChanges,
) -> Result<ComplaintChanges, Denial> {
    let complaint = complaint.ok_or(Denial::NotFound)?;

    match actor.role {
        Role::Resident => {
            if !owns(actor, complaint) {
                return Err(Denial::Forbidden);
            }
            Ok(ComplaintChanges {
                status: None,
                assignee_id: None,
                ..requested
            })
        }
        Role::Staff | Role::BuildingManager | Role::SuperAdmin => Ok(requested),
    }
}

pub fn authorize_delete(actor: &Actor, complaint: Option<&complaints::Model>) -> Result<(), Denial> {
    let complaint = complaint.ok_or(Denial::NotFound)?;

    match actor.role {
        Role::Resident if !owns(actor, complaint) => Err(Denial::Forbidden),
        Role::Resident | Role::Staff | Role::BuildingManager | Role::SuperAdmin => Ok(()),
    }
}

/// Gate for the dedicated assignment route. Checked before any record is loaded.
pub fn authorize_assign_route(actor: &Actor) -> Result<(), Denial> {
    match actor.role {
        Role::Resident => Err(Denial::Forbidden),
        Role::Staff | Role::BuildingManager | Role::SuperAdmin => Ok(()),
    }
}

pub fn authorize_comment(
    actor: &Actor,
    complaint: &complaints::Model,
    policy: CommentPolicy,
) -> Result<(), Denial> {
    match policy {
        CommentPolicy::AnyAuthenticated => Ok(()),
        CommentPolicy::MatchReadScope => authorize_read(actor, complaint),
    }
}

/// Listing users, viewing a user, and user statistics.
pub fn authorize_user_directory(actor: &Actor) -> Result<(), Denial> {
    match actor.role {
        Role::SuperAdmin | Role::BuildingManager => Ok(()),
        Role::Staff | Role::Resident => Err(Denial::Forbidden),
    }
}

/// Editing and deactivating users.
pub fn authorize_user_admin(actor: &Actor) -> Result<(), Denial> {
    match actor.role {
        Role::SuperAdmin => Ok(()),
        Role::BuildingManager | Role::Staff | Role::Resident => Err(Denial::Forbidden),
    }
}
