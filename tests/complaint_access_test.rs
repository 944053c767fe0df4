/// Integration tests for who may see and change which complaints
mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use complaint_desk::app_config::ComplaintsConfig;
use complaint_desk::complaint::{ComplaintChanges, ComplaintQuery, ComplaintService};
use complaint_desk::error::ServiceError;
use complaint_desk::orm::complaints::{Priority, Status};
use complaint_desk::orm::comments;
use complaint_desk::permission::CommentPolicy;
use sea_orm::{entity::*, query::*};

fn service(db: &TestDb) -> ComplaintService {
    ComplaintService::new(db.store(), ComplaintsConfig::default())
}

#[actix_rt::test]
#[serial]
async fn test_resident_lists_only_own_complaints() {
    let db = TestDb::new().await;
    let n = create_neighborhood(db.connection()).await.unwrap();

    let own = create_test_complaint(db.connection(), n.resident.id, n.apartment.id, "Mine")
        .await
        .unwrap();
    create_test_complaint(db.connection(), n.neighbor.id, n.apartment.id, "Theirs")
        .await
        .unwrap();

    let complaints = service(&db);
    let page = complaints
        .list(&actor_for(&n.resident), ComplaintQuery::default())
        .await
        .expect("list failed");

    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.complaints.len(), 1);
    assert_eq!(page.complaints[0].complaint.id, own.id);

    // Filters cannot widen the scope.
    let query = ComplaintQuery {
        status: Some(Status::Pending),
        ..Default::default()
    };
    let page = complaints
        .list(&actor_for(&n.resident), query)
        .await
        .unwrap();
    assert!(page
        .complaints
        .iter()
        .all(|c| c.complaint.reporter_id == n.resident.id));

    let page = complaints
        .list(&actor_for(&n.staff), ComplaintQuery::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 2);
}

#[actix_rt::test]
#[serial]
async fn test_foreign_and_missing_complaints_look_the_same() {
    let db = TestDb::new().await;
    let n = create_neighborhood(db.connection()).await.unwrap();
    let theirs = create_test_complaint(db.connection(), n.neighbor.id, n.apartment.id, "Theirs")
        .await
        .unwrap();

    let complaints = service(&db);
    let resident = actor_for(&n.resident);

    let foreign = complaints.get_by_id(&resident, theirs.id).await.unwrap_err();
    let missing = complaints.get_by_id(&resident, 9999).await.unwrap_err();

    match (foreign, missing) {
        (ServiceError::NotFound(a), ServiceError::NotFound(b)) => assert_eq!(a, b),
        other => panic!("expected two NotFound errors, got {:?}", other),
    }

    let detail = complaints
        .get_by_id(&actor_for(&n.manager), theirs.id)
        .await
        .expect("manager should read any complaint");
    assert_eq!(detail.complaint.id, theirs.id);
    assert!(detail.comments.is_some());
}

#[actix_rt::test]
#[serial]
async fn test_resident_cannot_change_workflow_fields() {
    let db = TestDb::new().await;
    let n = create_neighborhood(db.connection()).await.unwrap();
    let own = create_test_complaint(db.connection(), n.resident.id, n.apartment.id, "Mine")
        .await
        .unwrap();

    let complaints = service(&db);
    let changes = ComplaintChanges {
        title: Some("Leaking radiator".to_owned()),
        priority: Some(Priority::High),
        status: Some(Status::Resolved),
        assignee_id: Some(n.staff.id),
        ..Default::default()
    };

    let updated = complaints
        .update(&actor_for(&n.resident), own.id, changes)
        .await
        .expect("owner update should succeed");

    assert_eq!(updated.complaint.title, "Leaking radiator");
    assert_eq!(updated.complaint.priority, Priority::High);
    assert_eq!(updated.complaint.status, Status::Pending);
    assert_eq!(updated.complaint.assignee_id, None);
    assert_eq!(updated.complaint.resolved_at, None);
}

#[actix_rt::test]
#[serial]
async fn test_resident_cannot_update_foreign_complaint() {
    let db = TestDb::new().await;
    let n = create_neighborhood(db.connection()).await.unwrap();
    let theirs = create_test_complaint(db.connection(), n.neighbor.id, n.apartment.id, "Theirs")
        .await
        .unwrap();

    let err = service(&db)
        .update(
            &actor_for(&n.resident),
            theirs.id,
            ComplaintChanges {
                title: Some("Hijacked".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[actix_rt::test]
#[serial]
async fn test_ownership_is_checked_before_field_validation() {
    let db = TestDb::new().await;
    let n = create_neighborhood(db.connection()).await.unwrap();
    let theirs = create_test_complaint(db.connection(), n.neighbor.id, n.apartment.id, "Theirs")
        .await
        .unwrap();
    let own = create_test_complaint(db.connection(), n.resident.id, n.apartment.id, "Mine")
        .await
        .unwrap();

    let complaints = service(&db);
    let resident = actor_for(&n.resident);
    let too_short = || ComplaintChanges {
        title: Some("ab".to_owned()),
        ..Default::default()
    };

    let err = complaints
        .update(&resident, theirs.id, too_short())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let err = complaints
        .update(&resident, own.id, too_short())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[actix_rt::test]
#[serial]
async fn test_assignee_filter_stays_within_read_scope() {
    let db = TestDb::new().await;
    let n = create_neighborhood(db.connection()).await.unwrap();
    let theirs = create_test_complaint(db.connection(), n.neighbor.id, n.apartment.id, "Theirs")
        .await
        .unwrap();
    create_test_complaint(db.connection(), n.resident.id, n.apartment.id, "Mine")
        .await
        .unwrap();

    let complaints = service(&db);
    complaints
        .assign(
            &actor_for(&n.staff),
            theirs.id,
            ComplaintChanges {
                assignee_id: Some(n.staff.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let by_assignee = || ComplaintQuery {
        assignee_id: Some(n.staff.id),
        ..Default::default()
    };

    let page = complaints
        .list(&actor_for(&n.resident), by_assignee())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 0);
    assert!(page.complaints.is_empty());

    let page = complaints
        .list(&actor_for(&n.staff), by_assignee())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.complaints[0].complaint.id, theirs.id);
}

#[actix_rt::test]
#[serial]
async fn test_delete_rules() {
    let db = TestDb::new().await;
    let n = create_neighborhood(db.connection()).await.unwrap();
    let own = create_test_complaint(db.connection(), n.resident.id, n.apartment.id, "Mine")
        .await
        .unwrap();
    let theirs = create_test_complaint(db.connection(), n.neighbor.id, n.apartment.id, "Theirs")
        .await
        .unwrap();

    let complaints = service(&db);
    let resident = actor_for(&n.resident);

    complaints
        .add_comment(&resident, own.id, "Still dripping")
        .await
        .unwrap();

    let err = complaints.delete(&resident, theirs.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    complaints
        .delete(&resident, own.id)
        .await
        .expect("owner may delete");
    assert!(matches!(
        complaints.get_by_id(&resident, own.id).await,
        Err(ServiceError::NotFound(_))
    ));

    let orphaned = comments::Entity::find()
        .filter(comments::Column::ComplaintId.eq(own.id))
        .count(db.connection())
        .await
        .unwrap();
    assert_eq!(orphaned, 0);

    let err = complaints.delete(&resident, own.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    complaints
        .delete(&actor_for(&n.staff), theirs.id)
        .await
        .expect("staff may delete any complaint");
}

#[actix_rt::test]
#[serial]
async fn test_assign_route_refuses_residents_before_lookup() {
    let db = TestDb::new().await;
    let n = create_neighborhood(db.connection()).await.unwrap();
    let own = create_test_complaint(db.connection(), n.resident.id, n.apartment.id, "Mine")
        .await
        .unwrap();

    let complaints = service(&db);
    let changes = ComplaintChanges {
        assignee_id: Some(n.staff.id),
        ..Default::default()
    };

    // Even for a missing id the answer is Forbidden, not NotFound.
    let err = complaints
        .assign(&actor_for(&n.resident), 9999, changes.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let assigned = complaints
        .assign(
            &actor_for(&n.manager),
            own.id,
            ComplaintChanges {
                status: Some(Status::InProgress),
                ..changes
            },
        )
        .await
        .expect("manager may assign");
    assert_eq!(assigned.complaint.assignee_id, Some(n.staff.id));
    assert_eq!(assigned.complaint.status, Status::InProgress);
    assert_eq!(assigned.assignee.map(|a| a.id), Some(n.staff.id));
}

#[actix_rt::test]
#[serial]
async fn test_assignee_must_exist() {
    let db = TestDb::new().await;
    let n = create_neighborhood(db.connection()).await.unwrap();
    let own = create_test_complaint(db.connection(), n.resident.id, n.apartment.id, "Mine")
        .await
        .unwrap();

    let err = service(&db)
        .update(
            &actor_for(&n.staff),
            own.id,
            ComplaintChanges {
                assignee_id: Some(4242),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[actix_rt::test]
#[serial]
async fn test_comment_policy_is_configurable() {
    let db = TestDb::new().await;
    let n = create_neighborhood(db.connection()).await.unwrap();
    let theirs = create_test_complaint(db.connection(), n.neighbor.id, n.apartment.id, "Theirs")
        .await
        .unwrap();
    let resident = actor_for(&n.resident);

    service(&db)
        .add_comment(&resident, theirs.id, "Same problem here")
        .await
        .expect("open policy lets any user comment");

    let strict = ComplaintService::new(
        db.store(),
        ComplaintsConfig {
            comment_policy: CommentPolicy::MatchReadScope,
            ..Default::default()
        },
    );
    let err = strict
        .add_comment(&resident, theirs.id, "Same problem here")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
