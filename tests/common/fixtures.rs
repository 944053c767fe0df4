//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::{Duration, NaiveDateTime, Utc};
use complaint_desk::orm::complaints::{Category, Priority, Status};
use complaint_desk::orm::{apartments, buildings, complaints, users};
use complaint_desk::permission::{Actor, Role};
use complaint_desk::session::hash_password;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

pub const TEST_PASSWORD: &str = "password123";

/// Create an active user with [`TEST_PASSWORD`].
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    role: Role,
) -> Result<users::Model, DbErr> {
    let now = Utc::now().naive_utc();
    let password_hash =
        hash_password(TEST_PASSWORD).map_err(|e| DbErr::Custom(e.to_string()))?;

    users::ActiveModel {
        email: Set(format!("{}@test.com", name)),
        password_hash: Set(password_hash),
        full_name: Set(format!("{} Tester", name)),
        phone: Set(Some("555-0100".to_owned())),
        role: Set(role),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub fn actor_for(user: &users::Model) -> Actor {
    Actor::new(user.id, user.email.clone(), user.role)
}

pub async fn create_test_building(db: &DatabaseConnection, name: &str) -> Result<buildings::Model, DbErr> {
    buildings::ActiveModel {
        name: Set(name.to_owned()),
        address: Set("1 Test Street".to_owned()),
        floors: Set(12),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_test_apartment(
    db: &DatabaseConnection,
    building_id: i32,
    unit_number: &str,
    owner_id: Option<i32>,
) -> Result<apartments::Model, DbErr> {
    apartments::ActiveModel {
        unit_number: Set(unit_number.to_owned()),
        floor: Set(3),
        area_sqm: Set(Some(72.5)),
        building_id: Set(building_id),
        owner_id: Set(owner_id),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Insert a complaint directly, bypassing the service.
pub async fn create_test_complaint(
    db: &DatabaseConnection,
    reporter_id: i32,
    apartment_id: i32,
    title: &str,
) -> Result<complaints::Model, DbErr> {
    create_test_complaint_at(db, reporter_id, apartment_id, title, Utc::now().naive_utc()).await
}

pub async fn create_test_complaint_at(
    db: &DatabaseConnection,
    reporter_id: i32,
    apartment_id: i32,
    title: &str,
    created_at: NaiveDateTime,
) -> Result<complaints::Model, DbErr> {
    complaints::ActiveModel {
        title: Set(title.to_owned()),
        description: Set("Something in the flat needs attention".to_owned()),
        category: Set(Category::Maintenance),
        priority: Set(Priority::Medium),
        status: Set(Status::Pending),
        reporter_id: Set(reporter_id),
        apartment_id: Set(apartment_id),
        assignee_id: Set(None),
        resolved_at: Set(None),
        created_at: Set(created_at),
        updated_at: Set(created_at),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Insert `count` complaints one minute apart, oldest first.
pub async fn create_many_complaints(
    db: &DatabaseConnection,
    reporter_id: i32,
    apartment_id: i32,
    count: usize,
) -> Result<Vec<complaints::Model>, DbErr> {
    let start = Utc::now().naive_utc() - Duration::hours(24);
    let mut rows = Vec::with_capacity(count);
    for i in 0..count {
        rows.push(
            create_test_complaint_at(
                db,
                reporter_id,
                apartment_id,
                &format!("Complaint number {}", i + 1),
                start + Duration::minutes(i as i64),
            )
            .await?,
        );
    }
    Ok(rows)
}

/// A building with one apartment and one user of every role. The resident
/// owns the apartment.
pub struct Neighborhood {
    pub admin: users::Model,
    pub manager: users::Model,
    pub staff: users::Model,
    pub resident: users::Model,
    pub neighbor: users::Model,
    pub building: buildings::Model,
    pub apartment: apartments::Model,
}

pub async fn create_neighborhood(db: &DatabaseConnection) -> Result<Neighborhood, DbErr> {
    let admin = create_test_user(db, "admin", Role::SuperAdmin).await?;
    let manager = create_test_user(db, "manager", Role::BuildingManager).await?;
    let staff = create_test_user(db, "staff", Role::Staff).await?;
    let resident = create_test_user(db, "resident", Role::Resident).await?;
    let neighbor = create_test_user(db, "neighbor", Role::Resident).await?;
    let building = create_test_building(db, "Maple Court").await?;
    let apartment = create_test_apartment(db, building.id, "4B", Some(resident.id)).await?;

    Ok(Neighborhood {
        admin,
        manager,
        staff,
        resident,
        neighbor,
        building,
        apartment,
    })
}
