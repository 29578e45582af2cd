//! Shared test utilities for the canteen service.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test accounts, menu items and orders with sensible defaults.

use crate::{
    core::{
        access::{Principal, Role},
        auth::{self, Registration},
        menu::{self, MenuItemInput},
        order::{self, CartLine, OrderWithLines},
    },
    entities::{menu_item, user},
    errors::Result,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::path::Path;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers an unverified student without a photo.
///
/// # Defaults
/// * `name`: "Test Student"
/// * `pnr`: "PNR001"
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<user::Model> {
    auth::register(
        db,
        Path::new("unused-uploads"),
        Registration {
            name: "Test Student".to_string(),
            email: email.to_string(),
            pnr: "PNR001".to_string(),
            password: password.to_string(),
        },
        None,
    )
    .await
}

/// Registers a student and marks the account verified.
/// The password is always `"password"`.
pub async fn create_verified_user(db: &DatabaseConnection, email: &str) -> Result<user::Model> {
    let student = create_test_user(db, email, "password").await?;
    let mut active: user::ActiveModel = student.into();
    active.verified = Set(true);
    Ok(active.update(db).await?)
}

/// Creates an available menu item in the "main" category.
pub async fn create_test_menu_item(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
) -> Result<menu_item::Model> {
    menu::create_menu_item(
        db,
        &admin_principal(),
        MenuItemInput {
            name: name.to_string(),
            price,
            category: "main".to_string(),
            description: None,
        },
    )
    .await
}

/// Places an unpaid order for a single item.
pub async fn place_test_order(
    db: &DatabaseConnection,
    user_id: i64,
    item_id: i64,
    quantity: i64,
) -> Result<OrderWithLines> {
    order::place_order(
        db,
        &student_principal(user_id),
        &[CartLine { item_id, quantity }],
    )
    .await
}

/// Sets up a database with a verified student and one menu item.
/// Returns (db, student, item); the item is "Chicken Biryani" at 180.
pub async fn setup_with_student_and_item()
-> Result<(DatabaseConnection, user::Model, menu_item::Model)> {
    let db = setup_test_db().await?;
    let student = create_verified_user(&db, "student@college.test").await?;
    let item = create_test_menu_item(&db, "Chicken Biryani", 180.0).await?;
    Ok((db, student, item))
}

#[must_use]
pub fn admin_principal() -> Principal {
    Principal::new(Role::Admin, 1, "Test Admin")
}

#[must_use]
pub fn kitchen_principal() -> Principal {
    Principal::new(Role::Kitchen, 1, "Test Cook")
}

#[must_use]
pub fn student_principal(user_id: i64) -> Principal {
    Principal::new(Role::Student, user_id, "Test Student")
}
