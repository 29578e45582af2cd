//! Database configuration module.
//!
//! This module handles `SQLite` database connection, table creation and seeding
//! using `SeaORM`. Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL.

use crate::config::seed::SeedConfig;
use crate::core::{auth, menu};
use crate::entities::{Admin, Expense, KitchenStaff, MenuItem, Order, OrderLine, User};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::TableCreateStatement,
};
use tracing::{info, instrument};

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()> {
    let builder = db.get_database_backend();
    let mut statement: TableCreateStatement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables if they do not exist yet.
///
/// Parents are created before children so the foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, MenuItem).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, OrderLine).await?;
    create_table(db, &schema, Admin).await?;
    create_table(db, &schema, KitchenStaff).await?;
    create_table(db, &schema, Expense).await?;

    Ok(())
}

/// Inserts seeded principals that are missing and the starter menu when the menu is empty.
#[instrument(skip_all)]
pub async fn seed_database(db: &DatabaseConnection, seed: &SeedConfig) -> Result<()> {
    for admin in &seed.admins {
        if auth::seed_admin(db, &admin.name, &admin.email, &admin.password).await? {
            info!("Seeded admin account {}", admin.email);
        }
    }

    for staff in &seed.kitchen_staff {
        if auth::seed_kitchen_staff(db, &staff.name, &staff.email, &staff.password).await? {
            info!("Seeded kitchen account {}", staff.email);
        }
    }

    let seeded = menu::seed_menu(db, &seed.menu).await?;
    if seeded > 0 {
        info!("Seeded {} menu items", seeded);
    }

    Ok(())
}
