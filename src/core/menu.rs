//! Menu business logic - Handles all menu-related operations.
//!
//! Admins create, edit, delete and toggle menu items; students only ever see
//! available items. Prices are validated here and read by order placement,
//! which snapshots them into order lines.

use crate::{
    config::seed::MenuSeed,
    core::access::{Capability, Principal, authorize},
    entities::{MenuItem, menu_item},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use tracing::info;

/// Fields an admin supplies when creating or editing an item.
#[derive(Debug, Clone)]
pub struct MenuItemInput {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub description: Option<String>,
}

impl MenuItemInput {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Menu item name cannot be empty"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::InvalidAmount { amount: self.price });
        }
        Ok(())
    }

    fn category_or_default(&self) -> String {
        let trimmed = self.category.trim();
        if trimmed.is_empty() {
            "main".to_string()
        } else {
            trimmed.to_string()
        }
    }

    fn description_or_none(&self) -> Option<String> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(ToString::to_string)
    }
}

/// Full menu for the management page, ordered by category then name.
pub async fn list_all(db: &DatabaseConnection, principal: &Principal) -> Result<Vec<menu_item::Model>> {
    authorize(principal, Capability::ManageMenu)?;
    MenuItem::find()
        .order_by_asc(menu_item::Column::Category)
        .order_by_asc(menu_item::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Items students can order, ordered by category then name.
pub async fn list_available(db: &DatabaseConnection) -> Result<Vec<menu_item::Model>> {
    MenuItem::find()
        .filter(menu_item::Column::Available.eq(true))
        .order_by_asc(menu_item::Column::Category)
        .order_by_asc(menu_item::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a menu item by id.
pub async fn get_menu_item(db: &DatabaseConnection, item_id: i64) -> Result<Option<menu_item::Model>> {
    MenuItem::find_by_id(item_id).one(db).await.map_err(Into::into)
}

/// Creates a new, available menu item.
///
/// # Errors
/// Returns an error if:
/// - The caller is not an admin
/// - The name is empty or whitespace-only
/// - The price is negative or not finite
/// - The database insert fails
pub async fn create_menu_item(
    db: &DatabaseConnection,
    principal: &Principal,
    input: MenuItemInput,
) -> Result<menu_item::Model> {
    authorize(principal, Capability::ManageMenu)?;
    input.validate()?;

    let item = menu_item::ActiveModel {
        name: Set(input.name.trim().to_string()),
        price: Set(input.price),
        category: Set(input.category_or_default()),
        available: Set(true),
        description: Set(input.description_or_none()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(item_id = item.id, name = %item.name, "menu item added");
    Ok(item)
}

/// Replaces name, price, category and description of an item.
///
/// Existing orders keep the price they were placed with.
pub async fn update_menu_item(
    db: &DatabaseConnection,
    principal: &Principal,
    item_id: i64,
    input: MenuItemInput,
) -> Result<menu_item::Model> {
    authorize(principal, Capability::ManageMenu)?;
    input.validate()?;

    let mut item: menu_item::ActiveModel = MenuItem::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or(Error::MenuItemNotFound { item_id })?
        .into();

    item.name = Set(input.name.trim().to_string());
    item.price = Set(input.price);
    item.category = Set(input.category_or_default());
    item.description = Set(input.description_or_none());

    let updated = item.update(db).await?;
    info!(item_id, "menu item updated");
    Ok(updated)
}

/// Shows or hides an item on the student menu.
pub async fn set_availability(
    db: &DatabaseConnection,
    principal: &Principal,
    item_id: i64,
    available: bool,
) -> Result<menu_item::Model> {
    authorize(principal, Capability::ManageMenu)?;

    let mut item: menu_item::ActiveModel = MenuItem::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or(Error::MenuItemNotFound { item_id })?
        .into();

    item.available = Set(available);
    item.update(db).await.map_err(Into::into)
}

/// Deletes an item. Order lines keep their own name and price snapshot.
pub async fn delete_menu_item(
    db: &DatabaseConnection,
    principal: &Principal,
    item_id: i64,
) -> Result<()> {
    authorize(principal, Capability::ManageMenu)?;

    let result = MenuItem::delete_by_id(item_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::MenuItemNotFound { item_id });
    }
    info!(item_id, "menu item deleted");
    Ok(())
}

/// Inserts the starter menu if the menu table is empty. Returns the number inserted.
pub async fn seed_menu(db: &DatabaseConnection, items: &[MenuSeed]) -> Result<usize> {
    if items.is_empty() || MenuItem::find().count(db).await? > 0 {
        return Ok(0);
    }

    let now = chrono::Utc::now();
    for seed in items {
        if !seed.price.is_finite() || seed.price < 0.0 {
            return Err(Error::Config {
                message: format!("Seed menu item {:?} has an invalid price", seed.name),
            });
        }
        menu_item::ActiveModel {
            name: Set(seed.name.clone()),
            price: Set(seed.price),
            category: Set(seed.category.clone()),
            available: Set(true),
            description: Set(seed.description.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(items.len())
}
