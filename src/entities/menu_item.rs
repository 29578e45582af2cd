//! Menu item entity - Dishes offered by the canteen.
//!
//! Prices here are the *current* prices. Orders copy the price into their
//! lines at placement time, so editing an item never changes past orders.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Menu item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menu_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Dish name (e.g., "Veg Thali")
    pub name: String,
    /// Current unit price in rupees
    pub price: f64,
    /// Grouping used on the menu page (e.g., "main", "beverage")
    pub category: String,
    /// Unavailable items are hidden from students
    pub available: bool,
    /// Free-text description
    pub description: Option<String>,
    /// When the item was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
