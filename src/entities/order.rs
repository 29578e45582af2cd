//! Order entity - A student's order with its payment and preparation state.
//!
//! Two independent axes live on the row: `payment_status` (Pending → Paid) and
//! `order_status` (Pending → Preparing → Ready). The line items are stored in
//! the `order_lines` child table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment axis of the order lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentStatus {
    /// Awaiting payment
    #[sea_orm(string_value = "Pending")]
    Pending,
    /// Payment confirmed (simulated or gateway-verified)
    #[sea_orm(string_value = "Paid")]
    Paid,
}

/// Fulfilment axis of the order lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum OrderStatus {
    /// Not yet picked up by the kitchen
    #[sea_orm(string_value = "Pending")]
    Pending,
    /// Kitchen is cooking
    #[sea_orm(string_value = "Preparing")]
    Preparing,
    /// Ready for pickup
    #[sea_orm(string_value = "Ready")]
    Ready,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student who placed the order
    pub user_id: i64,
    /// Sum of line amounts, fixed at placement
    pub total_amount: f64,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    /// When the order was placed
    pub order_time: DateTimeUtc,
    /// Kitchen's estimate in minutes
    pub estimated_time: i32,
    pub preparation_started: Option<DateTimeUtc>,
    pub preparation_completed: Option<DateTimeUtc>,
    /// Set when the kitchen marks the order ready
    pub notification_sent: bool,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Restrict"
    )]
    User,
    /// One order has many lines
    #[sea_orm(has_many = "super::order_line::Entity")]
    Lines,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
