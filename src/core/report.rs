//! Dashboard and queue generation.
//!
//! This module assembles the read-only views for the three roles. All
//! functions return structured data; the HTTP layer only serializes it.

use crate::{
    core::{
        access::{Capability, Principal, authorize},
        expense::{total_expenses, total_revenue},
        menu::list_available,
        order::{OrderDetails, OrderWithLines, list_student_orders, load_order_details},
        progress::is_overdue,
    },
    entities::{Order, OrderLine, OrderStatus, PaymentStatus, User, menu_item, order, user},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Select, prelude::*};
use serde::Serialize;
use std::collections::HashMap;

/// Number of orders on the admin dashboard.
pub const RECENT_ORDER_LIMIT: u64 = 5;

/// Number of entries in the kitchen's top-seller list.
pub const TOP_SELLER_LIMIT: usize = 5;

/// Headline numbers and latest orders for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminDashboard {
    /// Verified student accounts
    pub total_users: u64,
    pub pending_verifications: u64,
    pub total_orders: u64,
    /// Sum of paid order totals
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub profit: f64,
    pub recent_orders: Vec<OrderDetails>,
}

/// Generates the admin dashboard.
pub async fn admin_dashboard(
    db: &DatabaseConnection,
    principal: &Principal,
) -> Result<AdminDashboard> {
    authorize(principal, Capability::ViewAdminDashboard)?;

    let total_users = User::find()
        .filter(user::Column::Verified.eq(true))
        .count(db)
        .await?;
    let pending_verifications = User::find()
        .filter(user::Column::Verified.eq(false))
        .count(db)
        .await?;
    let total_orders = Order::find().count(db).await?;
    let total_revenue = total_revenue(db).await?;
    let total_expenses = total_expenses(db).await?;

    let recent_orders = load_order_details(
        db,
        Order::find()
            .order_by_desc(order::Column::OrderTime)
            .order_by_desc(order::Column::Id)
            .limit(RECENT_ORDER_LIMIT),
    )
    .await?;

    Ok(AdminDashboard {
        total_users,
        pending_verifications,
        total_orders,
        total_revenue,
        total_expenses,
        profit: total_revenue - total_expenses,
        recent_orders,
    })
}

/// Item name and units sold across paid orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopSeller {
    pub name: String,
    pub quantity: i64,
}

/// The kitchen's work queues. Only paid orders are shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KitchenQueue {
    /// Oldest first
    pub pending_orders: Vec<OrderDetails>,
    /// Oldest first
    pub preparing_orders: Vec<OrderDetails>,
    /// Newest first
    pub ready_orders: Vec<OrderDetails>,
    pub top_sellers: Vec<TopSeller>,
}

fn paid_with_status(status: OrderStatus) -> Select<Order> {
    Order::find()
        .filter(order::Column::PaymentStatus.eq(PaymentStatus::Paid))
        .filter(order::Column::OrderStatus.eq(status))
}

/// Generates the kitchen dashboard.
pub async fn kitchen_queue(db: &DatabaseConnection, principal: &Principal) -> Result<KitchenQueue> {
    authorize(principal, Capability::ViewKitchenQueue)?;

    let pending_orders = load_order_details(
        db,
        paid_with_status(OrderStatus::Pending)
            .order_by_asc(order::Column::OrderTime)
            .order_by_asc(order::Column::Id),
    )
    .await?;
    let preparing_orders = load_order_details(
        db,
        paid_with_status(OrderStatus::Preparing)
            .order_by_asc(order::Column::OrderTime)
            .order_by_asc(order::Column::Id),
    )
    .await?;
    let ready_orders = load_order_details(
        db,
        paid_with_status(OrderStatus::Ready).order_by_desc(order::Column::Id),
    )
    .await?;

    Ok(KitchenQueue {
        pending_orders,
        preparing_orders,
        ready_orders,
        top_sellers: top_sellers(db).await?,
    })
}

/// Best-selling items by quantity across paid orders, grouped by line name.
pub async fn top_sellers(db: &DatabaseConnection) -> Result<Vec<TopSeller>> {
    let lines = OrderLine::find()
        .inner_join(Order)
        .filter(order::Column::PaymentStatus.eq(PaymentStatus::Paid))
        .all(db)
        .await?;

    let mut totals: HashMap<String, i64> = HashMap::new();
    for line in lines {
        *totals.entry(line.name).or_default() += i64::from(line.quantity);
    }

    let mut sellers: Vec<TopSeller> = totals
        .into_iter()
        .map(|(name, quantity)| TopSeller { name, quantity })
        .collect();
    sellers.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
    sellers.truncate(TOP_SELLER_LIMIT);
    Ok(sellers)
}

/// Result of the kitchen's periodic poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KitchenAlerts {
    /// Paid orders not yet started
    pub new_orders: u64,
    /// Preparing orders past their estimate
    pub overdue_orders: Vec<i64>,
    pub timestamp: DateTime<Utc>,
}

/// Counts new work and flags overdue orders.
pub async fn kitchen_alerts(
    db: &DatabaseConnection,
    principal: &Principal,
    now: DateTime<Utc>,
) -> Result<KitchenAlerts> {
    authorize(principal, Capability::ViewKitchenQueue)?;

    let new_orders = paid_with_status(OrderStatus::Pending).count(db).await?;
    let overdue_orders = paid_with_status(OrderStatus::Preparing)
        .order_by_asc(order::Column::Id)
        .all(db)
        .await?
        .iter()
        .filter(|o| is_overdue(o, now))
        .map(|o| o.id)
        .collect();

    Ok(KitchenAlerts {
        new_orders,
        overdue_orders,
        timestamp: now,
    })
}

/// Orderable menu and the student's own order history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentDashboard {
    pub menu_items: Vec<menu_item::Model>,
    pub orders: Vec<OrderWithLines>,
}

pub async fn student_dashboard(
    db: &DatabaseConnection,
    principal: &Principal,
) -> Result<StudentDashboard> {
    authorize(principal, Capability::ViewMenu)?;
    Ok(StudentDashboard {
        menu_items: list_available(db).await?,
        orders: list_student_orders(db, principal).await?,
    })
}
