//! Order lifecycle - placement, the fulfilment state machine and order views.
//!
//! Placement resolves every cart line against the current menu and snapshots
//! name and price into `order_lines`; the client's prices are never read. The
//! total is computed once here and never recomputed.
//!
//! Fulfilment moves `Pending → Preparing → Ready` and is gated on the payment
//! axis: no transition into Preparing or Ready is accepted unless the order is
//! `Paid` at the moment of the attempt. There is no path back to Pending.

use crate::{
    core::{
        access::{Capability, Principal, Role, authorize},
        progress::{compute_progress, round1},
    },
    entities::{
        MenuItem, Order, OrderLine, OrderStatus, PaymentStatus, User, menu_item, order,
        order_line,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Select, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Default preparation estimate for new orders, in minutes.
pub const DEFAULT_ESTIMATED_MINUTES: i32 = 15;

const EMPTY_CART: &str = "Your cart is empty or invalid.";
const NO_VALID_ITEMS: &str = "Invalid items in cart. Please try again.";

/// A requested menu item and quantity, as sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub item_id: i64,
    pub quantity: i64,
}

/// Parses a client cart.
///
/// Anything that is not an array yields an empty cart. Entries without a
/// usable `id` are skipped; a missing `quantity` means 1. Prices and names in
/// the payload are ignored.
#[must_use]
pub fn parse_cart(raw: &Value) -> Vec<CartLine> {
    let Some(entries) = raw.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let item_id = entry.get("id").and_then(json_integer)?;
            let quantity = match entry.get("quantity") {
                None | Some(Value::Null) => 1,
                Some(q) => json_integer(q)?,
            };
            Some(CartLine { item_id, quantity })
        })
        .collect()
}

/// Accepts integers, floats (truncated) and numeric strings.
fn json_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            #[allow(clippy::cast_possible_truncation)]
            n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: order::Model,
    pub lines: Vec<order_line::Model>,
}

impl OrderWithLines {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity)).sum()
    }
}

/// An order with lines and the name of the student who placed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: OrderWithLines,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

/// Places an order for the calling student.
///
/// Unknown or unavailable items and non-positive quantities are dropped
/// silently. The order and its lines are written in one transaction.
///
/// # Errors
/// Returns an error if:
/// - The caller is not a student
/// - The cart is empty ("Your cart is empty or invalid.")
/// - No line survives resolution ("Invalid items in cart. Please try again.")
/// - The database operation fails
#[instrument(skip(db, cart), fields(user_id = principal.id, lines = cart.len()))]
pub async fn place_order(
    db: &DatabaseConnection,
    principal: &Principal,
    cart: &[CartLine],
) -> Result<OrderWithLines> {
    authorize(principal, Capability::PlaceOrder)?;

    if cart.is_empty() {
        return Err(Error::validation(EMPTY_CART));
    }

    let ids: Vec<i64> = cart.iter().map(|line| line.item_id).collect();
    let menu: HashMap<i64, menu_item::Model> = MenuItem::find()
        .filter(menu_item::Column::Id.is_in(ids))
        .filter(menu_item::Column::Available.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    let resolved: Vec<(&menu_item::Model, i32)> = cart
        .iter()
        .filter_map(|line| {
            let item = menu.get(&line.item_id)?;
            let quantity = i32::try_from(line.quantity).ok().filter(|q| *q > 0)?;
            Some((item, quantity))
        })
        .collect();

    if resolved.is_empty() {
        warn!("cart had no resolvable lines");
        return Err(Error::validation(NO_VALID_ITEMS));
    }

    let total_amount: f64 = resolved
        .iter()
        .map(|(item, quantity)| item.price * f64::from(*quantity))
        .sum();

    let txn = db.begin().await?;

    let order = order::ActiveModel {
        user_id: Set(principal.id),
        total_amount: Set(total_amount),
        payment_status: Set(PaymentStatus::Pending),
        order_status: Set(OrderStatus::Pending),
        order_time: Set(Utc::now()),
        estimated_time: Set(DEFAULT_ESTIMATED_MINUTES),
        preparation_started: Set(None),
        preparation_completed: Set(None),
        notification_sent: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut lines = Vec::with_capacity(resolved.len());
    for (item, quantity) in resolved {
        let line = order_line::ActiveModel {
            order_id: Set(order.id),
            menu_item_id: Set(item.id),
            name: Set(item.name.clone()),
            unit_price: Set(item.price),
            quantity: Set(quantity),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        lines.push(line);
    }

    txn.commit().await?;

    info!(order_id = order.id, total_amount, "order placed");
    Ok(OrderWithLines { order, lines })
}

/// Loads the lines of many orders with a single query, preserving order.
pub async fn attach_lines<C: ConnectionTrait>(
    db: &C,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderWithLines>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let mut by_order: HashMap<i64, Vec<order_line::Model>> = HashMap::new();
    for line in OrderLine::find()
        .filter(order_line::Column::OrderId.is_in(ids))
        .order_by_asc(order_line::Column::Id)
        .all(db)
        .await?
    {
        by_order.entry(line.order_id).or_default().push(line);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let lines = by_order.remove(&order.id).unwrap_or_default();
            OrderWithLines { order, lines }
        })
        .collect())
}

/// Runs an order query and attaches lines and customer details.
pub async fn load_order_details(
    db: &DatabaseConnection,
    query: Select<Order>,
) -> Result<Vec<OrderDetails>> {
    let (orders, customers): (Vec<_>, Vec<_>) = query
        .find_also_related(User)
        .all(db)
        .await?
        .into_iter()
        .unzip();

    Ok(attach_lines(db, orders)
        .await?
        .into_iter()
        .zip(customers)
        .map(|(order, customer)| OrderDetails {
            order,
            customer_name: customer.as_ref().map(|u| u.name.clone()),
            customer_email: customer.map(|u| u.email),
        })
        .collect())
}

/// Retrieves an order and its lines by id.
pub async fn get_order_with_lines(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Option<OrderWithLines>> {
    let Some(order) = Order::find_by_id(order_id).one(db).await? else {
        return Ok(None);
    };
    Ok(attach_lines(db, vec![order]).await?.pop())
}

/// Fetches an order the principal may see.
///
/// Students only see their own orders; someone else's order is reported as
/// not found rather than forbidden.
pub async fn find_visible_order(
    db: &DatabaseConnection,
    principal: &Principal,
    order_id: i64,
) -> Result<order::Model> {
    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(Error::OrderNotFound { order_id })?;

    if principal.is(Role::Student) && order.user_id != principal.id {
        warn!(order_id, principal_id = principal.id, "student asked for another user's order");
        return Err(Error::OrderNotFound { order_id });
    }
    Ok(order)
}

/// The calling student's orders, newest first.
pub async fn list_student_orders(
    db: &DatabaseConnection,
    principal: &Principal,
) -> Result<Vec<OrderWithLines>> {
    authorize(principal, Capability::TrackOwnOrders)?;
    let orders = Order::find()
        .filter(order::Column::UserId.eq(principal.id))
        .order_by_desc(order::Column::OrderTime)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;
    attach_lines(db, orders).await
}

fn require_paid(order: &order::Model, message: &str) -> Result<()> {
    if order.payment_status == PaymentStatus::Paid {
        Ok(())
    } else {
        warn!(order_id = order.id, "transition refused: payment not confirmed");
        Err(Error::PaymentNotConfirmed {
            order_id: order.id,
            message: message.to_string(),
        })
    }
}

async fn load_order(db: &DatabaseConnection, order_id: i64) -> Result<order::Model> {
    Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(Error::OrderNotFound { order_id })
}

/// Moves a paid order into preparation and stamps the start time.
///
/// An order that is already preparing is returned unchanged, keeping its
/// original start stamp.
///
/// # Errors
/// Returns an error if:
/// - The caller is not kitchen staff
/// - The order does not exist
/// - The order is not paid ("Cannot start preparation. Payment not confirmed.")
/// - The order is already ready
#[instrument(skip(db, principal))]
pub async fn start_preparation(
    db: &DatabaseConnection,
    principal: &Principal,
    order_id: i64,
) -> Result<order::Model> {
    authorize(principal, Capability::PrepareOrders)?;
    let order = load_order(db, order_id).await?;
    require_paid(&order, "Cannot start preparation. Payment not confirmed.")?;

    match order.order_status {
        OrderStatus::Preparing => return Ok(order),
        OrderStatus::Ready => return Err(Error::validation("Order is already ready.")),
        OrderStatus::Pending => {}
    }

    let mut active: order::ActiveModel = order.into();
    active.order_status = Set(OrderStatus::Preparing);
    active.preparation_started = Set(Some(Utc::now()));
    let updated = active.update(db).await?;

    info!(order_id, "order preparation started");
    Ok(updated)
}

/// Marks a paid order ready, stamps completion and flags the notification.
///
/// The current fulfilment state is not checked.
#[instrument(skip(db, principal))]
pub async fn complete_order(
    db: &DatabaseConnection,
    principal: &Principal,
    order_id: i64,
) -> Result<order::Model> {
    authorize(principal, Capability::PrepareOrders)?;
    let order = load_order(db, order_id).await?;
    require_paid(&order, "Cannot complete order. Payment not confirmed.")?;

    let mut active: order::ActiveModel = order.into();
    active.order_status = Set(OrderStatus::Ready);
    active.preparation_completed = Set(Some(Utc::now()));
    active.notification_sent = Set(true);
    let updated = active.update(db).await?;

    info!(order_id, "order completed and notification sent");
    Ok(updated)
}

/// Overwrites the preparation estimate. Any integer is accepted.
pub async fn set_estimated_time(
    db: &DatabaseConnection,
    principal: &Principal,
    order_id: i64,
    minutes: i32,
) -> Result<order::Model> {
    authorize(principal, Capability::PrepareOrders)?;
    let mut active: order::ActiveModel = load_order(db, order_id).await?.into();
    active.estimated_time = Set(minutes);
    let updated = active.update(db).await?;
    info!(order_id, minutes, "preparation time set");
    Ok(updated)
}

/// Admin override of the fulfilment status of a paid order.
///
/// Missing preparation stamps are filled in so progress stays meaningful.
#[instrument(skip(db, principal))]
pub async fn update_order_status(
    db: &DatabaseConnection,
    principal: &Principal,
    order_id: i64,
    status: OrderStatus,
) -> Result<order::Model> {
    authorize(principal, Capability::OverrideOrderStatus)?;
    let order = load_order(db, order_id).await?;
    require_paid(&order, "Order is not paid. Cannot update status.")?;

    let now = Utc::now();
    let started = order.preparation_started;
    let completed = order.preparation_completed;
    let mut active: order::ActiveModel = order.into();
    active.order_status = Set(status);
    match status {
        OrderStatus::Preparing if started.is_none() => {
            active.preparation_started = Set(Some(now));
        }
        OrderStatus::Ready if completed.is_none() => {
            active.preparation_completed = Set(Some(now));
        }
        _ => {}
    }

    let updated = active.update(db).await?;
    info!(order_id, ?status, "order status overridden by admin");
    Ok(updated)
}

/// Status snapshot polled by the student's order tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderStatusView {
    pub order_id: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub estimated_time: i32,
    /// Percentage, one decimal
    pub progress: f64,
    /// Minutes, one decimal
    pub remaining_time: f64,
    pub preparation_started: Option<DateTime<Utc>>,
    pub preparation_completed: Option<DateTime<Utc>>,
}

impl OrderStatusView {
    #[must_use]
    pub fn from_order(order: &order::Model, now: DateTime<Utc>) -> Self {
        let progress = compute_progress(order, now);
        Self {
            order_id: order.id,
            status: order.order_status,
            payment_status: order.payment_status,
            estimated_time: order.estimated_time,
            progress: round1(progress.progress),
            remaining_time: round1(progress.remaining),
            preparation_started: order.preparation_started,
            preparation_completed: order.preparation_completed,
        }
    }
}

/// Current status of one of the calling student's orders.
pub async fn order_status(
    db: &DatabaseConnection,
    principal: &Principal,
    order_id: i64,
    now: DateTime<Utc>,
) -> Result<OrderStatusView> {
    authorize(principal, Capability::TrackOwnOrders)?;
    let order = find_visible_order(db, principal, order_id).await?;
    Ok(OrderStatusView::from_order(&order, now))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::payment::{GatewayConfig, PaymentProof, confirm_payment};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    #[test]
    fn test_parse_cart_shapes() {
        let cart = parse_cart(&json!([
            {"id": 1, "quantity": 2, "price": 0.01},
            {"id": "3", "quantity": "4"},
            {"id": 5},
            {"id": 6.0, "quantity": 2.9},
            {"name": "no id"},
            {"id": "abc", "quantity": 1},
            {"id": 7, "quantity": "lots"},
            {"id": 8, "quantity": 0.5},
        ]));
        assert_eq!(
            cart,
            vec![
                CartLine { item_id: 1, quantity: 2 },
                CartLine { item_id: 3, quantity: 4 },
                CartLine { item_id: 5, quantity: 1 },
                CartLine { item_id: 6, quantity: 2 },
                CartLine { item_id: 8, quantity: 0 },
            ]
        );

        assert!(parse_cart(&json!({"id": 1})).is_empty());
        assert!(parse_cart(&json!("[]")).is_empty());
        assert!(parse_cart(&json!([])).is_empty());
    }

    #[tokio::test]
    async fn test_place_order_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = place_order(&db, &student_principal(1), &[]).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { message } if message == EMPTY_CART
        ));

        let cart = [CartLine { item_id: 1, quantity: 1 }];
        let result = place_order(&db, &admin_principal(), &cart).await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized));
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_uses_menu_prices() -> Result<()> {
        let (db, student, biryani) = setup_with_student_and_item().await?;

        // Client-side price in the payload is ignored by parse_cart
        let cart = parse_cart(&json!([{"id": biryani.id, "quantity": 2, "price": 1}]));
        let placed = place_order(&db, &student_principal(student.id), &cart).await?;

        assert_eq!(placed.order.total_amount, 360.0);
        assert_eq!(placed.order.payment_status, PaymentStatus::Pending);
        assert_eq!(placed.order.order_status, OrderStatus::Pending);
        assert_eq!(placed.order.estimated_time, DEFAULT_ESTIMATED_MINUTES);
        assert_eq!(placed.order.user_id, student.id);
        assert_eq!(placed.lines.len(), 1);
        assert_eq!(placed.lines[0].name, "Chicken Biryani");
        assert_eq!(placed.lines[0].unit_price, 180.0);
        assert_eq!(placed.lines[0].quantity, 2);
        assert_eq!(placed.item_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_drops_invalid_lines() -> Result<()> {
        let (db, student, biryani) = setup_with_student_and_item().await?;
        let tea = create_test_menu_item(&db, "Tea", 20.0).await?;
        let hidden = create_test_menu_item(&db, "Hidden", 99.0).await?;
        crate::core::menu::set_availability(&db, &admin_principal(), hidden.id, false).await?;

        let cart = [
            CartLine { item_id: biryani.id, quantity: 1 },
            CartLine { item_id: tea.id, quantity: 3 },
            CartLine { item_id: 9999, quantity: 1 },
            CartLine { item_id: tea.id, quantity: 0 },
            CartLine { item_id: tea.id, quantity: -2 },
            CartLine { item_id: hidden.id, quantity: 1 },
            CartLine { item_id: tea.id, quantity: i64::MAX },
        ];
        let placed = place_order(&db, &student_principal(student.id), &cart).await?;
        assert_eq!(placed.lines.len(), 2);
        assert_eq!(placed.order.total_amount, 180.0 + 60.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_no_valid_lines() -> Result<()> {
        let (db, student, _) = setup_with_student_and_item().await?;
        let cart = [CartLine { item_id: 4242, quantity: 1 }];
        let result = place_order(&db, &student_principal(student.id), &cart).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { message } if message == NO_VALID_ITEMS
        ));
        assert_eq!(Order::find().all(&db).await?.len(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_fractional_quantity_below_one_is_dropped() -> Result<()> {
        let (db, student, biryani) = setup_with_student_and_item().await?;
        let cart = parse_cart(&json!([{"id": biryani.id, "quantity": 0.5}]));
        assert_eq!(cart, vec![CartLine { item_id: biryani.id, quantity: 0 }]);

        let result = place_order(&db, &student_principal(student.id), &cart).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { message } if message == NO_VALID_ITEMS
        ));
        assert_eq!(Order::find().all(&db).await?.len(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_total_is_a_snapshot() -> Result<()> {
        let (db, student, biryani) = setup_with_student_and_item().await?;
        let placed = place_test_order(&db, student.id, biryani.id, 1).await?;

        crate::core::menu::update_menu_item(
            &db,
            &admin_principal(),
            biryani.id,
            crate::core::menu::MenuItemInput {
                name: "Chicken Biryani".to_string(),
                price: 999.0,
                category: "main".to_string(),
                description: None,
            },
        )
        .await?;

        let reloaded = get_order_with_lines(&db, placed.order.id).await?.unwrap();
        assert_eq!(reloaded.order.total_amount, 180.0);
        assert_eq!(reloaded.lines[0].unit_price, 180.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_start_preparation_requires_payment() -> Result<()> {
        let (db, student, biryani) = setup_with_student_and_item().await?;
        let placed = place_test_order(&db, student.id, biryani.id, 1).await?;
        let kitchen = kitchen_principal();

        let result = start_preparation(&db, &kitchen, placed.order.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::PaymentNotConfirmed { message, .. }
                if message == "Cannot start preparation. Payment not confirmed."
        ));
        let unchanged = Order::find_by_id(placed.order.id).one(&db).await?.unwrap();
        assert_eq!(unchanged.order_status, OrderStatus::Pending);
        assert!(unchanged.preparation_started.is_none());

        let result = complete_order(&db, &kitchen, placed.order.id).await;
        assert!(matches!(result.unwrap_err(), Error::PaymentNotConfirmed { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_full_lifecycle() -> Result<()> {
        let (db, student, biryani) = setup_with_student_and_item().await?;
        let placed = place_test_order(&db, student.id, biryani.id, 2).await?;
        let kitchen = kitchen_principal();

        confirm_payment(
            &db,
            &GatewayConfig::default(),
            placed.order.id,
            &PaymentProof::Simulated,
        )
        .await?;

        let preparing = start_preparation(&db, &kitchen, placed.order.id).await?;
        assert_eq!(preparing.order_status, OrderStatus::Preparing);
        let started = preparing.preparation_started.unwrap();

        // Starting again keeps the original stamp
        let again = start_preparation(&db, &kitchen, placed.order.id).await?;
        assert_eq!(again.preparation_started, Some(started));

        let timed = set_estimated_time(&db, &kitchen, placed.order.id, 25).await?;
        assert_eq!(timed.estimated_time, 25);

        let ready = complete_order(&db, &kitchen, placed.order.id).await?;
        assert_eq!(ready.order_status, OrderStatus::Ready);
        assert!(ready.preparation_completed.is_some());
        assert!(ready.notification_sent);

        let result = start_preparation(&db, &kitchen, placed.order.id).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_estimated_time_accepts_any_value() -> Result<()> {
        let (db, student, biryani) = setup_with_student_and_item().await?;
        let placed = place_test_order(&db, student.id, biryani.id, 1).await?;

        let order = set_estimated_time(&db, &kitchen_principal(), placed.order.id, -5).await?;
        assert_eq!(order.estimated_time, -5);
        let order = set_estimated_time(&db, &kitchen_principal(), placed.order.id, 0).await?;
        assert_eq!(order.estimated_time, 0);

        let result = set_estimated_time(&db, &student_principal(student.id), placed.order.id, 5).await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_order_status_requires_paid() -> Result<()> {
        let (db, student, biryani) = setup_with_student_and_item().await?;
        let placed = place_test_order(&db, student.id, biryani.id, 1).await?;
        let admin = admin_principal();

        let result = update_order_status(&db, &admin, placed.order.id, OrderStatus::Ready).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::PaymentNotConfirmed { message, .. }
                if message == "Order is not paid. Cannot update status."
        ));

        confirm_payment(
            &db,
            &GatewayConfig::default(),
            placed.order.id,
            &PaymentProof::Simulated,
        )
        .await?;
        let updated = update_order_status(&db, &admin, placed.order.id, OrderStatus::Preparing).await?;
        assert_eq!(updated.order_status, OrderStatus::Preparing);
        assert!(updated.preparation_started.is_some());

        let result = update_order_status(&db, &admin, 9999, OrderStatus::Ready).await;
        assert!(matches!(result.unwrap_err(), Error::OrderNotFound { order_id: 9999 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_students_only_see_their_own_orders() -> Result<()> {
        let (db, student, biryani) = setup_with_student_and_item().await?;
        let other = create_verified_user(&db, "other@college.test").await?;
        let placed = place_test_order(&db, student.id, biryani.id, 1).await?;
        place_test_order(&db, student.id, biryani.id, 3).await?;

        let mine = list_student_orders(&db, &student_principal(student.id)).await?;
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].lines[0].quantity, 3);

        assert!(list_student_orders(&db, &student_principal(other.id)).await?.is_empty());

        let result = order_status(&db, &student_principal(other.id), placed.order.id, Utc::now()).await;
        assert!(matches!(result.unwrap_err(), Error::OrderNotFound { .. }));

        let view = order_status(&db, &student_principal(student.id), placed.order.id, Utc::now()).await?;
        assert_eq!(view.status, OrderStatus::Pending);
        assert_eq!(view.progress, 0.0);
        assert_eq!(view.remaining_time, 15.0);
        Ok(())
    }
}
