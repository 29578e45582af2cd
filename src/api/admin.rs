//! Admin endpoints: dashboard, export, verification, menu, expenses and
//! order status overrides.

use super::{
    AppState,
    response::{ApiResponse, done, ok},
};
use crate::{
    core::{
        access::Principal,
        auth,
        expense::{self, ExpenseInput, ExpenseSummary},
        export::{self, ExportFormat},
        menu::{self, MenuItemInput},
        order,
        report::{self, AdminDashboard},
    },
    entities::{OrderStatus, menu_item, user},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub async fn dashboard(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ApiResponse<AdminDashboard>>> {
    let dashboard = report::admin_dashboard(&state.db, &principal).await?;
    Ok(ok("Admin dashboard", dashboard))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

pub async fn export(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ExportQuery>,
) -> Result<Response> {
    let format = ExportFormat::from_query(query.kind.as_deref())?;
    let file = export::export_data(
        &state.db,
        &principal,
        &state.settings.public_base_url,
        format,
        Utc::now(),
    )
    .await?;

    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct PendingUsers {
    pub users: Vec<user::Model>,
}

pub async fn pending_users(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ApiResponse<PendingUsers>>> {
    let users = auth::pending_verifications(&state.db, &principal).await?;
    Ok(ok("Pending verifications", PendingUsers { users }))
}

pub async fn verify_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    auth::verify_user(&state.db, &principal, user_id).await?;
    Ok(done("User verified successfully!"))
}

pub async fn reject_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    auth::reject_user(&state.db, &principal, &state.settings.uploads_root, user_id).await?;
    Ok(done("User rejected and removed!"))
}

#[derive(Debug, Serialize)]
pub struct MenuList {
    pub items: Vec<menu_item::Model>,
}

#[derive(Debug, Serialize)]
pub struct MenuItemBody {
    pub item: menu_item::Model,
}

#[derive(Debug, Deserialize)]
pub struct MenuItemForm {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    pub description: Option<String>,
}

impl From<MenuItemForm> for MenuItemInput {
    fn from(form: MenuItemForm) -> Self {
        Self {
            name: form.name,
            price: form.price,
            category: form.category,
            description: form.description,
        }
    }
}

pub async fn list_menu(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ApiResponse<MenuList>>> {
    let items = menu::list_all(&state.db, &principal).await?;
    Ok(ok("Menu", MenuList { items }))
}

pub async fn add_menu_item(
    State(state): State<AppState>,
    principal: Principal,
    Json(form): Json<MenuItemForm>,
) -> Result<Json<ApiResponse<MenuItemBody>>> {
    let item = menu::create_menu_item(&state.db, &principal, form.into()).await?;
    Ok(ok("Menu item added successfully!", MenuItemBody { item }))
}

pub async fn edit_menu_item(
    State(state): State<AppState>,
    principal: Principal,
    Path(item_id): Path<i64>,
    Json(form): Json<MenuItemForm>,
) -> Result<Json<ApiResponse<MenuItemBody>>> {
    let item = menu::update_menu_item(&state.db, &principal, item_id, form.into()).await?;
    Ok(ok("Menu item updated successfully!", MenuItemBody { item }))
}

pub async fn delete_menu_item(
    State(state): State<AppState>,
    principal: Principal,
    Path(item_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    menu::delete_menu_item(&state.db, &principal, item_id).await?;
    Ok(done("Menu item deleted successfully!"))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityForm {
    pub available: bool,
}

pub async fn set_availability(
    State(state): State<AppState>,
    principal: Principal,
    Path(item_id): Path<i64>,
    Json(form): Json<AvailabilityForm>,
) -> Result<Json<ApiResponse<MenuItemBody>>> {
    let item = menu::set_availability(&state.db, &principal, item_id, form.available).await?;
    let message = if item.available {
        "Menu item is now available"
    } else {
        "Menu item is now hidden"
    };
    Ok(ok(message, MenuItemBody { item }))
}

pub async fn list_expenses(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ApiResponse<ExpenseSummary>>> {
    let summary = expense::expense_summary(&state.db, &principal).await?;
    Ok(ok("Expenses", summary))
}

#[derive(Debug, Deserialize)]
pub struct ExpenseForm {
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    pub expense_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseBody {
    pub expense_id: i64,
}

pub async fn add_expense(
    State(state): State<AppState>,
    principal: Principal,
    Json(form): Json<ExpenseForm>,
) -> Result<Json<ApiResponse<ExpenseBody>>> {
    let input = ExpenseInput {
        description: form.description,
        amount: form.amount,
        category: form.category,
        expense_date: form.expense_date,
    };
    let expense = expense::add_expense(&state.db, &principal, input).await?;
    Ok(ok(
        "Expense added successfully!",
        ExpenseBody {
            expense_id: expense.id,
        },
    ))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    principal: Principal,
    Path(expense_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    expense::delete_expense(&state.db, &principal, expense_id).await?;
    Ok(done("Expense deleted successfully!"))
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: OrderStatus,
}

pub async fn update_order_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(order_id): Path<i64>,
    Json(form): Json<StatusForm>,
) -> Result<Json<ApiResponse<()>>> {
    order::update_order_status(&state.db, &principal, order_id, form.status).await?;
    Ok(done("Order status updated"))
}
