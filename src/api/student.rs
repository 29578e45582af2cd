//! Student endpoints: dashboard, ordering and order tracking. The invoice
//! download lives here too but is open to every role.

use super::{
    AppState,
    response::{ApiResponse, ok},
};
use crate::{
    core::{
        access::Principal,
        invoice,
        order::{self, OrderStatusView, parse_cart},
        report::{self, StudentDashboard},
    },
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub async fn dashboard(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ApiResponse<StudentDashboard>>> {
    let dashboard = report::student_dashboard(&state.db, &principal).await?;
    Ok(ok("Student dashboard", dashboard))
}

/// `items` is the cart: an array, or a string holding a JSON array.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Value,
}

#[derive(Debug, Serialize)]
pub struct PlacedOrder {
    pub order_id: i64,
    pub total_amount: f64,
}

pub async fn place_order(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Json<ApiResponse<PlacedOrder>>> {
    let raw = match request.items {
        Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::Null),
        other => other,
    };
    let cart = parse_cart(&raw);

    let placed = order::place_order(&state.db, &principal, &cart).await?;
    Ok(ok(
        "Order placed. Please complete the payment.",
        PlacedOrder {
            order_id: placed.order.id,
            total_amount: placed.order.total_amount,
        },
    ))
}

pub async fn order_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(order_id): Path<i64>,
) -> Result<Json<ApiResponse<OrderStatusView>>> {
    let view = order::order_status(&state.db, &principal, order_id, Utc::now()).await?;
    Ok(ok("Order status", view))
}

pub async fn download_invoice(
    State(state): State<AppState>,
    principal: Principal,
    Path(order_id): Path<i64>,
) -> Result<Response> {
    let bytes = invoice::invoice_pdf(&state.db, &principal, order_id).await?;
    let disposition = format!("attachment; filename={}", invoice::invoice_filename(order_id));
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
