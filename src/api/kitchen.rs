//! Kitchen endpoints: queues, polling and the preparation workflow.

use super::{
    AppState,
    response::{ApiResponse, done, ok},
};
use crate::{
    core::{
        access::Principal,
        order::{self, DEFAULT_ESTIMATED_MINUTES},
        report::{self, KitchenAlerts, KitchenQueue},
    },
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;

pub async fn dashboard(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ApiResponse<KitchenQueue>>> {
    let queue = report::kitchen_queue(&state.db, &principal).await?;
    Ok(ok("Kitchen dashboard", queue))
}

pub async fn check_new_orders(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ApiResponse<KitchenAlerts>>> {
    let alerts = report::kitchen_alerts(&state.db, &principal, Utc::now()).await?;
    Ok(ok("Kitchen alerts", alerts))
}

pub async fn start_preparation(
    State(state): State<AppState>,
    principal: Principal,
    Path(order_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    order::start_preparation(&state.db, &principal, order_id).await?;
    Ok(done("Order preparation started!"))
}

pub async fn complete_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(order_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    order::complete_order(&state.db, &principal, order_id).await?;
    Ok(done("Order completed and notification sent!"))
}

const fn default_minutes() -> i32 {
    DEFAULT_ESTIMATED_MINUTES
}

#[derive(Debug, Deserialize)]
pub struct SetTimeForm {
    #[serde(default = "default_minutes")]
    pub estimated_time: i32,
}

pub async fn set_time(
    State(state): State<AppState>,
    principal: Principal,
    Path(order_id): Path<i64>,
    Json(form): Json<SetTimeForm>,
) -> Result<Json<ApiResponse<()>>> {
    let updated =
        order::set_estimated_time(&state.db, &principal, order_id, form.estimated_time).await?;
    Ok(done(format!(
        "Preparation time set to {} minutes",
        updated.estimated_time
    )))
}
