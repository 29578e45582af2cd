//! Checkout endpoints and the gateway webhook.

use super::{
    AppState,
    response::{ApiResponse, done, ok},
};
use crate::{
    core::{
        access::Principal,
        payment::{self, PaymentForm, PaymentPage, PaymentProof, WebhookOutcome},
    },
    errors::Result,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Header carrying the hex HMAC of a webhook body.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-gateway-signature";

#[derive(Debug, Serialize)]
pub struct Paid {
    pub order_id: i64,
    /// Where the client can fetch the invoice
    pub invoice_url: String,
}

impl Paid {
    fn new(order_id: i64) -> Self {
        Self {
            order_id,
            invoice_url: format!("/invoice/{order_id}"),
        }
    }
}

pub async fn payment_page(
    State(state): State<AppState>,
    principal: Principal,
    Path(order_id): Path<i64>,
) -> Result<Json<ApiResponse<PaymentPage>>> {
    let page = payment::payment_page(
        &state.db,
        &principal,
        &state.settings.gateway,
        state.settings.upi_collect_id.as_deref(),
        order_id,
    )
    .await?;
    Ok(ok("Payment", page))
}

/// Callback fields posted by the gateway checkout widget.
#[derive(Debug, Deserialize)]
pub struct GatewayCallback {
    pub order_id: i64,
    pub gateway_order_id: String,
    pub payment_id: String,
    pub signature: String,
}

pub async fn verify_gateway_payment(
    State(state): State<AppState>,
    principal: Principal,
    Json(callback): Json<GatewayCallback>,
) -> Result<Json<ApiResponse<Paid>>> {
    let proof = PaymentProof::Gateway {
        gateway_order_id: callback.gateway_order_id,
        payment_id: callback.payment_id,
        signature: callback.signature,
    };
    payment::pay_order(
        &state.db,
        &principal,
        &state.settings.gateway,
        callback.order_id,
        &proof,
    )
    .await?;
    Ok(ok(
        "Payment successful! Your order has been confirmed.",
        Paid::new(callback.order_id),
    ))
}

pub async fn process_payment(
    State(state): State<AppState>,
    principal: Principal,
    Path(order_id): Path<i64>,
    Json(form): Json<PaymentForm>,
) -> Result<Json<ApiResponse<Paid>>> {
    payment::process_simulated_payment(&state.db, &principal, order_id, &form).await?;
    Ok(ok(
        "Payment successful! Your order has been confirmed.",
        Paid::new(order_id),
    ))
}

pub async fn assume_paid(
    State(state): State<AppState>,
    principal: Principal,
    Path(order_id): Path<i64>,
) -> Result<Json<ApiResponse<Paid>>> {
    payment::pay_order(
        &state.db,
        &principal,
        &state.settings.gateway,
        order_id,
        &PaymentProof::Simulated,
    )
    .await?;
    Ok(ok(
        "Payment marked as successful. Generating invoice...",
        Paid::new(order_id),
    ))
}

/// Server-to-server notification. Takes the raw body so the signature can be
/// checked over the exact bytes that were sent.
pub async fn gateway_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<()>>> {
    let signature = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome =
        payment::handle_webhook(&state.db, &state.settings.gateway, &body, signature).await?;
    if let WebhookOutcome::MarkedPaid(order_id) = outcome {
        info!(order_id, "order paid via webhook");
    }
    Ok(done("ok"))
}
