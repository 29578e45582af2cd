//! Payment confirmation.
//!
//! An order moves from `Pending` to `Paid` through one of three doors:
//! - the simulated checkout (demo mode, no money moves)
//! - a signed callback from the payment gateway's checkout widget
//! - the gateway's server-to-server webhook
//!
//! Gateway proofs are HMAC-SHA256 signatures keyed with the gateway secret,
//! compared in constant time. Marking an already-paid order is a no-op.

use crate::{
    core::{
        access::{Capability, Principal, authorize},
        order::{OrderWithLines, attach_lines, find_visible_order},
    },
    entities::{Order, PaymentStatus, order},
    errors::{Error, Result},
};
use hmac::{Hmac, Mac};
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, info, instrument, warn};

type HmacSha256 = Hmac<Sha256>;

/// Event name the gateway sends once funds are captured.
pub const CAPTURED_EVENT: &str = "payment.captured";

/// Where the gateway echoes back our order id in webhook payloads.
const ORDER_ID_POINTER: &str = "/payload/payment/entity/notes/canteen_order_id";

/// Gateway credentials. Any of them may be absent in demo deployments.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Public key id handed to the checkout widget
    pub key_id: Option<String>,
    /// Shared secret used to sign checkout callbacks
    pub key_secret: Option<String>,
    /// Separate secret for webhook bodies, if the gateway is set up with one
    pub webhook_secret: Option<String>,
}

impl GatewayConfig {
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.key_secret.is_some()
    }
}

/// Evidence that an order has been paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentProof {
    /// Demo checkout; always accepted.
    Simulated,
    /// Signed callback from the gateway checkout widget.
    Gateway {
        gateway_order_id: String,
        payment_id: String,
        signature: String,
    },
}

/// Lowercase hex HMAC-SHA256 of `message`.
///
/// # Errors
/// Only if the MAC rejects the key, which HMAC never does in practice.
pub fn sign(secret: &str, message: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| Error::Config {
        message: format!("Invalid gateway secret: {e}"),
    })?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a hex signature against `message` in constant time.
///
/// Malformed hex is simply a mismatch.
#[must_use]
pub fn verify(secret: &str, message: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(&expected).is_ok()
}

/// The string the gateway signs for a checkout callback.
fn checkout_message(gateway_order_id: &str, payment_id: &str) -> String {
    format!("{gateway_order_id}|{payment_id}")
}

/// Signature the gateway would produce for a checkout callback.
pub fn compute_checkout_signature(
    secret: &str,
    gateway_order_id: &str,
    payment_id: &str,
) -> Result<String> {
    sign(secret, checkout_message(gateway_order_id, payment_id).as_bytes())
}

/// Sets `payment_status = Paid`. Already-paid orders are returned untouched.
async fn mark_paid(db: &DatabaseConnection, order_id: i64) -> Result<order::Model> {
    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(Error::OrderNotFound { order_id })?;

    if order.payment_status == PaymentStatus::Paid {
        debug!(order_id, "order already paid");
        return Ok(order);
    }

    let mut active: order::ActiveModel = order.into();
    active.payment_status = Set(PaymentStatus::Paid);
    let updated = active.update(db).await?;

    info!(order_id, "payment confirmed");
    Ok(updated)
}

/// Confirms payment for an order given a proof.
///
/// # Errors
/// Returns an error if:
/// - The order does not exist
/// - A gateway proof arrives but no gateway secret is configured
/// - The gateway signature does not match ("Payment verification failed");
///   the order is left unchanged
/// - The database operation fails
#[instrument(skip(db, gateway, proof))]
pub async fn confirm_payment(
    db: &DatabaseConnection,
    gateway: &GatewayConfig,
    order_id: i64,
    proof: &PaymentProof,
) -> Result<order::Model> {
    match proof {
        PaymentProof::Simulated => mark_paid(db, order_id).await,
        PaymentProof::Gateway {
            gateway_order_id,
            payment_id,
            signature,
        } => {
            let secret = gateway
                .key_secret
                .as_deref()
                .ok_or(Error::GatewayNotConfigured)?;

            let message = checkout_message(gateway_order_id, payment_id);
            if !verify(secret, message.as_bytes(), signature) {
                warn!(order_id, %gateway_order_id, "gateway signature mismatch");
                return Err(Error::SignatureMismatch { order_id });
            }
            mark_paid(db, order_id).await
        }
    }
}

/// Student-facing confirmation: the order must belong to the caller.
///
/// The gateway signature binds the gateway's order id, not ours, so the
/// ownership check is what stops a student from paying for someone else's
/// order with their own receipt.
pub async fn pay_order(
    db: &DatabaseConnection,
    principal: &Principal,
    gateway: &GatewayConfig,
    order_id: i64,
    proof: &PaymentProof,
) -> Result<order::Model> {
    authorize(principal, Capability::PayOrder)?;
    find_visible_order(db, principal, order_id).await?;
    confirm_payment(db, gateway, order_id, proof).await
}

/// Fields submitted by the simulated checkout form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentForm {
    #[serde(default)]
    pub payment_method: String,
    pub card_number: Option<String>,
    pub expiry: Option<String>,
    pub cvv: Option<String>,
    pub upi_id: Option<String>,
}

fn filled(field: Option<&String>) -> bool {
    field.is_some_and(|v| !v.trim().is_empty())
}

impl PaymentForm {
    /// Card needs number, expiry and CVV; UPI needs an id. Nothing else passes.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self.payment_method.trim() {
            "card" => {
                filled(self.card_number.as_ref())
                    && filled(self.expiry.as_ref())
                    && filled(self.cvv.as_ref())
            }
            "upi" => filled(self.upi_id.as_ref()),
            _ => false,
        }
    }
}

/// Runs the simulated checkout for one of the caller's orders.
///
/// # Errors
/// Fails with "Payment failed! Please check your details." when the form is
/// incomplete; the order is left unchanged.
#[instrument(skip(db, principal, form), fields(method = %form.payment_method))]
pub async fn process_simulated_payment(
    db: &DatabaseConnection,
    principal: &Principal,
    order_id: i64,
    form: &PaymentForm,
) -> Result<order::Model> {
    authorize(principal, Capability::PayOrder)?;
    find_visible_order(db, principal, order_id).await?;

    if !form.is_complete() {
        warn!(order_id, "simulated payment rejected");
        return Err(Error::PaymentDetailsRejected { order_id });
    }
    mark_paid(db, order_id).await
}

/// What the webhook did with a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Ignored,
    MarkedPaid(i64),
}

/// The canteen order id carried in a webhook payload, as a string or number.
fn webhook_order_id(payload: &Value) -> Option<i64> {
    match payload.pointer(ORDER_ID_POINTER)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Processes a webhook delivery.
///
/// Without a gateway secret or a webhook secret the delivery is acknowledged
/// and ignored. Otherwise the body must carry a valid signature. Malformed
/// bodies, other events and unknown orders are ignored.
///
/// # Errors
/// Returns [`Error::WebhookSignatureInvalid`] for a missing or wrong
/// signature, or a database error.
#[instrument(skip_all, fields(bytes = body.len()))]
pub async fn handle_webhook(
    db: &DatabaseConnection,
    gateway: &GatewayConfig,
    body: &[u8],
    signature: Option<&str>,
) -> Result<WebhookOutcome> {
    if !gateway.is_configured() {
        debug!("gateway not configured, webhook ignored");
        return Ok(WebhookOutcome::Ignored);
    }

    let Some(secret) = gateway.webhook_secret.as_deref() else {
        warn!("webhook secret not configured, webhook ignored");
        return Ok(WebhookOutcome::Ignored);
    };
    if !signature.is_some_and(|sig| verify(secret, body, sig)) {
        warn!("webhook signature rejected");
        return Err(Error::WebhookSignatureInvalid);
    }

    let Ok(payload) = serde_json::from_slice::<Value>(body) else {
        warn!("webhook body is not JSON");
        return Ok(WebhookOutcome::Ignored);
    };

    if payload.get("event").and_then(Value::as_str) != Some(CAPTURED_EVENT) {
        return Ok(WebhookOutcome::Ignored);
    }

    let Some(order_id) = webhook_order_id(&payload) else {
        warn!("captured payment without a canteen order id");
        return Ok(WebhookOutcome::Ignored);
    };

    match mark_paid(db, order_id).await {
        Ok(_) => Ok(WebhookOutcome::MarkedPaid(order_id)),
        Err(Error::OrderNotFound { .. }) => {
            warn!(order_id, "webhook for unknown order");
            Ok(WebhookOutcome::Ignored)
        }
        Err(e) => Err(e),
    }
}

/// Everything the checkout page shows for one order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentPage {
    pub order: OrderWithLines,
    /// `upi://` deep link, when a collect id is configured
    pub upi_link: Option<String>,
    /// Public key for the gateway widget, when configured
    pub gateway_key_id: Option<String>,
}

/// `upi://pay` deep link for an amount.
#[must_use]
pub fn upi_link(collect_id: &str, amount: f64) -> String {
    format!("upi://pay?pa={collect_id}&pn=Canteen&am={amount:.2}&cu=INR")
}

/// Loads the checkout page for one of the caller's orders.
pub async fn payment_page(
    db: &DatabaseConnection,
    principal: &Principal,
    gateway: &GatewayConfig,
    upi_collect_id: Option<&str>,
    order_id: i64,
) -> Result<PaymentPage> {
    authorize(principal, Capability::PayOrder)?;
    let order = find_visible_order(db, principal, order_id).await?;
    let order = attach_lines(db, vec![order])
        .await?
        .pop()
        .ok_or(Error::OrderNotFound { order_id })?;

    Ok(PaymentPage {
        upi_link: upi_collect_id.map(|id| upi_link(id, order.order.total_amount)),
        gateway_key_id: gateway.key_id.clone(),
        order,
    })
}
