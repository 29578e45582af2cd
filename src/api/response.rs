//! JSON envelope for every API response and the error → status mapping.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// `{ "success": bool, "message": string, ...data }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Option<T>,
}

/// Successful response carrying `data` flattened next to the message.
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        message: message.into(),
        data: Some(data),
    })
}

/// Successful response with only a message.
pub fn done(message: impl Into<String>) -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        success: true,
        message: message.into(),
        data: None,
    })
}

impl Error {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. }
            | Self::InvalidAmount { .. }
            | Self::PaymentNotConfirmed { .. }
            | Self::SignatureMismatch { .. }
            | Self::PaymentDetailsRejected { .. }
            | Self::WebhookSignatureInvalid => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::OrderNotFound { .. }
            | Self::MenuItemNotFound { .. }
            | Self::UserNotFound { .. }
            | Self::ExpenseNotFound { .. } => StatusCode::NOT_FOUND,
            Self::DuplicateEmail { .. } => StatusCode::CONFLICT,
            Self::ExportUnavailable { .. } => StatusCode::NOT_IMPLEMENTED,
            Self::GatewayNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Render { .. }
            | Self::PasswordHash { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_user_facing() {
            self.to_string()
        } else {
            error!(error = %self, "request failed");
            "Something went wrong. Please try again.".to_string()
        };

        let body = ApiResponse::<()> {
            success: false,
            message,
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Payload {
        order_id: i64,
    }

    #[test]
    fn test_envelope_shape() {
        let Json(body) = ok("Order placed", Payload { order_id: 7 });
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"success": true, "message": "Order placed", "order_id": 7})
        );

        let Json(body) = done("Logged out");
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"success": true, "message": "Logged out"})
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::Unauthorized.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::OrderNotFound { order_id: 1 }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::DuplicateEmail { email: String::new() }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Database(sea_orm::DbErr::Custom("x".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
