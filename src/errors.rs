//! Unified error type for the canteen service.
//!
//! Every core operation returns [`Result`]. The `Display` text of the
//! user-facing variants is the message shown to the caller; internal variants
//! are logged and replaced with a generic message by the HTTP layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input rejected before touching the store (bad cart, empty name, bad upload).
    #[error("{message}")]
    Validation { message: String },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    /// Same message for unknown email, wrong password and unverified account.
    #[error("Invalid credentials or account not verified")]
    InvalidCredentials,

    #[error("Please log in to continue")]
    Unauthenticated,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Email already exists!")]
    DuplicateEmail { email: String },

    #[error("Order not found.")]
    OrderNotFound { order_id: i64 },

    #[error("Menu item not found")]
    MenuItemNotFound { item_id: i64 },

    #[error("User not found")]
    UserNotFound { user_id: i64 },

    #[error("Expense not found")]
    ExpenseNotFound { expense_id: i64 },

    #[error("{message}")]
    PaymentNotConfirmed { order_id: i64, message: String },

    #[error("Payment verification failed")]
    SignatureMismatch { order_id: i64 },

    #[error("Payment verification not configured")]
    GatewayNotConfigured,

    #[error("Invalid webhook signature")]
    WebhookSignatureInvalid,

    #[error("Payment failed! Please check your details.")]
    PaymentDetailsRejected { order_id: i64 },

    /// A renderer was compiled out of this build.
    #[error("{format} export is not available in this build. Please enable the `{feature}` feature.")]
    ExportUnavailable {
        format: &'static str,
        feature: &'static str,
    },

    #[error("Failed to render {format}: {message}")]
    Render {
        format: &'static str,
        message: String,
    },

    #[error("Password hashing error: {message}")]
    PasswordHash { message: String },
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with a static message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the message is safe to show to the caller verbatim.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::Config { .. }
                | Self::Database(_)
                | Self::Io(_)
                | Self::Render { .. }
                | Self::PasswordHash { .. }
        )
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Self::Render {
            format: "CSV",
            message: value.to_string(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            Error::InvalidCredentials.to_string(),
            "Invalid credentials or account not verified"
        );
        assert_eq!(
            Error::DuplicateEmail {
                email: "a@b.c".to_string()
            }
            .to_string(),
            "Email already exists!"
        );
        assert_eq!(
            Error::SignatureMismatch { order_id: 1 }.to_string(),
            "Payment verification failed"
        );
    }

    #[test]
    fn test_internal_errors_are_not_user_facing() {
        assert!(!Error::Database(sea_orm::DbErr::Custom("boom".to_string())).is_user_facing());
        assert!(
            !Error::Config {
                message: "x".to_string()
            }
            .is_user_facing()
        );
        assert!(Error::validation("Your cart is empty or invalid.").is_user_facing());
    }
}
