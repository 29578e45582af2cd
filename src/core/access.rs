//! Identity and access control.
//!
//! A [`Principal`] is produced by a successful login and handed explicitly to
//! every protected operation. Operations declare the [`Capability`] they need
//! and call [`authorize`] before doing anything else; this is the only place
//! where roles are compared.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// The three disjoint kinds of account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Kitchen,
    /// Students log in as plain users
    #[serde(alias = "user")]
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Admin => "admin",
            Self::Kitchen => "kitchen",
            Self::Student => "student",
        };
        f.write_str(name)
    }
}

/// An authenticated actor.
///
/// `id` is the primary key in the table that matches `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub role: Role,
    pub id: i64,
    pub name: String,
}

impl Principal {
    #[must_use]
    pub fn new(role: Role, id: i64, name: impl Into<String>) -> Self {
        Self {
            role,
            id,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

/// Operations that require an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewAdminDashboard,
    ExportData,
    VerifyUsers,
    ManageMenu,
    ManageExpenses,
    OverrideOrderStatus,
    ViewMenu,
    PlaceOrder,
    PayOrder,
    TrackOwnOrders,
    ViewKitchenQueue,
    PrepareOrders,
    DownloadInvoice,
}

impl Capability {
    /// Roles allowed to exercise this capability.
    #[must_use]
    pub const fn allowed_roles(self) -> &'static [Role] {
        match self {
            Self::ViewAdminDashboard
            | Self::ExportData
            | Self::VerifyUsers
            | Self::ManageMenu
            | Self::ManageExpenses
            | Self::OverrideOrderStatus => &[Role::Admin],
            Self::ViewMenu | Self::PlaceOrder | Self::PayOrder | Self::TrackOwnOrders => {
                &[Role::Student]
            }
            Self::ViewKitchenQueue | Self::PrepareOrders => &[Role::Kitchen],
            Self::DownloadInvoice => &[Role::Admin, Role::Kitchen, Role::Student],
        }
    }
}

/// Checks that `principal` may exercise `capability`.
///
/// # Errors
/// Returns [`Error::Unauthorized`] when the principal's role is not allowed.
pub fn authorize(principal: &Principal, capability: Capability) -> Result<()> {
    if capability.allowed_roles().contains(&principal.role) {
        Ok(())
    } else {
        warn!(
            role = %principal.role,
            principal_id = principal.id,
            ?capability,
            "access denied"
        );
        Err(Error::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_admin_capabilities() {
        let admin = Principal::new(Role::Admin, 1, "Admin");
        assert!(authorize(&admin, Capability::ManageMenu).is_ok());
        assert!(authorize(&admin, Capability::ExportData).is_ok());
        assert!(authorize(&admin, Capability::DownloadInvoice).is_ok());
        assert!(matches!(
            authorize(&admin, Capability::PlaceOrder),
            Err(Error::Unauthorized)
        ));
        assert!(authorize(&admin, Capability::PrepareOrders).is_err());
    }

    #[test]
    fn test_kitchen_capabilities() {
        let kitchen = Principal::new(Role::Kitchen, 1, "Cook");
        assert!(authorize(&kitchen, Capability::PrepareOrders).is_ok());
        assert!(authorize(&kitchen, Capability::ViewKitchenQueue).is_ok());
        assert!(authorize(&kitchen, Capability::ManageMenu).is_err());
        assert!(authorize(&kitchen, Capability::PayOrder).is_err());
    }

    #[test]
    fn test_student_capabilities() {
        let student = Principal::new(Role::Student, 7, "Asha");
        assert!(authorize(&student, Capability::PlaceOrder).is_ok());
        assert!(authorize(&student, Capability::TrackOwnOrders).is_ok());
        assert!(authorize(&student, Capability::OverrideOrderStatus).is_err());
        assert!(authorize(&student, Capability::ViewKitchenQueue).is_err());
    }

    #[test]
    fn test_role_serde_accepts_user_alias() {
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::Student);
        let role: Role = serde_json::from_str("\"kitchen\"").unwrap();
        assert_eq!(role, Role::Kitchen);
        assert_eq!(serde_json::to_string(&Role::Student).unwrap(), "\"student\"");
    }
}
