//! Core business logic - framework-agnostic identity, menu, order, payment,
//! expense and reporting operations. The HTTP layer in [`crate::api`] only
//! translates requests into calls to these functions.

/// Roles, principals and the capability gate
pub mod access;
/// Login, registration and user verification
pub mod auth;
/// Expense ledger and profit summary
pub mod expense;
/// Tabular exports (CSV and XLSX)
pub mod export;
/// PDF invoice rendering
pub mod invoice;
/// Menu management and lookup
pub mod menu;
/// Order placement and the fulfilment state machine
pub mod order;
/// Password hashing
pub mod password;
/// Payment confirmation (simulated, gateway signature, webhook)
pub mod payment;
/// Preparation progress calculation
pub mod progress;
/// Dashboards and kitchen alerts
pub mod report;
