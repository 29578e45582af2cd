//! Expense ledger and profit summary.

use crate::{
    core::access::{Capability, Principal, authorize},
    entities::{Expense, Order, PaymentStatus, expense, order},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::info;

const DEFAULT_CATEGORY: &str = "general";

/// Fields an admin supplies when recording an expense.
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    pub description: String,
    pub amount: f64,
    pub category: String,
    /// Defaults to now
    pub expense_date: Option<DateTime<Utc>>,
}

/// Ledger view: entries plus the profit calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseSummary {
    pub expenses: Vec<expense::Model>,
    pub total_expenses: f64,
    pub total_revenue: f64,
    pub profit: f64,
}

/// Sum of `total_amount` over paid orders.
pub async fn total_revenue<C: ConnectionTrait>(db: &C) -> Result<f64> {
    let sum: Option<Option<f64>> = Order::find()
        .select_only()
        .column_as(Expr::col(order::Column::TotalAmount).sum(), "total")
        .filter(order::Column::PaymentStatus.eq(PaymentStatus::Paid))
        .into_tuple()
        .one(db)
        .await?;
    Ok(sum.flatten().unwrap_or(0.0))
}

/// Sum of all recorded expenses.
pub async fn total_expenses<C: ConnectionTrait>(db: &C) -> Result<f64> {
    let sum: Option<Option<f64>> = Expense::find()
        .select_only()
        .column_as(Expr::col(expense::Column::Amount).sum(), "total")
        .into_tuple()
        .one(db)
        .await?;
    Ok(sum.flatten().unwrap_or(0.0))
}

/// All expenses newest first, with revenue and profit.
pub async fn expense_summary(
    db: &DatabaseConnection,
    principal: &Principal,
) -> Result<ExpenseSummary> {
    authorize(principal, Capability::ManageExpenses)?;

    let expenses = Expense::find()
        .order_by_desc(expense::Column::ExpenseDate)
        .order_by_desc(expense::Column::Id)
        .all(db)
        .await?;
    let total_expenses = total_expenses(db).await?;
    let total_revenue = total_revenue(db).await?;

    Ok(ExpenseSummary {
        expenses,
        total_expenses,
        total_revenue,
        profit: total_revenue - total_expenses,
    })
}

/// Records an expense.
///
/// # Errors
/// Returns an error if:
/// - The caller is not an admin
/// - The description is empty
/// - The amount is negative or not finite
/// - The database insert fails
pub async fn add_expense(
    db: &DatabaseConnection,
    principal: &Principal,
    input: ExpenseInput,
) -> Result<expense::Model> {
    authorize(principal, Capability::ManageExpenses)?;

    let description = input.description.trim();
    if description.is_empty() {
        return Err(Error::validation("Expense description cannot be empty"));
    }
    if !input.amount.is_finite() || input.amount < 0.0 {
        return Err(Error::InvalidAmount {
            amount: input.amount,
        });
    }
    let category = match input.category.trim() {
        "" => DEFAULT_CATEGORY,
        c => c,
    };

    let now = Utc::now();
    let expense = expense::ActiveModel {
        description: Set(description.to_string()),
        amount: Set(input.amount),
        category: Set(category.to_string()),
        expense_date: Set(input.expense_date.unwrap_or(now)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(expense_id = expense.id, amount = expense.amount, "expense added");
    Ok(expense)
}

pub async fn delete_expense(
    db: &DatabaseConnection,
    principal: &Principal,
    expense_id: i64,
) -> Result<()> {
    authorize(principal, Capability::ManageExpenses)?;

    let result = Expense::delete_by_id(expense_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::ExpenseNotFound { expense_id });
    }
    info!(expense_id, "expense deleted");
    Ok(())
}
