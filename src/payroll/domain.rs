//! The payroll types.

use serde::Deserialize;
use time::Date;

use crate::{Error, database_id::DatabaseId, user::UserId};

/// A payroll run covering a pay period.
#[derive(Debug, Clone, PartialEq)]
pub struct Payroll {
    /// The run's ID in the database.
    pub id: DatabaseId,
    /// The workspace the run belongs to.
    pub workspace_id: DatabaseId,
    /// The first day of the pay period.
    pub period_start: Date,
    /// The last day of the pay period.
    pub period_end: Date,
}

/// One member's pay for a payroll run.
///
/// The transaction's total is never stored, it is recomputed from the items
/// every time it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayrollTransaction {
    /// The transaction's ID in the database.
    pub id: DatabaseId,
    /// The payroll run the transaction belongs to.
    pub payroll_id: DatabaseId,
    /// The member being paid.
    pub user_id: UserId,
    /// Whether the transaction has been locked. Items of a locked
    /// transaction can no longer be changed.
    pub is_locked: bool,
}

/// A payroll transaction with its member's email and computed total.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollTransactionSummary {
    /// The transaction itself.
    pub transaction: PayrollTransaction,
    /// The member's email address.
    pub email: String,
    /// The net pay in integer cents: wages minus deductions.
    pub total: i64,
}

/// Whether an item adds to or subtracts from the member's pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Wage,
    Deduction,
}

impl ItemKind {
    /// The string stored in the transaction_item table.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Wage => "wage",
            ItemKind::Deduction => "deduction",
        }
    }

    /// Parse a kind from its database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "wage" => Some(ItemKind::Wage),
            "deduction" => Some(ItemKind::Deduction),
            _ => None,
        }
    }

    /// The label shown to users.
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Wage => "Wage",
            ItemKind::Deduction => "Deduction",
        }
    }

    /// The item's signed contribution to the transaction total.
    pub fn signed(self, amount: i64) -> i64 {
        match self {
            ItemKind::Wage => amount,
            ItemKind::Deduction => -amount,
        }
    }
}

/// A single wage or deduction line of a payroll transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionItem {
    /// The item's ID in the database.
    pub id: DatabaseId,
    /// The transaction the item belongs to.
    pub transaction_id: DatabaseId,
    /// Whether the item adds to or subtracts from the pay.
    pub kind: ItemKind,
    /// What the item is for.
    pub description: String,
    /// The amount in integer cents, always positive.
    pub amount: i64,
    /// Whether the item can be edited or deleted. Items generated from the
    /// timesheet are read-only.
    pub editable: bool,
}

/// The form data for creating a payroll run.
#[derive(Debug, Deserialize)]
pub struct PayrollFormData {
    /// The first day of the pay period.
    pub period_start: Date,
    /// The last day of the pay period.
    pub period_end: Date,
}

/// The form data for creating or editing a transaction item.
#[derive(Debug, Deserialize)]
pub struct ItemFormData {
    /// The item kind, "wage" or "deduction".
    pub kind: String,
    /// What the item is for.
    #[serde(default)]
    pub description: String,
    /// The amount in dollars, e.g. "12.34".
    pub amount: f64,
}

/// Check that an item amount is a positive number of cents.
pub(crate) fn validate_amount(amount: i64) -> Result<i64, Error> {
    if amount <= 0 {
        return Err(Error::NonPositiveAmount);
    }

    Ok(amount)
}
