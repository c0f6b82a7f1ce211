//! The double-entry journal types.

use serde::Deserialize;
use time::Date;

use crate::{Error, database_id::DatabaseId};

/// Which side of the ledger an entry line posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Debit,
    Credit,
}

impl LineKind {
    /// The string stored in the entry_line table.
    pub fn as_str(self) -> &'static str {
        match self {
            LineKind::Debit => "debit",
            LineKind::Credit => "credit",
        }
    }

    /// Parse a kind from its database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "debit" => Some(LineKind::Debit),
            "credit" => Some(LineKind::Credit),
            _ => None,
        }
    }

    /// The label shown to users.
    pub fn label(self) -> &'static str {
        match self {
            LineKind::Debit => "Debit",
            LineKind::Credit => "Credit",
        }
    }
}

/// A journal entry header. The money lives in the entry's lines.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    /// The entry's ID in the database.
    pub id: DatabaseId,
    /// The workspace the entry was posted in.
    pub workspace_id: DatabaseId,
    /// The day the entry is dated.
    pub date: Date,
    /// A short note describing the entry.
    pub memo: String,
}

/// The data needed to create an entry line.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntryLine {
    /// The ledger account the line posts to.
    pub account_id: DatabaseId,
    /// Whether the line is a debit or a credit.
    pub kind: LineKind,
    /// The amount in integer cents, always positive.
    pub amount: i64,
}

/// An entry line joined with its account's code and name for display.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryLineDetail {
    /// The line's ID in the database.
    pub id: DatabaseId,
    /// The ledger account the line posts to.
    pub account_id: DatabaseId,
    /// The account's code, e.g. "1000".
    pub account_code: String,
    /// The account's display name.
    pub account_name: String,
    /// Whether the line is a debit or a credit.
    pub kind: LineKind,
    /// The amount in integer cents, always positive.
    pub amount: i64,
}

/// A journal entry with its lines, ready for display or export.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntryDetail {
    /// The entry header.
    pub entry: JournalEntry,
    /// The entry's lines in insertion order.
    pub lines: Vec<EntryLineDetail>,
}

/// The debit and credit totals across a workspace's journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrialBalance {
    /// The sum of all debit lines in integer cents.
    pub debits: i64,
    /// The sum of all credit lines in integer cents.
    pub credits: i64,
}

/// The form data for creating or editing a journal entry.
///
/// The line fields are parallel arrays: the first element of each array
/// describes the first line, and so on.
#[derive(Debug, Deserialize)]
pub struct EntryFormData {
    /// The day the entry is dated.
    pub date: Date,
    /// A short note describing the entry.
    #[serde(default)]
    pub memo: String,
    /// The account each line posts to.
    #[serde(default)]
    pub account_id: Vec<DatabaseId>,
    /// The side each line posts to, "debit" or "credit".
    #[serde(default)]
    pub kind: Vec<String>,
    /// The amount of each line in dollars, e.g. "12.34".
    #[serde(default)]
    pub amount: Vec<f64>,
}

impl EntryFormData {
    /// Assemble the parallel line arrays into entry lines.
    ///
    /// # Errors
    /// Returns [Error::MismatchedEntryLines] if the arrays differ in length
    /// or a side is not "debit" or "credit".
    pub fn parse_lines(&self) -> Result<Vec<NewEntryLine>, Error> {
        if self.account_id.len() != self.kind.len() || self.kind.len() != self.amount.len() {
            return Err(Error::MismatchedEntryLines);
        }

        self.account_id
            .iter()
            .zip(&self.kind)
            .zip(&self.amount)
            .map(|((&account_id, kind), &amount)| {
                let kind = LineKind::parse(kind).ok_or(Error::MismatchedEntryLines)?;

                Ok(NewEntryLine {
                    account_id,
                    kind,
                    amount: dollars_to_cents(amount),
                })
            })
            .collect()
    }
}

/// Convert a dollar amount from a form into integer cents.
pub(crate) fn dollars_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Check that a set of entry lines forms a valid journal entry.
///
/// # Errors
/// Returns [Error::TooFewEntryLines] if there are fewer than two lines,
/// [Error::NonPositiveAmount] if any amount is zero or negative, and
/// [Error::UnbalancedEntry] if the debit and credit totals differ.
pub fn validate_entry_lines(lines: &[NewEntryLine]) -> Result<(), Error> {
    if lines.len() < 2 {
        return Err(Error::TooFewEntryLines);
    }

    if lines.iter().any(|line| line.amount <= 0) {
        return Err(Error::NonPositiveAmount);
    }

    let debits: i64 = lines
        .iter()
        .filter(|line| line.kind == LineKind::Debit)
        .map(|line| line.amount)
        .sum();
    let credits: i64 = lines
        .iter()
        .filter(|line| line.kind == LineKind::Credit)
        .map(|line| line.amount)
        .sum();

    if debits != credits {
        return Err(Error::UnbalancedEntry);
    }

    Ok(())
}
