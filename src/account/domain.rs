//! The chart of accounts types.

use serde::Deserialize;

use crate::{Error, database_id::DatabaseId};

/// The five fundamental account categories of double-entry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountKind {
    /// Every kind, in the order accounts are conventionally listed.
    pub const ALL: [AccountKind; 5] = [
        AccountKind::Asset,
        AccountKind::Liability,
        AccountKind::Equity,
        AccountKind::Revenue,
        AccountKind::Expense,
    ];

    /// The string stored in the account table.
    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::Asset => "asset",
            AccountKind::Liability => "liability",
            AccountKind::Equity => "equity",
            AccountKind::Revenue => "revenue",
            AccountKind::Expense => "expense",
        }
    }

    /// Parse a kind from its database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asset" => Some(AccountKind::Asset),
            "liability" => Some(AccountKind::Liability),
            "equity" => Some(AccountKind::Equity),
            "revenue" => Some(AccountKind::Revenue),
            "expense" => Some(AccountKind::Expense),
            _ => None,
        }
    }

    /// The label shown to users.
    pub fn label(self) -> &'static str {
        match self {
            AccountKind::Asset => "Asset",
            AccountKind::Liability => "Liability",
            AccountKind::Equity => "Equity",
            AccountKind::Revenue => "Revenue",
            AccountKind::Expense => "Expense",
        }
    }
}

/// A ledger account in a workspace's chart of accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The account's ID in the database.
    pub id: DatabaseId,
    /// The workspace the account belongs to.
    pub workspace_id: DatabaseId,
    /// The account code, unique within the workspace, e.g. "1000".
    pub code: String,
    /// The account's display name, e.g. "Cash at bank".
    pub name: String,
    /// The account's category.
    pub kind: AccountKind,
}

/// The form data for creating or editing an account.
#[derive(Debug, Deserialize)]
pub struct AccountFormData {
    /// The account code the user typed.
    pub code: String,
    /// The account name the user typed.
    pub name: String,
    /// The account kind, one of "asset", "liability", "equity", "revenue"
    /// or "expense".
    pub kind: String,
}

/// Trim the code and name fields and reject blank ones.
pub(crate) fn validate_account_fields(code: &str, name: &str) -> Result<(String, String), Error> {
    let code = code.trim();
    let name = name.trim();

    if code.is_empty() {
        return Err(Error::EmptyName("account code"));
    }

    if name.is_empty() {
        return Err(Error::EmptyName("account name"));
    }

    Ok((code.to_owned(), name.to_owned()))
}

#[cfg(test)]
mod account_kind_tests {
    use super::AccountKind;

    #[test]
    fn round_trips_through_string() {
        for kind in AccountKind::ALL {
            assert_eq!(AccountKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        assert_eq!(AccountKind::parse("contra"), None);
    }
}
