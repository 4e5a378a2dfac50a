//! Accounts and roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AccountId, ParseLabelError};

/// Account role. Decides which ledger operations the holder may invoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Reader,
    Author,
    Moderator,
    Admin,
}

impl Role {
    /// Storage label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Author => "author",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    /// Whether the role may receive referral commissions and request payouts.
    pub fn is_earner(&self) -> bool {
        matches!(self, Role::Author | Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reader" => Ok(Role::Reader),
            "author" => Ok(Role::Author),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(ParseLabelError::new("role", other)),
        }
    }
}

/// A ledger account. The balance is only ever changed by ledger operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Account {
    pub id: AccountId,
    pub display_name: String,
    pub role: Role,
    pub coin_balance: u64,
    /// Set at most once.
    pub referred_by: Option<AccountId>,
    pub created_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_labels_roundtrip() {
        for role in [Role::Reader, Role::Author, Role::Moderator, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().expect("parse"), role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        let err = "superuser".parse::<Role>().expect_err("unknown role");
        assert_eq!(err.kind, "role");
        assert_eq!(err.value, "superuser");
    }

    #[test]
    fn test_earner_roles() {
        assert!(Role::Author.is_earner());
        assert!(Role::Admin.is_earner());
        assert!(!Role::Reader.is_earner());
        assert!(!Role::Moderator.is_earner());
    }

    #[test]
    fn test_role_serde_snake_case() {
        let json = serde_json::to_string(&Role::Moderator).expect("serialize");
        assert_eq!(json, "\"moderator\"");
    }
}
