//! Deposit and withdrawal requests.
//!
//! Both are two-step state machines: created `pending`, then moved exactly
//! once to `approved` or `rejected` by an administrator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AccountId, ParseLabelError, RequestId};

/// Processing status shared by deposits and withdrawals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(ParseLabelError::new("status", other)),
        }
    }
}

/// Accepted external payment channels for deposits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DepositMethod {
    Zalopay,
    BankTransfer,
}

impl DepositMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositMethod::Zalopay => "zalopay",
            DepositMethod::BankTransfer => "bank_transfer",
        }
    }
}

impl FromStr for DepositMethod {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zalopay" => Ok(DepositMethod::Zalopay),
            "bank_transfer" => Ok(DepositMethod::BankTransfer),
            other => Err(ParseLabelError::new("deposit method", other)),
        }
    }
}

/// A claim that an external payment was made, awaiting admin review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Deposit {
    pub id: RequestId,
    pub account_id: AccountId,
    /// Money amount the account holder says they paid.
    pub claimed_amount: u64,
    /// Coins credited on approval.
    pub coins_requested: u64,
    pub method: DepositMethod,
    /// Unique code the holder quotes in the payment memo.
    pub reference_code: String,
    pub transfer_note: Option<String>,
    pub status: RequestStatus,
    pub admin_id: Option<AccountId>,
    pub admin_note: Option<String>,
    pub created_at: u64,
    pub processed_at: Option<u64>,
}

/// Bank details a payout is sent to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct BankDestination {
    pub bank_name: String,
    pub bank_account: String,
    pub bank_holder: String,
}

impl BankDestination {
    /// True when every field carries non-blank text.
    pub fn is_complete(&self) -> bool {
        [&self.bank_name, &self.bank_account, &self.bank_holder]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// A payout request. Coins are reserved (debited) when it is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Withdrawal {
    pub id: RequestId,
    pub account_id: AccountId,
    pub coins_reserved: u64,
    /// Money owed to the holder once approved.
    pub payout_amount: u64,
    pub destination: BankDestination,
    pub status: RequestStatus,
    pub admin_id: Option<AccountId>,
    pub admin_note: Option<String>,
    pub created_at: u64,
    pub processed_at: Option<u64>,
}
