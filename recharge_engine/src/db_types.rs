use std::{
    fmt::Display,
    str::FromStr,
    sync::OnceLock,
};

use chrono::{DateTime, Utc};
use log::error;
use regex::Regex;
use rpg_common::Cents;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

//--------------------------------------        OrderId        ---------------------------------------------------------
/// Opaque, immutable order identifier. New ids are random UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------       AccountId       ---------------------------------------------------------
/// An account identifier. Accounts are keyed by mainland-China mobile numbers, e.g. `13812345678`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid account id")]
pub struct InvalidAccountId(pub String);

fn account_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^1[3-9]\d{9}$").expect("account id pattern is valid"))
}

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = InvalidAccountId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if account_pattern().is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidAccountId(s.to_string()))
        }
    }
}

impl TryFrom<String> for AccountId {
    type Error = InvalidAccountId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been created, and is waiting for payment.
    Pending,
    /// Payment has been taken from the payer.
    Paid,
    /// The payment was declined, or could not be settled. Terminal.
    Failed,
    /// The order amount has been credited to the recipient. Terminal.
    Recharged,
}

impl OrderStatusType {
    /// The order lifecycle graph: `pending → paid → recharged`, with `pending | paid → failed`.
    pub fn can_transition_to(self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!((self, next), (Pending, Paid) | (Paid, Recharged) | (Pending, Failed) | (Paid, Failed))
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatusType::Failed | OrderStatusType::Recharged)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Paid => write!(f, "paid"),
            OrderStatusType::Failed => write!(f, "failed"),
            OrderStatusType::Recharged => write!(f, "recharged"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to pending");
            OrderStatusType::Pending
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "recharged" => Ok(Self::Recharged),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Illegal order status change from {from} to {to}")]
pub struct IllegalTransition {
    pub from: OrderStatusType,
    pub to: OrderStatusType,
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// The paying account
    pub account: AccountId,
    /// The account that is credited when the order is recharged
    pub recipient: AccountId,
    pub amount: Cents,
    pub status: OrderStatusType,
    /// The payment transaction id, once the payment has been taken or confirmed
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub recharged_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Moves the order to `next`, stamping the matching timestamp.
    ///
    /// Returns `Ok(false)` without touching the order when it is already in `next`, so that re-delivered events are
    /// harmless. Any edge that is not in the lifecycle graph is rejected and leaves the order as it was.
    ///
    /// Rolling a paid order back to `failed` clears `paid_at`, since `paid_at` is only ever set on paid or recharged
    /// orders.
    pub fn advance(&mut self, next: OrderStatusType, now: DateTime<Utc>) -> Result<bool, IllegalTransition> {
        if self.status == next {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(IllegalTransition { from: self.status, to: next });
        }
        match next {
            OrderStatusType::Paid => self.paid_at = Some(now),
            OrderStatusType::Recharged => self.recharged_at = Some(now),
            OrderStatusType::Failed => self.paid_at = None,
            OrderStatusType::Pending => {},
        }
        self.status = next;
        self.updated_at = now;
        Ok(true)
    }

    /// Undoes a recharge claim whose balance credit could not be committed.
    pub(crate) fn revert_recharge(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != OrderStatusType::Recharged {
            return false;
        }
        self.status = OrderStatusType::Paid;
        self.recharged_at = None;
        self.updated_at = now;
        true
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub account: AccountId,
    pub recipient: AccountId,
    pub amount: Cents,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// A new order that recharges the paying account itself.
    pub fn new(account: AccountId, amount: Cents) -> Self {
        let recipient = account.clone();
        Self::with_recipient(account, recipient, amount)
    }

    pub fn with_recipient(account: AccountId, recipient: AccountId, amount: Cents) -> Self {
        Self { id: OrderId::random(), account, recipient, amount, created_at: Utc::now() }
    }

    pub fn into_order(self) -> Order {
        Order {
            id: self.id,
            account: self.account,
            recipient: self.recipient,
            amount: self.amount,
            status: OrderStatusType::Pending,
            transaction_id: None,
            created_at: self.created_at,
            updated_at: self.created_at,
            paid_at: None,
            recharged_at: None,
        }
    }
}

//--------------------------------------        Account       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: Cents,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(id: AccountId) -> Self {
        let now = Utc::now();
        Self { id, balance: Cents::default(), created_at: now, updated_at: now }
    }
}
