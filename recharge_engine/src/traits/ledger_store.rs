use rpg_common::Cents;
use thiserror::Error;

use crate::db_types::{
    Account,
    AccountId,
    IllegalTransition,
    InvalidAccountId,
    NewOrder,
    Order,
    OrderId,
    OrderStatusType,
};

/// This trait defines the storage contract for backends holding orders and accounts.
///
/// Every read-modify-write goes through [`update_order`](LedgerStore::update_order) or
/// [`update_account`](LedgerStore::update_account). The backend holds that entity's exclusive lock (or an immediate
/// write transaction) while the mutator runs, so the mutator always observes the latest committed state.
///
/// A mutator that returns an error commits nothing, and the error is handed back to the caller unchanged.
#[allow(async_fn_in_trait)]
pub trait LedgerStore: Clone {
    /// The URL of the ledger store
    fn url(&self) -> &str;

    /// Stores a brand-new order in `pending` status and returns the stored record.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError>;

    /// Fetches the order with the given id, or `None` if it does not exist.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Fetches the account with the given id. Accounts are created on first reference with a zero balance, so this
    /// call never fails for a well-formed account id.
    async fn fetch_account(&self, account_id: &AccountId) -> Result<Account, PaymentGatewayError>;

    /// Atomically applies `mutator` to the order. Returns the committed order and the mutator's result.
    ///
    /// Fails with [`PaymentGatewayError::OrderNotFound`] if the order does not exist.
    async fn update_order<F, T>(&self, order_id: &OrderId, mutator: F) -> Result<(Order, T), PaymentGatewayError>
    where
        F: FnOnce(&mut Order) -> Result<T, PaymentGatewayError> + Send,
        T: Send;

    /// Atomically applies `mutator` to the account, creating the account first if it does not exist yet.
    /// Returns the committed account and the mutator's result.
    ///
    /// Implementations refuse to commit a negative balance.
    async fn update_account<F, T>(
        &self,
        account_id: &AccountId,
        mutator: F,
    ) -> Result<(Account, T), PaymentGatewayError>
    where
        F: FnOnce(&mut Account) -> Result<T, PaymentGatewayError> + Send,
        T: Send;

    /// All orders placed by the given account, oldest first.
    async fn fetch_orders_for_account(&self, account_id: &AccountId) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Closes the underlying connection, if there is one.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("Invalid account: {0}")]
    InvalidAccount(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Unsupported payment method: {0}")]
    UnsupportedMethod(String),
    #[error("Insufficient balance in account {account}. Required: {required}, available: {available}")]
    InsufficientBalance { account: AccountId, required: Cents, available: Cents },
    #[error("The callback signature for order {0} is invalid")]
    InvalidSignature(OrderId),
    #[error("The payment gateway is unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("{0} is not implemented")]
    NotImplemented(String),
    #[error("{0}")]
    IllegalTransition(#[from] IllegalTransition),
    #[error("Order {order_id} cannot be paid, since it is {status}")]
    OrderNotPayable { order_id: OrderId, status: OrderStatusType },
    #[error("Could not create the payment descriptor: {0}")]
    DescriptorError(String),
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
}

impl PaymentGatewayError {
    /// Only an unreachable gateway or a storage fault is worth retrying. Everything else is a definitive answer.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentGatewayError::GatewayUnavailable(_) | PaymentGatewayError::DatabaseError(_))
    }
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}

impl From<InvalidAccountId> for PaymentGatewayError {
    fn from(e: InvalidAccountId) -> Self {
        PaymentGatewayError::InvalidAccount(e.to_string())
    }
}
