use thiserror::Error;
use wfm_common::Kopecks;

use crate::db_types::{CallbackRecord, NewCallbackEvent};

/// The append-only audit trail of gateway events.
#[allow(async_fn_in_trait)]
pub trait PaymentLedger: Clone {
    /// Unconditionally persist the event. Invalid and forged callbacks are retained for audit and anomaly
    /// detection; they must never drive state mutation, but the write itself always happens.
    async fn insert_callback(&self, event: NewCallbackEvent) -> Result<CallbackRecord, LedgerError>;

    /// The most recent ledger entry for the given order id that carries a non-null payment id. Supports
    /// manual refund/cancel when the original synchronous response is no longer available.
    async fn last_payment_id(&self, order_id: &str) -> Result<Option<String>, LedgerError>;

    /// The most recently recorded amount (minor units) for the given order id, used as a fallback price
    /// source for callbacks that arrive without an amount.
    async fn last_amount(&self, order_id: &str) -> Result<Option<Kopecks>, LedgerError>;

    /// The most recent ledger entry for the given order id, if any.
    async fn last_callback(&self, order_id: &str) -> Result<Option<CallbackRecord>, LedgerError>;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
