use thiserror::Error;

use crate::db_types::{NewPurchase, Purchase};

/// Owner of the purchase (entitlement) rows.
#[allow(async_fn_in_trait)]
pub trait PurchaseManagement: Clone {
    /// Atomic conditional insert against the (product_id, buyer_id) uniqueness invariant.
    ///
    /// If no purchase exists for the pair, one is created with the given price and currency and the second
    /// element of the return value is `true`. If a purchase already exists it is returned untouched — the
    /// original price and currency are kept even when the new event reports a different amount.
    async fn upsert_purchase(&self, purchase: NewPurchase) -> Result<(Purchase, bool), PurchaseError>;

    /// Delete the purchase for the pair, if present. Returns `true` when a row was removed; deleting a
    /// non-existent purchase is a no-op, not an error.
    async fn remove_purchase(&self, product_id: i64, buyer_id: i64) -> Result<bool, PurchaseError>;

    async fn fetch_purchase(&self, product_id: i64, buyer_id: i64) -> Result<Option<Purchase>, PurchaseError>;
}

#[derive(Debug, Clone, Error)]
pub enum PurchaseError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Purchase was inserted but could not be read back for product {0}, buyer {1}")]
    MissingAfterUpsert(i64, i64),
}

impl From<sqlx::Error> for PurchaseError {
    fn from(e: sqlx::Error) -> Self {
        PurchaseError::DatabaseError(e.to_string())
    }
}
