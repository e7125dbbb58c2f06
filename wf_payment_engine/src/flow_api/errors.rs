use thiserror::Error;
use tinkoff_tools::TinkoffApiError;

use crate::traits::{CatalogError, LedgerError, PurchaseError};

#[derive(Debug, Error)]
pub enum PurchaseFlowError {
    #[error("Invalid order id: {0}")]
    InvalidOrderId(String),
    #[error("Order does not belong to the calling user")]
    OrderOwnershipMismatch,
    #[error("No payment id is recorded for order {0}")]
    PaymentIdNotFound(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Could not reach the payment gateway: {0}")]
    GatewayUnreachable(String),
    #[error("The payment gateway rejected the request. Error {error_code}. {message}")]
    GatewayRejected { error_code: String, message: String },
    #[error("{0}")]
    LedgerError(#[from] LedgerError),
    #[error("{0}")]
    PurchaseError(#[from] PurchaseError),
    #[error("{0}")]
    CatalogError(#[from] CatalogError),
}

impl From<TinkoffApiError> for PurchaseFlowError {
    fn from(e: TinkoffApiError) -> Self {
        match e {
            TinkoffApiError::Rejected { error_code, message } => Self::GatewayRejected { error_code, message },
            other => Self::GatewayUnreachable(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeliverableError {
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Buyer {buyer_id} is not entitled to product {product_id}")]
    NotEntitled { product_id: i64, buyer_id: i64 },
    #[error("No compatible deliverable is available for product {0}")]
    DeliverableUnavailable(i64),
    #[error("{0}")]
    CatalogError(#[from] CatalogError),
    #[error("{0}")]
    PurchaseError(#[from] PurchaseError),
}
