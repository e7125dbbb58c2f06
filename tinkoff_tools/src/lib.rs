//! # Tinkoff gateway tools
//!
//! Everything that is specific to the payment provider's wire protocol lives in this crate:
//!
//! * [`token`] — the request/callback signature scheme. The provider signs every message with a SHA-256 digest
//!   over the canonicalized parameter set plus a shared password. The canonicalization rules are exacting
//!   (key casing, boolean stringification, byte-lexical key order) and any deviation silently invalidates all
//!   verifications, so the scheme is isolated here and tested against fixed vectors.
//! * [`TinkoffApi`] — the outbound HTTP client for `Init`, `Cancel` and `Refund`.
//! * [`CallbackFields`] — normalization of the provider's inconsistently-cased callback parameters into a
//!   single canonical record, so case-insensitive lookups never leak into the reconciliation core.
pub mod api;
pub mod config;
pub mod data_objects;
mod error;
pub mod token;

pub use api::TinkoffApi;
pub use config::TinkoffConfig;
pub use data_objects::{CallbackFields, GatewayResponse, InitRequest, Receipt, ReceiptItem};
pub use error::TinkoffApiError;
