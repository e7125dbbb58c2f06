//! # Storage contracts
//!
//! This module defines the interface contracts the engine's database backends must expose.
//!
//! * [`PaymentLedger`] is the append-only record of every gateway event, valid or forged. The sole writer is
//!   the gateway-facing boundary; the sole reconciliation reader is the purchase flow.
//! * [`PurchaseManagement`] owns the purchase (entitlement) rows. The (product, buyer) uniqueness invariant
//!   is enforced by the backend's atomic conditional insert, not by in-process locking, so that duplicate
//!   concurrent deliveries of the same settlement converge to a single row.
//! * [`DeliverableCatalog`] is the read side of the versioned file catalog plus the install-event sink.
mod deliverable_catalog;
mod payment_ledger;
mod purchase_management;

pub use deliverable_catalog::{CatalogError, DeliverableCatalog};
pub use payment_ledger::{LedgerError, PaymentLedger};
pub use purchase_management::{PurchaseError, PurchaseManagement};
