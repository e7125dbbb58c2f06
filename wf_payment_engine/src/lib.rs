//! # Watchface Market Payment Engine
//!
//! This library contains the core logic for reconciling payment-gateway events into purchase state for the
//! watchface marketplace, and for resolving the correct installable build for a requesting device.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never
//!    need to access the database directly — use the public API instead. The exception is the data types,
//!    which are defined in [`db_types`] and are public.
//! 2. The storage contracts ([`mod@traits`]). Backends implement [`PaymentLedger`], [`PurchaseManagement`]
//!    and [`DeliverableCatalog`] to act as an engine backend.
//! 3. The engine public API ([`mod@flow_api`]): [`PurchaseFlowApi`] for the payment/reconciliation flows and
//!    [`DeliverableApi`] for artifact resolution.
//!
//! Everything specific to the payment provider's wire protocol — request/callback signatures, the outbound
//! client, callback field normalization — lives in the `tinkoff_tools` crate.
pub mod db_types;
pub mod flow_api;
mod sqlite;
pub mod test_utils;
pub mod traits;

pub use flow_api::{DeliverableApi, DeliverableError, PurchaseFlowApi, PurchaseFlowError};
pub use sqlite::SqliteDatabase;
pub use traits::{DeliverableCatalog, PaymentLedger, PurchaseManagement};
