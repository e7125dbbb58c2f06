//! # Engine public API
//!
//! [`PurchaseFlowApi`] reconciles gateway events (async callbacks, manual confirmations, administrative
//! refunds, payment initiation) into purchase state, and [`DeliverableApi`] resolves which build a device
//! should receive. Both are generic over the storage backend via the traits in [`crate::traits`].
pub mod callback_objects;
pub mod deliverable_api;
pub mod errors;
pub mod purchase_flow_api;

pub use callback_objects::{CallbackAck, InitOutcome, RefundOutcome, SignedCallback};
pub use deliverable_api::DeliverableApi;
pub use errors::{DeliverableError, PurchaseFlowError};
pub use purchase_flow_api::PurchaseFlowApi;
