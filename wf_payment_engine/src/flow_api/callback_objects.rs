use serde::Serialize;
use tinkoff_tools::CallbackFields;
use wfm_common::Kopecks;

use crate::db_types::OrderId;

//--------------------------------------    SignedCallback     -------------------------------------------------------
/// A callback tagged with the outcome of its signature check.
///
/// The tag is a precondition, not a flag: reconciliation only pattern-matches the `Verified` arm, which makes
/// it structurally impossible to mutate purchase state from a payload whose token did not verify.
#[derive(Debug, Clone)]
pub enum SignedCallback {
    Verified(CallbackFields),
    Unverified(CallbackFields),
}

impl SignedCallback {
    pub fn seal(fields: CallbackFields, token_valid: bool) -> Self {
        if token_valid {
            SignedCallback::Verified(fields)
        } else {
            SignedCallback::Unverified(fields)
        }
    }
}

//--------------------------------------     CallbackAck       -------------------------------------------------------
/// The acknowledgment returned to the provider. The boundary always answers HTTP 200 with this body — the
/// provider must not be made to retry merely because the token looked wrong locally.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CallbackAck {
    pub success: bool,
    pub token_valid: bool,
}

impl CallbackAck {
    pub fn valid() -> Self {
        Self { success: true, token_valid: true }
    }

    pub fn invalid() -> Self {
        Self { success: false, token_valid: false }
    }
}

//--------------------------------------     RefundOutcome     -------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct RefundOutcome {
    pub payment_id: String,
    pub amount: Option<Kopecks>,
    /// Whether a purchase row existed and was revoked. A refund of an already-revoked order reports `false`.
    pub purchase_removed: bool,
}

//--------------------------------------      InitOutcome      -------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct InitOutcome {
    pub order_id: OrderId,
    pub amount: Kopecks,
    pub payment_id: Option<String>,
    pub payment_url: Option<String>,
}
