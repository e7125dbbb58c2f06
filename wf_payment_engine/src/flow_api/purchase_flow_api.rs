use std::fmt::Debug;

use log::*;
use serde_json::{Map, Value};
use tinkoff_tools::{CallbackFields, InitRequest, TinkoffApi};
use wfm_common::Kopecks;

use crate::{
    db_types::{classify_callback, NewCallbackEvent, NewPurchase, OrderId, SettlementSignal},
    flow_api::{
        callback_objects::{CallbackAck, InitOutcome, RefundOutcome, SignedCallback},
        errors::PurchaseFlowError,
    },
    traits::{DeliverableCatalog, PaymentLedger, PurchaseManagement},
};

/// `PurchaseFlowApi` is the primary API for reconciling gateway events into purchase state. It is the only
/// writer of purchase records on the asynchronous path, and the synchronous confirm/purchase operations run
/// through the same idempotent rules.
pub struct PurchaseFlowApi<B> {
    db: B,
    gateway: TinkoffApi,
}

impl<B> Debug for PurchaseFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PurchaseFlowApi")
    }
}

impl<B> PurchaseFlowApi<B> {
    pub fn new(db: B, gateway: TinkoffApi) -> Self {
        Self { db, gateway }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> PurchaseFlowApi<B>
where B: PaymentLedger + PurchaseManagement + DeliverableCatalog
{
    /// Process one inbound gateway callback.
    ///
    /// The raw parameter set is normalized, its token is verified over the full received set, and the event
    /// is appended to the ledger *unconditionally* — forged callbacks are kept for audit, they just never
    /// reach the reconciliation step. Only a [`SignedCallback::Verified`] payload can mutate purchase state.
    ///
    /// The returned acknowledgment reports token validity; the boundary answers HTTP 200 either way so the
    /// provider does not retry on local verification failures.
    pub async fn process_callback(
        &self,
        params: Map<String, Value>,
        headers: Value,
        ip: Option<String>,
    ) -> Result<CallbackAck, PurchaseFlowError> {
        let token_valid = self.gateway.verify_callback_token(&params);
        let fields = CallbackFields::from_params(&params);
        let mut event = NewCallbackEvent::from_fields(&fields, token_valid, Value::Object(params))
            .with_headers(headers);
        if let Some(ip) = ip {
            event = event.with_ip(ip);
        }
        // The ledger write always happens first, independent of the reconciliation outcome.
        let record = self.db.insert_callback(event).await?;
        match SignedCallback::seal(fields, token_valid) {
            SignedCallback::Verified(fields) => {
                self.reconcile(&fields).await?;
                Ok(CallbackAck::valid())
            },
            SignedCallback::Unverified(_) => {
                warn!(
                    "🔄️🧾️ Callback with invalid token recorded as entry #{} (order: {:?}, payment: {:?})",
                    record.id, record.order_id, record.payment_id
                );
                Ok(CallbackAck::invalid())
            },
        }
    }

    /// Apply a verified callback to purchase state. Undecodable order ids are dropped silently: the ledger
    /// entry already exists, and the async path must never error the outer response over a bad order id.
    async fn reconcile(&self, fields: &CallbackFields) -> Result<(), PurchaseFlowError> {
        let raw_order_id = fields.order_id.as_deref().unwrap_or_default();
        let order_id = match raw_order_id.parse::<OrderId>() {
            Ok(oid) => oid,
            Err(e) => {
                debug!("🔄️🧾️ Ignoring callback with undecodable order id. {e}");
                return Ok(());
            },
        };
        match classify_callback(fields.status.as_deref(), fields.success) {
            SettlementSignal::Paid => {
                let price = self.resolve_amount(&order_id, raw_order_id, fields.amount).await?;
                let purchase = NewPurchase::new(order_id.product_id, order_id.buyer_id, price);
                let (record, created) = self.db.upsert_purchase(purchase).await?;
                if created {
                    info!("🔄️💰️ Order {order_id} settled. Purchase #{} at {}", record.id, record.price);
                } else {
                    debug!("🔄️💰️ Order {order_id} was already settled. Duplicate delivery ignored.");
                }
            },
            SettlementSignal::Reversed => {
                let removed = self.db.remove_purchase(order_id.product_id, order_id.buyer_id).await?;
                if removed {
                    info!("🔄️❌️ Order {order_id} reversed. Purchase revoked.");
                } else {
                    debug!("🔄️❌️ Reversal for order {order_id} matched no purchase. Nothing to do.");
                }
            },
            SettlementSignal::Pending => {
                trace!("🔄️🧾️ Intermediate status {:?} for order {order_id}. No state action.", fields.status);
            },
        }
        Ok(())
    }

    /// Amount resolution for a settlement, in order of preference: the amount carried by this callback, the
    /// last amount recorded in the ledger for the order id, the product's current list price. The ordering
    /// lets a late-arriving callback without an amount still settle correctly.
    async fn resolve_amount(
        &self,
        order_id: &OrderId,
        raw_order_id: &str,
        callback_amount: Option<Kopecks>,
    ) -> Result<Kopecks, PurchaseFlowError> {
        if let Some(amount) = callback_amount {
            return Ok(amount);
        }
        if let Some(amount) = self.db.last_amount(raw_order_id).await? {
            return Ok(amount);
        }
        let list_price = self.db.fetch_product(order_id.product_id).await?.map(|p| p.price).unwrap_or_default();
        Ok(list_price)
    }

    /// Manual confirmation of an order after the buyer lands on the success page, used when the async
    /// callback has not arrived (yet). The caller must own the order. The upsert is the same
    /// create-if-absent rule as the async path; an already-settled purchase is returned untouched.
    pub async fn confirm_order(
        &self,
        raw_order_id: &str,
        caller_id: i64,
    ) -> Result<crate::db_types::Purchase, PurchaseFlowError> {
        let order_id = raw_order_id
            .parse::<OrderId>()
            .map_err(|_| PurchaseFlowError::InvalidOrderId(raw_order_id.to_string()))?;
        if order_id.buyer_id != caller_id {
            warn!("🔄️🔒️ User {caller_id} tried to confirm order {order_id} belonging to user {}", order_id.buyer_id);
            return Err(PurchaseFlowError::OrderOwnershipMismatch);
        }
        let price = self.resolve_amount(&order_id, raw_order_id, None).await?;
        let (purchase, created) = self
            .db
            .upsert_purchase(NewPurchase::new(order_id.product_id, order_id.buyer_id, price))
            .await?;
        if created {
            info!("🔄️✅️ Order {order_id} confirmed manually by its owner.");
        }
        Ok(purchase)
    }

    /// Synchronous entitlement at the product's current list price. Shares the idempotent upsert with the
    /// callback path.
    pub async fn direct_purchase(
        &self,
        product_id: i64,
        buyer_id: i64,
    ) -> Result<crate::db_types::Purchase, PurchaseFlowError> {
        let product =
            self.db.fetch_product(product_id).await?.ok_or(PurchaseFlowError::ProductNotFound(product_id))?;
        let (purchase, created) =
            self.db.upsert_purchase(NewPurchase::new(product_id, buyer_id, product.price)).await?;
        if created {
            info!("🔄️💰️ Direct purchase of product {product_id} by buyer {buyer_id} at {}", purchase.price);
        }
        Ok(purchase)
    }

    /// Initiate a payment session with the gateway for the given product and buyer.
    ///
    /// A fresh order id is stamped, the signed `Init` request is sent, and on success a synthetic ledger
    /// entry is appended so the provider-assigned payment id and the amount stay recoverable by order id.
    pub async fn init_payment(
        &self,
        product_id: i64,
        buyer_id: i64,
        request: impl FnOnce(InitRequest) -> InitRequest,
    ) -> Result<InitOutcome, PurchaseFlowError> {
        let product =
            self.db.fetch_product(product_id).await?.ok_or(PurchaseFlowError::ProductNotFound(product_id))?;
        let order_id = OrderId::new(product_id, buyer_id);
        let amount = product.price;
        let init = request(InitRequest::new(amount, order_id.to_string()).with_description(product.title));
        let response = self.gateway.init_payment(init).await?;
        let event = NewCallbackEvent {
            order_id: Some(order_id.to_string()),
            payment_id: response.payment_id.clone(),
            status: response.status.clone().or_else(|| Some("NEW".to_string())),
            success: true,
            error_code: response.error_code.clone(),
            message: response.message.clone(),
            amount: Some(amount),
            token: None,
            token_valid: true,
            payload: serde_json::json!({
                "PaymentId": response.payment_id,
                "PaymentURL": response.payment_url,
                "Status": response.status,
                "Amount": amount,
            }),
            headers: Value::Null,
            ip: None,
        };
        self.db.insert_callback(event).await?;
        info!("🔄️🚀️ Payment initiated for order {order_id} ({amount})");
        Ok(InitOutcome {
            order_id,
            amount,
            payment_id: response.payment_id,
            payment_url: response.payment_url,
        })
    }

    /// Administrative refund (or cancellation) by order id.
    ///
    /// The payment id comes from the ledger; when no amount is supplied the last recorded amount is used,
    /// falling back to a `Cancel` when none is known. The purchase is only revoked after the gateway
    /// confirms the operation — the provider's authenticated response stands in for token verification on
    /// this path.
    pub async fn refund_order(
        &self,
        raw_order_id: &str,
        amount: Option<Kopecks>,
    ) -> Result<RefundOutcome, PurchaseFlowError> {
        let order_id = raw_order_id
            .parse::<OrderId>()
            .map_err(|_| PurchaseFlowError::InvalidOrderId(raw_order_id.to_string()))?;
        let payment_id = self
            .db
            .last_payment_id(raw_order_id)
            .await?
            .ok_or_else(|| PurchaseFlowError::PaymentIdNotFound(raw_order_id.to_string()))?;
        let amount = match amount {
            Some(a) => Some(a),
            None => self.db.last_amount(raw_order_id).await?,
        };
        self.gateway.refund_or_cancel(&payment_id, amount).await?;
        let purchase_removed = self.db.remove_purchase(order_id.product_id, order_id.buyer_id).await?;
        info!("🔄️❌️ Order {order_id} refunded via payment {payment_id}. Purchase removed: {purchase_removed}");
        Ok(RefundOutcome { payment_id, amount, purchase_removed })
    }

    /// The most recent ledger entry's public fields for an order id, as shown on success/fail landing pages.
    pub async fn order_status(
        &self,
        raw_order_id: &str,
    ) -> Result<Option<crate::db_types::CallbackSummary>, PurchaseFlowError> {
        let record = self.db.last_callback(raw_order_id).await?;
        Ok(record.as_ref().map(crate::db_types::CallbackSummary::from))
    }
}
