use std::sync::Arc;

use log::*;
use reqwest::{header::HeaderValue, Client};
use serde_json::{Map, Value};
use wfm_common::Kopecks;

use crate::{
    config::TinkoffConfig,
    data_objects::{GatewayResponse, InitRequest},
    token,
    TinkoffApiError,
};

/// Outbound client for the payment gateway. All requests are signed POSTs with a bounded timeout; a
/// transport failure or timeout surfaces as a recoverable error and never mutates anything locally.
#[derive(Clone)]
pub struct TinkoffApi {
    config: TinkoffConfig,
    client: Arc<Client>,
}

impl TinkoffApi {
    pub fn new(config: TinkoffConfig) -> Result<Self, TinkoffApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TinkoffApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &TinkoffConfig {
        &self.config
    }

    pub fn url(&self, operation: &str) -> String {
        format!("{}/v2/{operation}", self.config.base_url.trim_end_matches('/'))
    }

    /// Verify the token on an inbound callback against the full received parameter set.
    pub fn verify_callback_token(&self, params: &Map<String, Value>) -> bool {
        let candidate = token::extract_token(params);
        token::verify(params, self.config.password.reveal(), candidate.as_deref())
    }

    /// Sign the parameter set and POST it to the given operation endpoint.
    async fn post_signed(&self, operation: &str, mut params: Map<String, Value>) -> Result<GatewayResponse, TinkoffApiError> {
        params.insert("TerminalKey".to_string(), Value::String(self.config.terminal_key.clone()));
        let signature = token::sign(&params, self.config.password.reveal());
        params.insert(token::TOKEN_KEY.to_string(), Value::String(signature));
        let url = self.url(operation);
        trace!("Sending signed {operation} request to {url}");
        let response = self
            .client
            .post(&url)
            .header("Content-Type", HeaderValue::from_static("application/json"))
            .json(&params)
            .send()
            .await
            .map_err(|e| TinkoffApiError::TransportError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| TinkoffApiError::TransportError(e.to_string()))?;
            return Err(TinkoffApiError::QueryError { status, message });
        }
        let result =
            response.json::<GatewayResponse>().await.map_err(|e| TinkoffApiError::JsonError(e.to_string()))?;
        if !result.success {
            let error_code = result.error_code.clone().unwrap_or_default();
            let message = result.message.clone().unwrap_or_else(|| "Gateway returned an error".to_string());
            debug!("{operation} rejected by gateway. Error {error_code}. {message}");
            return Err(TinkoffApiError::Rejected { error_code, message });
        }
        Ok(result)
    }

    /// Initiate a payment session. On success the response carries the provider-assigned payment id and the
    /// URL the buyer should be redirected to.
    pub async fn init_payment(&self, request: InitRequest) -> Result<GatewayResponse, TinkoffApiError> {
        let params = match serde_json::to_value(&request) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => return Err(TinkoffApiError::JsonError("Init request did not serialize to an object".to_string())),
        };
        debug!("Initiating payment for order {}, {}", request.order_id, request.amount);
        let result = self.post_signed("Init", params).await?;
        info!("Payment initiated for order {}. PaymentId: {:?}", request.order_id, result.payment_id);
        Ok(result)
    }

    /// Cancel an authorized but uncaptured payment.
    pub async fn cancel_payment(&self, payment_id: &str) -> Result<GatewayResponse, TinkoffApiError> {
        let mut params = Map::new();
        params.insert("PaymentId".to_string(), Value::String(payment_id.to_string()));
        debug!("Cancelling payment {payment_id}");
        let result = self.post_signed("Cancel", params).await?;
        info!("Payment {payment_id} cancelled");
        Ok(result)
    }

    /// Refund a captured payment, fully or partially.
    pub async fn refund_payment(&self, payment_id: &str, amount: Kopecks) -> Result<GatewayResponse, TinkoffApiError> {
        let mut params = Map::new();
        params.insert("PaymentId".to_string(), Value::String(payment_id.to_string()));
        params.insert("Amount".to_string(), Value::from(amount.value()));
        debug!("Refunding {amount} on payment {payment_id}");
        let result = self.post_signed("Refund", params).await?;
        info!("Refunded {amount} on payment {payment_id}");
        Ok(result)
    }

    /// Refund when an amount is known, cancel otherwise. This mirrors the provider's own split: `Refund`
    /// requires an amount, `Cancel` voids the whole payment.
    pub async fn refund_or_cancel(
        &self,
        payment_id: &str,
        amount: Option<Kopecks>,
    ) -> Result<GatewayResponse, TinkoffApiError> {
        match amount {
            Some(amount) => self.refund_payment(payment_id, amount).await,
            None => self.cancel_payment(payment_id).await,
        }
    }
}
