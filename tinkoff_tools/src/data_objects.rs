use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use wfm_common::{parse_boolean_flag, Kopecks};

//--------------------------------------     InitRequest     ----------------------------------------------------------
/// Payload for the `Init` operation. The `TerminalKey` and `Token` fields are filled in by the client when
/// the request is signed and sent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitRequest {
    pub amount: Kopecks,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "NotificationURL", skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
    #[serde(rename = "SuccessURL", skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(rename = "FailURL", skip_serializing_if = "Option::is_none")]
    pub fail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// Itemized receipt. Serialized on the wire but excluded from the signature base.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
}

impl InitRequest {
    pub fn new<S: Into<String>>(amount: Kopecks, order_id: S) -> Self {
        Self {
            amount,
            order_id: order_id.into(),
            description: None,
            notification_url: None,
            success_url: None,
            fail_url: None,
            customer_email: None,
            customer_phone: None,
            receipt: None,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_urls(
        mut self,
        notification_url: Option<String>,
        success_url: Option<String>,
        fail_url: Option<String>,
    ) -> Self {
        self.notification_url = notification_url;
        self.success_url = success_url;
        self.fail_url = fail_url;
        self
    }

    pub fn with_customer_email<S: Into<String>>(mut self, email: S) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn with_receipt(mut self, receipt: Receipt) -> Self {
        self.receipt = Some(receipt);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Receipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub taxation: String,
    pub items: Vec<ReceiptItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiptItem {
    pub name: String,
    pub price: Kopecks,
    pub quantity: u32,
    pub amount: Kopecks,
    pub tax: String,
}

//--------------------------------------    GatewayResponse    --------------------------------------------------------
/// The provider's response envelope, shared by `Init`, `Cancel` and `Refund`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GatewayResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string_or_number")]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Kopecks>,
    #[serde(rename = "PaymentURL", default)]
    pub payment_url: Option<String>,
}

/// The provider sends `PaymentId` as a JSON string in some responses and as a number in others.
fn de_opt_string_or_number<'de, D>(d: D) -> Result<Option<String>, D::Error>
where D: Deserializer<'de> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

//--------------------------------------    CallbackFields     --------------------------------------------------------
/// Canonical form of an inbound callback. The provider uses two naming conventions for the same semantic
/// fields (`OrderId` / `orderId` and so on); this record normalizes them once, at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackFields {
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub status: Option<String>,
    pub success: bool,
    pub error_code: Option<String>,
    pub message: Option<String>,
    pub amount: Option<Kopecks>,
    pub token: Option<String>,
}

impl CallbackFields {
    pub fn from_params(params: &Map<String, Value>) -> Self {
        let success = match pick(params, "Success", "success") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => parse_boolean_flag(Some(s.clone()), false),
            Some(Value::Number(n)) => n.as_i64().map(|v| v != 0).unwrap_or(false),
            _ => false,
        };
        let amount = pick(params, "Amount", "amount").and_then(as_i64).map(Kopecks::from);
        Self {
            order_id: pick_string(params, "OrderId", "orderId"),
            payment_id: pick_string(params, "PaymentId", "paymentId"),
            status: pick_string(params, "Status", "status"),
            success,
            error_code: pick_string(params, "ErrorCode", "errorCode"),
            message: pick_string(params, "Message", "message"),
            amount,
            token: pick_string(params, "Token", "token"),
        }
    }
}

fn pick<'a>(params: &'a Map<String, Value>, primary: &str, alternate: &str) -> Option<&'a Value> {
    params.get(primary).or_else(|| params.get(alternate)).filter(|v| !v.is_null())
}

fn pick_string(params: &Map<String, Value>, primary: &str, alternate: &str) -> Option<String> {
    pick(params, primary, alternate).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn normalizes_pascal_cased_fields() {
        let params = json!({
            "OrderId": "wf-1-user-2-3",
            "PaymentId": 987654,
            "Status": "CONFIRMED",
            "Success": true,
            "Amount": 19900,
            "ErrorCode": "0",
            "Token": "abc",
        })
        .as_object()
        .unwrap()
        .clone();
        let fields = CallbackFields::from_params(&params);
        assert_eq!(fields.order_id.as_deref(), Some("wf-1-user-2-3"));
        assert_eq!(fields.payment_id.as_deref(), Some("987654"));
        assert_eq!(fields.status.as_deref(), Some("CONFIRMED"));
        assert!(fields.success);
        assert_eq!(fields.amount, Some(Kopecks::from(19900)));
    }

    #[test]
    fn normalizes_camel_cased_fields() {
        let params = json!({
            "orderId": "wf-1-user-2-3",
            "paymentId": "987654",
            "status": "REFUNDED",
            "success": "false",
            "amount": "500",
        })
        .as_object()
        .unwrap()
        .clone();
        let fields = CallbackFields::from_params(&params);
        assert_eq!(fields.order_id.as_deref(), Some("wf-1-user-2-3"));
        assert_eq!(fields.payment_id.as_deref(), Some("987654"));
        assert_eq!(fields.status.as_deref(), Some("REFUNDED"));
        assert!(!fields.success);
        assert_eq!(fields.amount, Some(Kopecks::from(500)));
    }

    #[test]
    fn missing_fields_stay_absent() {
        let fields = CallbackFields::from_params(&Map::new());
        assert_eq!(fields, CallbackFields::default());
    }

    #[test]
    fn init_request_serializes_provider_field_names() {
        let req = InitRequest::new(Kopecks::from(9900), "wf-1-user-2-3")
            .with_description("Watchface")
            .with_urls(Some("https://example.com/cb".into()), None, None);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["Amount"], json!(9900));
        assert_eq!(value["OrderId"], json!("wf-1-user-2-3"));
        assert_eq!(value["NotificationURL"], json!("https://example.com/cb"));
        assert!(value.get("SuccessURL").is_none());
    }

    #[test]
    fn gateway_response_accepts_string_or_numeric_payment_id() {
        let resp: GatewayResponse =
            serde_json::from_value(json!({ "Success": true, "PaymentId": "123" })).unwrap();
        assert_eq!(resp.payment_id.as_deref(), Some("123"));
        let resp: GatewayResponse =
            serde_json::from_value(json!({ "Success": true, "PaymentId": 456 })).unwrap();
        assert_eq!(resp.payment_id.as_deref(), Some("456"));
    }
}
