use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, Type};
use thiserror::Error;
use tinkoff_tools::CallbackFields;
use wfm_common::{Kopecks, RUB_CURRENCY_CODE};

//--------------------------------------        OrderId        -------------------------------------------------------
/// A compact order identifier binding a product, a buyer and an issuance timestamp for one payment attempt.
///
/// Serializes to the fixed pattern `wf-{product_id}-user-{buyer_id}-{issued_at}`. The order id is a weak
/// back-reference from the payment domain into the purchase domain: it is embedded in ledger entries as a
/// plain string and parsed back out, never stored as a foreign key, because the ledger must retain entries
/// whose order id fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderId {
    pub product_id: i64,
    pub buyer_id: i64,
    pub issued_at: i64,
}

#[derive(Debug, Clone, Error)]
#[error("Malformed order id: {0}")]
pub struct OrderIdError(String);

impl OrderId {
    /// Create a fresh order id for a new payment attempt, stamped with the current time.
    pub fn new(product_id: i64, buyer_id: i64) -> Self {
        Self { product_id, buyer_id, issued_at: Utc::now().timestamp() }
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "wf-{}-user-{}-{}", self.product_id, self.buyer_id, self.issued_at)
    }
}

impl FromStr for OrderId {
    type Err = OrderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pattern = regex::Regex::new(r"^wf-(\d+)-user-(\d+)-(\d+)$").unwrap();
        let caps = pattern.captures(s).ok_or_else(|| OrderIdError(s.to_string()))?;
        let product_id = caps[1].parse::<i64>().map_err(|_| OrderIdError(s.to_string()))?;
        let buyer_id = caps[2].parse::<i64>().map_err(|_| OrderIdError(s.to_string()))?;
        let issued_at = caps[3].parse::<i64>().map_err(|_| OrderIdError(s.to_string()))?;
        if product_id <= 0 || buyer_id <= 0 {
            return Err(OrderIdError(s.to_string()));
        }
        Ok(Self { product_id, buyer_id, issued_at })
    }
}

//--------------------------------------   SettlementSignal    -------------------------------------------------------
/// Which state transition, if any, a callback's status token calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementSignal {
    /// The charge completed; the purchase should be settled.
    Paid,
    /// The charge was cancelled, reversed or refunded; the purchase should be revoked.
    Reversed,
    /// An intermediate status; no state action.
    Pending,
}

const PAID_STATUSES: [&str; 3] = ["CONFIRMED", "AUTHORIZED", "AUTHORIZED_AND_CONFIRM"];
const REVERSAL_STATUSES: [&str; 5] = ["CANCELED", "CANCELLED", "REVERSED", "PARTIAL_REVERSED", "REFUNDED"];

/// Classify a callback into a settlement signal. Status tokens are matched case-insensitively against the
/// provider's fixed sets; a truthy success flag settles even when the status token is unrecognized.
pub fn classify_callback(status: Option<&str>, success: bool) -> SettlementSignal {
    let normalized = status.map(str::to_uppercase).unwrap_or_default();
    if success || PAID_STATUSES.contains(&normalized.as_str()) {
        SettlementSignal::Paid
    } else if REVERSAL_STATUSES.contains(&normalized.as_str()) {
        SettlementSignal::Reversed
    } else {
        SettlementSignal::Pending
    }
}

//--------------------------------------   NewCallbackEvent    -------------------------------------------------------
/// One gateway event about to be appended to the ledger. Inbound callbacks carry the raw payload and request
/// metadata; successful `Init` calls append a synthetic entry so that the payment id and amount are always
/// recoverable by order id.
#[derive(Debug, Clone)]
pub struct NewCallbackEvent {
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub status: Option<String>,
    pub success: bool,
    pub error_code: Option<String>,
    pub message: Option<String>,
    pub amount: Option<Kopecks>,
    pub token: Option<String>,
    pub token_valid: bool,
    pub payload: Value,
    pub headers: Value,
    pub ip: Option<String>,
}

impl NewCallbackEvent {
    pub fn from_fields(fields: &CallbackFields, token_valid: bool, payload: Value) -> Self {
        Self {
            order_id: fields.order_id.clone(),
            payment_id: fields.payment_id.clone(),
            status: fields.status.clone(),
            success: fields.success,
            error_code: fields.error_code.clone(),
            message: fields.message.clone(),
            amount: fields.amount,
            token: fields.token.clone(),
            token_valid,
            payload,
            headers: Value::Null,
            ip: None,
        }
    }

    pub fn with_headers(mut self, headers: Value) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_ip<S: Into<String>>(mut self, ip: S) -> Self {
        self.ip = Some(ip.into());
        self
    }
}

//--------------------------------------    CallbackRecord     -------------------------------------------------------
/// A persisted ledger entry. Append-only: never updated after the signature validity has been recorded.
#[derive(Debug, Clone, FromRow)]
pub struct CallbackRecord {
    pub id: i64,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub status: Option<String>,
    pub success: bool,
    pub error_code: Option<String>,
    pub message: Option<String>,
    pub amount: Option<Kopecks>,
    pub token: Option<String>,
    pub token_valid: bool,
    pub payload: String,
    pub headers: String,
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The public fields of a ledger entry, as surfaced to success/fail landing pages.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackSummary {
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub status: Option<String>,
    pub success: bool,
    pub error_code: Option<String>,
    pub message: Option<String>,
    pub amount: Option<Kopecks>,
}

impl From<&CallbackRecord> for CallbackSummary {
    fn from(record: &CallbackRecord) -> Self {
        Self {
            order_id: record.order_id.clone(),
            payment_id: record.payment_id.clone(),
            status: record.status.clone(),
            success: record.success,
            error_code: record.error_code.clone(),
            message: record.message.clone(),
            amount: record.amount,
        }
    }
}

//--------------------------------------       Purchase        -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub product_id: i64,
    pub buyer_id: i64,
    pub price: Kopecks,
    pub currency: String,
}

impl NewPurchase {
    pub fn new(product_id: i64, buyer_id: i64, price: Kopecks) -> Self {
        Self { product_id, buyer_id, price, currency: RUB_CURRENCY_CODE.to_string() }
    }
}

/// A buyer's entitlement to a product. At most one row exists per (product, buyer) pair.
#[derive(Debug, Clone, FromRow)]
pub struct Purchase {
    pub id: i64,
    pub product_id: i64,
    pub buyer_id: i64,
    pub price: Kopecks,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Product        -------------------------------------------------------
/// The slice of product metadata the engine consumes: fallback pricing and the free flag.
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub price: Kopecks,
    pub is_free: bool,
}

//--------------------------------------       FileType        -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(rename_all = "snake_case")]
pub enum FileType {
    Apk,
    Icon,
    Banner,
    Screenshot,
    PreviewVideo,
}

impl Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::Apk => write!(f, "apk"),
            FileType::Icon => write!(f, "icon"),
            FileType::Banner => write!(f, "banner"),
            FileType::Screenshot => write!(f, "screenshot"),
            FileType::PreviewVideo => write!(f, "preview_video"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid file type: {0}")]
pub struct FileTypeError(String);

impl FromStr for FileType {
    type Err = FileTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apk" => Ok(Self::Apk),
            "icon" => Ok(Self::Icon),
            "banner" => Ok(Self::Banner),
            "screenshot" => Ok(Self::Screenshot),
            "preview_video" => Ok(Self::PreviewVideo),
            s => Err(FileTypeError(s.to_string())),
        }
    }
}

//--------------------------------------    DeliverableFile    -------------------------------------------------------
/// One versioned build attached to a product. `version_code` is nullable on legacy rows; `min_sdk`/`max_sdk`
/// are nullable when the build is unconstrained on that side.
#[derive(Debug, Clone, FromRow)]
pub struct DeliverableFile {
    pub id: i64,
    pub product_id: i64,
    pub file_type: FileType,
    pub version: String,
    pub version_code: Option<i64>,
    pub min_sdk: Option<i64>,
    pub max_sdk: Option<i64>,
    pub storage_ref: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------    InstallRecord      -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewInstall {
    pub product_id: i64,
    pub buyer_id: i64,
    pub version_code: Option<i64>,
    pub device_sdk: Option<i64>,
}

/// A device-reported install/download event. Read back to decide whether an update is available.
#[derive(Debug, Clone, FromRow)]
pub struct InstallRecord {
    pub id: i64,
    pub product_id: i64,
    pub buyer_id: i64,
    pub version_code: Option<i64>,
    pub device_sdk: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_id_round_trips() {
        let oid = OrderId { product_id: 42, buyer_id: 7, issued_at: 1700000000 };
        let encoded = oid.to_string();
        assert_eq!(encoded, "wf-42-user-7-1700000000");
        assert_eq!(encoded.parse::<OrderId>().unwrap(), oid);
    }

    #[test]
    fn order_id_rejects_non_matching_patterns() {
        for bad in [
            "",
            "wf-12-user-3",
            "wf-12-user-3-100-extra",
            "wf--user-3-100",
            "wf-12-user--100",
            "xx-12-user-3-100",
            "wf-12-user-3-abc",
            "wf-12.5-user-3-100",
            " wf-12-user-3-100",
        ] {
            assert!(bad.parse::<OrderId>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn order_id_rejects_non_positive_ids() {
        assert!("wf-0-user-3-100".parse::<OrderId>().is_err());
        assert!("wf-12-user-0-100".parse::<OrderId>().is_err());
    }

    #[test]
    fn order_id_timestamp_is_not_range_checked() {
        let oid = "wf-1-user-2-0".parse::<OrderId>().unwrap();
        assert_eq!(oid.issued_at, 0);
    }

    #[test]
    fn classify_paid_statuses() {
        assert_eq!(classify_callback(Some("CONFIRMED"), false), SettlementSignal::Paid);
        assert_eq!(classify_callback(Some("authorized"), false), SettlementSignal::Paid);
        assert_eq!(classify_callback(Some("AUTHORIZED_AND_CONFIRM"), false), SettlementSignal::Paid);
        // A truthy success flag settles even with an unknown status token
        assert_eq!(classify_callback(Some("SOMETHING_ELSE"), true), SettlementSignal::Paid);
        assert_eq!(classify_callback(None, true), SettlementSignal::Paid);
    }

    #[test]
    fn classify_reversal_statuses() {
        for status in ["CANCELED", "cancelled", "REVERSED", "PARTIAL_REVERSED", "refunded"] {
            assert_eq!(classify_callback(Some(status), false), SettlementSignal::Reversed, "{status}");
        }
    }

    #[test]
    fn classify_pending_statuses() {
        assert_eq!(classify_callback(Some("NEW"), false), SettlementSignal::Pending);
        assert_eq!(classify_callback(Some("FORM_SHOWED"), false), SettlementSignal::Pending);
        assert_eq!(classify_callback(None, false), SettlementSignal::Pending);
    }
}
