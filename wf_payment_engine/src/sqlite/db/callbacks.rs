use log::debug;
use sqlx::SqliteConnection;
use wfm_common::Kopecks;

use crate::{
    db_types::{CallbackRecord, NewCallbackEvent},
    traits::LedgerError,
};

/// Appends the event to the ledger. There is no update path: entries are immutable once written.
pub async fn insert_callback(
    event: NewCallbackEvent,
    conn: &mut SqliteConnection,
) -> Result<CallbackRecord, LedgerError> {
    let payload = event.payload.to_string();
    let headers = event.headers.to_string();
    let record: CallbackRecord = sqlx::query_as(
        r#"
            INSERT INTO gateway_callbacks (
                order_id,
                payment_id,
                status,
                success,
                error_code,
                message,
                amount,
                token,
                token_valid,
                payload,
                headers,
                ip
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *;
        "#,
    )
    .bind(event.order_id)
    .bind(event.payment_id)
    .bind(event.status)
    .bind(event.success)
    .bind(event.error_code)
    .bind(event.message)
    .bind(event.amount)
    .bind(event.token)
    .bind(event.token_valid)
    .bind(payload)
    .bind(headers)
    .bind(event.ip)
    .fetch_one(conn)
    .await?;
    debug!("🧾️ Ledger entry #{} recorded (order: {:?}, valid: {})", record.id, record.order_id, record.token_valid);
    Ok(record)
}

/// The newest entry for the order id that carries a payment id.
pub async fn last_payment_id(order_id: &str, conn: &mut SqliteConnection) -> Result<Option<String>, LedgerError> {
    let payment_id: Option<(String,)> = sqlx::query_as(
        "SELECT payment_id FROM gateway_callbacks \
         WHERE order_id = $1 AND payment_id IS NOT NULL ORDER BY id DESC LIMIT 1",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(payment_id.map(|row| row.0))
}

/// The newest recorded amount for the order id.
pub async fn last_amount(order_id: &str, conn: &mut SqliteConnection) -> Result<Option<Kopecks>, LedgerError> {
    let amount: Option<(i64,)> = sqlx::query_as(
        "SELECT amount FROM gateway_callbacks \
         WHERE order_id = $1 AND amount IS NOT NULL ORDER BY id DESC LIMIT 1",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(amount.map(|row| Kopecks::from(row.0)))
}

/// The newest entry for the order id, regardless of its contents.
pub async fn last_callback(
    order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<CallbackRecord>, LedgerError> {
    let record = sqlx::query_as("SELECT * FROM gateway_callbacks WHERE order_id = $1 ORDER BY id DESC LIMIT 1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(record)
}
