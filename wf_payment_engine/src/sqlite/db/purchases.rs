use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPurchase, Purchase},
    traits::PurchaseError,
};

/// Conditional insert against the (product_id, buyer_id) UNIQUE constraint. Duplicate deliveries of the
/// same settlement converge on the first inserted row; the existing price and currency are never replaced.
pub async fn upsert_purchase(
    purchase: NewPurchase,
    conn: &mut SqliteConnection,
) -> Result<(Purchase, bool), PurchaseError> {
    let result = sqlx::query(
        r#"
            INSERT INTO purchases (product_id, buyer_id, price, currency)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_id, buyer_id) DO NOTHING;
        "#,
    )
    .bind(purchase.product_id)
    .bind(purchase.buyer_id)
    .bind(purchase.price)
    .bind(&purchase.currency)
    .execute(&mut *conn)
    .await?;
    let inserted = result.rows_affected() > 0;
    if inserted {
        debug!("🧾️ Purchase recorded for product {} by buyer {}", purchase.product_id, purchase.buyer_id);
    } else {
        debug!(
            "🧾️ Purchase for product {} by buyer {} already settled. Keeping the original price.",
            purchase.product_id, purchase.buyer_id
        );
    }
    let record = fetch_purchase(purchase.product_id, purchase.buyer_id, conn)
        .await?
        .ok_or(PurchaseError::MissingAfterUpsert(purchase.product_id, purchase.buyer_id))?;
    Ok((record, inserted))
}

/// Removes the purchase if present. Returns `true` when a row was deleted.
pub async fn remove_purchase(
    product_id: i64,
    buyer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, PurchaseError> {
    let result = sqlx::query("DELETE FROM purchases WHERE product_id = $1 AND buyer_id = $2")
        .bind(product_id)
        .bind(buyer_id)
        .execute(conn)
        .await?;
    let removed = result.rows_affected() > 0;
    if removed {
        debug!("🧾️ Purchase for product {product_id} by buyer {buyer_id} revoked");
    }
    Ok(removed)
}

pub async fn fetch_purchase(
    product_id: i64,
    buyer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Purchase>, PurchaseError> {
    let purchase = sqlx::query_as("SELECT * FROM purchases WHERE product_id = $1 AND buyer_id = $2")
        .bind(product_id)
        .bind(buyer_id)
        .fetch_optional(conn)
        .await?;
    Ok(purchase)
}
