use sqlx::SqliteConnection;

use crate::{
    db_types::{DeliverableFile, FileType, InstallRecord, NewInstall, Product},
    traits::CatalogError,
};

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, CatalogError> {
    let product = sqlx::query_as("SELECT id, title, price, is_free FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

pub async fn fetch_deliverables(
    product_id: i64,
    file_type: FileType,
    conn: &mut SqliteConnection,
) -> Result<Vec<DeliverableFile>, CatalogError> {
    let files = sqlx::query_as("SELECT * FROM deliverable_files WHERE product_id = $1 AND file_type = $2 ORDER BY id")
        .bind(product_id)
        .bind(file_type)
        .fetch_all(conn)
        .await?;
    Ok(files)
}

pub async fn record_install(install: NewInstall, conn: &mut SqliteConnection) -> Result<InstallRecord, CatalogError> {
    let record = sqlx::query_as(
        r#"
            INSERT INTO installs (product_id, buyer_id, version_code, device_sdk)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(install.product_id)
    .bind(install.buyer_id)
    .bind(install.version_code)
    .bind(install.device_sdk)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn latest_install(
    product_id: i64,
    buyer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<InstallRecord>, CatalogError> {
    let record = sqlx::query_as(
        "SELECT * FROM installs WHERE product_id = $1 AND buyer_id = $2 ORDER BY id DESC LIMIT 1",
    )
    .bind(product_id)
    .bind(buyer_id)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}
