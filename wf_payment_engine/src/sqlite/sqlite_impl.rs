//! `SqliteDatabase` is the concrete SQLite backend for the payment engine. It implements all the storage
//! contracts defined in the [`traits`](crate::traits) module.
use std::fmt::Debug;

use sqlx::SqlitePool;
use wfm_common::Kopecks;

use super::db::{callbacks, db_url, deliverables, new_pool, purchases};
use crate::{
    db_types::{
        CallbackRecord,
        DeliverableFile,
        FileType,
        InstallRecord,
        NewCallbackEvent,
        NewInstall,
        NewPurchase,
        Product,
        Purchase,
    },
    traits::{CatalogError, DeliverableCatalog, LedgerError, PaymentLedger, PurchaseError, PurchaseManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new connection pool to the database at `WFM_DATABASE_URL`, or the default path if unset.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    /// Creates a new connection pool to the database at the given URL.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl PaymentLedger for SqliteDatabase {
    async fn insert_callback(&self, event: NewCallbackEvent) -> Result<CallbackRecord, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(|e| LedgerError::DatabaseError(e.to_string()))?;
        callbacks::insert_callback(event, &mut conn).await
    }

    async fn last_payment_id(&self, order_id: &str) -> Result<Option<String>, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(|e| LedgerError::DatabaseError(e.to_string()))?;
        callbacks::last_payment_id(order_id, &mut conn).await
    }

    async fn last_amount(&self, order_id: &str) -> Result<Option<Kopecks>, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(|e| LedgerError::DatabaseError(e.to_string()))?;
        callbacks::last_amount(order_id, &mut conn).await
    }

    async fn last_callback(&self, order_id: &str) -> Result<Option<CallbackRecord>, LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(|e| LedgerError::DatabaseError(e.to_string()))?;
        callbacks::last_callback(order_id, &mut conn).await
    }
}

impl PurchaseManagement for SqliteDatabase {
    async fn upsert_purchase(&self, purchase: NewPurchase) -> Result<(Purchase, bool), PurchaseError> {
        let mut conn = self.pool.acquire().await.map_err(|e| PurchaseError::DatabaseError(e.to_string()))?;
        purchases::upsert_purchase(purchase, &mut conn).await
    }

    async fn remove_purchase(&self, product_id: i64, buyer_id: i64) -> Result<bool, PurchaseError> {
        let mut conn = self.pool.acquire().await.map_err(|e| PurchaseError::DatabaseError(e.to_string()))?;
        purchases::remove_purchase(product_id, buyer_id, &mut conn).await
    }

    async fn fetch_purchase(&self, product_id: i64, buyer_id: i64) -> Result<Option<Purchase>, PurchaseError> {
        let mut conn = self.pool.acquire().await.map_err(|e| PurchaseError::DatabaseError(e.to_string()))?;
        purchases::fetch_purchase(product_id, buyer_id, &mut conn).await
    }
}

impl DeliverableCatalog for SqliteDatabase {
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await.map_err(|e| CatalogError::DatabaseError(e.to_string()))?;
        deliverables::fetch_product(product_id, &mut conn).await
    }

    async fn fetch_deliverables(
        &self,
        product_id: i64,
        file_type: FileType,
    ) -> Result<Vec<DeliverableFile>, CatalogError> {
        let mut conn = self.pool.acquire().await.map_err(|e| CatalogError::DatabaseError(e.to_string()))?;
        deliverables::fetch_deliverables(product_id, file_type, &mut conn).await
    }

    async fn record_install(&self, install: NewInstall) -> Result<InstallRecord, CatalogError> {
        let mut conn = self.pool.acquire().await.map_err(|e| CatalogError::DatabaseError(e.to_string()))?;
        deliverables::record_install(install, &mut conn).await
    }

    async fn latest_install(&self, product_id: i64, buyer_id: i64) -> Result<Option<InstallRecord>, CatalogError> {
        let mut conn = self.pool.acquire().await.map_err(|e| CatalogError::DatabaseError(e.to_string()))?;
        deliverables::latest_install(product_id, buyer_id, &mut conn).await
    }
}
