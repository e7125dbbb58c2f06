use thiserror::Error;

use crate::db_types::{DeliverableFile, FileType, InstallRecord, NewInstall, Product};

/// Read side of the versioned file catalog, plus the install-event sink. File upload and replacement are
/// owned by collaborators; the engine only reads the catalog.
#[allow(async_fn_in_trait)]
pub trait DeliverableCatalog: Clone {
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError>;

    /// All deliverables of the given type attached to the product, in storage order. Callers apply the
    /// newest/compatibility selection themselves.
    async fn fetch_deliverables(&self, product_id: i64, file_type: FileType) -> Result<Vec<DeliverableFile>, CatalogError>;

    async fn record_install(&self, install: NewInstall) -> Result<InstallRecord, CatalogError>;

    /// The most recent install event reported for the pair, if any.
    async fn latest_install(&self, product_id: i64, buyer_id: i64) -> Result<Option<InstallRecord>, CatalogError>;
}

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}
