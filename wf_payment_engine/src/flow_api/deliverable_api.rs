use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{DeliverableFile, FileType, NewInstall},
    flow_api::errors::DeliverableError,
    traits::{DeliverableCatalog, PurchaseManagement},
};

/// Recency ordering for builds: version code first (rows without one sort last), then version string, then
/// row id, so the choice is deterministic even on legacy catalogs where the version code is missing.
fn release_key(file: &DeliverableFile) -> (Option<i64>, &str, i64) {
    (file.version_code, file.version.as_str(), file.id)
}

/// Pick the newest build among the candidates.
pub fn newest(files: &[DeliverableFile]) -> Option<&DeliverableFile> {
    files.iter().max_by_key(|&f| release_key(f))
}

/// Keep only the builds installable at the given device SDK level. An unset bound is unconstrained.
pub fn compatible_with(files: &[DeliverableFile], device_sdk: i64) -> Vec<&DeliverableFile> {
    files
        .iter()
        .filter(|f| f.min_sdk.map_or(true, |min| min <= device_sdk))
        .filter(|f| f.max_sdk.map_or(true, |max| max >= device_sdk))
        .collect()
}

/// True only when both version codes are known and the installed one is older. Absent data never implies an
/// update is available.
pub fn has_update(installed_version_code: Option<i64>, latest_version_code: Option<i64>) -> bool {
    match (installed_version_code, latest_version_code) {
        (Some(installed), Some(latest)) => installed < latest,
        _ => false,
    }
}

/// `DeliverableApi` resolves the correct installable build for a requesting device and records the resulting
/// install/download events.
pub struct DeliverableApi<B> {
    db: B,
}

impl<B> Debug for DeliverableApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeliverableApi")
    }
}

impl<B> DeliverableApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> DeliverableApi<B>
where B: DeliverableCatalog + PurchaseManagement
{
    /// The newest installable build for the product, ignoring device constraints.
    pub async fn latest(&self, product_id: i64) -> Result<Option<DeliverableFile>, DeliverableError> {
        let files = self.db.fetch_deliverables(product_id, FileType::Apk).await?;
        Ok(newest(&files).cloned())
    }

    /// The newest build compatible with the given device capability. With no capability given this behaves
    /// exactly like [`Self::latest`].
    pub async fn compatible(
        &self,
        product_id: i64,
        device_sdk: Option<i64>,
    ) -> Result<Option<DeliverableFile>, DeliverableError> {
        let files = self.db.fetch_deliverables(product_id, FileType::Apk).await?;
        let resolved = match device_sdk {
            Some(sdk) => compatible_with(&files, sdk).into_iter().max_by_key(|&f| release_key(f)),
            None => newest(&files),
        };
        Ok(resolved.cloned())
    }

    /// Resolve the deliverable for a requesting device and record the download as an install event.
    ///
    /// The buyer must either hold a purchase for the product or the product must be flagged free. A product
    /// with no compatible build yields [`DeliverableError::DeliverableUnavailable`], which is distinct from
    /// the product not existing at all.
    pub async fn fetch_deliverable(
        &self,
        product_id: i64,
        buyer_id: i64,
        device_sdk: Option<i64>,
    ) -> Result<DeliverableFile, DeliverableError> {
        let product =
            self.db.fetch_product(product_id).await?.ok_or(DeliverableError::ProductNotFound(product_id))?;
        if !product.is_free && self.db.fetch_purchase(product_id, buyer_id).await?.is_none() {
            debug!("📦️🔒️ Buyer {buyer_id} has no entitlement to product {product_id}");
            return Err(DeliverableError::NotEntitled { product_id, buyer_id });
        }
        let file = self
            .compatible(product_id, device_sdk)
            .await?
            .ok_or(DeliverableError::DeliverableUnavailable(product_id))?;
        let install =
            NewInstall { product_id, buyer_id, version_code: file.version_code, device_sdk };
        self.db.record_install(install).await?;
        info!("📦️ Resolved deliverable #{} (v{}) of product {product_id} for buyer {buyer_id}", file.id, file.version);
        Ok(file)
    }

    /// Whether the buyer's most recently installed build is older than the newest attached build.
    pub async fn update_available(&self, product_id: i64, buyer_id: i64) -> Result<bool, DeliverableError> {
        let installed = self.db.latest_install(product_id, buyer_id).await?.and_then(|i| i.version_code);
        let latest = self.latest(product_id).await?.and_then(|f| f.version_code);
        Ok(has_update(installed, latest))
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;

    fn file(id: i64, version: &str, version_code: Option<i64>, min_sdk: Option<i64>, max_sdk: Option<i64>) -> DeliverableFile {
        DeliverableFile {
            id,
            product_id: 1,
            file_type: FileType::Apk,
            version: version.to_string(),
            version_code,
            min_sdk,
            max_sdk,
            storage_ref: format!("uploads/{id}.apk"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn newest_prefers_version_code() {
        let files = vec![file(1, "1.0.0", Some(10), None, None), file(2, "2.0.0", Some(7), None, None)];
        assert_eq!(newest(&files).unwrap().id, 1);
    }

    #[test]
    fn newest_falls_back_to_version_string_then_id() {
        // Legacy rows without a version code sort after any row that has one
        let files = vec![file(5, "3.0.0", None, None, None), file(1, "1.0.0", Some(1), None, None)];
        assert_eq!(newest(&files).unwrap().id, 1);
        let files = vec![file(1, "1.2.0", None, None, None), file(2, "1.10.0", None, None, None)];
        // Plain string ordering: "1.2.0" > "1.10.0"
        assert_eq!(newest(&files).unwrap().id, 1);
        let files = vec![file(1, "1.0.0", None, None, None), file(2, "1.0.0", None, None, None)];
        assert_eq!(newest(&files).unwrap().id, 2);
    }

    #[test]
    fn newest_of_empty_catalog_is_none() {
        assert!(newest(&[]).is_none());
    }

    #[test]
    fn compatibility_bounds_are_inclusive_and_optional() {
        let files = vec![
            file(1, "2.0.0", Some(20), Some(24), None),
            file(2, "1.5.0", Some(15), Some(18), None),
            file(3, "1.0.0", Some(10), None, Some(19)),
        ];
        let survivors = compatible_with(&files, 21);
        let ids = survivors.iter().map(|f| f.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![2]);
        let survivors = compatible_with(&files, 24);
        let ids = survivors.iter().map(|f| f.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2]);
        let survivors = compatible_with(&files, 18);
        let ids = survivors.iter().map(|f| f.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn update_signal_requires_both_version_codes() {
        assert!(has_update(Some(5), Some(7)));
        assert!(!has_update(None, Some(7)));
        assert!(!has_update(Some(7), None));
        assert!(!has_update(Some(7), Some(7)));
        assert!(!has_update(Some(8), Some(7)));
    }
}
