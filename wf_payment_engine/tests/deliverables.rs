use wf_payment_engine::{
    test_utils::prepare_env::{prepare_test_env, random_db_path, seed_deliverable, seed_product},
    DeliverableApi,
    DeliverableCatalog,
    DeliverableError,
    PurchaseManagement,
    SqliteDatabase,
};
use wfm_common::Kopecks;

async fn setup() -> (SqliteDatabase, DeliverableApi<SqliteDatabase>) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    (db.clone(), DeliverableApi::new(db))
}

async fn grant(db: &SqliteDatabase, product_id: i64, buyer_id: i64) {
    let purchase = wf_payment_engine::db_types::NewPurchase::new(product_id, buyer_id, Kopecks::from(9900));
    db.upsert_purchase(purchase).await.expect("Error granting purchase");
}

#[tokio::test]
async fn latest_build_is_resolved_by_version_code() {
    let (db, api) = setup().await;
    let product_id = seed_product(&db, "Chrono", 19900, false).await;
    seed_deliverable(&db, product_id, "apk", "1.0.0", Some(10), None, None, "uploads/a.apk").await;
    // A legacy row without a version code never outranks one that has one
    seed_deliverable(&db, product_id, "apk", "2.0.0", None, None, None, "uploads/legacy.apk").await;
    let top = seed_deliverable(&db, product_id, "apk", "1.5.0", Some(15), None, None, "uploads/b.apk").await;

    let latest = api.latest(product_id).await.unwrap().expect("Expected a build");
    assert_eq!(latest.id, top);
    assert_eq!(latest.version, "1.5.0");
}

#[tokio::test]
async fn device_capability_filters_incompatible_builds() {
    let (db, api) = setup().await;
    let product_id = seed_product(&db, "Chrono", 19900, false).await;
    let old = seed_deliverable(&db, product_id, "apk", "1.0.0", Some(10), Some(18), None, "uploads/old.apk").await;
    let new = seed_deliverable(&db, product_id, "apk", "2.0.0", Some(20), Some(24), None, "uploads/new.apk").await;

    // A device below the newest build's minimum gets the older compatible build
    let resolved = api.compatible(product_id, Some(21)).await.unwrap().expect("Expected a build");
    assert_eq!(resolved.id, old);
    // A capable device gets the newest build
    let resolved = api.compatible(product_id, Some(24)).await.unwrap().expect("Expected a build");
    assert_eq!(resolved.id, new);
    // No capability reported: newest build, unconditionally
    let resolved = api.compatible(product_id, None).await.unwrap().expect("Expected a build");
    assert_eq!(resolved.id, new);
    // Nothing installable at all
    assert!(api.compatible(product_id, Some(12)).await.unwrap().is_none());
}

#[tokio::test]
async fn fetch_deliverable_enforces_entitlement() {
    let (db, api) = setup().await;
    let product_id = seed_product(&db, "Chrono", 19900, false).await;
    seed_deliverable(&db, product_id, "apk", "1.0.0", Some(10), None, None, "uploads/a.apk").await;

    let err = api.fetch_deliverable(product_id + 100, 7, None).await.unwrap_err();
    assert!(matches!(err, DeliverableError::ProductNotFound(_)));

    let err = api.fetch_deliverable(product_id, 7, None).await.unwrap_err();
    assert!(matches!(err, DeliverableError::NotEntitled { .. }));

    grant(&db, product_id, 7).await;
    let file = api.fetch_deliverable(product_id, 7, None).await.expect("Entitled buyer was refused");
    assert_eq!(file.storage_ref, "uploads/a.apk");
}

#[tokio::test]
async fn free_products_need_no_purchase() {
    let (db, api) = setup().await;
    let product_id = seed_product(&db, "Freebie", 0, true).await;
    seed_deliverable(&db, product_id, "apk", "1.0.0", Some(1), None, None, "uploads/free.apk").await;

    let file = api.fetch_deliverable(product_id, 99, None).await.expect("Free product was refused");
    assert_eq!(file.storage_ref, "uploads/free.apk");
}

#[tokio::test]
async fn entitled_buyer_with_no_compatible_build_gets_unavailable() {
    let (db, api) = setup().await;
    let product_id = seed_product(&db, "Chrono", 19900, false).await;
    seed_deliverable(&db, product_id, "apk", "2.0.0", Some(20), Some(24), None, "uploads/new.apk").await;
    grant(&db, product_id, 7).await;

    let err = api.fetch_deliverable(product_id, 7, Some(21)).await.unwrap_err();
    assert!(matches!(err, DeliverableError::DeliverableUnavailable(_)));
}

#[tokio::test]
async fn downloads_are_recorded_as_installs() {
    let (db, api) = setup().await;
    let product_id = seed_product(&db, "Chrono", 19900, false).await;
    seed_deliverable(&db, product_id, "apk", "1.2.0", Some(12), None, None, "uploads/a.apk").await;
    grant(&db, product_id, 7).await;

    assert!(db.latest_install(product_id, 7).await.unwrap().is_none());
    api.fetch_deliverable(product_id, 7, Some(26)).await.unwrap();
    let install = db.latest_install(product_id, 7).await.unwrap().expect("Install was not recorded");
    assert_eq!(install.version_code, Some(12));
    assert_eq!(install.device_sdk, Some(26));
}

#[tokio::test]
async fn update_available_compares_installed_and_newest_version_codes() {
    let (db, api) = setup().await;
    let product_id = seed_product(&db, "Chrono", 19900, false).await;
    seed_deliverable(&db, product_id, "apk", "1.0.0", Some(10), None, None, "uploads/a.apk").await;
    grant(&db, product_id, 7).await;

    // No install on record yet
    assert!(!api.update_available(product_id, 7).await.unwrap());

    api.fetch_deliverable(product_id, 7, None).await.unwrap();
    assert!(!api.update_available(product_id, 7).await.unwrap());

    seed_deliverable(&db, product_id, "apk", "1.1.0", Some(11), None, None, "uploads/b.apk").await;
    assert!(api.update_available(product_id, 7).await.unwrap());

    // Downloading the newer build clears the signal
    api.fetch_deliverable(product_id, 7, None).await.unwrap();
    assert!(!api.update_available(product_id, 7).await.unwrap());
}

#[tokio::test]
async fn non_apk_files_never_resolve_as_builds() {
    let (db, api) = setup().await;
    let product_id = seed_product(&db, "Chrono", 19900, false).await;
    seed_deliverable(&db, product_id, "icon", "1.0.0", None, None, None, "uploads/icon.png").await;
    seed_deliverable(&db, product_id, "screenshot", "1.0.0", None, None, None, "uploads/shot.png").await;

    assert!(api.latest(product_id).await.unwrap().is_none());
}
