use std::path::Path;

use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/wf_test_store_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database<P: AsRef<Path>>(path: P) {
    let p = path.as_ref().as_os_str().to_str().unwrap();
    if let Err(e) = Sqlite::drop_database(p).await {
        warn!("Error dropping database {p}: {e:?}");
    }
    Sqlite::create_database(p).await.expect("Error creating database");
    info!("Created Sqlite database {p}");
}

/// Insert a product row directly, returning its id. Products are collaborator-owned in production; tests
/// seed them here.
pub async fn seed_product(db: &SqliteDatabase, title: &str, price: i64, is_free: bool) -> i64 {
    let row: (i64,) = sqlx::query_as("INSERT INTO products (title, price, is_free) VALUES ($1, $2, $3) RETURNING id")
        .bind(title)
        .bind(price)
        .bind(is_free)
        .fetch_one(db.pool())
        .await
        .expect("Error seeding product");
    row.0
}

/// Attach a deliverable file row directly, returning its id.
#[allow(clippy::too_many_arguments)]
pub async fn seed_deliverable(
    db: &SqliteDatabase,
    product_id: i64,
    file_type: &str,
    version: &str,
    version_code: Option<i64>,
    min_sdk: Option<i64>,
    max_sdk: Option<i64>,
    storage_ref: &str,
) -> i64 {
    let row: (i64,) = sqlx::query_as(
        r#"
            INSERT INTO deliverable_files (product_id, file_type, version, version_code, min_sdk, max_sdk, storage_ref)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
        "#,
    )
    .bind(product_id)
    .bind(file_type)
    .bind(version)
    .bind(version_code)
    .bind(min_sdk)
    .bind(max_sdk)
    .bind(storage_ref)
    .fetch_one(db.pool())
    .await
    .expect("Error seeding deliverable");
    row.0
}
