use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use ledger_engine::SqliteDatabase;

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 1).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
}

pub fn random_db_path() -> String {
    format!("sqlite://../data/test_ledger_{}", rand::random::<u64>())
}

pub async fn create_database(url: &str) {
    if let Some(dir) = url.strip_prefix("sqlite://").and_then(|p| std::path::Path::new(p).parent()) {
        std::fs::create_dir_all(dir).expect("Error creating the test data folder");
    }
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("🚀️ Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("🚀️ Created Sqlite database {url}");
}
