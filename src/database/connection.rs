use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use super::migrations::Migrator;

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

pub fn get_database_url(database_path: Option<&str>) -> String {
    match database_path {
        Some(":memory:") => "sqlite::memory:".to_string(),
        Some(path) => format!("sqlite:{}?mode=rwc", path),
        None => "sqlite:oms-staging.db?mode=rwc".to_string(),
    }
}

/// Connects and brings the staging schema up to date.
pub async fn setup_database(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = establish_connection(database_url).await?;
    Migrator::up(&db, None).await?;
    info!("Staging database ready");
    Ok(db)
}
