//! Database migration command.

use filetree_core::config::AppConfig;
use filetree_core::error::AppError;
use filetree_database::DatabasePool;
use filetree_database::migration::run_migrations;

use crate::output;

/// Apply all pending migrations.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let pool = DatabasePool::connect(&config.database).await?;
    println!("Running database migrations...");
    run_migrations(pool.pool()).await?;
    pool.close().await;
    output::print_success("All migrations applied successfully.");
    Ok(())
}
