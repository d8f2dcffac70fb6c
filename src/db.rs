use anyhow::{bail, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Open the database read-only for serving.
///
/// The serving process treats the file as immutable: queries are rejected at
/// the SQLite level (`query_only`), schema-embedded SQL is not trusted, and
/// temp state stays in memory.
pub async fn connect_read_only(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        bail!("database not found: {}", db_path.display());
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .read_only(true)
        .busy_timeout(Duration::from_millis(2000))
        .pragma("query_only", "ON")
        .pragma("trusted_schema", "OFF")
        .pragma("temp_store", "MEMORY");

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Open the database read-write for stamping. Never creates the file: a
/// missing database means the upstream build has not run.
pub async fn connect_read_write(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        bail!(
            "database not found: {} (run `mcpdict build` first)",
            db_path.display()
        );
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(false)
        .busy_timeout(Duration::from_millis(2000));

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}
