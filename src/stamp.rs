//! Post-build version stamping.
//!
//! Runs once per build, between the upstream build tool and packaging. It
//! materializes the `info_rowid` lookup table (abbreviation to stable
//! language id) and writes a Unix-timestamp version marker into
//! `build_version`. Clients key their caches on that marker: a database
//! without one must never ship, so schema drift aborts with a non-zero exit
//! instead of skipping the stamp.

use anyhow::{bail, Result};
use sqlx::SqlitePool;
use std::path::Path;

use crate::db;

/// CLI entry point for `mcpdict stamp`.
pub async fn run_stamp(db_path: &Path) -> Result<()> {
    let pool = db::connect_read_write(db_path).await?;
    let version = stamp(&pool).await?;
    pool.close().await;

    println!("Stamped {} (version {})", db_path.display(), version);
    Ok(())
}

/// Stamp the database, returning the version written.
///
/// Idempotent in shape: re-stamping rebuilds `info_rowid` and replaces the
/// single `build_version` row with a fresh timestamp.
pub async fn stamp(pool: &SqlitePool) -> Result<i64> {
    for table in ["info", "langs"] {
        if !table_exists(pool, table).await? {
            bail!(
                "expected upstream table '{}' is missing; refusing to stamp (upstream schema change?)",
                table
            );
        }
    }

    sqlx::query("DROP TABLE IF EXISTS info_rowid")
        .execute(pool)
        .await?;
    sqlx::query("CREATE TABLE info_rowid (簡稱 TEXT PRIMARY KEY, 語言ID INTEGER)")
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO info_rowid(簡稱, 語言ID) SELECT 簡稱, info.ROWID FROM info")
        .execute(pool)
        .await?;

    sqlx::query("CREATE TABLE IF NOT EXISTS build_version (version INTEGER)")
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM build_version")
        .execute(pool)
        .await?;

    let version = chrono::Utc::now().timestamp();
    sqlx::query("INSERT INTO build_version(version) VALUES (?1)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(version)
}

pub async fn table_exists(pool: &SqlitePool, name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}
