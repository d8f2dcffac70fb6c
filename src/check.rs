//! Database verification.
//!
//! The build-time gate before packaging: confirms the upstream build and the
//! stamping step both ran, and prints a short summary. Used by `mcpdict
//! check` in CI so a broken or unstamped artifact never ships.

use anyhow::{bail, Result};
use std::path::Path;

use crate::db;
use crate::query;
use crate::stamp;

pub async fn run_check(db_path: &Path) -> Result<()> {
    let pool = db::connect_read_only(db_path).await?;

    for table in ["info", "langs", "info_rowid", "build_version"] {
        if !stamp::table_exists(&pool, table).await? {
            bail!("missing table '{}'; the database is incomplete", table);
        }
    }

    let version_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM build_version")
        .fetch_one(&pool)
        .await?;
    if version_rows != 1 {
        bail!(
            "build_version holds {} rows, expected exactly 1",
            version_rows
        );
    }

    let version = query::load_version(&pool).await?;

    let language_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM info WHERE 簡稱 <> '漢字'")
            .fetch_one(&pool)
            .await?;
    let reading_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM langs")
        .fetch_one(&pool)
        .await?;

    let db_size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    println!("MCPDict — Database Check");
    println!("========================");
    println!();
    println!("  Database:   {}", db_path.display());
    println!("  Size:       {}", format_bytes(db_size));
    println!("  Version:    {}", version);
    println!("  Languages:  {}", language_count);
    println!("  Readings:   {}", reading_count);
    println!();
    println!("ok");

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
