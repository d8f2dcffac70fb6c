use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use tempfile::TempDir;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};

fn mcpdict_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("mcpdict");
    path
}

fn setup_test_env() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let db_path = data_dir.join("mcpdict.db");

    let config_content = format!(
        r#"[db]
path = "{}/data/mcpdict.db"

[server]
bind = "127.0.0.1:0"
max_chars = 128
"#,
        root.display()
    );

    let config_path = config_dir.join("mcpdict.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path, db_path)
}

fn run_mcpdict(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = mcpdict_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run mcpdict binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// Build a miniature upstream-shaped database: the `info` table plus the
/// `langs` FTS index, as the upstream build tool would leave them.
fn create_upstream_db(db_path: &Path, with_langs: bool) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    rt.block_on(async {
        let mut conn = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .unwrap()
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE info (
                語言 TEXT, 簡稱 TEXT,
                地圖集二排序 TEXT, 地圖集二顏色 TEXT, 地圖集二分區 TEXT,
                音典排序 TEXT, 音典顏色 TEXT, 音典分區 TEXT,
                陳邡排序 TEXT, 陳邡顏色 TEXT, 陳邡分區 TEXT,
                地點 TEXT, 經緯度 TEXT
            )
            "#,
        )
        .execute(&mut conn)
        .await
        .unwrap();

        for (name, abbr) in [("漢字", "漢字"), ("潮州話", "潮州"), ("上海話", "上海")] {
            sqlx::query(
                "INSERT INTO info (語言, 簡稱, 地點) VALUES (?1, ?2, ?3)",
            )
            .bind(name)
            .bind(abbr)
            .bind("某地")
            .execute(&mut conn)
            .await
            .unwrap();
        }

        if with_langs {
            sqlx::query("CREATE VIRTUAL TABLE langs USING fts5(語言, 讀音, 註釋, 字組)")
                .execute(&mut conn)
                .await
                .unwrap();

            for (lang, reading, note, ch) in [
                ("潮州", "si5", "", "是"),
                ("上海", "sɿ1", "*思*想", "是"),
                ("上海", "sɿ5", "意*思*", "是"),
                ("上海", "sɿ1", "", "社"),
            ] {
                sqlx::query("INSERT INTO langs (語言, 讀音, 註釋, 字組) VALUES (?1, ?2, ?3, ?4)")
                    .bind(lang)
                    .bind(reading)
                    .bind(note)
                    .bind(ch)
                    .execute(&mut conn)
                    .await
                    .unwrap();
            }
        }

        conn.close().await.unwrap();
    });
}

fn query_scalar_i64(db_path: &Path, sql: &str) -> Result<i64, String> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    rt.block_on(async {
        let mut conn = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .map_err(|e| e.to_string())?
            .connect()
            .await
            .map_err(|e| e.to_string())?;
        let value: i64 = sqlx::query_scalar(sql)
            .fetch_one(&mut conn)
            .await
            .map_err(|e| e.to_string())?;
        conn.close().await.ok();
        Ok(value)
    })
}

#[test]
fn test_stamp_writes_version() {
    let (_tmp, config_path, db_path) = setup_test_env();
    create_upstream_db(&db_path, true);

    let (stdout, stderr, success) = run_mcpdict(&config_path, &["stamp"]);
    assert!(success, "stamp failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("version"));

    let version = query_scalar_i64(&db_path, "SELECT version FROM build_version").unwrap();
    assert!(version > 0, "expected a positive Unix timestamp");

    let mapped = query_scalar_i64(&db_path, "SELECT COUNT(*) FROM info_rowid").unwrap();
    assert_eq!(mapped, 3, "info_rowid should cover every info row");
}

#[test]
fn test_stamp_twice_keeps_single_version_row() {
    let (_tmp, config_path, db_path) = setup_test_env();
    create_upstream_db(&db_path, true);

    let (_, _, success1) = run_mcpdict(&config_path, &["stamp"]);
    assert!(success1, "first stamp failed");
    let (_, _, success2) = run_mcpdict(&config_path, &["stamp"]);
    assert!(success2, "second stamp failed");

    let rows = query_scalar_i64(&db_path, "SELECT COUNT(*) FROM build_version").unwrap();
    assert_eq!(rows, 1, "re-stamping must replace the marker, not append");
}

#[test]
fn test_stamp_fails_on_missing_upstream_table() {
    let (_tmp, config_path, db_path) = setup_test_env();
    create_upstream_db(&db_path, false);

    let (_, stderr, success) = run_mcpdict(&config_path, &["stamp"]);
    assert!(!success, "stamp should fail when 'langs' is missing");
    assert!(
        stderr.contains("langs"),
        "should name the missing table, got: {}",
        stderr
    );

    // A refused stamp must not leave a version marker behind.
    let result = query_scalar_i64(&db_path, "SELECT COUNT(*) FROM build_version");
    assert!(result.is_err(), "build_version must not exist after a refused stamp");
}

#[test]
fn test_stamp_fails_on_missing_database() {
    let (_tmp, config_path, _db_path) = setup_test_env();

    let (_, stderr, success) = run_mcpdict(&config_path, &["stamp"]);
    assert!(!success, "stamp should fail without a database file");
    assert!(
        stderr.contains("database not found"),
        "should report the missing file, got: {}",
        stderr
    );
}

#[test]
fn test_check_passes_on_stamped_database() {
    let (_tmp, config_path, db_path) = setup_test_env();
    create_upstream_db(&db_path, true);
    run_mcpdict(&config_path, &["stamp"]);

    let (stdout, stderr, success) = run_mcpdict(&config_path, &["check"]);
    assert!(success, "check failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("ok"));
    assert!(stdout.contains("Languages:  2"), "got: {}", stdout);
    assert!(stdout.contains("Readings:   4"), "got: {}", stdout);
}

#[test]
fn test_check_fails_on_unstamped_database() {
    let (_tmp, config_path, db_path) = setup_test_env();
    create_upstream_db(&db_path, true);

    let (_, stderr, success) = run_mcpdict(&config_path, &["check"]);
    assert!(!success, "check should fail before stamping");
    assert!(
        stderr.contains("info_rowid") || stderr.contains("build_version"),
        "should name the missing table, got: {}",
        stderr
    );
}

#[test]
fn test_serve_refuses_unstamped_database() {
    let (_tmp, config_path, db_path) = setup_test_env();
    create_upstream_db(&db_path, true);

    let (_, stderr, success) = run_mcpdict(&config_path, &["serve"]);
    assert!(!success, "serve should refuse a database without a version marker");
    assert!(
        stderr.contains("build_version") || stderr.contains("version marker"),
        "should mention the missing version, got: {}",
        stderr
    );
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("nope.toml");

    let (_, stderr, success) = run_mcpdict(&config_path, &["check"]);
    assert!(!success);
    assert!(
        stderr.contains("config"),
        "should mention the config file, got: {}",
        stderr
    );
}

#[test]
fn test_invalid_config_rejected() {
    let (_tmp, config_path, _db_path) = setup_test_env();
    fs::write(
        &config_path,
        r#"[db]
path = "whatever.db"

[server]
bind = ""
"#,
    )
    .unwrap();

    let (_, stderr, success) = run_mcpdict(&config_path, &["check"]);
    assert!(!success);
    assert!(
        stderr.contains("server.bind"),
        "should reject the empty bind address, got: {}",
        stderr
    );
}
