//! Read-only queries over the stamped MCPDict database.
//!
//! Used by both the HTTP handlers in [`crate::server`] and the `mcpdict
//! check` command. All functions take a pool opened with
//! [`crate::db::connect_read_only`] and never write.

use anyhow::{bail, Context, Result};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use sqlx::{Row, SqlitePool};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{Language, Reading, ReadingCell};

/// Label of the first header column in a `/chars/` response.
pub const LANGUAGE_ID_HEADER: &str = "語言ID";

/// Load the version marker stamped into `build_version`.
///
/// A missing table or empty marker is fatal: a serving process must never
/// answer queries without a version.
pub async fn load_version(pool: &SqlitePool) -> Result<String> {
    let version: Option<String> =
        sqlx::query_scalar("SELECT CAST(version AS TEXT) FROM build_version LIMIT 1")
            .fetch_optional(pool)
            .await
            .context("failed to read the build_version table (run `mcpdict stamp`?)")?;

    match version {
        Some(v) if !v.is_empty() => Ok(v),
        _ => bail!("no version marker in build_version (run `mcpdict stamp`?)"),
    }
}

/// Fetch every language variety, ordered by `語言ID` ascending.
///
/// The `簡稱 = '漢字'` row is character metadata, not a language, and is
/// excluded. The sort columns are cast to TEXT so the whole tuple is opaque
/// display strings regardless of upstream column affinity.
pub async fn list_langs(pool: &SqlitePool) -> Result<Vec<Language>> {
    let rows = sqlx::query(
        r#"
        SELECT
            ROWID AS language_id,
            語言 AS name,
            簡稱 AS abbreviation,
            CAST(地圖集二排序 AS TEXT) AS atlas_sort,
            地圖集二顏色 AS atlas_color,
            地圖集二分區 AS atlas_region,
            CAST(音典排序 AS TEXT) AS yindian_sort,
            音典顏色 AS yindian_color,
            音典分區 AS yindian_region,
            CAST(陳邡排序 AS TEXT) AS chenfang_sort,
            陳邡顏色 AS chenfang_color,
            陳邡分區 AS chenfang_region,
            地點 AS location,
            經緯度 AS coordinates
        FROM info
        WHERE 簡稱 <> '漢字'
        ORDER BY ROWID
        "#,
    )
    .fetch_all(pool)
    .await
    .context("failed to query the info table")?;

    let langs = rows
        .iter()
        .map(|row| Language {
            language_id: row.get("language_id"),
            name: row.get("name"),
            abbreviation: row.get("abbreviation"),
            atlas_sort: row.get("atlas_sort"),
            atlas_color: row.get("atlas_color"),
            atlas_region: row.get("atlas_region"),
            yindian_sort: row.get("yindian_sort"),
            yindian_color: row.get("yindian_color"),
            yindian_region: row.get("yindian_region"),
            chenfang_sort: row.get("chenfang_sort"),
            chenfang_color: row.get("chenfang_color"),
            chenfang_region: row.get("chenfang_region"),
            location: row.get("location"),
            coordinates: row.get("coordinates"),
        })
        .collect();

    Ok(langs)
}

/// The sparse readings table returned by `/chars/`.
///
/// Serializes as `[header, row, …]` where the header is `["語言ID", char…]`
/// and every data row is `[language_id, cell…]` with cells in header order.
#[derive(Debug)]
pub struct CharsTable {
    pub header: Vec<String>,
    pub rows: Vec<CharsRow>,
}

#[derive(Debug)]
pub struct CharsRow {
    pub language_id: i64,
    pub cells: Vec<ReadingCell>,
}

impl Serialize for CharsTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(1 + self.rows.len()))?;
        seq.serialize_element(&self.header)?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

impl Serialize for CharsRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(1 + self.cells.len()))?;
        seq.serialize_element(&self.language_id)?;
        for cell in &self.cells {
            seq.serialize_element(cell)?;
        }
        seq.end()
    }
}

/// Distinct characters of `chars` in first-occurrence order.
pub fn distinct_chars(chars: &str) -> Vec<char> {
    let mut seen = BTreeSet::new();
    chars.chars().filter(|c| seen.insert(*c)).collect()
}

/// Look up readings for every character of `chars` and assemble the sparse
/// table described in the module docs.
///
/// Duplicate characters in the input are queried once but keep their own
/// header column. Characters unknown to the dataset contribute empty cells.
/// Languages without a single reading across the queried characters are
/// omitted entirely. Rows are ordered by `語言ID` ascending.
pub async fn chars_table(pool: &SqlitePool, chars: &str) -> Result<CharsTable> {
    let queried: Vec<char> = chars.chars().collect();

    let mut per_char: HashMap<char, BTreeMap<i64, Vec<Reading>>> = HashMap::new();
    for ch in distinct_chars(chars) {
        per_char.insert(ch, readings_for_char(pool, ch).await?);
    }

    let mut language_ids: BTreeSet<i64> = BTreeSet::new();
    for by_lang in per_char.values() {
        language_ids.extend(by_lang.keys().copied());
    }

    let mut header = Vec::with_capacity(1 + queried.len());
    header.push(LANGUAGE_ID_HEADER.to_string());
    header.extend(queried.iter().map(|c| c.to_string()));

    let rows = language_ids
        .iter()
        .map(|&language_id| CharsRow {
            language_id,
            cells: queried
                .iter()
                .map(|ch| {
                    per_char
                        .get(ch)
                        .and_then(|by_lang| by_lang.get(&language_id))
                        .map(|readings| ReadingCell::from_readings(readings.clone()))
                        .unwrap_or(ReadingCell::Empty)
                })
                .collect(),
        })
        .collect();

    Ok(CharsTable { header, rows })
}

/// Fetch all readings of a single character, grouped by language id.
///
/// The `langs` FTS index is matched on its `字組` column. The term is quoted
/// as an FTS5 phrase; a character that tokenizes to nothing matches no rows
/// rather than breaking the query syntax.
async fn readings_for_char(pool: &SqlitePool, ch: char) -> Result<BTreeMap<i64, Vec<Reading>>> {
    let term = ch.to_string().replace('"', "\"\"");

    let rows = sqlx::query(
        r#"
        SELECT
            r.語言ID AS language_id,
            l.讀音 AS transcription,
            l.註釋 AS annotation
        FROM langs l
        JOIN info_rowid r ON l.語言 = r.簡稱
        WHERE langs MATCH '字組:"' || ?1 || '"'
        ORDER BY r.語言ID, l.rowid
        "#,
    )
    .bind(term)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to query readings for '{}'", ch))?;

    let mut by_lang: BTreeMap<i64, Vec<Reading>> = BTreeMap::new();
    for row in rows {
        let language_id: i64 = row.get("language_id");
        let transcription: String = row.get("transcription");
        let annotation: Option<String> = row.get("annotation");
        by_lang
            .entry(language_id)
            .or_default()
            .push(Reading::new(transcription, annotation));
    }

    Ok(by_lang)
}
