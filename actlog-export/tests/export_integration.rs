//! End-to-end export tests: seed an in-memory store, run a full export into
//! a temp directory, and read the CSV files back.

use std::path::{Path, PathBuf};

use actlog_core::db;
use actlog_export::{run_export, CHAT_HEADER, FLAT_HEADER};
use sqlx::SqlitePool;
use tempfile::TempDir;

const RUN_TS: &str = "20240101_000000";

async fn make_pool() -> SqlitePool {
    let pool = db::create_memory_pool().await.unwrap();
    db::init_schema(&pool).await.unwrap();
    pool
}

async fn run(pool: &SqlitePool) -> (TempDir, Vec<PathBuf>) {
    let dir = TempDir::new().unwrap();
    let written = run_export(pool, dir.path(), RUN_TS).await.unwrap();
    (dir, written)
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader
        .headers()
        .unwrap()
        .iter()
        .map(String::from)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (header, rows)
}

// ===========================================================================
// TEST 1: five files per run, named <prefix>_export_<run_ts>.csv
// ===========================================================================
#[tokio::test]
async fn test_export_writes_five_named_files() {
    let pool = make_pool().await;
    let (dir, written) = run(&pool).await;

    let expected = [
        "chatHistory",
        "playerState",
        "discoveredClues",
        "currentPuzzleState",
        "other_activity_log",
    ];
    assert_eq!(written.len(), expected.len());
    for (path, prefix) in written.iter().zip(expected) {
        let name = format!("{}_export_{}.csv", prefix, RUN_TS);
        assert_eq!(path, &dir.path().join(&name));
        assert!(path.exists(), "{} must exist", name);
    }
}

// ===========================================================================
// TEST 2: headers are written even when no rows match
// ===========================================================================
#[tokio::test]
async fn test_export_headers_on_empty_store() {
    let pool = make_pool().await;
    let (_dir, written) = run(&pool).await;

    let (chat_header, chat_rows) = read_csv(&written[0]);
    assert_eq!(chat_header, CHAT_HEADER);
    assert!(chat_rows.is_empty());

    for path in &written[1..] {
        let (header, rows) = read_csv(path);
        assert_eq!(header, FLAT_HEADER);
        assert!(rows.is_empty());
    }
}

// ===========================================================================
// TEST 3: chat flattening — one CSV row per message, empties for absents
// (the worked example from the ingestion contract)
// ===========================================================================
#[tokio::test]
async fn test_export_chat_example_scenario() {
    let pool = make_pool().await;
    db::insert_event(
        &pool,
        "s1",
        "chatHistories",
        r#"{"persona_a":[{"role":"user","content":"hi"}]}"#,
        "2024-01-01T00:00:00Z",
    )
    .await
    .unwrap();

    let (_dir, written) = run(&pool).await;
    let (_, rows) = read_csv(&written[0]);
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row[0], "s1");
    assert_eq!(row[1], "2024-01-01T00:00:00Z");
    assert!(!row[2].is_empty(), "server timestamp column must be populated");
    assert_eq!(row[3], "persona_a");
    assert_eq!(row[4], "user");
    assert_eq!(row[5], "hi");
    assert_eq!(&row[6..], &["", "", "", "", ""]);
}

// ===========================================================================
// TEST 4: a non-mapping chat row yields no records without aborting the run
// ===========================================================================
#[tokio::test]
async fn test_export_chat_bad_shape_skipped() {
    let pool = make_pool().await;
    db::insert_event(&pool, "bad", "chatHistories", r#"["not","a","mapping"]"#, "t1")
        .await
        .unwrap();
    db::insert_event(
        &pool,
        "good",
        "chatHistories",
        r#"{"p":[{"role":"user","content":"still here"}]}"#,
        "t2",
    )
    .await
    .unwrap();

    let (_dir, written) = run(&pool).await;
    let (_, rows) = read_csv(&written[0]);
    assert_eq!(rows.len(), 1, "only the well-formed row produces output");
    assert_eq!(rows[0][0], "good");
}

// ===========================================================================
// TEST 5: filtered categories are verbatim — data_content not re-encoded
// ===========================================================================
#[tokio::test]
async fn test_export_filtered_category_verbatim() {
    let pool = make_pool().await;
    // Stored text with deliberate spacing: must come back byte-equal.
    let stored = r#"{"hp": 10,  "location": "vault"}"#;
    let id = db::insert_event(&pool, "s2", "playerState", stored, "t1")
        .await
        .unwrap();

    let (_dir, written) = run(&pool).await;
    let (header, rows) = read_csv(&written[1]);
    assert_eq!(header, FLAT_HEADER);
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row[0], id.to_string());
    assert_eq!(row[1], "s2");
    assert_eq!(row[2], "playerState");
    assert_eq!(row[3], "t1");
    assert_eq!(row[5], stored);
}

// ===========================================================================
// TEST 6: each known category file contains only its own rows
// ===========================================================================
#[tokio::test]
async fn test_export_partitions_by_category() {
    let pool = make_pool().await;
    db::insert_event(&pool, "s1", "playerState", "{}", "t").await.unwrap();
    db::insert_event(&pool, "s1", "discoveredClues", "[]", "t").await.unwrap();
    db::insert_event(&pool, "s1", "discoveredClues", "[]", "t").await.unwrap();
    db::insert_event(&pool, "s1", "currentPuzzleState", "{}", "t").await.unwrap();

    let (_dir, written) = run(&pool).await;

    let (_, player) = read_csv(&written[1]);
    let (_, clues) = read_csv(&written[2]);
    let (_, puzzle) = read_csv(&written[3]);
    let (_, other) = read_csv(&written[4]);

    assert_eq!(player.len(), 1);
    assert_eq!(clues.len(), 2);
    assert_eq!(puzzle.len(), 1);
    assert!(other.is_empty());
    assert!(clues.iter().all(|r| r[2] == "discoveredClues"));
}

// ===========================================================================
// TEST 7: a store failure aborts the run with an error
// ===========================================================================
#[tokio::test]
async fn test_export_store_failure_aborts_run() {
    // Pool without the table: the first category query fails and the run
    // stops. Rows are fetched before a file is opened, so the failed
    // category leaves nothing behind.
    let pool = db::create_memory_pool().await.unwrap();
    let dir = TempDir::new().unwrap();

    let result = run_export(&pool, dir.path(), RUN_TS).await;
    assert!(result.is_err(), "missing table must abort the export");

    let leftover = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftover, 0, "no partial file for the failed category");
}

// ===========================================================================
// TEST 8: unknown data types all and only land in the catch-all file
// ===========================================================================
#[tokio::test]
async fn test_export_catch_all_unknown_types() {
    let pool = make_pool().await;
    db::insert_event(&pool, "s1", "menuClicks", r#"{"button":"start"}"#, "t").await.unwrap();
    db::insert_event(&pool, "s1", "playerState", "{}", "t").await.unwrap();
    db::insert_event(&pool, "s2", "debugPing", "1", "t").await.unwrap();

    let (_dir, written) = run(&pool).await;

    let (_, other) = read_csv(&written[4]);
    let mut types: Vec<&str> = other.iter().map(|r| r[2].as_str()).collect();
    types.sort_unstable();
    assert_eq!(types, ["debugPing", "menuClicks"]);

    let (_, player) = read_csv(&written[1]);
    assert_eq!(player.len(), 1, "known categories stay out of the catch-all");
}
