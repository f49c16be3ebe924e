//! The export run: one CSV file per category, driven by a category table.
//!
//! Each run is a single sequential pass. Categories are data, not code
//! paths: adding a new filtered category means adding a `CategorySpec`
//! entry. Every category issues its own query against the store, including
//! the catch-all, so two simultaneous runs never conflict (filenames carry
//! the run timestamp) but are not guaranteed a point-in-time snapshot under
//! live ingestion.

use std::path::{Path, PathBuf};

use actlog_core::{ActivityEvent, ActlogError};
use sqlx::SqlitePool;

use crate::flatten::{flatten_chat_row, CHAT_HEADER};

/// The category tags with dedicated export files. Anything else lands in
/// the catch-all file.
pub const KNOWN_CATEGORIES: [&str; 4] = [
    "chatHistories",
    "playerState",
    "discoveredClues",
    "currentPuzzleState",
];

/// Header for the verbatim (non-chat) export files.
pub const FLAT_HEADER: [&str; 6] = [
    "db_id",
    "session_id",
    "data_type",
    "submission_client_timestamp",
    "submission_server_timestamp",
    "data_content_json",
];

/// How a category's rows are selected and shaped.
#[derive(Debug, Clone, Copy)]
pub enum RowSource {
    /// `chatHistories` rows, flattened to one record per message.
    ChatFlatten,
    /// Rows with exactly this `data_type`, written verbatim.
    Filtered(&'static str),
    /// Rows whose `data_type` is none of the known categories, verbatim.
    CatchAll,
}

#[derive(Debug, Clone, Copy)]
pub struct CategorySpec {
    /// Output filename prefix: `<prefix>_export_<run_ts>.csv`.
    pub prefix: &'static str,
    pub source: RowSource,
}

/// One entry per output file, in the order files are produced.
pub const CATEGORIES: [CategorySpec; 5] = [
    CategorySpec { prefix: "chatHistory", source: RowSource::ChatFlatten },
    CategorySpec { prefix: "playerState", source: RowSource::Filtered("playerState") },
    CategorySpec { prefix: "discoveredClues", source: RowSource::Filtered("discoveredClues") },
    CategorySpec { prefix: "currentPuzzleState", source: RowSource::Filtered("currentPuzzleState") },
    CategorySpec { prefix: "other_activity_log", source: RowSource::CatchAll },
];

/// Timestamp suffix shared by all files of one run, so repeated runs never
/// overwrite prior output.
pub fn run_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

const SELECT_COLUMNS: &str =
    "SELECT id, session_id, data_type, data_content, client_timestamp, server_timestamp \
     FROM user_activity_log";

async fn fetch_rows(
    pool: &SqlitePool,
    source: RowSource,
) -> Result<Vec<ActivityEvent>, sqlx::Error> {
    match source {
        RowSource::ChatFlatten | RowSource::Filtered(_) => {
            let data_type = match source {
                RowSource::Filtered(d) => d,
                _ => "chatHistories",
            };
            let sql = format!("{} WHERE data_type = ?", SELECT_COLUMNS);
            sqlx::query_as(&sql).bind(data_type).fetch_all(pool).await
        }
        RowSource::CatchAll => {
            let sql = format!("{} WHERE data_type NOT IN (?, ?, ?, ?)", SELECT_COLUMNS);
            let mut query = sqlx::query_as(&sql);
            for category in KNOWN_CATEGORIES {
                query = query.bind(category);
            }
            query.fetch_all(pool).await
        }
    }
}

/// Write one category's file. The header always goes first, even when no
/// rows match.
async fn export_category(
    pool: &SqlitePool,
    spec: &CategorySpec,
    path: &Path,
) -> Result<(), ActlogError> {
    let rows = fetch_rows(pool, spec.source).await?;

    let mut writer = csv::Writer::from_path(path)?;
    match spec.source {
        RowSource::ChatFlatten => {
            writer.write_record(CHAT_HEADER)?;
            for event in &rows {
                for record in flatten_chat_row(event) {
                    writer.write_record(&record)?;
                }
            }
        }
        RowSource::Filtered(_) | RowSource::CatchAll => {
            writer.write_record(FLAT_HEADER)?;
            for event in &rows {
                // data_content goes out as the stored text, not re-encoded
                writer.write_record([
                    event.id.to_string().as_str(),
                    event.session_id.as_str(),
                    event.data_type.as_str(),
                    event.client_timestamp.as_str(),
                    event.server_timestamp.as_str(),
                    event.data_content.as_str(),
                ])?;
            }
        }
    }
    writer.flush().map_err(ActlogError::Io)?;

    Ok(())
}

/// Run the full export once: five files in `out_dir`, all suffixed with
/// `run_ts`. A store failure aborts the run; files already completed stay
/// on disk. Returns the paths written.
pub async fn run_export(
    pool: &SqlitePool,
    out_dir: &Path,
    run_ts: &str,
) -> Result<Vec<PathBuf>, ActlogError> {
    let mut written = Vec::with_capacity(CATEGORIES.len());

    for spec in &CATEGORIES {
        let path = out_dir.join(format!("{}_export_{}.csv", spec.prefix, run_ts));
        tracing::info!("Exporting {} to {}...", spec.prefix, path.display());
        export_category(pool, spec, &path).await?;
        tracing::info!("{} export complete.", spec.prefix);
        written.push(path);
    }

    Ok(written)
}
