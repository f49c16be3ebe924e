pub mod flatten;
pub mod job;

pub use flatten::{flatten_chat_row, CHAT_HEADER};
pub use job::{run_export, run_timestamp, CategorySpec, RowSource, CATEGORIES, FLAT_HEADER, KNOWN_CATEGORIES};
