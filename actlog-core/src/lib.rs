pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::ActlogConfig;
pub use error::ActlogError;
pub use models::{ActivityEvent, ChatMessage};
