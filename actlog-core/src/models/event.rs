use serde::{Deserialize, Serialize};

/// One persisted activity event. Rows are created by the ingestion service
/// and never updated or deleted.
///
/// `data_content` is the payload as stored: an opaque JSON text blob,
/// decoded only when a consumer needs structure. `client_timestamp` is
/// caller-supplied and opaque; `server_timestamp` is assigned by the store
/// at insert time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityEvent {
    pub id: i64,
    pub session_id: String,
    pub data_type: String,
    pub data_content: String,
    pub client_timestamp: String,
    pub server_timestamp: String,
}
