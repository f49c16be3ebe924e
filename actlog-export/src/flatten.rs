//! Chat-history flattening.
//!
//! A `chatHistories` payload is a mapping from persona id to a list of
//! message objects. Flattening turns one stored row into one CSV row per
//! message. Shape problems are never fatal: the offending row, persona, or
//! message is skipped with a warning and processing continues.

use actlog_core::{ActivityEvent, ChatMessage};

/// Header for the chat-history export file, written once per run before any
/// data rows.
pub const CHAT_HEADER: [&str; 11] = [
    "session_id",
    "submission_client_timestamp",
    "submission_server_timestamp",
    "persona_id_conversation_with",
    "message_role",
    "message_content",
    "message_image",
    "message_source",
    "message_step_id",
    "message_script_id",
    "message_timestamp",
];

/// Flatten one stored `chatHistories` row into CSV records.
///
/// Returns an empty vec (after logging a warning) when the stored content
/// does not parse or is not a persona → messages mapping.
pub fn flatten_chat_row(event: &ActivityEvent) -> Vec<Vec<String>> {
    let parsed: serde_json::Value = match serde_json::from_str(&event.data_content) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(
                "Skipping row {} for session {}: could not decode chatHistories JSON: {}",
                event.id,
                event.session_id,
                e
            );
            return Vec::new();
        }
    };

    let personas = match parsed.as_object() {
        Some(map) => map,
        None => {
            tracing::warn!(
                "Skipping row {} for session {}: chatHistories content is not a mapping",
                event.id,
                event.session_id
            );
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for (persona_id, messages) in personas {
        let messages = match messages.as_array() {
            Some(list) => list,
            None => {
                tracing::warn!(
                    "Skipping messages for persona {} in session {}: not a list",
                    persona_id,
                    event.session_id
                );
                continue;
            }
        };

        for entry in messages {
            if !entry.is_object() {
                tracing::warn!(
                    "Skipping a message for persona {} in session {}: not an object",
                    persona_id,
                    event.session_id
                );
                continue;
            }
            let message: ChatMessage = match serde_json::from_value(entry.clone()) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(
                        "Skipping a message for persona {} in session {}: {}",
                        persona_id,
                        event.session_id,
                        e
                    );
                    continue;
                }
            };

            let mut record = vec![
                event.session_id.clone(),
                event.client_timestamp.clone(),
                event.server_timestamp.clone(),
                persona_id.clone(),
            ];
            record.extend(message.csv_cells());
            records.push(record);
        }
    }

    records
}
