use serde::Deserialize;
use serde_json::Value;

/// One entry in a `chatHistories` payload, keyed in the payload by the
/// persona the conversation is with. Exists only transiently while the
/// export job flattens chat rows; never persisted in this form.
///
/// Fields are kept as raw JSON values: clients are loose about types (a
/// numeric `timestamp`, say), and the export stringifies whatever is there
/// rather than dropping the message.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChatMessage {
    pub role: Option<Value>,
    pub content: Option<Value>,
    pub image: Option<Value>,
    pub source: Option<Value>,
    #[serde(rename = "stepId")]
    pub step_id: Option<Value>,
    #[serde(rename = "scriptId")]
    pub script_id: Option<Value>,
    pub timestamp: Option<Value>,
}

impl ChatMessage {
    /// The seven message columns as CSV cell text, in export order:
    /// strings as-is, other values as their JSON text, absent or null
    /// as empty.
    pub fn csv_cells(self) -> [String; 7] {
        [
            Self::cell(self.role),
            Self::cell(self.content),
            Self::cell(self.image),
            Self::cell(self.source),
            Self::cell(self.step_id),
            Self::cell(self.script_id),
            Self::cell(self.timestamp),
        ]
    }

    fn cell(value: Option<Value>) -> String {
        match value {
            None => String::new(),
            Some(Value::String(s)) => s,
            Some(v) => v.to_string(),
        }
    }
}
