pub mod chat;
pub mod event;

pub use chat::ChatMessage;
pub use event::ActivityEvent;
