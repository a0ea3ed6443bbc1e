//! Frames delivered over the backend's message socket.
//!
//! The backend wraps every push in a `{"type": ..., "message": ...}`
//! envelope. Chat broadcasts and log lines share one socket; anything
//! else is unknown to this console and skipped by the subscriber.

use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

/// A structured log line pushed by the backend's log handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LogLine {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub message: String,
}

impl LogLine {
    /// Rendering used when appending to the session's raw log transcript.
    pub fn render(&self) -> String {
        if self.level.is_empty() {
            return self.message.clone();
        }
        format!("[{}] {}", self.level, self.message)
    }
}

/// A decoded socket envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message", rename_all = "lowercase")]
pub enum SocketFrame {
    Chat(ChatMessage),
    Log(LogLine),
}

impl SocketFrame {
    /// Decodes a raw text frame. Returns `None` for frames this console
    /// does not understand, which callers are expected to skip.
    pub fn from_text(text: &str) -> Option<SocketFrame> {
        serde_json::from_str(text).ok()
    }
}
