use serde::{Deserialize, Serialize};

use super::chat::ChatId;

// =============================================================================
// Inbound Events
// =============================================================================

/// Reference to a file hosted by the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Platform file identifier.
    pub id: String,
    /// Size announced by the platform, if any.
    pub size: Option<u64>,
}

impl FileRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            size: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// Slash commands understood by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    Help,
    Unknown(String),
}

impl ChatCommand {
    /// Parse `/start`, `/help@SomeBot arg` etc. Returns `None` for plain text.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim_start().strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word).to_ascii_lowercase();
        Some(match name.as_str() {
            "start" => ChatCommand::Start,
            "help" => ChatCommand::Help,
            _ => ChatCommand::Unknown(name),
        })
    }
}

/// Event delivered by the transport adapter, already reduced to what the
/// bot cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A compressed photo. Platform photos are always JPEG.
    Photo { chat_id: ChatId, file: FileRef },
    /// A file sent "as document"; may or may not be an image.
    Document {
        chat_id: ChatId,
        file: FileRef,
        mime_type: Option<String>,
    },
    /// Free text to be rewritten.
    Text { chat_id: ChatId, text: String },
    /// A slash command.
    Command { chat_id: ChatId, command: ChatCommand },
    /// Inline keyboard callback.
    ButtonPress { chat_id: ChatId, data: String },
}

impl InboundEvent {
    /// Build a text or command event from a message body.
    pub fn from_text(chat_id: ChatId, text: impl Into<String>) -> Self {
        let text = text.into();
        match ChatCommand::parse(&text) {
            Some(command) => InboundEvent::Command { chat_id, command },
            None => InboundEvent::Text { chat_id, text },
        }
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            InboundEvent::Photo { chat_id, .. }
            | InboundEvent::Document { chat_id, .. }
            | InboundEvent::Text { chat_id, .. }
            | InboundEvent::Command { chat_id, .. }
            | InboundEvent::ButtonPress { chat_id, .. } => *chat_id,
        }
    }

    /// Short name used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Photo { .. } => "photo",
            InboundEvent::Document { .. } => "document",
            InboundEvent::Text { .. } => "text",
            InboundEvent::Command { .. } => "command",
            InboundEvent::ButtonPress { .. } => "button_press",
        }
    }
}

// =============================================================================
// Outbound Types
// =============================================================================

/// One inline button: visible label plus the payload echoed back on press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuButton {
    pub label: String,
    pub payload: String,
}

impl MenuButton {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}
