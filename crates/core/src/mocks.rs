//! Mock implementations of core traits for testing.
//!
//! These doubles are shared by the unit and integration tests of every crate
//! in the workspace.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::{
    traits::{ChatMessage, ChatTransport, FileFetcher, GenerationParams, LlmClient, LlmResponse, LlmUsage},
    types::{ChatId, FileRef, MenuButton},
    Error, Result,
};

// =============================================================================
// Recording Transport
// =============================================================================

/// Everything the bot sent, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text {
        chat_id: ChatId,
        text: String,
    },
    Menu {
        chat_id: ChatId,
        prompt: String,
        buttons: Vec<MenuButton>,
    },
    Photo {
        chat_id: ChatId,
        image: Bytes,
        caption: String,
    },
    Typing {
        chat_id: ChatId,
    },
}

/// Transport that records outbound calls instead of sending them.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Outbound>>,
    fail_photos: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose `send_photo` always fails.
    pub fn failing_photos() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_photos: true,
        }
    }

    /// Snapshot of everything sent so far.
    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().unwrap().clone()
    }

    /// Text bodies sent so far, in order.
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Photos sent so far as `(bytes, caption)`.
    pub fn photos(&self) -> Vec<(Bytes, String)> {
        self.sent()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Photo { image, caption, .. } => Some((image, caption)),
                _ => None,
            })
            .collect()
    }

    /// Menus sent so far as `(prompt, buttons)`.
    pub fn menus(&self) -> Vec<(String, Vec<MenuButton>)> {
        self.sent()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Menu { prompt, buttons, .. } => Some((prompt, buttons)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, outbound: Outbound) {
        self.sent.lock().unwrap().push(outbound);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.record(Outbound::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_menu(&self, chat_id: ChatId, prompt: &str, buttons: &[MenuButton]) -> Result<()> {
        self.record(Outbound::Menu {
            chat_id,
            prompt: prompt.to_string(),
            buttons: buttons.to_vec(),
        });
        Ok(())
    }

    async fn send_photo(&self, chat_id: ChatId, image: Bytes, caption: &str) -> Result<()> {
        if self.fail_photos {
            return Err(Error::transport("photo upload rejected"));
        }
        self.record(Outbound::Photo {
            chat_id,
            image,
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn send_typing(&self, chat_id: ChatId) -> Result<()> {
        self.record(Outbound::Typing { chat_id });
        Ok(())
    }
}

// =============================================================================
// In-Memory File Fetcher
// =============================================================================

/// File fetcher serving bytes registered up front.
#[derive(Default)]
pub struct MockFileFetcher {
    files: Mutex<HashMap<String, Bytes>>,
}

impl MockFileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the bytes behind a file id.
    pub fn with_file(self, id: &str, data: impl Into<Bytes>) -> Self {
        self.files.lock().unwrap().insert(id.to_string(), data.into());
        self
    }
}

#[async_trait]
impl FileFetcher for MockFileFetcher {
    async fn fetch(&self, file: &FileRef) -> Result<Bytes> {
        self.files
            .lock()
            .unwrap()
            .get(&file.id)
            .cloned()
            .ok_or_else(|| Error::network(format!("file {} not found", file.id)))
    }
}

// =============================================================================
// Mock LLM Client
// =============================================================================

/// Scripted mock LLM that returns predefined responses.
pub struct MockLlm {
    responses: Mutex<Vec<Result<String>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockLlm {
    /// Create a new mock LLM with a queue of responses, served in order.
    pub fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that returns one response.
    pub fn constant(response: &str) -> Self {
        Self::new(vec![Ok(response.to_string())])
    }

    /// Create a mock whose only call fails with `err`.
    pub fn failing(err: Error) -> Self {
        Self::new(vec![Err(err)])
    }

    /// Get the number of calls made to this mock.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Messages of every call, in order.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn chat(&self, messages: &[ChatMessage], _params: &GenerationParams) -> Result<LlmResponse> {
        self.calls.lock().unwrap().push(messages.to_vec());

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(Error::internal("MockLlm has no scripted responses left"));
        }
        let content = responses.remove(0)?;

        Ok(LlmResponse {
            content,
            finish_reason: "stop".to_string(),
            usage: LlmUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            },
        })
    }
}
