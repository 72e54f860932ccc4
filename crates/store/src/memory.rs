//! In-memory pending-upload store implementation using DashMap.

use async_trait::async_trait;
use dashmap::DashMap;

use cropbot_core::{
    traits::PendingUploadStore,
    types::{ChatId, ChatState, PendingImage},
    Error, Result,
};

/// Process-lifetime store of the latest upload per chat.
///
/// Each chat maps to an explicit [`ChatState`]; a chat without an entry is
/// `Idle`. Writes replace the whole entry under the shard lock, so a reader
/// sees either the old or the new image, never a mix.
#[derive(Debug, Default)]
pub struct InMemoryPendingStore {
    /// Thread-safe concurrent hashmap.
    chats: DashMap<ChatId, ChatState>,
}

impl InMemoryPendingStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self {
            chats: DashMap::new(),
        }
    }

    /// Number of chats with a pending image.
    pub fn len(&self) -> usize {
        self.chats.iter().filter(|entry| !entry.value().is_idle()).count()
    }

    /// Check if no chat has a pending image.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximate bytes held by pending images.
    pub fn memory_usage(&self) -> usize {
        self.chats
            .iter()
            .filter_map(|entry| entry.value().pending().map(|image| image.bytes.len()))
            .sum()
    }
}

#[async_trait]
impl PendingUploadStore for InMemoryPendingStore {
    async fn put(&self, chat_id: ChatId, image: PendingImage) -> Result<()> {
        if image.chat_id != chat_id {
            return Err(Error::internal(format!(
                "image of chat {} stored under chat {}",
                image.chat_id, chat_id
            )));
        }

        let size = image.bytes.len();
        let previous = self.chats.insert(chat_id, ChatState::AwaitingChoice(image));
        let superseded = previous.map(|state| !state.is_idle()).unwrap_or(false);

        tracing::debug!(chat_id = %chat_id, size, superseded, "Pending image stored");
        Ok(())
    }

    async fn state(&self, chat_id: ChatId) -> Result<ChatState> {
        Ok(self
            .chats
            .get(&chat_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}
