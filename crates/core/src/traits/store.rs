//! Pending-upload store trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatId, ChatState, PendingImage};

/// Keyed store holding at most one pending image per chat.
///
/// Implementations must replace entries atomically per key. No ordering is
/// promised across chats.
#[async_trait]
pub trait PendingUploadStore: Send + Sync {
    /// Store `image` for `chat_id`, superseding any previous entry.
    async fn put(&self, chat_id: ChatId, image: PendingImage) -> Result<()>;

    /// Current state of the chat. Chats never seen are `Idle`.
    async fn state(&self, chat_id: ChatId) -> Result<ChatState>;

    /// The pending image, if any. Does not consume it.
    async fn get(&self, chat_id: ChatId) -> Result<Option<PendingImage>> {
        Ok(match self.state(chat_id).await? {
            ChatState::Idle => None,
            ChatState::AwaitingChoice(image) => Some(image),
        })
    }
}
