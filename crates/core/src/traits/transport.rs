//! Messaging platform traits.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::types::{ChatId, FileRef, MenuButton};

/// Outbound side of the messaging platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Send a prompt with one button per row.
    async fn send_menu(&self, chat_id: ChatId, prompt: &str, buttons: &[MenuButton]) -> Result<()>;

    /// Send an encoded image with a caption.
    async fn send_photo(&self, chat_id: ChatId, image: Bytes, caption: &str) -> Result<()>;

    /// Show the "typing…" indicator.
    async fn send_typing(&self, chat_id: ChatId) -> Result<()>;
}

/// Resolves platform file references and downloads their bytes.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Download the file behind `file`.
    async fn fetch(&self, file: &FileRef) -> Result<Bytes>;
}
