//! Telegram adapters over teloxide.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use teloxide::{
    prelude::*,
    types::{ChatAction, InlineKeyboardButton, InlineKeyboardMarkup, InputFile},
};
use url::Url;

use cropbot_core::{
    traits::{ChatTransport, FileFetcher},
    types::{ChatId, FileRef, InboundEvent, MenuButton},
    Error, Result,
};

fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(chat_id.0)
}

fn request_error(e: teloxide::RequestError) -> Error {
    Error::transport(e.to_string())
}

// =============================================================================
// Outbound
// =============================================================================

/// Sends messages through the Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// One button per row keeps long labels readable on phones.
pub fn keyboard(buttons: &[MenuButton]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        buttons
            .iter()
            .map(|b| vec![InlineKeyboardButton::callback(b.label.clone(), b.payload.clone())]),
    )
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.bot
            .send_message(tg_chat(chat_id), text)
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn send_menu(&self, chat_id: ChatId, prompt: &str, buttons: &[MenuButton]) -> Result<()> {
        self.bot
            .send_message(tg_chat(chat_id), prompt)
            .reply_markup(keyboard(buttons))
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: ChatId, image: Bytes, caption: &str) -> Result<()> {
        let photo = InputFile::memory(image.to_vec()).file_name("crop.jpg");
        self.bot
            .send_photo(tg_chat(chat_id), photo)
            .caption(caption)
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: ChatId) -> Result<()> {
        self.bot
            .send_chat_action(tg_chat(chat_id), ChatAction::Typing)
            .await
            .map_err(request_error)?;
        Ok(())
    }
}

// =============================================================================
// File Download
// =============================================================================

/// Resolves file ids with `getFile` and downloads them over reqwest.
pub struct TelegramFileFetcher {
    bot: Bot,
    http: reqwest::Client,
    max_bytes: u64,
}

impl TelegramFileFetcher {
    pub fn new(bot: Bot, max_bytes: u64) -> Self {
        Self {
            bot,
            http: reqwest::Client::new(),
            max_bytes,
        }
    }

    /// `{api}/file/bot{token}/{path}`.
    fn download_url(&self, path: &str) -> Result<Url> {
        let api = self.bot.api_url();
        let raw = format!(
            "{}/file/bot{}/{}",
            api.as_str().trim_end_matches('/'),
            self.bot.token(),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| Error::internal(format!("Bad file URL: {}", e)))
    }
}

#[async_trait]
impl FileFetcher for TelegramFileFetcher {
    async fn fetch(&self, file: &FileRef) -> Result<Bytes> {
        let meta = self
            .bot
            .get_file(file.id.clone())
            .await
            .map_err(|e| Error::network(format!("getFile failed: {}", e)))?;

        if u64::from(meta.size) > self.max_bytes {
            return Err(Error::invalid_request(format!(
                "File of {} bytes exceeds the {} byte limit",
                meta.size, self.max_bytes
            )));
        }

        // The URL embeds the bot token; never log it.
        let url = self.download_url(&meta.path)?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Download failed: {}", e.without_url())))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::network(format!("File host returned {}", status)));
        }
        if let Some(len) = resp.content_length() {
            if len > self.max_bytes {
                return Err(Error::invalid_request(format!(
                    "File of {} bytes exceeds the {} byte limit",
                    len, self.max_bytes
                )));
            }
        }

        let mut buf = BytesMut::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| Error::network(format!("Download failed: {}", e.without_url())))?;
            if (buf.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(Error::invalid_request(format!(
                    "Download exceeds the {} byte limit",
                    self.max_bytes
                )));
            }
            buf.extend_from_slice(&chunk);
        }

        Ok(buf.freeze())
    }
}

// =============================================================================
// Inbound
// =============================================================================

/// Reduce a message to the event the bot reacts to, if any.
///
/// Photos use the largest size Telegram offers. Captions are ignored.
pub fn message_event(msg: &Message) -> Option<InboundEvent> {
    let chat_id = ChatId(msg.chat.id.0);

    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        return Some(InboundEvent::Photo {
            chat_id,
            file: FileRef::new(photo.file.id.clone()).with_size(u64::from(photo.file.size)),
        });
    }

    if let Some(doc) = msg.document() {
        return Some(InboundEvent::Document {
            chat_id,
            file: FileRef::new(doc.file.id.clone()).with_size(u64::from(doc.file.size)),
            mime_type: doc.mime_type.as_ref().map(|m| m.to_string()),
        });
    }

    msg.text().map(|text| InboundEvent::from_text(chat_id, text))
}

/// Reduce a callback query to a button press, if it carries data.
pub fn callback_event(q: &CallbackQuery) -> Option<InboundEvent> {
    let data = q.data.clone()?;
    let chat_id = match &q.message {
        Some(message) => message.chat().id.0,
        // Private chats share the user's id.
        None => i64::try_from(q.from.id.0).ok()?,
    };
    Some(InboundEvent::ButtonPress {
        chat_id: ChatId(chat_id),
        data,
    })
}
