//! Event router: dispatches inbound events and owns error reporting.
//!
//! Every inbound event is handled here inside its own span. Handlers return
//! `Result`; this is the only place errors are turned into log records and
//! user-facing replies.

use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use cropbot_core::{
    config::AppConfig,
    traits::{ChatTransport, FileFetcher, GenerationParams, LlmClient, PendingUploadStore},
    types::{ChatCommand, ChatId, ImageFormat, InboundEvent},
    Error, Result,
};

use crate::crop::{CropMenu, CropProtocol};
use crate::rewrite::TextRewriter;
use crate::vision::ImageProcessor;

/// Reply when a button refers to an image that is no longer stored.
pub const NOT_FOUND_TEXT: &str = "File not found. Please send the photo again.";
/// Reply to documents that are not supported images.
pub const SEND_IMAGE_TEXT: &str = "Please send an image (JPEG, PNG, WebP, GIF, BMP or TIFF).";
/// Reply when text generation fails.
pub const REWRITE_FAILED_TEXT: &str = "Could not generate text. Please try again later.";
/// Reply when text generation is not configured.
pub const REWRITE_DISABLED_TEXT: &str = "Text rewriting is not available right now.";
/// Reply for every other failure.
pub const GENERIC_ERROR_TEXT: &str = "Error while processing. Please try again.";

pub const HELP_TEXT: &str = "Send me a photo (or an image file as a document) and pick how to crop it:\n\
    • choose one of the offered sizes\n\
    • keep the top, the bottom or the center\n\
    You can pick several crops for the same photo.\n\n\
    Send any other text and I'll write product title and description variants for it.";

/// Routes inbound events to the crop protocol, the rewriter or command replies.
pub struct EventRouter {
    crop: CropProtocol,
    rewriter: Option<TextRewriter>,
    transport: Arc<dyn ChatTransport>,
    greeting: String,
}

impl EventRouter {
    pub fn new(crop: CropProtocol, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            crop,
            rewriter: None,
            transport,
            greeting: "Hello!".to_string(),
        }
    }

    /// Wire a router from configuration and the injected boundaries.
    ///
    /// Without `llm` text messages get a "not available" reply.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn PendingUploadStore>,
        transport: Arc<dyn ChatTransport>,
        fetcher: Arc<dyn FileFetcher>,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Self {
        let crop = CropProtocol::new(
            store,
            transport.clone(),
            fetcher,
            ImageProcessor::new(config.crop.output_quality, config.crop.normalize_quality),
            CropMenu::new(config.crop.targets.clone()),
        )
        .with_max_download_bytes(config.safety.max_download_size_bytes);

        let mut router = Self::new(crop, transport).with_greeting(config.telegram.greeting.clone());
        if let Some(llm) = llm {
            let gateway = &config.model_gateway;
            router = router.with_rewriter(
                TextRewriter::new(llm)
                    .with_params(GenerationParams {
                        temperature: gateway.temperature,
                        top_p: gateway.top_p,
                        max_tokens: gateway.max_tokens,
                    })
                    .with_variants(gateway.variants)
                    .with_max_chunk_chars(config.safety.max_message_chars),
            );
        }
        router
    }

    /// Enable text rewriting.
    pub fn with_rewriter(mut self, rewriter: TextRewriter) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Handle one event to completion. Never fails: errors are logged and
    /// reported to the chat.
    pub async fn handle(&self, event: InboundEvent) {
        let chat_id = event.chat_id();
        let kind = event.kind();
        let span = tracing::info_span!(
            "event",
            trace_id = %Uuid::new_v4(),
            chat_id = %chat_id,
            kind
        );

        async move {
            tracing::debug!("Event received");
            match self.dispatch(event).await {
                Ok(()) => tracing::debug!("Event handled"),
                Err(err) => self.report(chat_id, kind, err).await,
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Photo { chat_id, file } => {
                self.crop
                    .receive_image(chat_id, &file, ImageFormat::CANONICAL)
                    .await
            }
            InboundEvent::Document {
                chat_id,
                file,
                mime_type,
            } => {
                let format = mime_type
                    .as_deref()
                    .and_then(ImageFormat::from_mime)
                    .ok_or_else(|| {
                        Error::UnsupportedMedia(mime_type.clone().unwrap_or_else(|| "unknown".into()))
                    })?;
                self.crop.receive_image(chat_id, &file, format).await
            }
            InboundEvent::ButtonPress { chat_id, data } => self.crop.complete(chat_id, &data).await,
            InboundEvent::Text { chat_id, text } => self.rewrite(chat_id, &text).await,
            InboundEvent::Command { chat_id, command } => match command {
                ChatCommand::Start => self.transport.send_text(chat_id, &self.greeting).await,
                ChatCommand::Help | ChatCommand::Unknown(_) => {
                    self.transport.send_text(chat_id, HELP_TEXT).await
                }
            },
        }
    }

    async fn rewrite(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let Some(rewriter) = &self.rewriter else {
            return self.transport.send_text(chat_id, REWRITE_DISABLED_TEXT).await;
        };

        self.transport.send_typing(chat_id).await?;
        let chunks = rewriter.rewrite(text).await?;
        for chunk in &chunks {
            self.transport.send_text(chat_id, chunk).await?;
        }
        Ok(())
    }

    async fn report(&self, chat_id: ChatId, kind: &'static str, err: Error) {
        match &err {
            Error::NotFound(_) | Error::UnsupportedMedia(_) | Error::InvalidRequest(_) => {
                tracing::warn!(error = %err, error_kind = err.kind(), "Event rejected")
            }
            _ => tracing::error!(error = %err, error_kind = err.kind(), "Event failed"),
        }

        let reply = user_message(&err, kind);
        if let Err(send_err) = self.transport.send_text(chat_id, reply).await {
            tracing::warn!(error = %send_err, "Failed to report error to chat");
        }
    }
}

/// User-facing text for a failed event. Never includes error details.
pub fn user_message(err: &Error, event_kind: &str) -> &'static str {
    match err {
        Error::NotFound(_) => NOT_FOUND_TEXT,
        Error::UnsupportedMedia(_) => SEND_IMAGE_TEXT,
        _ if event_kind == "text" => REWRITE_FAILED_TEXT,
        _ => GENERIC_ERROR_TEXT,
    }
}
