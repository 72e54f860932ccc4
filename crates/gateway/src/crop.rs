//! Crop selection protocol.
//!
//! An image event stores the normalized upload for its chat and offers one
//! menu per target size. A later button press crops the stored image.

use bytes::Bytes;
use regex::Regex;
use std::sync::Arc;

use cropbot_core::{
    traits::{ChatTransport, FileFetcher, PendingUploadStore},
    types::{Anchor, ChatId, CropRequest, FileRef, ImageFormat, MenuButton, PendingImage, TargetSize},
    Error, Result,
};

use crate::vision::ImageProcessor;

/// Acknowledgement sent once an upload is stored.
pub const RECEIVED_TEXT: &str = "Photo received! Choose crop options.";

/// Sizes and anchors offered to users, plus the payload parser.
#[derive(Debug, Clone)]
pub struct CropMenu {
    targets: Vec<TargetSize>,
    payload_pattern: Regex,
}

impl CropMenu {
    /// Create a menu offering `targets`, in order.
    pub fn new(targets: Vec<TargetSize>) -> Self {
        Self {
            targets,
            payload_pattern: Regex::new(r"^crop_(\d{1,6})x(\d{1,6})_(north|center|south)$")
                .expect("payload pattern is valid"),
        }
    }

    /// Offered target sizes.
    pub fn targets(&self) -> &[TargetSize] {
        &self.targets
    }

    /// Prompt shown above the buttons of one target.
    pub fn prompt(target: TargetSize) -> String {
        format!("Crop to {}:", target)
    }

    /// Buttons for one target, one per anchor.
    pub fn buttons(target: TargetSize) -> Vec<MenuButton> {
        Anchor::MENU_ORDER
            .iter()
            .map(|&anchor| MenuButton::new(anchor.label(), CropRequest { target, anchor }.payload()))
            .collect()
    }

    /// Parse a button payload into a crop request for an offered size.
    pub fn parse(&self, payload: &str) -> Result<CropRequest> {
        let caps = self
            .payload_pattern
            .captures(payload)
            .ok_or_else(|| Error::invalid_request(format!("Unknown button payload {:?}", payload)))?;

        let side = |i: usize| -> Result<u32> {
            caps[i]
                .parse::<u32>()
                .map_err(|e| Error::invalid_request(format!("Bad size in payload: {}", e)))
        };
        let anchor = Anchor::from_wire(&caps[3])
            .ok_or_else(|| Error::invalid_request(format!("Unknown anchor {:?}", &caps[3])))?;
        let request = CropRequest::new(side(1)?, side(2)?, anchor)?;

        if !self.targets.contains(&request.target) {
            return Err(Error::invalid_request(format!(
                "Size {} is not offered",
                request.target
            )));
        }
        Ok(request)
    }
}

/// Drives the per-chat upload and crop workflow.
pub struct CropProtocol {
    store: Arc<dyn PendingUploadStore>,
    transport: Arc<dyn ChatTransport>,
    fetcher: Arc<dyn FileFetcher>,
    processor: Arc<ImageProcessor>,
    menu: CropMenu,
    max_download_bytes: u64,
}

impl CropProtocol {
    pub fn new(
        store: Arc<dyn PendingUploadStore>,
        transport: Arc<dyn ChatTransport>,
        fetcher: Arc<dyn FileFetcher>,
        processor: ImageProcessor,
        menu: CropMenu,
    ) -> Self {
        Self {
            store,
            transport,
            fetcher,
            processor: Arc::new(processor),
            menu,
            max_download_bytes: u64::MAX,
        }
    }

    /// Reject files the platform announces as larger than `bytes`.
    pub fn with_max_download_bytes(mut self, bytes: u64) -> Self {
        self.max_download_bytes = bytes;
        self
    }

    /// Download, normalize and store an upload, then offer the crop menus.
    pub async fn receive_image(&self, chat_id: ChatId, file: &FileRef, format: ImageFormat) -> Result<()> {
        if let Some(size) = file.size {
            if size > self.max_download_bytes {
                return Err(Error::invalid_request(format!(
                    "File of {} bytes exceeds the {} byte limit",
                    size, self.max_download_bytes
                )));
            }
        }

        let data = self.fetcher.fetch(file).await?;
        tracing::debug!(file_id = %file.id, size = data.len(), format = %format, "Upload downloaded");

        self.accept(chat_id, data, format).await
    }

    /// Normalize and store already downloaded bytes, then offer the menus.
    pub async fn accept(&self, chat_id: ChatId, data: Bytes, format: ImageFormat) -> Result<()> {
        let processor = self.processor.clone();
        let normalized = tokio::task::spawn_blocking(move || processor.normalize(data, format))
            .await
            .map_err(|e| Error::internal(format!("normalize task failed: {}", e)))??;

        let (width, height) = (normalized.width, normalized.height);
        self.store
            .put(chat_id, PendingImage::new(chat_id, format, normalized))
            .await?;
        tracing::info!(width, height, source_format = %format, "Upload ready for cropping");

        self.offer_menu(chat_id).await
    }

    async fn offer_menu(&self, chat_id: ChatId) -> Result<()> {
        self.transport.send_text(chat_id, RECEIVED_TEXT).await?;
        for &target in self.menu.targets() {
            self.transport
                .send_menu(chat_id, &CropMenu::prompt(target), &CropMenu::buttons(target))
                .await?;
        }
        Ok(())
    }

    /// Handle a button press: crop the pending image and send it back.
    ///
    /// The pending image is left in place so further crops can be chosen.
    pub async fn complete(&self, chat_id: ChatId, payload: &str) -> Result<()> {
        let request = self.menu.parse(payload)?;
        let pending = self
            .store
            .get(chat_id)
            .await?
            .ok_or(Error::NotFound(chat_id.0))?;

        let processor = self.processor.clone();
        let source = pending.bytes.clone();
        let output = tokio::task::spawn_blocking(move || processor.transform(&source, &request))
            .await
            .map_err(|e| Error::internal(format!("crop task failed: {}", e)))??;

        tracing::info!(
            target_size = %request.target,
            anchor = %request.anchor,
            size = output.len(),
            "Crop delivered"
        );
        self.transport
            .send_photo(chat_id, output, &request.caption())
            .await
    }
}
