use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::chat::ChatId;

/// Image encodings the bot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
    Bmp,
    Tiff,
}

impl ImageFormat {
    /// The format every pending image is stored in.
    pub const CANONICAL: ImageFormat = ImageFormat::Jpeg;

    /// Map a MIME type (`image/png`, `image/jpeg; charset=…`) to a format.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            "image/webp" => Some(ImageFormat::Webp),
            "image/gif" => Some(ImageFormat::Gif),
            "image/bmp" | "image/x-ms-bmp" => Some(ImageFormat::Bmp),
            "image/tiff" => Some(ImageFormat::Tiff),
            _ => None,
        }
    }

    /// Get the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
        }
    }

    pub fn is_canonical(&self) -> bool {
        *self == Self::CANONICAL
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Image bytes in the canonical encoding, with their pixel size.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
}

/// The latest upload of a chat, waiting for a crop choice.
#[derive(Debug, Clone)]
pub struct PendingImage {
    pub chat_id: ChatId,
    /// Canonical (JPEG) bytes.
    pub bytes: Bytes,
    /// Encoding the user originally sent.
    pub source_format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl PendingImage {
    pub fn new(chat_id: ChatId, source_format: ImageFormat, image: NormalizedImage) -> Self {
        Self {
            chat_id,
            bytes: image.bytes,
            source_format,
            width: image.width,
            height: image.height,
        }
    }
}

/// Per-chat position in the crop workflow.
#[derive(Debug, Clone, Default)]
pub enum ChatState {
    /// Nothing to crop.
    #[default]
    Idle,
    /// An image is stored and the crop menu has been offered.
    AwaitingChoice(PendingImage),
}

impl ChatState {
    pub fn pending(&self) -> Option<&PendingImage> {
        match self {
            ChatState::Idle => None,
            ChatState::AwaitingChoice(image) => Some(image),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ChatState::Idle)
    }
}
