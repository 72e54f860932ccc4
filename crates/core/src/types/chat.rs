use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

// =============================================================================
// Chat Identity
// =============================================================================

/// Opaque identifier of a conversation on the messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// =============================================================================
// Crop Types
// =============================================================================

/// Which part of a cover-fitted image survives the crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Keep the upper region.
    Top,
    /// Keep the middle.
    Center,
    /// Keep the lower region.
    Bottom,
}

impl Anchor {
    /// All anchors, in the order they are offered to the user.
    pub const MENU_ORDER: [Anchor; 3] = [Anchor::Top, Anchor::Bottom, Anchor::Center];

    /// Name used in button payloads and captions.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Anchor::Top => "north",
            Anchor::Center => "center",
            Anchor::Bottom => "south",
        }
    }

    /// Parse a payload anchor name.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "north" => Some(Anchor::Top),
            "center" => Some(Anchor::Center),
            "south" => Some(Anchor::Bottom),
            _ => None,
        }
    }

    /// Human-readable button label.
    pub fn label(&self) -> &'static str {
        match self {
            Anchor::Top => "🔼 Top",
            Anchor::Center => "🔳 Center",
            Anchor::Bottom => "🔽 Bottom",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Target box of a crop, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    /// Create a target size; both sides must be positive.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Dimension { width, height });
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A crop choice made by the user. Lives only inside a button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropRequest {
    pub target: TargetSize,
    pub anchor: Anchor,
}

impl CropRequest {
    pub fn new(width: u32, height: u32, anchor: Anchor) -> Result<Self> {
        Ok(Self {
            target: TargetSize::new(width, height)?,
            anchor,
        })
    }

    /// Button payload, e.g. `crop_1110x398_north`.
    pub fn payload(&self) -> String {
        format!("crop_{}_{}", self.target, self.anchor.wire_name())
    }

    /// Caption attached to the delivered image, e.g. `1110x398 (north)`.
    pub fn caption(&self) -> String {
        format!("{} ({})", self.target, self.anchor)
    }
}
