//! Error types for Cropbot.

use thiserror::Error;

/// Result type alias using Cropbot's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Cropbot.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Imaging Errors
    // =========================================================================
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid target dimensions {width}x{height}")]
    Dimension { width: u32, height: u32 },

    #[error("Encode error: {0}")]
    Encode(String),

    // =========================================================================
    // Crop Protocol Errors
    // =========================================================================
    #[error("No pending image for chat {0}")]
    NotFound(i64),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    // =========================================================================
    // Model Gateway Errors
    // =========================================================================
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Boundary Errors
    // =========================================================================
    #[error("Network error: {0}")]
    Network(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an encode error.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an invalid response error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Decode(_) => "decode",
            Error::Dimension { .. } => "dimension",
            Error::Encode(_) => "encode",
            Error::NotFound(_) => "not_found",
            Error::InvalidRequest(_) => "invalid_request",
            Error::UnsupportedMedia(_) => "unsupported_media",
            Error::InvalidResponse(_) => "invalid_response",
            Error::Network(_) => "network",
            Error::Transport(_) => "transport",
            Error::Config(_) => "config",
            Error::Serialization(_) => "serialization",
            Error::Internal(_) => "internal",
            Error::Other(_) => "other",
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
