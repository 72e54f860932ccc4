//! Core traits for Cropbot.
//!
//! Traits are organized by boundary:
//! - `transport`: messaging platform (ChatTransport, FileFetcher)
//! - `store`: pending uploads (PendingUploadStore)
//! - `llm`: text generation (LlmClient)

pub mod llm;
pub mod store;
pub mod transport;

pub use llm::*;
pub use store::*;
pub use transport::*;
