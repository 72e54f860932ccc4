#![deny(unused)]
//! Chat gateway for Cropbot.
//!
//! This crate turns platform updates into bot behaviour:
//! - image normalization and anchored cropping
//! - the per-chat crop selection protocol
//! - product text rewriting
//! - the Telegram transport and update loop

pub mod crop;
pub mod rewrite;
pub mod router;
pub mod server;
pub mod telegram;
pub mod vision;

pub use crop::{CropMenu, CropProtocol};
pub use rewrite::{split_into_chunks, TextRewriter};
pub use router::EventRouter;
pub use server::BotServer;
pub use telegram::{TelegramFileFetcher, TelegramTransport};
pub use vision::ImageProcessor;
