//! Core type definitions for Cropbot.
//!
//! Broken down into submodules for better maintainability.

pub mod chat;
pub mod event;
pub mod image;

pub use chat::*;
pub use event::*;
pub use image::*;
