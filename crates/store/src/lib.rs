#![deny(unused)]
//! Pending-upload store for Cropbot.
//!
//! Holds the most recent normalized image of every chat for as long as the
//! process lives. Nothing is persisted.

pub mod memory;

pub use memory::InMemoryPendingStore;
