#![deny(unused)]
//! Governance for Cropbot.
//!
//! This crate provides:
//! - Logging setup
//! - Output guardrails for generated text

pub mod guardrails;
pub mod tracing_layer;

pub use guardrails::{
    CompositeGuardrail, EmptyOutputGuard, Guardrail, GuardrailResult, LinkGuard, MarkupGuard,
    ViolationType,
};
pub use tracing_layer::configure_tracing;
