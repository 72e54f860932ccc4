//! Guardrails for model output validation.
//!
//! Generated text is forwarded to chats verbatim, so anything that could
//! render as markup or carry a link is rejected before delivery:
//! - empty output
//! - HTML/XML angle brackets
//! - URLs

use regex::Regex;

use cropbot_core::{Error, Result};

/// Result of a guardrail check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailResult {
    /// Whether the check passed.
    pub passed: bool,
    /// Reason for failure (if any).
    pub reason: Option<String>,
    /// Type of violation detected.
    pub violation_type: Option<ViolationType>,
}

impl GuardrailResult {
    /// Create a passing result.
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
            violation_type: None,
        }
    }

    /// Create a failing result.
    pub fn fail(reason: impl Into<String>, violation_type: ViolationType) -> Self {
        Self {
            passed: false,
            reason: Some(reason.into()),
            violation_type: Some(violation_type),
        }
    }

    /// Turn a failed check into `Error::InvalidResponse`.
    pub fn into_result(self) -> Result<()> {
        if self.passed {
            Ok(())
        } else {
            Err(Error::invalid_response(
                self.reason.unwrap_or_else(|| "output rejected".to_string()),
            ))
        }
    }
}

/// Type of output violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationType {
    /// Nothing usable was generated.
    EmptyOutput,
    /// Markup angle brackets in output.
    Markup,
    /// A URL in output.
    Link,
}

/// Guardrail trait for output interceptors.
pub trait Guardrail: Send + Sync {
    /// Check output before it's returned to the user.
    fn check_output(&self, output: &str) -> GuardrailResult;
}

/// Rejects blank output.
#[derive(Debug, Default)]
pub struct EmptyOutputGuard;

impl Guardrail for EmptyOutputGuard {
    fn check_output(&self, output: &str) -> GuardrailResult {
        if output.trim().is_empty() {
            GuardrailResult::fail("Model returned no text", ViolationType::EmptyOutput)
        } else {
            GuardrailResult::pass()
        }
    }
}

/// Rejects any `<` or `>`.
#[derive(Debug, Default)]
pub struct MarkupGuard;

impl Guardrail for MarkupGuard {
    fn check_output(&self, output: &str) -> GuardrailResult {
        if output.contains(['<', '>']) {
            GuardrailResult::fail("Markup detected in output", ViolationType::Markup)
        } else {
            GuardrailResult::pass()
        }
    }
}

/// Rejects URL substrings.
pub struct LinkGuard {
    pattern: Regex,
}

impl LinkGuard {
    /// Create a new link guard matching `http://`, `https://` and `www.`.
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"(?i)(?:https?://|\bwww\.)").expect("link pattern is valid"),
        }
    }

    /// Check for links.
    pub fn detect(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

impl Default for LinkGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Guardrail for LinkGuard {
    fn check_output(&self, output: &str) -> GuardrailResult {
        if self.detect(output) {
            GuardrailResult::fail("Link detected in output", ViolationType::Link)
        } else {
            GuardrailResult::pass()
        }
    }
}

/// Composite guardrail that runs multiple guardrails.
pub struct CompositeGuardrail {
    guardrails: Vec<Box<dyn Guardrail>>,
}

impl CompositeGuardrail {
    /// Create a new composite guardrail.
    pub fn new() -> Self {
        Self {
            guardrails: Vec::new(),
        }
    }

    /// Add a guardrail to the chain.
    pub fn add(mut self, guardrail: Box<dyn Guardrail>) -> Self {
        self.guardrails.push(guardrail);
        self
    }

    /// Create with default guardrails (empty + markup + link).
    pub fn default_chain() -> Self {
        Self::new()
            .add(Box::new(EmptyOutputGuard))
            .add(Box::new(MarkupGuard))
            .add(Box::new(LinkGuard::new()))
    }
}

impl Default for CompositeGuardrail {
    fn default() -> Self {
        Self::new()
    }
}

impl Guardrail for CompositeGuardrail {
    fn check_output(&self, output: &str) -> GuardrailResult {
        self.guardrails
            .iter()
            .map(|guardrail| guardrail.check_output(output))
            .find(|result| !result.passed)
            .unwrap_or_else(GuardrailResult::pass)
    }
}
