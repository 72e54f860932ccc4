//! Product text rewriting through the text-generation service.

use std::sync::Arc;

use cropbot_core::{
    traits::{ChatMessage, GenerationParams, LlmClient},
    Error, Result,
};
use cropbot_governance::{CompositeGuardrail, Guardrail};

/// Hard limit of a single chat message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Builds the fixed instruction for `variants` title/description pairs.
pub fn system_instruction(variants: u8) -> String {
    format!(
        "You write product copy for an online marketplace. From the product \
         information the user sends, write {n} alternative variants. Label them \
         exactly \"Title 1:\", \"Description 1:\" and so on up to {n}. Keep each \
         title under 70 characters and each description to two or three \
         sentences. Answer in the language of the user's text. Use plain text \
         only without HTML, markdown or links.",
        n = variants
    )
}

/// Split `text` into consecutive pieces of at most `max_chars` characters.
///
/// Counts Unicode scalar values, so no character is ever split. Joining the
/// pieces gives back `text`.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Turns free text into validated, message-sized rewrite variants.
pub struct TextRewriter {
    llm: Arc<dyn LlmClient>,
    params: GenerationParams,
    variants: u8,
    guardrail: CompositeGuardrail,
    max_chunk_chars: usize,
}

impl TextRewriter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            params: GenerationParams::default(),
            variants: 3,
            guardrail: CompositeGuardrail::default_chain(),
            max_chunk_chars: MAX_MESSAGE_CHARS,
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_variants(mut self, variants: u8) -> Self {
        self.variants = variants.max(1);
        self
    }

    pub fn with_max_chunk_chars(mut self, max_chars: usize) -> Self {
        self.max_chunk_chars = max_chars.max(1);
        self
    }

    /// Request rewrites for `text` and return them as ordered chunks.
    ///
    /// Output that is empty, carries markup or carries a link is rejected
    /// as `InvalidResponse`.
    pub async fn rewrite(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Err(Error::invalid_request("Nothing to rewrite"));
        }

        let messages = [
            ChatMessage::system(system_instruction(self.variants)),
            ChatMessage::user(text),
        ];
        let response = self.llm.chat(&messages, &self.params).await?;

        let check = self.guardrail.check_output(&response.content);
        if !check.passed {
            tracing::warn!(
                violation = ?check.violation_type,
                finish_reason = %response.finish_reason,
                "Generated text rejected"
            );
        }
        check.into_result()?;

        let chunks = split_into_chunks(response.content.trim(), self.max_chunk_chars);
        tracing::debug!(
            chars = response.content.chars().count(),
            chunks = chunks.len(),
            tokens = response.usage.total_tokens,
            "Rewrite ready"
        );
        Ok(chunks)
    }
}
