#![deny(unused)]
//! Model Gateway for Cropbot.
//!
//! This crate provides the HTTP client for the text-generation host and
//! builds it from application configuration.

pub mod http_client;

pub use http_client::{ChatCompletionsClient, ChatCompletionsConfig};

use cropbot_core::{config::ModelGatewayConfig, Error, Result};

/// Create an LLM client from the `model_gateway` config section.
///
/// Fails with `Error::Config` when no API key is configured.
pub fn create_client_from_config(config: &ModelGatewayConfig) -> Result<ChatCompletionsClient> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| Error::Config("model_gateway.api_key (or LLM_API_KEY) is not set".into()))?;

    ChatCompletionsClient::new(ChatCompletionsConfig {
        base_url: config.base_url.clone(),
        model: config.model.clone(),
        api_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = ModelGatewayConfig::default();
        assert!(matches!(
            create_client_from_config(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_builds_client_from_config() {
        let config = ModelGatewayConfig {
            api_key: Some(Secret::new("sk-test".to_string())),
            base_url: "http://127.0.0.1:9/v1".into(),
            ..Default::default()
        };
        let client = create_client_from_config(&config).unwrap();
        assert_eq!(client.endpoint().as_str(), "http://127.0.0.1:9/v1/chat/completions");
        assert_eq!(client.model(), "gpt-4o-mini");
    }
}
