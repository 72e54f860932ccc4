#![deny(unused)]
//! Cropbot - Telegram bot for marketplace sellers.
//!
//! Crops product photos to listing sizes and rewrites product text into
//! title/description variants.

use std::sync::Arc;

use cropbot_core::{config::AppConfig, traits::LlmClient};
use cropbot_gateway::{BotServer, EventRouter};
use cropbot_store::InMemoryPendingStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    cropbot_governance::configure_tracing(&config.logging)?;

    tracing::info!("Starting Cropbot v{}", env!("CARGO_PKG_VERSION"));

    let token = config
        .telegram
        .bot_token
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("BOT_TOKEN (or telegram.bot_token) is not set"))?;
    let server = BotServer::new(token);

    // =========================================================================
    // Pending uploads
    // =========================================================================
    let store = Arc::new(InMemoryPendingStore::new());
    tracing::info!(
        targets = config.crop.targets.len(),
        max_download_bytes = config.safety.max_download_size_bytes,
        "Initialized in-memory pending-upload store"
    );

    // =========================================================================
    // Text generation (optional)
    // =========================================================================
    let llm: Option<Arc<dyn LlmClient>> = if config.model_gateway.api_key.is_some() {
        let client = cropbot_model_gateway::create_client_from_config(&config.model_gateway)?;
        tracing::info!(
            model = %client.model(),
            endpoint = %client.endpoint(),
            "Text rewriting enabled"
        );
        Some(Arc::new(client))
    } else {
        tracing::warn!("LLM_API_KEY is not set, text rewriting disabled");
        None
    };

    let router = EventRouter::from_config(
        &config,
        store,
        Arc::new(server.transport()),
        Arc::new(server.file_fetcher(config.safety.max_download_size_bytes)),
        llm,
    );

    server.run(Arc::new(router)).await;
    Ok(())
}
