//! Long-polling bot server built on the teloxide dispatcher.

use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use teloxide::{prelude::*, types::BotCommand};

use crate::router::EventRouter;
use crate::telegram::{callback_event, message_event, TelegramFileFetcher, TelegramTransport};

type HandlerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Owns the bot connection and runs the update loop.
pub struct BotServer {
    bot: Bot,
}

impl BotServer {
    /// Create a server for the bot identified by `token`.
    pub fn new(token: &Secret<String>) -> Self {
        Self {
            bot: Bot::new(token.expose_secret()),
        }
    }

    /// Outbound transport sharing this server's connection.
    pub fn transport(&self) -> TelegramTransport {
        TelegramTransport::new(self.bot.clone())
    }

    /// File fetcher sharing this server's connection.
    pub fn file_fetcher(&self, max_bytes: u64) -> TelegramFileFetcher {
        TelegramFileFetcher::new(self.bot.clone(), max_bytes)
    }

    /// Register commands and process updates until Ctrl-C.
    ///
    /// Updates of one chat are handled in order; different chats run
    /// concurrently.
    pub async fn run(self, router: Arc<EventRouter>) {
        let commands = [
            BotCommand::new("start", "Say hello"),
            BotCommand::new("help", "How to crop photos and rewrite text"),
        ];
        if let Err(e) = self.bot.set_my_commands(commands).await {
            tracing::warn!("Failed to set bot commands: {}", e);
        }

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handle_message))
            .branch(Update::filter_callback_query().endpoint(handle_callback));

        tracing::info!("Bot is polling for updates");
        Dispatcher::builder(self.bot, handler)
            .default_handler(|_| async {})
            .dependencies(dptree::deps![router])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
        tracing::info!("Bot stopped");
    }
}

async fn handle_message(msg: Message, router: Arc<EventRouter>) -> HandlerResult {
    if let Some(event) = message_event(&msg) {
        router.handle(event).await;
    }
    Ok(())
}

async fn handle_callback(bot: Bot, q: CallbackQuery, router: Arc<EventRouter>) -> HandlerResult {
    // Stop the button spinner first; cropping may take a moment.
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        tracing::warn!("Failed to answer callback query: {}", e);
    }
    if let Some(event) = callback_event(&q) {
        router.handle(event).await;
    }
    Ok(())
}
