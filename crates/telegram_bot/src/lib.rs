//! Telegram bot.
//!
//! The conversational layer: dialogue routing, per-chat sessions,
//! keyboard construction and rendering. All storage goes through the
//! engine crate.

use std::sync::Arc;

use teloxide::prelude::*;

mod handlers;
mod keyboard;
mod parsing;
mod state;
mod subscription;
mod ui;

#[derive(Clone)]
pub struct ConfigParameters {
    engine: Arc<engine::Engine>,
    sessions: state::SessionStore,
    channel: Option<String>,
}

pub struct Bot {
    token: String,
    channel: Option<String>,
    engine: Arc<engine::Engine>,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);
        let parameters = ConfigParameters {
            engine: self.engine.clone(),
            sessions: state::SessionStore::default(),
            channel: self.channel.clone(),
        };

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handlers::handle_message))
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    channel: Option<String>,
    engine: Option<Arc<engine::Engine>>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn channel(mut self, channel: Option<String>) -> BotBuilder {
        self.channel = channel.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn engine(mut self, engine: engine::Engine) -> BotBuilder {
        self.engine = Some(Arc::new(engine));
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        if self.token.is_empty() {
            return Err("telegram token is empty".to_string());
        }
        let engine = self.engine.ok_or_else(|| "engine is required".to_string())?;
        Ok(Bot {
            token: self.token,
            channel: self.channel,
            engine,
        })
    }
}
