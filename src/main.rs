use std::{sync::Arc, time::Duration};

mod app;
mod auth;
mod catalog;
mod config;
mod dto;
mod error;
mod favorites;
mod messages;
mod movies;
mod state;
mod store;
mod validation;

use crate::messages::Messages;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "movieshelf=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;
    spawn_messages_reloader(
        app_state.messages.clone(),
        app_state.config.messages_reload_secs,
    );

    let app = app::build_app(app_state);
    app::serve(app).await
}

/// Polls the message file for edits. An interval of zero disables polling.
fn spawn_messages_reloader(messages: Arc<Messages>, every_secs: u64) {
    if every_secs == 0 {
        return;
    }
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(every_secs));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if messages.clone().refresh().await {
                tracing::info!("message catalog reloaded");
            }
        }
    });
}
