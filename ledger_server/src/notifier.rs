//! Telegram channel notifications.
//!
//! The notifier is hooked onto [`NewIpLoginEvent`]s at startup. Delivery is best-effort: failures are logged and
//! never reach the login that triggered them.
use std::{sync::Arc, time::Duration};

use ledger_engine::events::NewIpLoginEvent;
use log::*;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;

use crate::config::TelegramConfig;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";
const MAX_USER_AGENT_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Telegram notifications are not configured")]
    NotConfigured,
    #[error("Could not create the HTTP client. {0}")]
    Initialization(String),
    #[error("Could not reach Telegram. {0}")]
    RequestError(String),
    #[error("Telegram rejected the message with status {status}. {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Clone)]
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: Arc<Client>,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifierError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.notifications_enabled()
    }

    /// Posts an HTML message to the configured channel.
    pub async fn send_message(&self, text: &str) -> Result<(), NotifierError> {
        let channel_id = match (&self.config.channel_id, self.config.bot_token.is_empty()) {
            (Some(channel_id), false) => channel_id,
            _ => return Err(NotifierError::NotConfigured),
        };
        let url = format!("{TELEGRAM_API_URL}/bot{}/sendMessage", self.config.bot_token.reveal());
        let body = json!({ "chat_id": channel_id, "text": text, "parse_mode": "HTML" });
        // The URL holds the bot token, so reqwest errors are stripped of it before they are logged
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifierError::RequestError(e.without_url().to_string()))?;
        if response.status().is_success() {
            trace!("📣️ Telegram message delivered to {channel_id}");
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(NotifierError::Rejected { status, message })
        }
    }

    pub async fn notify_new_ip_login(&self, event: &NewIpLoginEvent) {
        if !self.is_enabled() {
            info!("📣️ Telegram notifications are disabled. {} logged in from new IP {}", event.cabinet, event.new_ip);
            return;
        }
        match self.send_message(&new_ip_login_message(event)).await {
            Ok(()) => info!("📣️ New IP login notification sent for {}", event.cabinet),
            Err(e) => error!("📣️ Could not send the new IP login notification for {}. {e}", event.cabinet),
        }
    }
}

pub fn new_ip_login_message(event: &NewIpLoginEvent) -> String {
    let device = if event.user_agent.is_empty() {
        "Unknown".to_string()
    } else {
        event.user_agent.chars().take(MAX_USER_AGENT_LEN).collect::<String>()
    };
    format!(
        "🔐 <b>New login from a different IP</b>\n\n👤 Cabinet: <code>{}</code>\n🌐 Previous IP: <code>{}</code>\n🆕 New \
         IP: <code>{}</code>\n🕐 Time: {}\n📱 Device: {}",
        escape_html(&event.cabinet),
        escape_html(&event.previous_ip),
        escape_html(&event.new_ip),
        event.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        escape_html(&device),
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
