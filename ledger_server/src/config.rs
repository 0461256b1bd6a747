//! Server configuration.
//!
//! Everything is read from `CLS_*` environment variables (a `.env` file is loaded first). Invalid values are logged
//! and replaced by the default, so the server always starts.
use std::{env, time::Duration};

use ledger_common::{helpers::parse_boolean_flag, Secret};
use log::*;

const DEFAULT_CLS_HOST: &str = "127.0.0.1";
const DEFAULT_CLS_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/cabinet_ledger.db";
const DEFAULT_SESSION_IDLE_MINUTES: u64 = 60;
const DEFAULT_SESSION_SWEEP_MINUTES: u64 = 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// Sessions without a heartbeat for this long are removed by the sweeper.
    pub session_idle_timeout: Duration,
    /// How often the sweeper runs.
    pub session_sweep_interval: Duration,
    pub telegram: TelegramConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CLS_HOST.to_string(),
            port: DEFAULT_CLS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            session_idle_timeout: minutes(DEFAULT_SESSION_IDLE_MINUTES),
            session_sweep_interval: minutes(DEFAULT_SESSION_SWEEP_MINUTES),
            telegram: TelegramConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CLS_HOST").ok().unwrap_or_else(|| DEFAULT_CLS_HOST.into());
        let port = env::var("CLS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CLS_PORT. {e} Using the default, {DEFAULT_CLS_PORT}, instead."
                    );
                    DEFAULT_CLS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CLS_PORT);
        let database_url = env::var("CLS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CLS_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("CLS_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("CLS_USE_FORWARDED").ok(), false);
        let session_idle_timeout = minutes_from_env("CLS_SESSION_IDLE_TIMEOUT", DEFAULT_SESSION_IDLE_MINUTES);
        let session_sweep_interval = minutes_from_env("CLS_SESSION_SWEEP_INTERVAL", DEFAULT_SESSION_SWEEP_MINUTES);
        let telegram = TelegramConfig::from_env();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            session_idle_timeout,
            session_sweep_interval,
            telegram,
        }
    }
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(60))
}

fn minutes_from_env(var: &str, default: u64) -> Duration {
    let value = env::var(var)
        .map_err(|_| info!("🪛️ {var} is not set. Using the default value of {default} minutes."))
        .and_then(|s| {
            s.trim()
                .parse::<u64>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for {var}. {e}. Using {default} minutes."))
        })
        .ok()
        .filter(|m| {
            if *m == 0 {
                warn!("🪛️ {var} must be at least one minute. Using {default} minutes.");
            }
            *m > 0
        })
        .unwrap_or(default);
    minutes(value)
}

//-------------------------------------------------  TelegramConfig  ---------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct TelegramConfig {
    /// Verifies Telegram login payloads and authenticates the notifier.
    pub bot_token: Secret<String>,
    /// The chat that receives notifications.
    pub channel_id: Option<String>,
}

impl TelegramConfig {
    pub fn new<S: Into<String>>(bot_token: S, channel_id: Option<String>) -> Self {
        Self { bot_token: Secret::new(bot_token.into()), channel_id }
    }

    pub fn from_env() -> Self {
        let bot_token = env::var("CLS_TELEGRAM_BOT_TOKEN").ok().unwrap_or_else(|| {
            warn!(
                "🪛️ CLS_TELEGRAM_BOT_TOKEN is not set. Telegram logins will be rejected and notifications are \
                 disabled."
            );
            String::default()
        });
        let channel_id = env::var("CLS_TELEGRAM_CHANNEL_ID").ok().filter(|s| !s.trim().is_empty());
        if channel_id.is_none() {
            info!("🪛️ CLS_TELEGRAM_CHANNEL_ID is not set. New-IP login notifications are disabled.");
        }
        Self { bot_token: Secret::new(bot_token), channel_id }
    }

    pub fn notifications_enabled(&self) -> bool {
        !self.bot_token.is_empty() && self.channel_id.is_some()
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
