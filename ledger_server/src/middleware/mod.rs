mod telegram_auth;

pub use telegram_auth::{TelegramAuthMiddlewareFactory, TelegramAuthMiddlewareService};
