use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use hmac::{Hmac, Mac};
use log::{debug, trace};
use regex::Regex;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::config::ServerOptions;

type HmacSha256 = Hmac<Sha256>;

/// Recorded in sessions and login logs when no client address can be determined.
pub const UNKNOWN_IP: &str = "unknown";

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The first entry of the `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = Regex::new(r#"for="?(?P<ip>[^;,"]+)"#).ok().and_then(|re| {
            req.headers()
                .get("Forwarded")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| re.captures(v))
                .and_then(|caps| caps.name("ip"))
                .and_then(|m| IpAddr::from_str(m.as_str()).ok())
        });
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.and_then(|s| IpAddr::from_str(&s).ok())
    })
}

/// The client address as recorded against logins and sessions.
pub fn client_ip(req: &HttpRequest, options: &ServerOptions) -> String {
    get_remote_ip(req, options.use_x_forwarded_for, options.use_forwarded)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

pub fn user_agent(req: &HttpRequest) -> String {
    req.headers().get("User-Agent").and_then(|v| v.to_str().ok()).unwrap_or_default().to_string()
}

/// Builds the string Telegram signs: every field except `hash` as `key=value`, sorted, joined by newlines.
///
/// String values are used verbatim. Everything else (ids, auth dates) is rendered as JSON text.
pub fn telegram_data_check_string(data: &Map<String, Value>) -> String {
    let mut lines = data
        .iter()
        .filter(|(k, _)| k.as_str() != "hash")
        .map(|(k, v)| match v {
            Value::String(s) => format!("{k}={s}"),
            v => format!("{k}={v}"),
        })
        .collect::<Vec<String>>();
    lines.sort();
    lines.join("\n")
}

fn telegram_mac(bot_token: &str, data_check_string: &str) -> Option<HmacSha256> {
    let secret = Sha256::digest(bot_token.as_bytes());
    let mut mac = HmacSha256::new_from_slice(secret.as_slice()).ok()?;
    mac.update(data_check_string.as_bytes());
    Some(mac)
}

/// Computes the hex signature Telegram attaches to login widget data.
pub fn telegram_signature(bot_token: &str, data_check_string: &str) -> Option<String> {
    telegram_mac(bot_token, data_check_string).map(|mac| hex::encode(mac.finalize().into_bytes()))
}

/// Checks the `hash` field of a Telegram login payload. Comparison is constant time.
pub fn verify_telegram_auth(data: &Map<String, Value>, bot_token: &str) -> bool {
    if bot_token.is_empty() {
        return false;
    }
    let Some(hash) = data.get("hash").and_then(Value::as_str) else {
        return false;
    };
    let Ok(expected) = hex::decode(hash) else {
        return false;
    };
    telegram_mac(bot_token, &telegram_data_check_string(data))
        .map(|mac| mac.verify_slice(&expected).is_ok())
        .unwrap_or(false)
}
