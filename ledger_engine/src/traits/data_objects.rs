use serde::{Deserialize, Serialize};

/// The result of a login attempt that reached the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginOutcome {
    /// A new session was opened.
    Success(SessionGrant),
    /// The cabinet already has a live session. Nothing was changed.
    SessionExists { cabinet: String },
    /// The key is unknown or inactive.
    InvalidKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGrant {
    pub cabinet: String,
    pub session_id: String,
    pub ip_address: String,
    pub user_agent: String,
    /// The IP address of the cabinet's previous successful login, if there was one.
    pub previous_ip: Option<String>,
}

impl SessionGrant {
    /// True if an earlier successful login came from a different address.
    pub fn ip_changed(&self) -> bool {
        self.previous_ip.as_ref().map(|ip| ip != &self.ip_address).unwrap_or(false)
    }
}
