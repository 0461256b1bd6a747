use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cabinet logged in from a different IP address than its previous successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIpLoginEvent {
    pub cabinet: String,
    pub previous_ip: String,
    pub new_ip: String,
    pub user_agent: String,
    pub timestamp: DateTime<Utc>,
}

impl NewIpLoginEvent {
    pub fn new<S: Into<String>>(cabinet: S, previous_ip: S, new_ip: S, user_agent: S) -> Self {
        Self {
            cabinet: cabinet.into(),
            previous_ip: previous_ip.into(),
            new_ip: new_ip.into(),
            user_agent: user_agent.into(),
            timestamp: Utc::now(),
        }
    }
}
