//! Access keys, logins and sessions.
//!
//! A cabinet may hold at most one session at a time. A second login with a valid key is rejected until the first
//! session logs out, is force-logged-out by an admin, or is swept after going idle.
//!
//! When a successful login comes from a different IP than the cabinet's previous successful login, a
//! [`NewIpLoginEvent`] is published. Publishing happens on a separate task, so a slow hook never delays the login.
use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    db_types::{AccessKey, LoginAttempt, LoginLogEntry, NewAccessKey, Session},
    events::{EventProducers, NewIpLoginEvent},
    traits::{AccessManagement, AuthApiError, LoginOutcome},
};

pub const DEFAULT_LOGIN_LOG_LIMIT: i64 = 100;

pub struct AccessApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B: Debug> Debug for AccessApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessApi ({:?})", self.db)
    }
}

impl<B> AccessApi<B>
where B: AccessManagement
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub async fn login(&self, attempt: LoginAttempt) -> Result<LoginOutcome, AuthApiError> {
        let outcome = self.db.login(attempt).await?;
        match &outcome {
            LoginOutcome::Success(grant) => {
                info!("🔑️ {} logged in from {}", grant.cabinet, grant.ip_address);
                if grant.ip_changed() {
                    let previous = grant.previous_ip.clone().unwrap_or_default();
                    let event = NewIpLoginEvent::new(
                        grant.cabinet.as_str(),
                        previous.as_str(),
                        grant.ip_address.as_str(),
                        grant.user_agent.as_str(),
                    );
                    let producers = self.producers.clone();
                    tokio::spawn(async move { producers.publish_new_ip_login(event).await });
                }
            },
            LoginOutcome::SessionExists { cabinet } => info!("🔑️ Login for {cabinet} rejected. A session is active"),
            LoginOutcome::InvalidKey => info!("🔑️ Login attempt with an invalid access key"),
        }
        Ok(outcome)
    }

    /// Refreshes the session's activity time. Unknown sessions, and any backend failure, report `false`.
    pub async fn heartbeat(&self, session_id: &str) -> bool {
        match self.db.touch_session(session_id).await {
            Ok(valid) => valid,
            Err(e) => {
                error!("🔑️ Could not refresh session. {e}");
                false
            },
        }
    }

    pub async fn fetch_session(&self, session_id: &str) -> Result<Option<Session>, AuthApiError> {
        self.db.fetch_session(session_id).await
    }

    pub async fn logout(&self, session_id: &str) -> Result<u64, AuthApiError> {
        self.db.delete_session(session_id).await
    }

    pub async fn force_logout(&self, cabinet: &str) -> Result<u64, AuthApiError> {
        let n = self.db.delete_sessions_for_cabinet(cabinet).await?;
        info!("🔑️ Force logout of {cabinet} removed {n} session(s)");
        Ok(n)
    }

    /// Removes every session whose last activity is older than `idle`.
    pub async fn sweep_idle_sessions(&self, idle: Duration) -> Result<u64, AuthApiError> {
        self.db.delete_idle_sessions(idle).await
    }

    pub async fn access_keys(&self) -> Result<Vec<AccessKey>, AuthApiError> {
        self.db.fetch_access_keys().await
    }

    pub async fn create_access_key(&self, key: NewAccessKey) -> Result<AccessKey, AuthApiError> {
        let access_key = key.access_key.trim().to_string();
        let cabinet = key.cabinet.trim().to_string();
        if access_key.is_empty() || cabinet.is_empty() {
            return Err(AuthApiError::ValidationError("Both an access key and a cabinet are required".to_string()));
        }
        let description = key.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
        let key = self.db.insert_access_key(NewAccessKey { access_key, cabinet, description }).await?;
        info!("🔑️ New access key #{} issued for {}", key.id, key.cabinet);
        Ok(key)
    }

    pub async fn activate_access_key(&self, id: i64) -> Result<AccessKey, AuthApiError> {
        self.db.set_access_key_active(id, true).await
    }

    pub async fn deactivate_access_key(&self, id: i64) -> Result<AccessKey, AuthApiError> {
        self.db.set_access_key_active(id, false).await
    }

    pub async fn delete_access_key(&self, id: i64) -> Result<u64, AuthApiError> {
        self.db.delete_access_key(id).await
    }

    /// The most recent login attempts. Non-positive limits fall back to [`DEFAULT_LOGIN_LOG_LIMIT`].
    pub async fn login_logs(&self, limit: Option<i64>) -> Result<Vec<LoginLogEntry>, AuthApiError> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LOGIN_LOG_LIMIT);
        self.db.fetch_login_logs(limit).await
    }
}
