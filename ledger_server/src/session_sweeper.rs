use std::time::Duration;

use ledger_engine::{AccessApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

/// Starts the idle session sweeper. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every `interval`, sessions that have been idle for longer than `idle_timeout` are removed.
pub fn start_session_sweeper(db: SqliteDatabase, idle_timeout: Duration, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = AccessApi::new(db, Default::default());
        info!("🕰️ Idle session sweeper started. Sessions idle for {}s are removed.", idle_timeout.as_secs());
        loop {
            timer.tick().await;
            trace!("🕰️ Running idle session sweep");
            match api.sweep_idle_sessions(idle_timeout).await {
                Ok(0) => trace!("🕰️ No idle sessions"),
                Ok(n) => info!("🕰️ {n} idle sessions removed"),
                Err(e) => error!("🕰️ Error running the idle session sweep: {e}"),
            }
        }
    })
}
