//! Stateless pub-sub for ledger events.
//!
//! Components publish events through an [`EventProducer`]; a single [`EventHandler`] per event type drains the channel
//! and runs the registered hook for each event on its own task. Hooks only ever see the event itself.
//!
//! Publishing never fails the publisher. If the handler has gone away the event is dropped and logged.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size);
        Self { listener, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped, then waits for in-flight hooks to finish.
    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Only the producers keep the channel open from here on.
        drop(self.sender);
        let mut jobs = JoinSet::new();
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&self.handler);
            jobs.spawn(async move { (handler)(ev).await });
            // Reap finished hooks so the set doesn't grow without bound on a long-lived server.
            while let Some(done) = jobs.try_join_next() {
                if let Err(e) = done {
                    warn!("📬️ Event hook panicked or was cancelled: {e}");
                }
            }
        }
        debug!("📬️ All producers are gone. Waiting for {} hooks to complete", jobs.len());
        while let Some(done) = jobs.join_next().await {
            if let Err(e) = done {
                warn!("📬️ Event hook panicked or was cancelled: {e}");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
