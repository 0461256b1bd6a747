use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, NewIpLoginEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub new_ip_login_producer: Vec<EventProducer<NewIpLoginEvent>>,
}

impl EventProducers {
    pub async fn publish_new_ip_login(&self, event: NewIpLoginEvent) {
        for producer in &self.new_ip_login_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_new_ip_login: Option<EventHandler<NewIpLoginEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_new_ip_login = hooks.on_new_ip_login.map(|f| EventHandler::new(buffer_size, f));
        Self { on_new_ip_login }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_new_ip_login {
            result.new_ip_login_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_new_ip_login {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_new_ip_login: Option<Handler<NewIpLoginEvent>>,
}

impl EventHooks {
    pub fn on_new_ip_login<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(NewIpLoginEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_new_ip_login = Some(Arc::new(f));
        self
    }
}
