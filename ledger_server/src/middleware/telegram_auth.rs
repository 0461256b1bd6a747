//! Telegram login verification for Actix Web.
//!
//! The Telegram login widget hands the browser a JSON object with the user's profile, an `auth_date` and a `hash`.
//! The hash is an HMAC-SHA256 of the other fields, keyed with the SHA-256 of the bot token, so only Telegram (and
//! us) can produce it.
//!
//! Wrap the Telegram login route with this middleware. Requests with a missing or wrong hash never reach the
//! handler and get a 401. Verified requests are passed on with their body intact.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use ledger_common::Secret;
use log::{trace, warn};
use serde_json::{Map, Value};

use crate::{errors::ServerError, helpers::verify_telegram_auth};

pub const INVALID_TELEGRAM_AUTH: &str = "Invalid Telegram authentication";

pub struct TelegramAuthMiddlewareFactory {
    bot_token: Secret<String>,
}

impl TelegramAuthMiddlewareFactory {
    pub fn new(bot_token: Secret<String>) -> Self {
        TelegramAuthMiddlewareFactory { bot_token }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TelegramAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = TelegramAuthMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TelegramAuthMiddlewareService { bot_token: self.bot_token.clone(), service: Rc::new(service) }))
    }
}

pub struct TelegramAuthMiddlewareService<S> {
    bot_token: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for TelegramAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let bot_token = self.bot_token.reveal().clone();
        Box::pin(async move {
            trace!("🔐️ Checking Telegram signature for request");
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ServerError::InvalidRequestBody("Failed to extract request data.".into())
            })?;
            let fields = serde_json::from_slice::<Map<String, Value>>(data.as_ref()).map_err(|e| {
                warn!("🔐️ Telegram login payload is not a JSON object. {e}");
                ServerError::InvalidRequestBody(e.to_string())
            })?;
            if verify_telegram_auth(&fields, &bot_token) {
                trace!("🔐️ Telegram signature for request ✅️");
                req.set_payload(bytes_to_payload(data));
                service.call(req).await
            } else {
                warn!("🔐️ Missing or invalid Telegram signature. Denying access.");
                Err(ServerError::AuthenticationError(INVALID_TELEGRAM_AUTH.into()).into())
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
