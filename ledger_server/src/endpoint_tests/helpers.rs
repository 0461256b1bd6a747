use actix_web::{body, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;

/// Runs a single request against an app set up by `configure` and returns the status and body.
///
/// Errors raised by middleware are rendered the same way the server would render them.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.map_into_boxed_body().into_parts().1,
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let bytes = body::to_bytes(res.into_body()).await.unwrap_or_default();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

pub async fn get_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::get().uri(path), configure).await
}

pub async fn post_request<F>(path: &str, body: serde_json::Value, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::post().uri(path).set_json(body), configure).await
}

pub async fn patch_request<F>(path: &str, body: Option<serde_json::Value>, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::patch().uri(path);
    let req = match body {
        Some(body) => req.set_json(body),
        None => req,
    };
    send_request(req, configure).await
}

pub async fn delete_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::delete().uri(path), configure).await
}
