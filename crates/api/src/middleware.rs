//! Request-scope middleware: correlation id, diagnostic context, and
//! request logging.
//!
//! The whole request runs inside a fresh task-local scope, so the
//! correlation id and diagnostic fields cannot leak into another request
//! and are gone on every exit path. The inbound `X-Request-Id` header is
//! honoured when present and the id is always echoed back on the response.

use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

use finpuls_observability::{diag, request as request_context};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn request_scope(req: Request<Body>, next: Next) -> Response {
    finpuls_observability::scoped(handle(req, next)).await
}

async fn handle(req: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let client_ip = client_ip(req.headers());

    let request_id = match inbound_request_id(req.headers()) {
        Some(id) => {
            request_context::set(id.clone());
            id
        }
        None => request_context::get_or_create(),
    };

    diag::set("requestId", request_id.clone());
    diag::set("http.method", method.clone());
    diag::set("http.path", path.clone());
    diag::set("http.clientIp", client_ip.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        http.method = %method,
        http.path = %path,
        http.client_ip = %client_ip,
    );

    async {
        tracing::info!("request received");
        let mut response = next.run(req).await;

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        tracing::info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            context = ?diag::snapshot(),
            "request completed"
        );
        response
    }
    .instrument(span)
    .await
}

fn inbound_request_id(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(raw.to_string())
}

/// Caller address: first hop of `X-Forwarded-For`, then `X-Real-IP`.
fn client_ip(headers: &HeaderMap) -> String {
    for header in ["x-forwarded-for", "x-real-ip"] {
        if let Some(value) = headers.get(header).and_then(|v| v.to_str().ok()) {
            let first = value.split(',').next().unwrap_or("").trim();
            if !first.is_empty() && !first.eq_ignore_ascii_case("unknown") {
                return first.to_string();
            }
        }
    }
    "unknown".to_string()
}
