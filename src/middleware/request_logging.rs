//! Per-request logging: request id propagation, a request span and a
//! "request completed" line with status and latency.
use std::time::Instant;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, HeaderName, HeaderValue};
use actix_web::middleware::Next;
use actix_web::Error;
use tracing::{info, Instrument, Span};
use uuid::Uuid;

use crate::observability::error_tracking::{capture_unexpected_5xx, RequestContext};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LENGTH: usize = 128;

/// Middleware body for `actix_web::middleware::from_fn`.
pub async fn log_request(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let context = RequestContext {
        request_id: incoming_request_id(&req).unwrap_or_else(|| Uuid::new_v4().to_string()),
        method: req.method().to_string(),
        path: req.path().to_string(),
        client_ip: get_client_ip(&req),
    };
    let span = create_request_span(&context, &get_user_agent(&req));
    let start = Instant::now();

    let mut response = next.call(req).instrument(span.clone()).await?;

    if let Ok(value) = HeaderValue::from_str(&context.request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_millis() as u64;
    span.in_scope(|| {
        info!(
            status = status,
            status_class = get_status_class(status),
            latency_ms = latency_ms,
            "request completed"
        );
    });
    capture_unexpected_5xx(&context, status);

    Ok(response)
}

/// Reuses a caller-supplied request id when it is short printable ASCII.
pub fn incoming_request_id(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| {
            !value.is_empty()
                && value.len() <= MAX_REQUEST_ID_LENGTH
                && value.chars().all(|c| c.is_ascii_graphic())
        })
        .map(str::to_string)
}

/// Client address as resolved by actix-web.
///
/// Forwarded headers are only honoured when actix is configured to trust them.
pub fn get_client_ip(req: &ServiceRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn get_user_agent(req: &ServiceRequest) -> String {
    req.headers()
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

pub fn create_request_span(context: &RequestContext, user_agent: &str) -> Span {
    tracing::info_span!(
        "request",
        request_id = %context.request_id,
        method = %context.method,
        path = %context.path,
        client_ip = %context.client_ip,
        user_agent = %user_agent
    )
}

pub fn get_status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "unknown",
    }
}
