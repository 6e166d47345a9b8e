use tracing::error;
use uuid::Uuid;

/// What is known about a request when its outcome gets reported.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub client_ip: String,
}

/// Records a server-side failure and returns the tracking event id.
///
/// Returns `None` for statuses below 500; client errors are not tracked.
pub fn capture_unexpected_5xx(context: &RequestContext, status: u16) -> Option<Uuid> {
    if status < 500 {
        return None;
    }

    let event_id = Uuid::new_v4();
    error!(
        tracking_backend = "log",
        event_id = %event_id,
        request_id = %context.request_id,
        method = %context.method,
        path = %context.path,
        client_ip = %context.client_ip,
        status = status,
        "unexpected server error"
    );
    Some(event_id)
}
