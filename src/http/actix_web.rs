//! actix-web glue: a request extractor's worth of conversions from actix-web's `http02`-based
//! types to the `http` 1.x types this crate's signature engine and inbox admission path use.

use super::ErrorEnvelope;
use crate::error::Error;
use crate::inbox::InboxContext;
use actix_web::http::StatusCode;
use actix_web::{web::Bytes, HttpRequest, HttpResponse};

fn convert_method(method: &actix_web::http::Method) -> http::Method {
    http::Method::from_bytes(method.as_str().as_bytes()).unwrap_or(http::Method::POST)
}

fn convert_headers(headers: &actix_web::http::header::HeaderMap) -> http::HeaderMap {
    let mut out = http::HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::from_bytes(name.as_str().as_bytes()),
            http::HeaderValue::from_bytes(value.as_bytes()),
        ) {
            out.append(name, value);
        }
    }
    out
}

/// Run the admission path (§4.7) for a POST to `/actors/{user}/inbox` or the shared `/inbox`,
/// returning `202 Accepted` on success. Errors are the caller's responsibility to map via
/// [`error_response`].
pub async fn admit_inbox(ctx: &InboxContext, request: &HttpRequest, body: Bytes) -> Result<HttpResponse, Error> {
    let source_ip = request.peer_addr().map(|addr| addr.ip().to_string());
    let method = convert_method(request.method());
    let headers = convert_headers(request.headers());
    let path_and_query = request.uri().path_and_query().map_or_else(|| request.path().to_string(), |pq| pq.as_str().to_string());

    crate::inbox::admit(
        ctx,
        source_ip.as_deref(),
        &method,
        &path_and_query,
        &headers,
        &body,
    )
    .await?;
    Ok(HttpResponse::Accepted().finish())
}

/// Maps a core [`Error`] onto the JSON error envelope of §7 with the matching HTTP status.
pub fn error_response(error: &Error, path: &str) -> HttpResponse {
    let envelope = ErrorEnvelope::new(error, path);
    let status = StatusCode::from_u16(envelope.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(envelope)
}
