//! axum glue: an `ActivityRequest` extractor and a `Content-Type: application/activity+json`
//! response wrapper, mirroring the shape teachers of this code reach for (`FederationJson`), but
//! generalized to this crate's own framework-agnostic [`crate::inbox::admit`].

use super::ErrorEnvelope;
use crate::error::Error;
use crate::inbox::InboxContext;
use crate::APUB_JSON_CONTENT_TYPE;
use axum::body::{to_bytes, Body};
use axum::extract::FromRequest;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

/// Inbox payloads are small JSON-LD documents; this is generous headroom against a runaway body.
const MAX_INBOX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Everything [`crate::inbox::admit`] needs out of an inbound axum request, extracted once so the
/// handler never has to re-read the body.
pub struct ActivityRequest {
    pub headers: HeaderMap,
    pub method: Method,
    pub uri: Uri,
    pub body: Vec<u8>,
}

impl<S: Send + Sync> FromRequest<S> for ActivityRequest {
    type Rejection = Response;

    async fn from_request(req: axum::http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let bytes = to_bytes(body, MAX_INBOX_BODY_BYTES)
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()).into_response())?;
        Ok(Self {
            headers: parts.headers,
            method: parts.method,
            uri: parts.uri,
            body: bytes.to_vec(),
        })
    }
}

/// Run the admission path (§4.7) for a decomposed axum request, returning `202 Accepted` on
/// success. The caller owns mapping the error case through [`ApiError`].
pub async fn admit_inbox(ctx: &InboxContext, request: ActivityRequest, source_ip: Option<&str>) -> Result<StatusCode, Error> {
    let path_and_query = request
        .uri
        .path_and_query()
        .map_or_else(|| request.uri.path().to_string(), |pq| pq.as_str().to_string());

    crate::inbox::admit(
        ctx,
        source_ip,
        &request.method,
        &path_and_query,
        &request.headers,
        &request.body,
    )
    .await?;
    Ok(StatusCode::ACCEPTED)
}

/// Wraps a JSON-LD body so its `Content-Type` is `application/activity+json` rather than axum's
/// default `application/json`.
pub struct ActivityJson<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for ActivityJson<T> {
    fn into_response(self) -> Response {
        let mut response = Json(self.0).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            APUB_JSON_CONTENT_TYPE
                .parse()
                .expect("static content type always parses"),
        );
        response
    }
}

/// Maps a core [`Error`] onto an axum response carrying the JSON error envelope of §7.
pub struct ApiError {
    pub error: Error,
    pub path: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope::new(&self.error, &self.path);
        let status = StatusCode::from_u16(envelope.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(envelope)).into_response()
    }
}
