//! Thin adapters between this crate's framework-agnostic core and the `actix-web`/`axum` features.
//!
//! Route registration, bearer-token principal extraction, and anything else specific to an HTTP
//! framework are the embedding application's job (§1 treats the routing framework itself as an
//! external collaborator); these modules only carry what every adapter needs regardless of which
//! framework hosts it: pulling method/headers/body out of a request for [`crate::inbox::admit`],
//! and mapping [`crate::error::Error`] onto the JSON error envelope of §7.

#[cfg(feature = "actix-web")]
pub mod actix_web;
#[cfg(feature = "axum")]
pub mod axum;

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The JSON error envelope required by §7: `{statusCode, message, path, timestamp}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub message: String,
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorEnvelope {
    pub fn new(error: &Error, path: &str) -> Self {
        Self {
            status_code: error.status_code(),
            message: redact_for_client(error),
            path: path.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// POSTs to inboxes never expose internal state (§7): collapse anything not already meant for the
/// client into a fixed, terse message.
fn redact_for_client(error: &Error) -> String {
    use crate::error::ErrorKind;
    match error.kind() {
        ErrorKind::Unauthorized => "unauthorized".to_string(),
        ErrorKind::InternalFailure => "internal error".to_string(),
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_message_is_redacted() {
        let error = Error::Unauthorized("digest mismatch for actor X".to_string());
        let envelope = ErrorEnvelope::new(&error, "/actors/alice/inbox");
        assert_eq!(envelope.message, "unauthorized");
        assert_eq!(envelope.status_code, 401);
    }

    #[test]
    fn not_found_message_passes_through() {
        let error = Error::NotFound("actor bob".to_string());
        let envelope = ErrorEnvelope::new(&error, "/actors/bob");
        assert_eq!(envelope.message, "Not found: actor bob");
    }
}
