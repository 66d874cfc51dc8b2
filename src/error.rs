use std::fmt::{Debug, Display, Formatter};

/// The error kind, used by HTTP adapters to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed payload, invalid `WebFinger` resource, missing signed headers.
    BadRequest,
    /// Signature, digest or staleness failure; unauthorized inbox/outbox access.
    Unauthorized,
    /// Unknown local actor, unknown object, foreign `WebFinger` host.
    NotFound,
    /// Duplicate actor on create.
    Conflict,
    /// Rate limit exceeded.
    TooManyRequests,
    /// Remote fetch failed; may be retried by the caller.
    RemoteFetchFailed,
    /// A single outbound delivery target rejected the activity or exhausted its own retry
    /// budget; terminal for that target, must not trigger a whole-job retry.
    DeliveryFailed,
    /// Unexpected internal condition.
    InternalFailure,
}

/// Error type returned throughout this crate.
#[derive(thiserror::Error)]
pub enum Error {
    /// The request body or activity could not be parsed or was missing required fields.
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// HTTP signature, digest or authorization check failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// The entity already exists.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Caller exceeded the configured rate limit.
    #[error("Too many requests")]
    TooManyRequests,
    /// A remote fetch failed and may succeed on retry.
    #[error("Remote fetch failed: {0}")]
    RemoteFetchFailed(String),
    /// An outbound delivery target rejected the activity (4xx) or exhausted its own retries
    /// (repeated 5xx/network failure); this target will not receive the activity, but other
    /// targets and the job itself are unaffected.
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
    /// Any other failure not classified above.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Classify this error for HTTP status mapping and retry policy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BadRequest(_) => ErrorKind::BadRequest,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::TooManyRequests => ErrorKind::TooManyRequests,
            Error::RemoteFetchFailed(_) => ErrorKind::RemoteFetchFailed,
            Error::DeliveryFailed(_) => ErrorKind::DeliveryFailed,
            Error::Other(_) => ErrorKind::InternalFailure,
        }
    }

    /// Whether a worker should retry the job that produced this error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RemoteFetchFailed | ErrorKind::InternalFailure
        )
    }

    /// HTTP status code for this error, used by the thin framework adapters.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::RemoteFetchFailed => 502,
            ErrorKind::DeliveryFailed => 502,
            ErrorKind::InternalFailure => 500,
        }
    }
}

// Manual Debug so that an `Other(anyhow::Error)` wrapping a value with key material never
// accidentally prints it; anyhow's Debug already shows the full chain which is what we want here,
// so this just forwards. Kept as its own impl because `thiserror`'s derive requires it on the enum
// regardless.
impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::BadRequest(e.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::BadRequest(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::RemoteFetchFailed(e.to_string())
    }
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(e: derive_builder::UninitializedFieldError) -> Self {
        Error::BadRequest(e.to_string())
    }
}

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_failed_is_not_transient() {
        assert!(!Error::DeliveryFailed("peer rejected with 410".to_string()).is_transient());
    }

    #[test]
    fn remote_fetch_failed_is_transient() {
        assert!(Error::RemoteFetchFailed("timed out".to_string()).is_transient());
    }
}
