#![doc = include_str!("../README.md")]

/// Configuration for this node, layered from defaults, an optional file and the environment.
pub mod config;
/// Error type returned throughout this crate.
pub mod error;
/// Discovery endpoints: WebFinger, NodeInfo, actor profiles and collections.
pub mod discovery;
/// Remote actor/object fetching with retry, caching and storage side effects.
pub mod fetch;
/// Thin HTTP framework adapters (axum and actix-web).
pub mod http;
/// Inbox admission, queueing and per-activity-type handlers.
pub mod inbox;
/// JSON-LD compaction and canonicalization, bounded to what ActivityPub needs.
pub mod jsonld;
/// Key generation, lookup and caching for HTTP Signatures.
pub mod keys;
/// Outbox persistence, recipient resolution and signed delivery.
pub mod outbox;
/// Per-IP request rate limiting backed by a pluggable counter store.
pub mod rate_limit;
/// HTTP Signature construction and verification (draft-cavage-http-signatures-12).
pub mod signatures;
/// Abstract persistence trait and entities for actors, activities and edges.
pub mod store;
/// Structured logging bootstrap.
pub mod telemetry;
/// Traits implemented by embedding applications: objects, actors, activity handlers.
pub mod traits;
/// URL normalization used wherever an IRI is compared or stored.
pub mod url;

pub use activitystreams_kinds as kinds;

/// Mime type for Activitypub, used for `Accept` and `Content-Type` HTTP headers.
pub static APUB_JSON_CONTENT_TYPE: &str = "application/activity+json";

/// Well-known IRI that stands in for "every follower of this actor".
pub static PUBLIC_COLLECTION: &str = "https://www.w3.org/ns/activitystreams#Public";
