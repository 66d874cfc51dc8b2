use moka::sync::Cache;
use serde_json::Value;
use std::sync::OnceLock;

/// The ActivityStreams 2.0 context IRI.
pub static CONTEXT_ACTIVITYSTREAMS: &str = "https://www.w3.org/ns/activitystreams";
/// The security vocabulary context IRI (public keys).
pub static CONTEXT_SECURITY_V1: &str = "https://w3id.org/security/v1";
/// The identity vocabulary context IRI.
pub static CONTEXT_IDENTITY_V1: &str = "https://w3id.org/identity/v1";

/// Offline cache of well-known JSON-LD contexts, so compaction never needs the network for the
/// handful of contexts every ActivityPub payload actually uses. Anything else is resolved by the
/// caller's own network document loader (see [`crate::fetch`]).
pub fn context_cache() -> &'static Cache<String, Value> {
    static CACHE: OnceLock<Cache<String, Value>> = OnceLock::new();
    CACHE.get_or_init(|| {
        let cache = Cache::new(16);
        cache.insert(
            CONTEXT_ACTIVITYSTREAMS.to_string(),
            serde_json::json!({ "@vocab": CONTEXT_ACTIVITYSTREAMS }),
        );
        cache.insert(
            CONTEXT_SECURITY_V1.to_string(),
            serde_json::json!({ "@vocab": CONTEXT_SECURITY_V1 }),
        );
        cache.insert(
            CONTEXT_IDENTITY_V1.to_string(),
            serde_json::json!({ "@vocab": CONTEXT_IDENTITY_V1 }),
        );
        cache
    })
}
