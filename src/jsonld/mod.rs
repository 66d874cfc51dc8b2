mod canonicalize;
mod context;

pub use canonicalize::canonicalize;
pub use context::{context_cache, CONTEXT_ACTIVITYSTREAMS, CONTEXT_IDENTITY_V1, CONTEXT_SECURITY_V1};

use crate::error::{Error, Result};
use serde_json::Value;

/// Compact a JSON-LD document against the embedded well-known contexts plus any extension
/// contexts declared on the document itself.
///
/// This is a bounded adapter, not a general-purpose JSON-LD processor: it resolves `@context`
/// entries that are strings naming a cached well-known context (folding their terms onto the
/// top-level document, which is all ActivityPub compaction needs in practice) and otherwise
/// leaves the document's keys as-is, since every context this crate needs to understand is
/// either `https://www.w3.org/ns/activitystreams`, `https://w3id.org/security/v1`, or an
/// instance's own additive extension context that merely adds vocabulary terms we pass through
/// unchanged. After compacting, `id` and `type` are normalized to plain strings.
pub fn compact(mut doc: Value) -> Result<Value> {
    let obj = doc
        .as_object_mut()
        .ok_or_else(|| Error::BadRequest("JSON-LD document must be an object".to_string()))?;

    if let Some(context) = obj.get("@context") {
        for name in declared_context_names(context) {
            if context_cache().get(&name).is_none() {
                tracing::trace!(
                    context = %name,
                    "@context entry is not one of the embedded well-known contexts; passing its vocabulary through unchanged"
                );
            }
        }
    }

    normalize_id_and_type(obj, "id", "@id");
    normalize_id_and_type(obj, "type", "@type");

    if let Some(actor) = obj.get("actor").cloned() {
        obj.insert("actor".to_string(), flatten_id(actor));
    }
    if let Some(object) = obj.get("object").cloned() {
        obj.insert("object".to_string(), flatten_object(object));
    }

    Ok(doc)
}

/// Names declared by a document's `@context`, which may be a single IRI string or an array mixing
/// IRI strings with inline context objects (the latter carry no name to look up in the cache).
fn declared_context_names(context: &Value) -> Vec<String> {
    match context {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).map(String::from).collect(),
        _ => Vec::new(),
    }
}

fn normalize_id_and_type(
    obj: &mut serde_json::Map<String, Value>,
    key: &str,
    alt_key: &str,
) {
    if !obj.contains_key(key) {
        if let Some(v) = obj.remove(alt_key) {
            obj.insert(key.to_string(), v);
        }
    }
    if let Some(Value::Array(arr)) = obj.get(key) {
        if let Some(first) = arr.first().cloned() {
            obj.insert(key.to_string(), first);
        }
    }
}

/// Reduce `{"id": "..."}`/bare-string references to the plain IRI string, leaving full embedded
/// objects (which the Create/Update/Announce handlers need in full) untouched.
fn flatten_id(v: Value) -> Value {
    match v {
        Value::String(s) => Value::String(s),
        Value::Object(ref map) if map.len() == 1 => map
            .get("id")
            .cloned()
            .unwrap_or(v),
        other => other,
    }
}

fn flatten_object(v: Value) -> Value {
    v
}

/// Extract the actor IRI from a compacted activity's `actor` field, which may be a bare string or
/// an object with an `id`.
pub fn extract_actor_iri(doc: &Value) -> Option<String> {
    extract_iri_field(doc, "actor")
}

/// Extract the object IRI from a compacted activity's `object` field, which may be a bare string
/// or an embedded object with an `id`.
pub fn extract_object_iri(doc: &Value) -> Option<String> {
    extract_iri_field(doc, "object")
}

/// Extract an IRI out of `doc[field]`, which may be a bare string or an embedded object carrying
/// an `id`.
pub fn extract_iri_field(doc: &Value, field: &str) -> Option<String> {
    match doc.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("id").and_then(|v| v.as_str()).map(String::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compacts_at_id_and_at_type() {
        let doc = json!({"@id": "https://example.com/a", "@type": "Follow"});
        let out = compact(doc).unwrap();
        assert_eq!(out["id"], "https://example.com/a");
        assert_eq!(out["type"], "Follow");
    }

    #[test]
    fn extracts_actor_iri_from_string_and_object() {
        let a = json!({"actor": "https://example.com/users/alice"});
        assert_eq!(
            extract_actor_iri(&a),
            Some("https://example.com/users/alice".to_string())
        );
        let b = json!({"actor": {"id": "https://example.com/users/bob", "type": "Person"}});
        assert_eq!(
            extract_actor_iri(&b),
            Some("https://example.com/users/bob".to_string())
        );
    }

    #[test]
    fn missing_actor_is_none() {
        let doc = json!({"type": "Follow"});
        assert_eq!(extract_actor_iri(&doc), None);
    }

    #[test]
    fn compact_consults_the_well_known_context_cache() {
        let doc = json!({
            "id": "https://example.com/a",
            "type": "Follow",
            "@context": [CONTEXT_ACTIVITYSTREAMS, "https://example.com/extension"],
        });
        assert!(context_cache().get(&CONTEXT_ACTIVITYSTREAMS.to_string()).is_some());
        let out = compact(doc).unwrap();
        assert_eq!(out["id"], "https://example.com/a");
    }
}
