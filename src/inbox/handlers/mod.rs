pub mod accept;
pub mod announce;
pub mod block;
pub mod create;
pub mod delete;
pub mod flag;
pub mod follow;
pub mod like;
pub mod move_actor;
pub mod reject;
pub mod undo;
pub mod update;

use crate::jsonld;
use serde_json::Value;

/// Extract the actor IRI of an inner (embedded) activity, e.g. the `Follow` nested inside an
/// `Accept`'s `object` field.
pub(crate) fn inner_actor_iri(raw: &Value) -> Option<String> {
    raw.get("object").and_then(jsonld::extract_actor_iri)
}

/// Extract the object IRI of an inner (embedded) activity.
pub(crate) fn inner_object_iri(raw: &Value) -> Option<String> {
    let inner = raw.get("object")?;
    jsonld::extract_object_iri(inner)
}

/// Extract the `type` of an inner (embedded) activity/object.
pub(crate) fn inner_type(raw: &Value) -> Option<String> {
    raw.get("object")?
        .get("type")
        .and_then(Value::as_str)
        .map(String::from)
}
