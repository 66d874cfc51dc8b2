use crate::error::{Error, Result};
use crate::store::{ContentObject, Store};
use crate::url::normalize;
use serde_json::{json, Value};

/// Dereference a locally hosted object by IRI, returning its stored JSON-LD, or a `Tombstone` if
/// it was soft-deleted. Activities (e.g. an Announce) are also dereferenceable this way, since
/// they're addressable by IRI like any other object.
pub async fn dereference(store: &dyn Store, iri: &str) -> Result<Value> {
    let normalized = normalize(iri);

    if let Some(object) = store.find_content_object_by_iri(&normalized).await? {
        return Ok(if object.deleted_at.is_some() {
            tombstone(&object)
        } else {
            object.raw
        });
    }

    if let Some(activity) = store.find_activity_by_iri(&normalized).await? {
        if activity.deleted_at.is_none() {
            return Ok(activity.raw);
        }
    }

    Err(Error::NotFound(normalized))
}

fn tombstone(object: &ContentObject) -> Value {
    json!({
        "id": object.iri,
        "type": "Tombstone",
        "formerType": object.kind,
        "deleted": object.deleted_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let store = MemoryStore::new();
        let err = dereference(&store, "https://example.test/objects/missing").await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn deleted_object_renders_tombstone() {
        let store = MemoryStore::new();
        let iri = "https://example.test/objects/1".to_string();
        store
            .upsert_content_object(ContentObject {
                id: uuid::Uuid::new_v4(),
                iri: iri.clone(),
                kind: "Note".to_string(),
                attributed_to_iri: "https://example.test/actors/alice".to_string(),
                in_reply_to_iri: None,
                raw: json!({"id": iri, "type": "Note"}),
                activitypub_updated_at: None,
                created_at: chrono::Utc::now(),
                deleted_at: None,
            })
            .await
            .unwrap();
        store.soft_delete_content_object(&iri).await.unwrap();

        let doc = dereference(&store, &iri).await.unwrap();
        assert_eq!(doc["type"], "Tombstone");
    }
}
