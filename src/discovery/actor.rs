use crate::jsonld::{CONTEXT_ACTIVITYSTREAMS, CONTEXT_SECURITY_V1};
use crate::store::Actor;
use serde_json::{json, Value};

/// Render a stored [`Actor`] as an ActivityStreams `Person`, with the collection IRIs and public
/// key every remote peer needs to federate with it.
pub fn render(actor: &Actor) -> Value {
    let mut doc = json!({
        "@context": [CONTEXT_ACTIVITYSTREAMS, CONTEXT_SECURITY_V1],
        "id": actor.iri,
        "type": "Person",
        "preferredUsername": actor.preferred_username,
        "inbox": actor.inbox_iri,
        "outbox": actor.outbox_iri,
        "followers": actor.followers_iri,
        "following": actor.following_iri,
        "liked": actor.liked_iri,
        "publicKey": {
            "id": format!("{}#main-key", actor.iri),
            "owner": actor.iri,
            "publicKeyPem": actor.public_key_pem,
        },
    });

    if let Some(name) = &actor.display_name {
        doc["name"] = json!(name);
    }
    if let Some(summary) = &actor.summary {
        doc["summary"] = json!(summary);
    }
    if let Some(shared_inbox) = &actor.shared_inbox_iri {
        doc["endpoints"] = json!({ "sharedInbox": shared_inbox });
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_actor() -> Actor {
        Actor {
            id: uuid::Uuid::new_v4(),
            iri: "https://example.test/actors/alice".to_string(),
            preferred_username: "alice".to_string(),
            display_name: Some("Alice".to_string()),
            summary: None,
            is_local: true,
            inbox_iri: "https://example.test/actors/alice/inbox".to_string(),
            outbox_iri: "https://example.test/actors/alice/outbox".to_string(),
            followers_iri: "https://example.test/actors/alice/followers".to_string(),
            following_iri: "https://example.test/actors/alice/following".to_string(),
            liked_iri: "https://example.test/actors/alice/liked".to_string(),
            shared_inbox_iri: None,
            public_key_pem: "-----BEGIN PUBLIC KEY-----\n-----END PUBLIC KEY-----".to_string(),
            private_key_pem: Some("pem".to_string()),
            raw: json!({}),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn renders_person_with_public_key() {
        let doc = render(&sample_actor());
        assert_eq!(doc["type"], "Person");
        assert_eq!(doc["id"], "https://example.test/actors/alice");
        assert_eq!(doc["publicKey"]["owner"], "https://example.test/actors/alice");
        assert_eq!(doc["name"], "Alice");
    }
}
