use crate::error::{Error, Result};
use crate::store::Store;
use serde::Serialize;

/// A single link entry of a JRD (JSON Resource Descriptor), RFC 7033 §4.4.4.
#[derive(Debug, Clone, Serialize)]
pub struct JrdLink {
    pub rel: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// A JRD document, the WebFinger response body.
#[derive(Debug, Clone, Serialize)]
pub struct Jrd {
    pub subject: String,
    pub aliases: Vec<String>,
    pub links: Vec<JrdLink>,
}

/// Resolve a WebFinger `resource` query parameter into a JRD naming the matching local actor's
/// profile IRI, per §4.9. Only `acct:` resources are understood; any other scheme, or a host that
/// isn't this instance, is rejected rather than silently ignored.
pub async fn resolve(store: &dyn Store, instance_host: &str, resource: &str) -> Result<Jrd> {
    let rest = resource
        .strip_prefix("acct:")
        .ok_or_else(|| Error::BadRequest(format!("unsupported WebFinger resource scheme: {resource}")))?;
    let (username, host) = rest
        .rsplit_once('@')
        .ok_or_else(|| Error::BadRequest(format!("malformed acct resource: {resource}")))?;

    if !host.eq_ignore_ascii_case(instance_host) {
        return Err(Error::NotFound(format!("{host} is not hosted here")));
    }

    let actor = store
        .find_actor_by_username(username)
        .await?
        .filter(|a| a.is_local)
        .ok_or_else(|| Error::NotFound(format!("no local actor named {username}")))?;

    Ok(Jrd {
        subject: format!("acct:{username}@{host}"),
        aliases: vec![actor.iri.clone()],
        links: vec![JrdLink {
            rel: "self".to_string(),
            kind: Some(crate::APUB_JSON_CONTENT_TYPE.to_string()),
            href: Some(actor.iri),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Actor, MemoryStore};

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .upsert_actor(Actor {
                id: uuid::Uuid::new_v4(),
                iri: "https://example.test/actors/alice".to_string(),
                preferred_username: "alice".to_string(),
                display_name: None,
                summary: None,
                is_local: true,
                inbox_iri: "https://example.test/actors/alice/inbox".to_string(),
                outbox_iri: "https://example.test/actors/alice/outbox".to_string(),
                followers_iri: "https://example.test/actors/alice/followers".to_string(),
                following_iri: "https://example.test/actors/alice/following".to_string(),
                liked_iri: "https://example.test/actors/alice/liked".to_string(),
                shared_inbox_iri: None,
                public_key_pem: "pem".to_string(),
                private_key_pem: Some("pem".to_string()),
                raw: serde_json::json!({}),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn resolves_local_actor() {
        let store = seeded_store().await;
        let jrd = resolve(&store, "example.test", "acct:alice@example.test")
            .await
            .unwrap();
        assert_eq!(jrd.subject, "acct:alice@example.test");
        assert_eq!(jrd.aliases, vec!["https://example.test/actors/alice"]);
        assert_eq!(jrd.links[0].href.as_deref(), Some("https://example.test/actors/alice"));
    }

    #[tokio::test]
    async fn rejects_foreign_host() {
        let store = seeded_store().await;
        let err = resolve(&store, "example.test", "acct:alice@other.test")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn rejects_non_acct_resource() {
        let store = seeded_store().await;
        let err = resolve(&store, "example.test", "https://example.test/actors/alice")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BadRequest);
    }
}
