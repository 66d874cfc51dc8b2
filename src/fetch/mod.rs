mod nodeinfo;

use crate::error::{Error, Result};
use crate::jsonld;
use crate::store::{Actor, ContentObject, Store};
use crate::url::normalize;
use moka::future::Cache;
use reqwest::Client;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const POSITIVE_TTL: Duration = Duration::from_secs(60 * 60 * 24);
const NEGATIVE_TTL: Duration = Duration::from_secs(60 * 60);
const MAX_RETRIES: u32 = 3;

/// Fetches remote actors and objects over HTTP, with retry, response caching and local upsert.
pub struct ObjectFetcher {
    client: ClientWithMiddleware,
    store: Arc<dyn Store>,
    instance_base_url: String,
    found: Cache<String, Value>,
    missing: Cache<String, ()>,
}

impl ObjectFetcher {
    pub fn new(store: Arc<dyn Store>, instance_base_url: String, timeout: Duration) -> Self {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(format!(
                "activitypub-node/{} (+{instance_base_url})",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .expect("reqwest client builder should not fail with static config");
        Self {
            client: ClientWithMiddleware::from(inner),
            store,
            instance_base_url,
            found: Cache::builder()
                .max_capacity(50_000)
                .time_to_live(POSITIVE_TTL)
                .build(),
            missing: Cache::builder()
                .max_capacity(50_000)
                .time_to_live(NEGATIVE_TTL)
                .build(),
        }
    }

    /// Fetch and JSON-LD-compact a remote object, without storing it.
    pub async fn fetch_object(&self, iri: &str) -> Result<Value> {
        let key = normalize(iri);
        if let Some(doc) = self.found.get(&key).await {
            return Ok(doc);
        }
        if self.missing.get(&key).await.is_some() {
            return Err(Error::NotFound(key));
        }

        match self.fetch_with_retry(iri).await {
            Ok(doc) => {
                let compacted = jsonld::compact(doc)?;
                self.found.insert(key, compacted.clone()).await;
                Ok(compacted)
            }
            Err(e) => {
                if matches!(e.kind(), crate::error::ErrorKind::NotFound) {
                    self.missing.insert(key, ()).await;
                }
                Err(e)
            }
        }
    }

    async fn fetch_with_retry(&self, iri: &str) -> Result<Value> {
        let mut attempt = 0;
        loop {
            let response = self
                .client
                .get(iri)
                .header(
                    "Accept",
                    "application/activity+json, application/ld+json;profile=\"https://www.w3.org/ns/activitystreams\"",
                )
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .json::<Value>()
                        .await
                        .map_err(|e| Error::RemoteFetchFailed(e.to_string()));
                }
                Ok(resp) if resp.status().as_u16() == 404 => {
                    return Err(Error::NotFound(iri.to_string()));
                }
                Ok(resp) if resp.status().is_client_error() => {
                    return Err(Error::RemoteFetchFailed(format!(
                        "{iri} returned {}",
                        resp.status()
                    )));
                }
                _ if attempt < MAX_RETRIES => {
                    tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
                    attempt += 1;
                    continue;
                }
                Ok(resp) => {
                    return Err(Error::RemoteFetchFailed(format!(
                        "{iri} returned {} after {attempt} retries",
                        resp.status()
                    )));
                }
                Err(e) => {
                    return Err(Error::RemoteFetchFailed(format!(
                        "{iri} unreachable after {attempt} retries: {e}"
                    )));
                }
            }
        }
    }

    /// Fetch a remote actor and upsert it into the store, classifying by compacted `type`.
    pub async fn fetch_and_store_actor(&self, iri: &str) -> Result<Actor> {
        let doc = self.fetch_object(iri).await?;
        upsert_actor_from_json(&self.store, doc).await
    }

    /// Fetch a remote object and store it as either an [`Actor`] or a [`ContentObject`],
    /// dispatching on the compacted `type` field.
    pub async fn fetch_and_store_object(&self, iri: &str) -> Result<()> {
        let doc = self.fetch_object(iri).await?;
        let kind = doc.get("type").and_then(Value::as_str).unwrap_or("");
        if is_actor_kind(kind) {
            upsert_actor_from_json(&self.store, doc).await?;
        } else {
            upsert_content_object_from_json(&self.store, doc).await?;
        }
        Ok(())
    }

    /// Resolve the inbox IRI of a remote actor, fetching it if unknown locally.
    pub async fn fetch_actor_inbox_iri(&self, actor_iri: &str) -> Result<String> {
        let actor = match self.store.find_actor_by_iri(actor_iri).await? {
            Some(actor) => actor,
            None => self.fetch_and_store_actor(actor_iri).await?,
        };
        Ok(actor.inbox_iri)
    }

    /// Discover a domain's shared inbox via NodeInfo, per §4.5.
    pub async fn fetch_shared_inbox_for_domain(&self, domain: &str) -> Result<Option<String>> {
        nodeinfo::discover_shared_inbox(&self.client, domain).await
    }

    pub fn instance_base_url(&self) -> &str {
        &self.instance_base_url
    }
}

fn is_actor_kind(kind: &str) -> bool {
    matches!(kind, "Person" | "Service" | "Application" | "Group" | "Organization")
}

async fn upsert_actor_from_json(store: &Arc<dyn Store>, doc: Value) -> Result<Actor> {
    let iri = normalize(
        doc.get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::BadRequest("actor document missing id".to_string()))?,
    );
    let preferred_username = doc
        .get("preferredUsername")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let inbox_iri = doc
        .get("inbox")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::BadRequest("actor document missing inbox".to_string()))?
        .to_string();
    let outbox_iri = doc
        .get("outbox")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let followers_iri = doc
        .get("followers")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let following_iri = doc
        .get("following")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let liked_iri = doc
        .get("liked")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let shared_inbox_iri = doc
        .get("endpoints")
        .and_then(|e| e.get("sharedInbox"))
        .and_then(Value::as_str)
        .map(String::from);
    let public_key_pem = extract_public_key_pem(&doc, &iri)
        .ok_or_else(|| Error::BadRequest("actor document missing publicKey".to_string()))?;

    let now = chrono::Utc::now();
    let existing = store.find_actor_by_iri(&iri).await?;
    let actor = Actor {
        id: existing.as_ref().map(|a| a.id).unwrap_or_else(uuid::Uuid::new_v4),
        iri,
        preferred_username,
        display_name: doc.get("name").and_then(Value::as_str).map(String::from),
        summary: doc.get("summary").and_then(Value::as_str).map(String::from),
        is_local: false,
        inbox_iri,
        outbox_iri,
        followers_iri,
        following_iri,
        liked_iri,
        shared_inbox_iri,
        public_key_pem,
        private_key_pem: None,
        raw: doc,
        created_at: existing.map(|a| a.created_at).unwrap_or(now),
        updated_at: now,
    };
    store.upsert_actor(actor).await
}

fn extract_public_key_pem(doc: &Value, owner_iri: &str) -> Option<String> {
    let public_key = doc.get("publicKey")?;
    match public_key {
        Value::Array(entries) => entries
            .iter()
            .find(|e| e.get("owner").and_then(Value::as_str) == Some(owner_iri))
            .or_else(|| entries.first())
            .and_then(|e| e.get("publicKeyPem"))
            .and_then(Value::as_str)
            .map(String::from),
        Value::Object(_) => public_key
            .get("publicKeyPem")
            .and_then(Value::as_str)
            .map(String::from),
        _ => None,
    }
}

async fn upsert_content_object_from_json(
    store: &Arc<dyn Store>,
    doc: Value,
) -> Result<ContentObject> {
    let iri = normalize(
        doc.get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::BadRequest("object missing id".to_string()))?,
    );
    let kind = doc
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("Object")
        .to_string();
    let attributed_to_iri = jsonld::extract_iri_field(&doc, "attributedTo").unwrap_or_default();
    let in_reply_to_iri = jsonld::extract_iri_field(&doc, "inReplyTo");

    let now = chrono::Utc::now();
    let existing = store.find_content_object_by_iri(&iri).await?;
    let object = ContentObject {
        id: existing.as_ref().map(|o| o.id).unwrap_or_else(uuid::Uuid::new_v4),
        iri,
        kind,
        attributed_to_iri,
        in_reply_to_iri,
        raw: doc,
        activitypub_updated_at: Some(now),
        created_at: existing.map(|o| o.created_at).unwrap_or(now),
        deleted_at: None,
    };
    store.upsert_content_object(object).await
}
