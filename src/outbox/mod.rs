use crate::error::{Error, Result};
use crate::fetch::ObjectFetcher;
use crate::keys::KeyStore;
use crate::queue::{Job, Queue, WorkerOutcome};
use crate::signatures::{self, SigningRequest};
use crate::store::Store;
use crate::url::{domain_of, normalize};
use crate::PUBLIC_COLLECTION;
use http::Method;
use itertools::Itertools;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// An outbound activity queued for signed delivery.
#[derive(Debug, Clone)]
pub struct OutboxJob {
    pub local_actor_iri: String,
    pub activity: Value,
}

/// Shared state the outbox worker needs.
pub struct OutboxContext {
    pub store: Arc<dyn Store>,
    pub fetcher: Arc<ObjectFetcher>,
    pub key_store: Arc<KeyStore>,
    pub http: Client,
    pub debug_inline: bool,
}

impl OutboxContext {
    pub fn new(
        store: Arc<dyn Store>,
        fetcher: Arc<ObjectFetcher>,
        key_store: Arc<KeyStore>,
        request_timeout: Duration,
        debug_inline: bool,
    ) -> Self {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("reqwest client builder should not fail with static config");
        Self {
            store,
            fetcher,
            key_store,
            http,
            debug_inline,
        }
    }
}

/// Enqueue `activity` authored by `local_actor_iri` for delivery. In debug mode, delivers inline
/// and returns once delivery has been attempted, so integration tests observe it synchronously.
pub async fn enqueue(
    ctx: &OutboxContext,
    queue: &Queue<OutboxJob>,
    local_actor_iri: &str,
    activity: Value,
) -> Result<()> {
    let job = OutboxJob {
        local_actor_iri: local_actor_iri.to_string(),
        activity,
    };
    if ctx.debug_inline {
        return deliver(ctx, &job).await;
    }
    let job_id = job
        .activity
        .get("id")
        .and_then(Value::as_str)
        .map(normalize)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    queue.enqueue(job_id, job).await;
    Ok(())
}

/// Process one dequeued outbox job: resolve recipients, resolve target inboxes, sign and deliver.
pub async fn process_one(ctx: &OutboxContext, job: Job<OutboxJob>) -> WorkerOutcome<OutboxJob> {
    match deliver(ctx, &job.payload).await {
        Ok(()) => WorkerOutcome::Done,
        Err(e) if e.is_transient() => WorkerOutcome::Retry(job),
        Err(_) => WorkerOutcome::Failed,
    }
}

async fn deliver(ctx: &OutboxContext, job: &OutboxJob) -> Result<()> {
    let actor = ctx
        .store
        .find_actor_by_iri(&job.local_actor_iri)
        .await?
        .ok_or_else(|| Error::NotFound(format!("local actor {}", job.local_actor_iri)))?;
    let private_key_pem = actor
        .private_key_pem
        .clone()
        .ok_or_else(|| Error::NotFound(format!("no private key for {}", job.local_actor_iri)))?;
    let key_id = format!("{}#main-key", actor.iri);

    let recipients = resolve_recipients(ctx, &actor, &job.activity).await?;
    let inbox_targets = resolve_inbox_targets(ctx, &recipients).await;

    let body = serde_json::to_vec(&job.activity)
        .map_err(|e| Error::Other(anyhow::anyhow!("failed to serialize activity: {e}")))?;

    // `deliver_to` already retries a single target up to the full 1s/2s/4s backoff budget before
    // returning, so by the time this loop finishes every target has reached a terminal state
    // (delivered, rejected, or retries exhausted). None of that should cause the whole job to be
    // re-enqueued — re-running it here would re-POST to targets that already succeeded and
    // re-attempt ones that already exhausted their retries (§4.8 step 5, property 9).
    for target in &inbox_targets {
        if let Err(e) = deliver_to(ctx, target, &body, &key_id, &private_key_pem).await {
            tracing::warn!(target, error = %e, "delivery target did not succeed, not retrying this job for it");
            let letter = crate::store::DeadLetter {
                id: uuid::Uuid::new_v4(),
                queue: "outbox".to_string(),
                job_id: job
                    .activity
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or(target)
                    .to_string(),
                last_error: format!("{target}: {e}"),
                attempts: 3,
                recorded_at: chrono::Utc::now(),
            };
            if let Err(store_err) = ctx.store.record_dead_letter(letter).await {
                tracing::error!(error = %store_err, "failed to record dead letter for delivery target");
            }
        }
    }
    Ok(())
}

async fn deliver_to(
    ctx: &OutboxContext,
    inbox_iri: &str,
    body: &[u8],
    key_id: &str,
    private_key_pem: &str,
) -> Result<()> {
    let url = url::Url::parse(inbox_iri)?;
    let host = url
        .host_str()
        .ok_or_else(|| Error::BadRequest(format!("inbox has no host: {inbox_iri}")))?
        .to_string();
    let path_and_query = match url.query() {
        Some(q) => format!("{}?{q}", url.path()),
        None => url.path().to_string(),
    };

    let request = SigningRequest {
        method: &Method::POST,
        path_and_query: &path_and_query,
        host: &host,
        body,
        content_type: crate::APUB_JSON_CONTENT_TYPE,
    };
    let headers = signatures::sign(&request, key_id, private_key_pem)?;

    let mut attempt = 0;
    loop {
        let mut req = ctx
            .http
            .post(inbox_iri)
            .header("Content-Type", crate::APUB_JSON_CONTENT_TYPE)
            .body(body.to_vec());
        for (name, value) in &headers {
            req = req.header(name, value);
        }
        let response = req.send().await;
        match response {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            // §4.8 step 5 / property 9: a 4xx is never retried, for this target or the job.
            Ok(resp) if resp.status().is_client_error() => {
                return Err(Error::DeliveryFailed(format!(
                    "{inbox_iri} rejected delivery with {}",
                    resp.status()
                )));
            }
            _ if attempt < 3 => {
                tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
                attempt += 1;
            }
            // Retry budget for this target is exhausted: terminal (property 9 "marked failed for
            // that job"), not a transient condition the caller should retry the whole job over.
            Ok(resp) => {
                return Err(Error::DeliveryFailed(format!(
                    "{inbox_iri} returned {} after {attempt} retries",
                    resp.status()
                )));
            }
            Err(e) => {
                return Err(Error::DeliveryFailed(format!(
                    "{inbox_iri} unreachable after {attempt} retries: {e}"
                )));
            }
        }
    }
}

async fn resolve_recipients(
    ctx: &OutboxContext,
    actor: &crate::store::Actor,
    activity: &Value,
) -> Result<Vec<String>> {
    let mut recipients = Vec::new();
    for field in ["to", "cc", "bto", "bcc", "audience"] {
        let Some(value) = activity.get(field) else {
            continue;
        };
        let iris: Vec<String> = match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items.iter().filter_map(Value::as_str).map(String::from).collect(),
            _ => continue,
        };
        for iri in iris {
            if iri == PUBLIC_COLLECTION {
                let (followers, _) = ctx.store.list_followers(&actor.iri, 0, u64::MAX).await?;
                recipients.extend(followers);
            } else if iri == actor.followers_iri {
                let (followers, _) = ctx.store.list_followers(&actor.iri, 0, u64::MAX).await?;
                recipients.extend(followers);
            } else {
                recipients.push(normalize(&iri));
            }
        }
    }
    Ok(recipients.into_iter().unique().collect())
}

async fn resolve_inbox_targets(ctx: &OutboxContext, recipients: &[String]) -> Vec<String> {
    let mut by_domain: HashMap<String, Vec<String>> = HashMap::new();
    for recipient in recipients {
        if let Some(domain) = domain_of(recipient) {
            by_domain.entry(domain).or_default().push(recipient.clone());
        }
    }

    let mut targets = Vec::new();
    for (domain, actors) in by_domain {
        if actors.len() >= 2 {
            if let Ok(Some(shared)) = ctx.fetcher.fetch_shared_inbox_for_domain(&domain).await {
                targets.push(shared);
                continue;
            }
        }
        for actor_iri in actors {
            if let Ok(inbox) = ctx.fetcher.fetch_actor_inbox_iri(&actor_iri).await {
                targets.push(inbox);
            }
        }
    }
    targets.into_iter().unique().collect()
}
