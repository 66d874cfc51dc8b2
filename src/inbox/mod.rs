pub mod handlers;

use crate::error::{Error, Result};
use crate::fetch::ObjectFetcher;
use crate::jsonld;
use crate::keys::KeyStore;
use crate::queue::{Job, Queue, RetryPolicy, WorkerOutcome};
use crate::rate_limit::{self, CounterStore};
use crate::signatures;
use crate::store::Store;
use crate::traits::ModerationSink;
use crate::url::normalize;
use http::{HeaderMap, Method};
use serde_json::Value;
use std::sync::Arc;

/// A compacted inbound activity, ready for a per-type handler.
#[derive(Debug, Clone)]
pub struct InboxJob {
    pub activity_iri: String,
    pub actor_iri: String,
    pub object_iri: Option<String>,
    pub kind: String,
    pub raw: Value,
}

/// Shared state the inbox admission path and worker both need.
pub struct InboxContext {
    pub store: Arc<dyn Store>,
    pub fetcher: Arc<ObjectFetcher>,
    pub key_store: Arc<KeyStore>,
    pub counter_store: Arc<dyn CounterStore>,
    pub moderation: Arc<dyn ModerationSink>,
    pub queue: Arc<Queue<InboxJob>>,
    pub outbox_queue: Arc<Queue<crate::outbox::OutboxJob>>,
    pub outbox_ctx: Arc<crate::outbox::OutboxContext>,
    pub instance_base_url: String,
}

impl InboxContext {
    pub fn new(
        store: Arc<dyn Store>,
        fetcher: Arc<ObjectFetcher>,
        key_store: Arc<KeyStore>,
        counter_store: Arc<dyn CounterStore>,
        moderation: Arc<dyn ModerationSink>,
        outbox_queue: Arc<Queue<crate::outbox::OutboxJob>>,
        outbox_ctx: Arc<crate::outbox::OutboxContext>,
        instance_base_url: String,
    ) -> Self {
        Self {
            store,
            fetcher,
            key_store,
            counter_store,
            moderation,
            queue: Queue::new(RetryPolicy::default()),
            outbox_queue,
            outbox_ctx,
            instance_base_url,
        }
    }
}

/// Run the admission path (§4.7 "Acceptance path"): rate limit, verify signature, compact, extract
/// actor/object, dedup, enqueue. Returns once the job is enqueued (or recognized as a duplicate);
/// the actual handler runs asynchronously on a worker.
pub async fn admit(
    ctx: &InboxContext,
    source_ip: Option<&str>,
    method: &Method,
    path_and_query: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<()> {
    if let Some(ip) = source_ip {
        rate_limit::check(ctx.counter_store.as_ref(), ip).await?;
    } else {
        tracing::warn!("inbox request with no determinable source IP; skipping rate limit");
    }

    signatures::verify(method, path_and_query, headers, body, &ctx.key_store).await?;

    let payload: Value =
        serde_json::from_slice(body).map_err(|e| Error::BadRequest(format!("invalid JSON: {e}")))?;
    let compacted = jsonld::compact(payload)?;

    let activity_iri = compacted
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::BadRequest("activity missing id".to_string()))?;
    let activity_iri = normalize(activity_iri);

    let kind = compacted
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::BadRequest("activity missing type".to_string()))?
        .to_string();

    let actor_iri = jsonld::extract_actor_iri(&compacted)
        .ok_or_else(|| Error::BadRequest("activity missing actor".to_string()))?;
    let actor_iri = normalize(&actor_iri);

    let object_iri = jsonld::extract_object_iri(&compacted).map(|s| normalize(&s));

    // §4.7 step 6: an IRI already recorded in the processed-id set is a no-op duplicate, even if
    // the original job is still in flight or the process has since restarted (the queue's own
    // `job_id` dedup only covers this process's lifetime).
    if !ctx.store.mark_processed(&activity_iri).await? {
        return Ok(());
    }

    let job = InboxJob {
        activity_iri: activity_iri.clone(),
        actor_iri,
        object_iri,
        kind,
        raw: compacted,
    };
    ctx.queue.enqueue(activity_iri, job).await;
    Ok(())
}

/// Dispatch one dequeued job to its per-type handler.
pub async fn process_one(ctx: &InboxContext, job: Job<InboxJob>) -> WorkerOutcome<InboxJob> {
    let kind = job.payload.kind.clone();
    let result = match kind.as_str() {
        "Follow" => handlers::follow::handle(ctx, &job.payload).await,
        "Accept" => handlers::accept::handle(ctx, &job.payload).await,
        "Reject" => handlers::reject::handle(ctx, &job.payload).await,
        "Create" => handlers::create::handle(ctx, &job.payload).await,
        "Update" => handlers::update::handle(ctx, &job.payload).await,
        "Delete" => handlers::delete::handle(ctx, &job.payload).await,
        "Like" => handlers::like::handle(ctx, &job.payload).await,
        "Announce" => handlers::announce::handle(ctx, &job.payload).await,
        "Block" => handlers::block::handle(ctx, &job.payload).await,
        "Flag" => handlers::flag::handle(ctx, &job.payload).await,
        "Move" => handlers::move_actor::handle(ctx, &job.payload).await,
        "Undo" => handlers::undo::handle(ctx, &job.payload).await,
        other => {
            tracing::info!(kind = other, "no handler registered for activity type");
            Ok(())
        }
    };

    match result {
        Ok(()) => {
            let activity = crate::store::Activity {
                id: uuid::Uuid::new_v4(),
                iri: job.payload.activity_iri.clone(),
                kind,
                actor_iri: job.payload.actor_iri.clone(),
                object_iri: job.payload.object_iri.clone(),
                in_reply_to_iri: None,
                recipient_iris: Vec::new(),
                raw: job.payload.raw.clone(),
                created_at: chrono::Utc::now(),
                deleted_at: None,
            };
            if let Err(e) = ctx.store.upsert_activity(activity).await {
                tracing::error!(error = %e, "failed to persist processed activity");
            }
            WorkerOutcome::Done
        }
        Err(e) if e.is_transient() => {
            tracing::warn!(error = %e, activity_iri = %job.payload.activity_iri, "transient inbox handler failure, retrying");
            WorkerOutcome::Retry(job)
        }
        Err(e) => {
            tracing::warn!(error = %e, activity_iri = %job.payload.activity_iri, "permanent inbox handler failure, dropping");
            WorkerOutcome::Failed
        }
    }
}
