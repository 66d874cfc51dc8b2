use crate::error::{Error, Result};
use crate::inbox::{InboxContext, InboxJob};
use crate::jsonld;
use crate::store::ContentObject;
use crate::url::normalize;
use serde_json::Value;

/// Persists the inner object as a [`ContentObject`]. If it replies to something we don't already
/// have, fetches and stores that too so a reply chain can be rendered without further round-trips.
pub async fn handle(ctx: &InboxContext, job: &InboxJob) -> Result<()> {
    let object_iri = job
        .object_iri
        .clone()
        .ok_or_else(|| Error::BadRequest("Create missing object".to_string()))?;

    let Some(object) = job.raw.get("object").filter(|v| v.is_object()) else {
        ctx.fetcher.fetch_and_store_object(&object_iri).await?;
        return Ok(());
    };

    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("Object")
        .to_string();
    let attributed_to_iri = jsonld::extract_iri_field(object, "attributedTo")
        .map(|s| normalize(&s))
        .unwrap_or_else(|| job.actor_iri.clone());
    let in_reply_to_iri = jsonld::extract_iri_field(object, "inReplyTo").map(|s| normalize(&s));

    let now = chrono::Utc::now();
    let existing = ctx.store.find_content_object_by_iri(&object_iri).await?;
    let content = ContentObject {
        id: existing.as_ref().map(|o| o.id).unwrap_or_else(uuid::Uuid::new_v4),
        iri: object_iri,
        kind,
        attributed_to_iri,
        in_reply_to_iri: in_reply_to_iri.clone(),
        raw: object.clone(),
        activitypub_updated_at: None,
        created_at: existing.map(|o| o.created_at).unwrap_or(now),
        deleted_at: None,
    };
    ctx.store.upsert_content_object(content).await?;

    if let Some(in_reply_to) = in_reply_to_iri {
        if ctx.store.find_content_object_by_iri(&in_reply_to).await?.is_none() {
            if let Err(e) = ctx.fetcher.fetch_and_store_object(&in_reply_to).await {
                tracing::warn!(error = %e, in_reply_to, "failed to fetch in-reply-to object, continuing");
            }
        }
    }
    Ok(())
}
