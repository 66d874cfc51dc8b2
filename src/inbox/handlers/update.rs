use crate::error::{Error, Result};
use crate::inbox::{InboxContext, InboxJob};
use crate::jsonld;
use crate::url::normalize;
use serde_json::Value;

/// Applies an in-place field update to an existing [`crate::store::ContentObject`]. If we don't
/// recognize the object (it was never created locally, or arrived by reference only), fall back
/// to fetching the authoritative copy rather than guessing at a partial patch.
pub async fn handle(ctx: &InboxContext, job: &InboxJob) -> Result<()> {
    let object_iri = job
        .object_iri
        .clone()
        .ok_or_else(|| Error::BadRequest("Update missing object".to_string()))?;

    let Some(object) = job.raw.get("object").filter(|v| v.is_object()) else {
        ctx.fetcher.fetch_and_store_object(&object_iri).await?;
        return Ok(());
    };

    if let Some(attributed_to) = jsonld::extract_iri_field(object, "attributedTo").map(|s| normalize(&s)) {
        if attributed_to != job.actor_iri {
            return Err(Error::BadRequest(format!(
                "Update actor {} does not match object attributedTo {attributed_to}",
                job.actor_iri
            )));
        }
    }

    match ctx.store.find_content_object_by_iri(&object_iri).await? {
        Some(mut existing) => {
            if let Some(kind) = object.get("type").and_then(Value::as_str) {
                existing.kind = kind.to_string();
            }
            if let Some(in_reply_to) = jsonld::extract_iri_field(object, "inReplyTo") {
                existing.in_reply_to_iri = Some(normalize(&in_reply_to));
            }
            existing.raw = object.clone();
            existing.activitypub_updated_at = Some(chrono::Utc::now());
            ctx.store.upsert_content_object(existing).await?;
        }
        None => {
            ctx.fetcher.fetch_and_store_object(&object_iri).await?;
        }
    }
    Ok(())
}
