use crate::error::{Error, Result};
use crate::inbox::{InboxContext, InboxJob};
use crate::jsonld;
use crate::url::normalize;
use serde_json::Value;

/// Undo of `{Follow, Like, Announce, Block, Create}`. The inner activity's actor must equal the
/// outer Undo's actor, or a remote actor could unravel edges it never created.
pub async fn handle(ctx: &InboxContext, job: &InboxJob) -> Result<()> {
    let Some(inner) = job.raw.get("object").filter(|v| v.is_object()) else {
        return Err(Error::BadRequest("Undo missing embedded inner activity".to_string()));
    };
    let inner_kind = inner
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::BadRequest("Undo inner activity missing type".to_string()))?;
    let inner_actor = jsonld::extract_actor_iri(inner)
        .map(|s| normalize(&s))
        .ok_or_else(|| Error::BadRequest("Undo inner activity missing actor".to_string()))?;

    if inner_actor != job.actor_iri {
        return Err(Error::BadRequest(format!(
            "Undo actor {} does not match inner activity actor {inner_actor}",
            job.actor_iri
        )));
    }

    match inner_kind {
        "Follow" => {
            let followed_iri = super::inner_object_iri(&job.raw)
                .map(|s| normalize(&s))
                .ok_or_else(|| Error::BadRequest("Undo(Follow) missing inner object".to_string()))?;
            ctx.store.delete_follow(&inner_actor, &followed_iri).await?;
        }
        "Like" => {
            let liked_iri = super::inner_object_iri(&job.raw)
                .map(|s| normalize(&s))
                .ok_or_else(|| Error::BadRequest("Undo(Like) missing inner object".to_string()))?;
            ctx.store.delete_like(&inner_actor, &liked_iri).await?;
        }
        "Block" => {
            let blocked_iri = super::inner_object_iri(&job.raw)
                .map(|s| normalize(&s))
                .ok_or_else(|| Error::BadRequest("Undo(Block) missing inner object".to_string()))?;
            ctx.store.delete_block(&inner_actor, &blocked_iri).await?;
        }
        "Announce" => {
            let announce_iri = inner
                .get("id")
                .and_then(Value::as_str)
                .map(normalize)
                .ok_or_else(|| Error::BadRequest("Undo(Announce) missing inner id".to_string()))?;
            ctx.store.soft_delete_activity(&announce_iri).await?;
        }
        "Create" => {
            let content_iri = super::inner_object_iri(&job.raw)
                .map(|s| normalize(&s))
                .ok_or_else(|| Error::BadRequest("Undo(Create) missing inner object".to_string()))?;
            if ctx.store.find_content_object_by_iri(&content_iri).await?.is_some() {
                ctx.store.soft_delete_content_object(&content_iri).await?;
            }
        }
        other => {
            tracing::info!(kind = other, "no Undo handling for this inner activity type, ignoring");
        }
    }
    Ok(())
}
