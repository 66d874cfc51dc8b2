use crate::error::{Error, Result};
use crate::inbox::{InboxContext, InboxJob};
use crate::outbox;
use crate::store::FollowStatus;
use crate::url::normalize;
use serde_json::json;

/// Remote `actor` asks to follow a local actor named by `object`: record the edge as accepted
/// and emit a matching `Accept` back to the follower.
///
/// Re-entrant: if the edge is already `accepted` this still re-emits the `Accept`, since the most
/// likely reason a Follow is replayed is that the follower never received the first one.
pub async fn handle(ctx: &InboxContext, job: &InboxJob) -> Result<()> {
    let followed_iri = job
        .object_iri
        .as_ref()
        .ok_or_else(|| Error::BadRequest("Follow missing object".to_string()))?;
    let followed_iri = normalize(followed_iri);

    let followed = ctx
        .store
        .find_actor_by_iri(&followed_iri)
        .await?
        .ok_or_else(|| Error::NotFound(format!("actor {followed_iri}")))?;
    if !followed.is_local {
        return Err(Error::BadRequest(format!(
            "Follow target {followed_iri} is not hosted here"
        )));
    }

    if ctx.store.is_blocked(&followed_iri, &job.actor_iri).await? {
        return Err(Error::Unauthorized(format!(
            "{} has blocked {}",
            followed_iri, job.actor_iri
        )));
    }

    ctx.store
        .upsert_follow(&job.actor_iri, &followed_iri, FollowStatus::Pending)
        .await?;

    let accept = json!({
        "id": format!("{}/activities/accept/{}", ctx.instance_base_url, uuid::Uuid::new_v4()),
        "type": "Accept",
        "actor": followed_iri,
        "object": job.raw,
        "to": [job.actor_iri],
    });
    outbox::enqueue(&ctx.outbox_ctx, &ctx.outbox_queue, &followed_iri, accept).await?;

    ctx.store
        .upsert_follow(&job.actor_iri, &followed_iri, FollowStatus::Accepted)
        .await?;
    Ok(())
}
