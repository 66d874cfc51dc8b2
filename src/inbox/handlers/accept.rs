use crate::error::Result;
use crate::inbox::{InboxContext, InboxJob};
use crate::store::FollowStatus;
use crate::url::normalize;

/// Remote `actor` accepted a Follow we sent earlier: the inner object is the original Follow,
/// whose actor is us and whose object is the remote actor now accepting it.
///
/// A missing edge means we never sent (or have forgotten) that Follow; warn and no-op rather than
/// fabricate one, since we have no local actor to attribute it to.
pub async fn handle(ctx: &InboxContext, job: &InboxJob) -> Result<()> {
    if super::inner_type(&job.raw).as_deref() != Some("Follow") {
        tracing::debug!(activity_iri = %job.activity_iri, "Accept does not wrap a Follow, ignoring");
        return Ok(());
    }
    let Some(follower_iri) = super::inner_actor_iri(&job.raw) else {
        tracing::warn!(activity_iri = %job.activity_iri, "Accept(Follow) missing inner actor");
        return Ok(());
    };
    let follower_iri = normalize(&follower_iri);
    let followed_iri = normalize(&job.actor_iri);

    if ctx.store.find_follow(&follower_iri, &followed_iri).await?.is_none() {
        tracing::warn!(follower_iri, followed_iri, "Accept for unknown Follow edge, ignoring");
        return Ok(());
    }

    ctx.store
        .upsert_follow(&follower_iri, &followed_iri, FollowStatus::Accepted)
        .await
}
