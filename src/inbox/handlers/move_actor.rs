use crate::error::{Error, Result};
use crate::inbox::{InboxContext, InboxJob};
use crate::jsonld;
use crate::url::normalize;

/// Migrates every row referencing the old actor IRI to the new one. Each table is rewritten in
/// its own store call; a durable [`crate::store::Store`] implementation is expected to wrap these
/// in a single database transaction so a crash mid-migration cannot leave a partially-moved actor.
pub async fn handle(ctx: &InboxContext, job: &InboxJob) -> Result<()> {
    let old_iri = job
        .object_iri
        .clone()
        .ok_or_else(|| Error::BadRequest("Move missing object".to_string()))?;
    let new_iri = jsonld::extract_iri_field(&job.raw, "target")
        .map(|s| normalize(&s))
        .ok_or_else(|| Error::BadRequest("Move missing target".to_string()))?;

    if ctx.store.find_actor_by_iri(&old_iri).await?.is_none() {
        tracing::info!(old_iri, "Move for an actor we don't track, ignoring");
        return Ok(());
    }

    ctx.store.rewrite_actor_iri(&old_iri, &new_iri).await?;
    ctx.store.rewrite_activity_iris(&old_iri, &new_iri).await?;
    ctx.store.rewrite_content_object_iris(&old_iri, &new_iri).await?;
    ctx.store.rewrite_follow_iris(&old_iri, &new_iri).await?;
    ctx.store.rewrite_like_iris(&old_iri, &new_iri).await?;
    ctx.store.rewrite_block_iris(&old_iri, &new_iri).await?;
    Ok(())
}
