use crate::error::{Error, Result};
use crate::inbox::{InboxContext, InboxJob};

/// Records the like edge and best-effort fetches the liked object so it can be rendered; a fetch
/// failure here must not fail the whole activity, since the like itself is still valid.
pub async fn handle(ctx: &InboxContext, job: &InboxJob) -> Result<()> {
    let object_iri = job
        .object_iri
        .clone()
        .ok_or_else(|| Error::BadRequest("Like missing object".to_string()))?;

    ctx.store.insert_like(&job.actor_iri, &object_iri).await?;

    if ctx.store.find_content_object_by_iri(&object_iri).await?.is_none() {
        if let Err(e) = ctx.fetcher.fetch_and_store_object(&object_iri).await {
            tracing::debug!(error = %e, object_iri, "best-effort fetch of liked object failed");
        }
    }
    Ok(())
}
