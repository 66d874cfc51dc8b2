use crate::error::{Error, Result};
use crate::inbox::{InboxContext, InboxJob};

/// The Announce activity itself is persisted generically by [`crate::inbox::process_one`] once
/// this handler returns `Ok`; this handler's own job is to best-effort fetch the announced object
/// so boosts render without a second round-trip.
pub async fn handle(ctx: &InboxContext, job: &InboxJob) -> Result<()> {
    let object_iri = job
        .object_iri
        .clone()
        .ok_or_else(|| Error::BadRequest("Announce missing object".to_string()))?;

    if ctx.store.find_content_object_by_iri(&object_iri).await?.is_none() {
        if let Err(e) = ctx.fetcher.fetch_and_store_object(&object_iri).await {
            tracing::debug!(error = %e, object_iri, "best-effort fetch of announced object failed");
        }
    }
    Ok(())
}
