use crate::error::Result;
use crate::inbox::{InboxContext, InboxJob};

/// Soft-deletes the referenced [`crate::store::ContentObject`] if we have one; a Delete for an
/// object we never stored is a no-op rather than an error, since we may simply not have seen the
/// Create (or already dropped it).
pub async fn handle(ctx: &InboxContext, job: &InboxJob) -> Result<()> {
    let Some(object_iri) = &job.object_iri else {
        return Ok(());
    };
    if ctx.store.find_content_object_by_iri(object_iri).await?.is_some() {
        ctx.store.soft_delete_content_object(object_iri).await?;
    }
    Ok(())
}
