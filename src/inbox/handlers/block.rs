use crate::error::{Error, Result};
use crate::inbox::{InboxContext, InboxJob};

/// Records the block edge. No notification is sent back; a Block is silent by convention.
pub async fn handle(ctx: &InboxContext, job: &InboxJob) -> Result<()> {
    let blocked_iri = job
        .object_iri
        .clone()
        .ok_or_else(|| Error::BadRequest("Block missing object".to_string()))?;
    ctx.store.insert_block(&job.actor_iri, &blocked_iri).await
}
