use crate::error::Result;
use crate::inbox::{InboxContext, InboxJob};
use serde_json::Value;

/// Hands the report off to the configured [`crate::traits::ModerationSink`]; this crate has no
/// opinion on moderation workflow beyond delivering the report.
pub async fn handle(ctx: &InboxContext, job: &InboxJob) -> Result<()> {
    let object_iri = job.object_iri.as_deref().unwrap_or_default();
    let content = job
        .raw
        .get("content")
        .or_else(|| job.raw.get("summary"))
        .and_then(Value::as_str);

    ctx.moderation
        .report(object_iri, &job.actor_iri, content, &job.raw)
        .await;
    Ok(())
}
