use crate::error::Result;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;

/// Discover a remote domain's shared inbox, trying `/nodeinfo/2.0` first and falling back to the
/// `.well-known/nodeinfo` indirection, per §4.5.
pub async fn discover_shared_inbox(
    client: &ClientWithMiddleware,
    domain: &str,
) -> Result<Option<String>> {
    if let Some(doc) = try_fetch_json(client, &format!("https://{domain}/nodeinfo/2.0")).await {
        if let Some(url) = extract_shared_inbox(&doc) {
            return Ok(Some(url));
        }
    }

    let Some(well_known) =
        try_fetch_json(client, &format!("https://{domain}/.well-known/nodeinfo")).await
    else {
        return Ok(None);
    };
    let Some(href) = well_known
        .get("links")
        .and_then(Value::as_array)
        .and_then(|links| {
            links.iter().find(|l| {
                l.get("rel").and_then(Value::as_str)
                    == Some("http://nodeinfo.diaspora.software/ns/schema/2.0")
            })
        })
        .and_then(|l| l.get("href"))
        .and_then(Value::as_str)
    else {
        return Ok(None);
    };

    let Some(doc) = try_fetch_json(client, href).await else {
        return Ok(None);
    };
    Ok(extract_shared_inbox(&doc))
}

async fn try_fetch_json(client: &ClientWithMiddleware, url: &str) -> Option<Value> {
    let resp = client.get(url).send().await.ok()?;
    if !resp.status().is_success() {
        return None;
    }
    resp.json::<Value>().await.ok()
}

fn extract_shared_inbox(doc: &Value) -> Option<String> {
    let protocols = doc.get("protocols")?.as_array()?;
    let supports_activitypub = protocols
        .iter()
        .any(|p| p.as_str() == Some("activitypub"));
    if !supports_activitypub {
        return None;
    }
    doc.get("metadata")
        .and_then(|m| m.get("usage"))
        .or_else(|| doc.get("usage"))
        .and_then(|u| u.get("sharedInboxUrl"))
        .and_then(Value::as_str)
        .map(String::from)
}
