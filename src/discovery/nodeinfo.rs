use serde_json::{json, Value};

/// `/.well-known/nodeinfo`: a pointer to the 2.0 document, per the NodeInfo discovery protocol.
pub fn well_known(instance_base_url: &str) -> Value {
    json!({
        "links": [{
            "rel": "http://nodeinfo.diaspora.software/ns/schema/2.0",
            "href": format!("{instance_base_url}/nodeinfo/2.0"),
        }]
    })
}

/// Usage counters surfaced in both NodeInfo schema versions.
pub struct Usage {
    pub local_actors: u64,
    pub local_activities: u64,
    pub shared_inbox_url: Option<String>,
}

/// `/nodeinfo/2.0`.
pub fn document_2_0(usage: &Usage) -> Value {
    json!({
        "version": "2.0",
        "software": {
            "name": "activitypub-node",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "protocols": ["activitypub"],
        "services": {"inbound": [], "outbound": []},
        "openRegistrations": false,
        "usage": usage_json(usage),
        "metadata": {},
    })
}

/// `/nodeinfo/1.0`: the same facts, shaped to the older (and slightly stricter) 1.0 schema.
pub fn document_1_0(usage: &Usage) -> Value {
    json!({
        "version": "1.0",
        "software": {
            "name": "activitypub-node",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "protocols": ["activitypub"],
        "services": {"inbound": [], "outbound": []},
        "usage": usage_json(usage),
        "openRegistrations": false,
        "metadata": {},
    })
}

fn usage_json(usage: &Usage) -> Value {
    let mut value = json!({
        "users": {"total": usage.local_actors},
        "localPosts": usage.local_activities,
    });
    if let Some(shared_inbox) = &usage.shared_inbox_url {
        value["sharedInboxUrl"] = json!(shared_inbox);
    }
    value
}
