use crate::jsonld::CONTEXT_ACTIVITYSTREAMS;
use serde_json::{json, Value};

/// The five collections every actor exposes, per §4.9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Followers,
    Following,
    Outbox,
    Inbox,
    Liked,
}

impl CollectionKind {
    pub fn as_path_segment(&self) -> &'static str {
        match self {
            CollectionKind::Followers => "followers",
            CollectionKind::Following => "following",
            CollectionKind::Outbox => "outbox",
            CollectionKind::Inbox => "inbox",
            CollectionKind::Liked => "liked",
        }
    }
}

/// Render one `OrderedCollectionPage` of IRIs (never embedded objects, per §4.9), in descending
/// creation order. `page` and `per_page` are the caller's already-validated query parameters.
pub fn page(collection_iri: &str, items: Vec<String>, total_items: u64, page_num: u64, per_page: u64) -> Value {
    let mut doc = json!({
        "@context": CONTEXT_ACTIVITYSTREAMS,
        "id": format!("{collection_iri}?page={page_num}&perPage={per_page}"),
        "type": "OrderedCollectionPage",
        "partOf": collection_iri,
        "totalItems": total_items,
        "orderedItems": items,
    });
    if page_num > 1 {
        doc["prev"] = json!(format!("{collection_iri}?page={}&perPage={per_page}", page_num - 1));
    }
    if (page_num * per_page) < total_items {
        doc["next"] = json!(format!("{collection_iri}?page={}&perPage={per_page}", page_num + 1));
    }
    doc
}

/// Render the bare (unpaged) collection root, which only advertises `totalItems` and a link to
/// the first page; clients page in via [`page`].
pub fn root(collection_iri: &str, total_items: u64) -> Value {
    json!({
        "@context": CONTEXT_ACTIVITYSTREAMS,
        "id": collection_iri,
        "type": "OrderedCollection",
        "totalItems": total_items,
        "first": format!("{collection_iri}?page=1&perPage=20"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_math_matches_totals() {
        let items: Vec<String> = (0..5).map(|i| format!("https://example.test/objects/{i}")).collect();
        let doc = page("https://example.test/actors/alice/outbox", items.clone(), 42, 2, 5);
        assert_eq!(doc["totalItems"], 42);
        assert_eq!(doc["orderedItems"].as_array().unwrap().len(), 5);
        assert!(doc.get("prev").is_some());
        assert!(doc.get("next").is_some());
    }

    #[test]
    fn last_page_has_no_next_link() {
        let doc = page("https://example.test/actors/alice/outbox", vec![], 10, 1, 20);
        assert!(doc.get("next").is_none());
        assert!(doc.get("prev").is_none());
    }
}
