use serde_json::Value;

/// Produce a deterministic n-quads-style serialization of a compacted ActivityPub document,
/// suitable as input to a digest/signature over "the canonical form of this activity".
///
/// This is intentionally not a general URDNA2015 implementation: ActivityPub documents are
/// IRI-keyed (no blank nodes needing the graph-isomorphism search that algorithm exists for), so
/// canonical form here is just a depth-first, key-sorted flattening into `subject predicate
/// object .` triples, which is sufficient to make two JSON encodings of the same activity
/// produce byte-identical output.
pub fn canonicalize(doc: &Value) -> String {
    let mut triples = Vec::new();
    let subject = doc
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("_:root")
        .to_string();
    walk(&subject, doc, &mut triples);
    triples.sort();
    triples.join("\n")
}

fn walk(subject: &str, doc: &Value, out: &mut Vec<String>) {
    let Value::Object(map) = doc else {
        return;
    };
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    for key in keys {
        if key == "id" || key == "@context" {
            continue;
        }
        let value = &map[key];
        emit(subject, key, value, out);
    }
}

fn emit(subject: &str, predicate: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(format!("{subject} {predicate} \"{s}\" .")),
        Value::Number(n) => out.push(format!("{subject} {predicate} {n} .")),
        Value::Bool(b) => out.push(format!("{subject} {predicate} {b} .")),
        Value::Array(items) => {
            for item in items {
                emit(subject, predicate, item, out);
            }
        }
        Value::Object(map) => {
            if let Some(Value::String(inner_id)) = map.get("id") {
                out.push(format!("{subject} {predicate} <{inner_id}> ."));
                walk(inner_id, value, out);
            } else {
                let blank = format!("_:{subject}/{predicate}");
                out.push(format!("{subject} {predicate} {blank} ."));
                walk(&blank, value, out);
            }
        }
        Value::Null => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn same_document_canonicalizes_identically_regardless_of_key_order() {
        let a = json!({"id": "https://e.com/1", "type": "Follow", "actor": "https://e.com/a"});
        let b = json!({"actor": "https://e.com/a", "type": "Follow", "id": "https://e.com/1"});
        assert_eq!(canonicalize(&a), canonicalize(&b));
    }

    #[test]
    fn different_documents_canonicalize_differently() {
        let a = json!({"id": "https://e.com/1", "type": "Follow"});
        let b = json!({"id": "https://e.com/1", "type": "Accept"});
        assert_ne!(canonicalize(&a), canonicalize(&b));
    }
}
