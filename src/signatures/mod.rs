mod parse;

use crate::error::{Error, Result};
use crate::keys::{digest_header, KeyStore};
use base64::Engine as _;
use http::{HeaderMap, HeaderValue, Method};
use pkcs8::DecodePrivateKey;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{RandomizedSigner, Verifier};
use rsa::{pkcs8::DecodePublicKey, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::time::Duration;

pub use parse::ParsedSignature;

/// Headers signed on every outbound request, in order.
const SIGNED_HEADERS: &[&str] = &["(request-target)", "host", "date", "digest", "content-type"];
/// Maximum allowed clock skew between a signature's `Date` header and now.
const MAX_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// A request, decomposed into exactly what the signing string needs.
pub struct SigningRequest<'a> {
    pub method: &'a Method,
    pub path_and_query: &'a str,
    pub host: &'a str,
    pub body: &'a [u8],
    pub content_type: &'a str,
}

/// Sign a request with `key_id`/`private_key_pem`, returning the headers to attach.
pub fn sign(request: &SigningRequest<'_>, key_id: &str, private_key_pem: &str) -> Result<HeaderMap> {
    let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
        .map_err(|e| Error::Other(anyhow::anyhow!("invalid private key: {e}")))?;
    let signing_key = SigningKey::<Sha256>::new(private_key);

    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    let digest = digest_header(request.body);
    let request_target = format!(
        "{} {}",
        request.method.as_str().to_lowercase(),
        request.path_and_query
    );

    let signing_string = build_signing_string(
        &[
            ("(request-target)", request_target.as_str()),
            ("host", request.host),
            ("date", date.as_str()),
            ("digest", digest.as_str()),
            ("content-type", request.content_type),
        ],
        SIGNED_HEADERS,
    )?;

    let signature: Signature = signing_key.sign_with_rng(&mut rand::rngs::OsRng, signing_string.as_bytes());
    let signature_b64 = base64::engine::general_purpose::STANDARD.encode(signature.to_bytes());

    let header_value = format!(
        "keyId=\"{key_id}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{signature_b64}\"",
        SIGNED_HEADERS.join(" ")
    );

    let mut headers = HeaderMap::new();
    headers.insert("Date", HeaderValue::from_str(&date).map_err(to_internal)?);
    headers.insert("Digest", HeaderValue::from_str(&digest).map_err(to_internal)?);
    headers.insert(
        "Signature",
        HeaderValue::from_str(&header_value).map_err(to_internal)?,
    );
    Ok(headers)
}

/// Verify an inbound request's `Signature` and `Digest` headers.
pub async fn verify(
    method: &Method,
    path_and_query: &str,
    headers: &HeaderMap,
    body: &[u8],
    key_store: &KeyStore,
) -> Result<()> {
    let signature_header = headers
        .get("signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::Unauthorized("missing Signature header".to_string()))?;
    let parsed = ParsedSignature::parse(signature_header)?;

    if parsed.headers.is_empty() {
        return Err(Error::Unauthorized("signature covers no headers".to_string()));
    }

    verify_digest(headers, body)?;
    verify_date_freshness(headers)?;

    let mut parts = Vec::with_capacity(parsed.headers.len());
    for name in &parsed.headers {
        let value = if name == "(request-target)" {
            format!("{} {}", method.as_str().to_lowercase(), path_and_query)
        } else {
            headers
                .get(name.as_str())
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    Error::Unauthorized(format!("missing signed header {name}"))
                })?
                .to_string()
        };
        parts.push((name.as_str(), value));
    }
    let signing_string = build_signing_string(
        &parts.iter().map(|(k, v)| (*k, v.as_str())).collect::<Vec<_>>(),
        &parsed.headers.iter().map(String::as_str).collect::<Vec<_>>(),
    )?;

    let public_key_pem = key_store.public_key_pem(&parsed.key_id).await?;
    let public_key = RsaPublicKey::from_public_key_pem(&public_key_pem)
        .map_err(|e| Error::Unauthorized(format!("invalid public key for {}: {e}", parsed.key_id)))?;
    let verifying_key = VerifyingKey::<Sha256>::new(public_key);

    let signature_bytes = base64::engine::general_purpose::STANDARD
        .decode(&parsed.signature)
        .map_err(|e| Error::Unauthorized(format!("invalid signature encoding: {e}")))?;
    let signature = Signature::try_from(signature_bytes.as_slice())
        .map_err(|e| Error::Unauthorized(format!("malformed signature: {e}")))?;

    verifying_key
        .verify(signing_string.as_bytes(), &signature)
        .map_err(|_| Error::Unauthorized("signature verification failed".to_string()))
}

fn verify_digest(headers: &HeaderMap, body: &[u8]) -> Result<()> {
    let Some(received) = headers.get("digest").and_then(|v| v.to_str().ok()) else {
        return Err(Error::Unauthorized("missing Digest header".to_string()));
    };
    let expected = digest_header(body);
    if !received.eq_ignore_ascii_case(&expected) {
        return Err(Error::Unauthorized("digest mismatch".to_string()));
    }
    Ok(())
}

fn verify_date_freshness(headers: &HeaderMap) -> Result<()> {
    let Some(date) = headers.get("date").and_then(|v| v.to_str().ok()) else {
        return Err(Error::Unauthorized("missing Date header".to_string()));
    };
    let sent = httpdate::parse_http_date(date)
        .map_err(|_| Error::Unauthorized("unparseable Date header".to_string()))?;
    let now = std::time::SystemTime::now();
    let skew = now
        .duration_since(sent)
        .or_else(|_| sent.duration_since(now))
        .unwrap_or(Duration::MAX);
    if skew > MAX_CLOCK_SKEW {
        return Err(Error::Unauthorized("stale signature".to_string()));
    }
    Ok(())
}

fn build_signing_string(values: &[(&str, &str)], order: &[&str]) -> Result<String> {
    let mut lines = Vec::with_capacity(order.len());
    for name in order {
        let value = values
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| *v)
            .ok_or_else(|| Error::Other(anyhow::anyhow!("missing header {name} while signing")))?;
        lines.push(format!("{name}: {value}"));
    }
    Ok(lines.join("\n"))
}

fn to_internal(e: http::header::InvalidHeaderValue) -> Error {
    Error::Other(anyhow::anyhow!("invalid header value: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ObjectFetcher;
    use crate::store::{Actor, MemoryStore};
    use std::sync::Arc;

    fn test_keypair() -> (String, String) {
        let kp = crate::keys::generate_local_keypair().unwrap();
        (kp.public_key_pem, kp.private_key_pem().to_string())
    }

    #[tokio::test]
    async fn sign_then_verify_round_trips() {
        let (public_pem, private_pem) = test_keypair();
        let store: Arc<dyn crate::store::Store> = Arc::new(MemoryStore::new());
        store
            .upsert_actor(Actor {
                id: uuid::Uuid::new_v4(),
                iri: "https://example.com/users/alice".to_string(),
                preferred_username: "alice".to_string(),
                display_name: None,
                summary: None,
                is_local: true,
                inbox_iri: "https://example.com/users/alice/inbox".to_string(),
                outbox_iri: "https://example.com/users/alice/outbox".to_string(),
                followers_iri: "https://example.com/users/alice/followers".to_string(),
                following_iri: "https://example.com/users/alice/following".to_string(),
                liked_iri: "https://example.com/users/alice/liked".to_string(),
                shared_inbox_iri: None,
                public_key_pem: public_pem,
                private_key_pem: Some(private_pem.clone()),
                raw: serde_json::json!({}),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
        let fetcher = Arc::new(ObjectFetcher::new(
            store.clone(),
            "https://example.com".to_string(),
            Duration::from_secs(5),
        ));
        let key_store = KeyStore::new(store, fetcher);

        let body = br#"{"type":"Follow"}"#;
        let req = SigningRequest {
            method: &Method::POST,
            path_and_query: "/users/bob/inbox",
            host: "example.com",
            body,
            content_type: "application/activity+json",
        };
        let key_id = "https://example.com/users/alice#main-key";
        let headers = sign(&req, key_id, &private_pem).unwrap();

        let mut full_headers = headers;
        full_headers.insert("host", HeaderValue::from_static("example.com"));
        full_headers.insert(
            "content-type",
            HeaderValue::from_static("application/activity+json"),
        );

        verify(&Method::POST, "/users/bob/inbox", &full_headers, body, &key_store)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn tampered_body_fails_digest_check() {
        let (public_pem, private_pem) = test_keypair();
        let store: Arc<dyn crate::store::Store> = Arc::new(MemoryStore::new());
        store
            .upsert_actor(Actor {
                id: uuid::Uuid::new_v4(),
                iri: "https://example.com/users/alice".to_string(),
                preferred_username: "alice".to_string(),
                display_name: None,
                summary: None,
                is_local: true,
                inbox_iri: "https://example.com/users/alice/inbox".to_string(),
                outbox_iri: "https://example.com/users/alice/outbox".to_string(),
                followers_iri: "https://example.com/users/alice/followers".to_string(),
                following_iri: "https://example.com/users/alice/following".to_string(),
                liked_iri: "https://example.com/users/alice/liked".to_string(),
                shared_inbox_iri: None,
                public_key_pem: public_pem,
                private_key_pem: Some(private_pem.clone()),
                raw: serde_json::json!({}),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
        let fetcher = Arc::new(ObjectFetcher::new(
            store.clone(),
            "https://example.com".to_string(),
            Duration::from_secs(5),
        ));
        let key_store = KeyStore::new(store, fetcher);

        let body = br#"{"type":"Follow"}"#;
        let req = SigningRequest {
            method: &Method::POST,
            path_and_query: "/users/bob/inbox",
            host: "example.com",
            body,
            content_type: "application/activity+json",
        };
        let key_id = "https://example.com/users/alice#main-key";
        let mut headers = sign(&req, key_id, &private_pem).unwrap();
        headers.insert("host", HeaderValue::from_static("example.com"));
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/activity+json"),
        );

        let tampered = br#"{"type":"Accept"}"#;
        let result = verify(&Method::POST, "/users/bob/inbox", &headers, tampered, &key_store).await;
        assert!(result.is_err());
    }
}
