use percent_encoding::percent_decode_str;
use url::Url;

/// Canonicalize an IRI for use as an identity/lookup key.
///
/// Rules, applied in order: parse as an absolute URL (unparseable input is returned unchanged,
/// never an error, since callers use this on untrusted strings that are validated elsewhere);
/// lowercase scheme and host; percent-decode the path; drop a single trailing slash from the path
/// when its length exceeds one; query and fragment are preserved verbatim.
pub fn normalize(iri: &str) -> String {
    let Ok(mut url) = Url::parse(iri) else {
        return iri.to_string();
    };

    let _ = url.set_scheme(&url.scheme().to_lowercase());
    if let Some(host) = url.host_str() {
        let lower = host.to_lowercase();
        let _ = url.set_host(Some(&lower));
    }

    let decoded_path = percent_decode_str(url.path())
        .decode_utf8()
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| url.path().to_string());
    let trimmed = if decoded_path.len() > 1 && decoded_path.ends_with('/') {
        decoded_path.trim_end_matches('/').to_string()
    } else {
        decoded_path
    };
    url.set_path(&trimmed);

    url.to_string()
}

/// Extract the bare domain (host, optionally with port) from an absolute IRI.
pub fn domain_of(iri: &str) -> Option<String> {
    let url = Url::parse(iri).ok()?;
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        let cases = [
            "https://Example.COM/Users/alice/",
            "HTTPS://example.com/a%2Fb",
            "https://example.com/",
            "https://example.com/x?y=1#z",
            "not a url at all",
        ];
        for c in cases {
            let once = normalize(c);
            let twice = normalize(&once);
            assert_eq!(once, twice, "not idempotent for {c}");
        }
    }

    #[test]
    fn lowercases_scheme_and_host() {
        assert_eq!(
            normalize("HTTPS://Example.COM/Users/alice"),
            "https://example.com/Users/alice"
        );
    }

    #[test]
    fn strips_single_trailing_slash() {
        assert_eq!(
            normalize("https://example.com/users/alice/"),
            "https://example.com/users/alice"
        );
        assert_eq!(normalize("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn unparseable_input_passes_through() {
        assert_eq!(normalize("acct:alice@example.com"), "acct:alice@example.com");
    }

    #[test]
    fn domain_of_includes_port() {
        assert_eq!(
            domain_of("https://example.com:8080/x"),
            Some("example.com:8080".to_string())
        );
        assert_eq!(
            domain_of("https://example.com/x"),
            Some("example.com".to_string())
        );
    }
}
