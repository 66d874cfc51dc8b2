/// Actor profile rendering (`GET /actors/{user}`).
pub mod actor;
/// Followers/following/outbox/inbox/liked collection pages.
pub mod collections;
/// NodeInfo 1.0/2.0 documents.
pub mod nodeinfo;
/// Object/activity dereference by IRI (`GET /objects/{iri}`).
pub mod object;
/// WebFinger resolution (RFC 7033).
pub mod webfinger;

use crate::error::{Error, Result};

pub use collections::CollectionKind;

/// Clamp an untrusted `perPage` query parameter to a sane range, defaulting when absent.
pub fn normalize_per_page(per_page: Option<u64>) -> u64 {
    per_page.unwrap_or(20).clamp(1, 100)
}

/// Clamp an untrusted `page` query parameter, which is 1-indexed per §8 property 10.
pub fn normalize_page(page: Option<u64>) -> u64 {
    page.unwrap_or(1).max(1)
}

/// The inbox collection is the one owner-only collection per §4.9; the others (followers,
/// following, outbox, liked) are world-readable.
pub fn require_owner(kind: CollectionKind, requester_iri: Option<&str>, owner_iri: &str) -> Result<()> {
    if kind != CollectionKind::Inbox {
        return Ok(());
    }
    match requester_iri {
        Some(iri) if iri == owner_iri => Ok(()),
        _ => Err(Error::Unauthorized(format!(
            "only {owner_iri} may read its own inbox collection"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_page_is_clamped() {
        assert_eq!(normalize_per_page(None), 20);
        assert_eq!(normalize_per_page(Some(0)), 1);
        assert_eq!(normalize_per_page(Some(1000)), 100);
    }

    #[test]
    fn inbox_requires_owner_match() {
        assert!(require_owner(CollectionKind::Inbox, Some("a"), "a").is_ok());
        assert!(require_owner(CollectionKind::Inbox, Some("b"), "a").is_err());
        assert!(require_owner(CollectionKind::Inbox, None, "a").is_err());
    }

    #[test]
    fn other_collections_are_public() {
        assert!(require_owner(CollectionKind::Followers, None, "a").is_ok());
    }
}
