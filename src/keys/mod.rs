use crate::error::{Error, Result};
use crate::fetch::ObjectFetcher;
use crate::store::Store;
use moka::future::Cache;
use pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rand::rngs::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest as _, Sha256};
use std::sync::Arc;
use std::time::Duration;

const RSA_KEY_BITS: usize = 2048;
const POSITIVE_TTL: Duration = Duration::from_secs(60 * 60 * 24);
const NEGATIVE_TTL: Duration = Duration::from_secs(60 * 60);

/// A generated RSA keypair, PEM encoded. [`Keypair::private_key_pem`] is redacted by `Debug` so
/// an accidental `{:?}` on a value containing one never leaks key material.
pub struct Keypair {
    pub public_key_pem: String,
    private_key_pem: String,
}

impl Keypair {
    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key_pem", &self.public_key_pem)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// Generate a fresh 2048-bit RSA keypair for a newly created local actor.
pub fn generate_local_keypair() -> Result<Keypair> {
    let mut rng = OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
        .map_err(|e| Error::Other(anyhow::anyhow!("RSA key generation failed: {e}")))?;
    let public_key = RsaPublicKey::from(&private_key);

    let private_key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| Error::Other(anyhow::anyhow!("PKCS#8 encoding failed: {e}")))?
        .to_string();
    let public_key_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| Error::Other(anyhow::anyhow!("SPKI encoding failed: {e}")))?;

    Ok(Keypair {
        public_key_pem,
        private_key_pem,
    })
}

/// SHA-256 digest header value over exact body bytes, as required by the `Digest` header.
pub fn digest_header(body: &[u8]) -> String {
    use base64::Engine as _;
    let hash = Sha256::digest(body);
    format!("SHA-256={}", base64::engine::general_purpose::STANDARD.encode(hash))
}

/// Resolves and caches actor public keys by `keyId`, and looks up local actors' private keys.
pub struct KeyStore {
    store: Arc<dyn Store>,
    fetcher: Arc<ObjectFetcher>,
    found: Cache<String, String>,
    missing: Cache<String, ()>,
}

impl KeyStore {
    pub fn new(store: Arc<dyn Store>, fetcher: Arc<ObjectFetcher>) -> Self {
        Self {
            store,
            fetcher,
            found: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(POSITIVE_TTL)
                .build(),
            missing: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(NEGATIVE_TTL)
                .build(),
        }
    }

    /// The private key PEM of a local actor, by actor IRI. Fails with `NotFound` for a remote or
    /// unknown actor.
    pub async fn private_key_pem(&self, local_actor_iri: &str) -> Result<String> {
        let actor = self
            .store
            .find_actor_by_iri(local_actor_iri)
            .await?
            .ok_or_else(|| Error::NotFound(format!("actor {local_actor_iri}")))?;
        if !actor.is_local {
            return Err(Error::NotFound(format!(
                "actor {local_actor_iri} is not local"
            )));
        }
        actor
            .private_key_pem
            .ok_or_else(|| Error::NotFound(format!("no private key for {local_actor_iri}")))
    }

    /// Resolve a `keyId` (an actor IRI with a `#main-key`-style fragment) to a PEM public key,
    /// fetching and caching the owning actor if it is not already known locally.
    pub async fn public_key_pem(&self, key_id: &str) -> Result<String> {
        if let Some(pem) = self.found.get(key_id).await {
            return Ok(pem);
        }
        if self.missing.get(key_id).await.is_some() {
            return Err(Error::NotFound(format!("key {key_id}")));
        }

        let owner_iri = strip_fragment(key_id);
        let actor = match self.store.find_actor_by_iri(&owner_iri).await? {
            Some(actor) => actor,
            None => match self.fetcher.fetch_and_store_actor(&owner_iri).await {
                Ok(actor) => actor,
                Err(e) => {
                    self.missing.insert(key_id.to_string(), ()).await;
                    return Err(e);
                }
            },
        };

        self.found
            .insert(key_id.to_string(), actor.public_key_pem.clone())
            .await;
        Ok(actor.public_key_pem)
    }
}

fn strip_fragment(key_id: &str) -> String {
    match key_id.split_once('#') {
        Some((base, _)) => base.to_string(),
        None => key_id.to_string(),
    }
}
