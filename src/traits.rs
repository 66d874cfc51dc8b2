use crate::error::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// A remote or local object that can be fetched, cached and stored by IRI.
///
/// Implemented by the embedding application's own actor/content types. `DataType` is whatever
/// shared handle the implementation needs to reach its store (typically `Data<YourContext>`).
#[async_trait]
pub trait Object: Sized {
    /// Application-specific context passed to every trait method (store handle, http client, ...).
    type DataType: Send + Sync;
    /// The JSON-LD wire representation of this object.
    type Kind: Serialize + DeserializeOwned + Send;
    /// Error type surfaced by trait methods; normally [`Error`] itself.
    type Error: From<Error> + Send;

    /// When this object was last refreshed from its authoritative source, if ever.
    fn last_refreshed_at(&self) -> Option<DateTime<Utc>>;

    /// Look up a previously stored copy of the object with the given normalized IRI.
    async fn read_from_id(
        object_id: url::Url,
        data: &Self::DataType,
    ) -> Result<Option<Self>, Self::Error>;

    /// Permanently remove the local copy of this object, if persistence supports it.
    async fn delete(self, data: &Self::DataType) -> Result<(), Self::Error>;

    /// Convert this object into its wire representation for signing or outbound delivery.
    async fn into_json(self, data: &Self::DataType) -> Result<Self::Kind, Self::Error>;

    /// Validate an incoming wire representation before it is persisted.
    async fn verify(
        json: &Self::Kind,
        expected_domain: &url::Url,
        data: &Self::DataType,
    ) -> Result<(), Self::Error>;

    /// Construct (and usually persist) this object from a verified wire representation.
    async fn from_json(json: Self::Kind, data: &Self::DataType) -> Result<Self, Self::Error>;
}

/// An [`Object`] that additionally carries the actor-specific fields the signature engine and
/// discovery endpoints need: inbox/outbox IRIs and a public key.
pub trait Actor: Object {
    /// This actor's public key, PEM encoded (SPKI).
    fn public_key_pem(&self) -> &str;
    /// This actor's private key, PEM encoded (PKCS#8), if it is hosted locally.
    fn private_key_pem(&self) -> Option<String>;
    /// The actor's personal inbox IRI.
    fn inbox(&self) -> url::Url;
    /// The actor's shared inbox IRI, if its server advertises one.
    fn shared_inbox(&self) -> Option<url::Url> {
        None
    }
}

/// A handler for one ActivityPub activity type, invoked by the inbox worker.
///
/// Implementations MUST be idempotent: the worker may invoke `receive` more than once for the
/// same activity IRI (e.g. after a crash between handling and acknowledging a job).
#[async_trait]
pub trait ActivityHandler: Send {
    /// Application-specific context, matching the `DataType` of the objects this handler touches.
    type DataType: Send + Sync;
    /// Error type surfaced by this handler.
    type Error: From<Error> + Send;

    /// The actor IRI that authored this activity.
    fn actor(&self) -> &url::Url;
    /// The recipient IRIs this activity is addressed to (`to`/`cc`/`bto`/`bcc`/`audience`).
    fn to(&self) -> Vec<url::Url>;

    /// Run any checks that must hold before the activity is accepted for processing, beyond the
    /// generic signature/digest checks already performed by the ingress guards.
    async fn verify(&self, data: &Self::DataType) -> Result<(), Self::Error>;

    /// Apply this activity's effects to the store.
    async fn receive(self, data: &Self::DataType) -> Result<(), Self::Error>;
}

/// External hand-off point for `Flag` activities (moderation reports).
///
/// The default implementation only logs; embedding applications that have a moderation queue
/// provide their own implementation.
#[async_trait]
pub trait ModerationSink: Send + Sync {
    /// Record a report against `object_iri`, raised by `reporter_iri`, with the raw activity for
    /// an operator to inspect.
    async fn report(
        &self,
        object_iri: &str,
        reporter_iri: &str,
        content: Option<&str>,
        raw: &serde_json::Value,
    );
}

/// A [`ModerationSink`] that only logs; the default when an embedding application does not wire
/// up a moderation queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingModerationSink;

#[async_trait]
impl ModerationSink for LoggingModerationSink {
    async fn report(
        &self,
        object_iri: &str,
        reporter_iri: &str,
        content: Option<&str>,
        _raw: &serde_json::Value,
    ) {
        tracing::warn!(
            object_iri,
            reporter_iri,
            content,
            "received Flag with no moderation sink configured, dropping"
        );
    }
}
