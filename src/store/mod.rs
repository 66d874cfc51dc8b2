mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Status of a `(follower, followed)` edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FollowStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A hosted or remote ActivityPub actor.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Actor {
    pub id: uuid::Uuid,
    pub iri: String,
    pub preferred_username: String,
    pub display_name: Option<String>,
    pub summary: Option<String>,
    pub is_local: bool,
    pub inbox_iri: String,
    pub outbox_iri: String,
    pub followers_iri: String,
    pub following_iri: String,
    pub liked_iri: String,
    pub shared_inbox_iri: Option<String>,
    pub public_key_pem: String,
    pub private_key_pem: Option<String>,
    pub raw: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted activity (an inbox item received, or an outbox item authored locally).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Activity {
    pub id: uuid::Uuid,
    pub iri: String,
    pub kind: String,
    pub actor_iri: String,
    pub object_iri: Option<String>,
    pub in_reply_to_iri: Option<String>,
    pub recipient_iris: Vec<String>,
    pub raw: Value,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A piece of hosted content (e.g. a `Note`), addressable by IRI.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ContentObject {
    pub id: uuid::Uuid,
    pub iri: String,
    pub kind: String,
    pub attributed_to_iri: String,
    pub in_reply_to_iri: Option<String>,
    pub raw: Value,
    pub activitypub_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A job that exhausted its retry budget, kept for operator inspection.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DeadLetter {
    pub id: uuid::Uuid,
    pub queue: String,
    pub job_id: String,
    pub last_error: String,
    pub attempts: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Abstract persistence for the entities this crate manages. Embedding applications supply a
/// concrete implementation (backed by Postgres, sqlite, ...); [`MemoryStore`] is a reference
/// implementation used by this crate's own tests.
///
/// Implementations MUST make `upsert_actor`/`upsert_activity`/`upsert_content_object` atomic
/// (insert-or-update keyed on `iri`), and MUST serialize concurrent mutations of the same
/// `(follower, followed)` pair so that Follow/Undo races cannot leave a dangling edge.
#[async_trait]
pub trait Store: Send + Sync {
    async fn upsert_actor(&self, actor: Actor) -> Result<Actor>;
    async fn find_actor_by_iri(&self, iri: &str) -> Result<Option<Actor>>;
    async fn find_actor_by_username(&self, username: &str) -> Result<Option<Actor>>;
    async fn rewrite_actor_iri(&self, old_iri: &str, new_iri: &str) -> Result<()>;

    async fn upsert_activity(&self, activity: Activity) -> Result<Activity>;
    async fn find_activity_by_iri(&self, iri: &str) -> Result<Option<Activity>>;
    async fn list_activities_by_actor(
        &self,
        actor_iri: &str,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Activity>, u64)>;
    async fn soft_delete_activity(&self, iri: &str) -> Result<()>;
    /// Rewrite `actor_iri`/`object_iri`/`in_reply_to_iri`/`recipient_iris` on every Activity row
    /// referencing `old_iri`, as part of a Move (actor migration).
    async fn rewrite_activity_iris(&self, old_iri: &str, new_iri: &str) -> Result<()>;

    async fn upsert_content_object(&self, object: ContentObject) -> Result<ContentObject>;
    async fn find_content_object_by_iri(&self, iri: &str) -> Result<Option<ContentObject>>;
    async fn soft_delete_content_object(&self, iri: &str) -> Result<()>;
    /// Rewrite `attributedTo`/`inReplyTo` on every ContentObject row referencing `old_iri`, as
    /// part of a Move (actor migration).
    async fn rewrite_content_object_iris(&self, old_iri: &str, new_iri: &str) -> Result<()>;

    /// Record `iri` as processed; returns `true` if it was newly inserted, `false` if it was
    /// already present (the caller should then treat the activity as a no-op duplicate).
    async fn mark_processed(&self, iri: &str) -> Result<bool>;

    async fn upsert_follow(
        &self,
        follower_iri: &str,
        followed_iri: &str,
        status: FollowStatus,
    ) -> Result<()>;
    async fn find_follow(
        &self,
        follower_iri: &str,
        followed_iri: &str,
    ) -> Result<Option<FollowStatus>>;
    async fn delete_follow(&self, follower_iri: &str, followed_iri: &str) -> Result<()>;
    async fn list_followers(
        &self,
        followed_iri: &str,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<String>, u64)>;
    async fn list_following(
        &self,
        follower_iri: &str,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<String>, u64)>;
    async fn rewrite_follow_iris(&self, old_iri: &str, new_iri: &str) -> Result<()>;

    async fn insert_like(&self, liker_iri: &str, liked_object_iri: &str) -> Result<()>;
    async fn delete_like(&self, liker_iri: &str, liked_object_iri: &str) -> Result<()>;
    async fn list_liked(
        &self,
        liker_iri: &str,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<String>, u64)>;
    async fn rewrite_like_iris(&self, old_iri: &str, new_iri: &str) -> Result<()>;

    async fn insert_block(&self, blocker_iri: &str, blocked_iri: &str) -> Result<()>;
    async fn delete_block(&self, blocker_iri: &str, blocked_iri: &str) -> Result<()>;
    async fn is_blocked(&self, blocker_iri: &str, blocked_iri: &str) -> Result<bool>;
    async fn rewrite_block_iris(&self, old_iri: &str, new_iri: &str) -> Result<()>;

    async fn record_dead_letter(&self, letter: DeadLetter) -> Result<()>;
}
