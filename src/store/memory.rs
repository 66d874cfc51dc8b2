use super::{Activity, Actor, ContentObject, DeadLetter, FollowStatus, Store};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// In-memory reference [`Store`] implementation, used by this crate's own test suite and the
/// local-federation examples. Not suitable for production use: nothing is durable.
#[derive(Default)]
pub struct MemoryStore {
    actors: RwLock<HashMap<String, Actor>>,
    activities: RwLock<HashMap<String, Activity>>,
    objects: RwLock<HashMap<String, ContentObject>>,
    processed: RwLock<HashSet<String>>,
    follows: RwLock<HashMap<(String, String), FollowStatus>>,
    likes: RwLock<HashSet<(String, String)>>,
    blocks: RwLock<HashSet<(String, String)>>,
    dead_letters: RwLock<Vec<DeadLetter>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T: Clone>(mut items: Vec<T>, offset: u64, limit: u64) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let start = (offset as usize).min(items.len());
    items.drain(..start);
    items.truncate(limit as usize);
    (items, total)
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_actor(&self, actor: Actor) -> Result<Actor> {
        let mut guard = self.actors.write().await;
        guard.insert(actor.iri.clone(), actor.clone());
        Ok(actor)
    }

    async fn find_actor_by_iri(&self, iri: &str) -> Result<Option<Actor>> {
        Ok(self.actors.read().await.get(iri).cloned())
    }

    async fn find_actor_by_username(&self, username: &str) -> Result<Option<Actor>> {
        Ok(self
            .actors
            .read()
            .await
            .values()
            .find(|a| a.is_local && a.preferred_username == username)
            .cloned())
    }

    async fn rewrite_actor_iri(&self, old_iri: &str, new_iri: &str) -> Result<()> {
        let mut guard = self.actors.write().await;
        if let Some(mut actor) = guard.remove(old_iri) {
            actor.iri = new_iri.to_string();
            guard.insert(new_iri.to_string(), actor);
        }
        Ok(())
    }

    async fn upsert_activity(&self, activity: Activity) -> Result<Activity> {
        let mut guard = self.activities.write().await;
        guard.insert(activity.iri.clone(), activity.clone());
        Ok(activity)
    }

    async fn find_activity_by_iri(&self, iri: &str) -> Result<Option<Activity>> {
        Ok(self.activities.read().await.get(iri).cloned())
    }

    async fn list_activities_by_actor(
        &self,
        actor_iri: &str,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Activity>, u64)> {
        let guard = self.activities.read().await;
        let mut items: Vec<Activity> = guard
            .values()
            .filter(|a| a.actor_iri == actor_iri && a.deleted_at.is_none())
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(items, offset, limit))
    }

    async fn soft_delete_activity(&self, iri: &str) -> Result<()> {
        if let Some(activity) = self.activities.write().await.get_mut(iri) {
            activity.deleted_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn rewrite_activity_iris(&self, old_iri: &str, new_iri: &str) -> Result<()> {
        let mut guard = self.activities.write().await;
        for activity in guard.values_mut() {
            if activity.actor_iri == old_iri {
                activity.actor_iri = new_iri.to_string();
            }
            if activity.object_iri.as_deref() == Some(old_iri) {
                activity.object_iri = Some(new_iri.to_string());
            }
            if activity.in_reply_to_iri.as_deref() == Some(old_iri) {
                activity.in_reply_to_iri = Some(new_iri.to_string());
            }
            for recipient in &mut activity.recipient_iris {
                if recipient == old_iri {
                    *recipient = new_iri.to_string();
                }
            }
        }
        Ok(())
    }

    async fn upsert_content_object(&self, object: ContentObject) -> Result<ContentObject> {
        let mut guard = self.objects.write().await;
        guard.insert(object.iri.clone(), object.clone());
        Ok(object)
    }

    async fn find_content_object_by_iri(&self, iri: &str) -> Result<Option<ContentObject>> {
        Ok(self.objects.read().await.get(iri).cloned())
    }

    async fn soft_delete_content_object(&self, iri: &str) -> Result<()> {
        if let Some(obj) = self.objects.write().await.get_mut(iri) {
            obj.deleted_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn rewrite_content_object_iris(&self, old_iri: &str, new_iri: &str) -> Result<()> {
        let mut guard = self.objects.write().await;
        for object in guard.values_mut() {
            if object.attributed_to_iri == old_iri {
                object.attributed_to_iri = new_iri.to_string();
            }
            if object.in_reply_to_iri.as_deref() == Some(old_iri) {
                object.in_reply_to_iri = Some(new_iri.to_string());
            }
        }
        Ok(())
    }

    async fn mark_processed(&self, iri: &str) -> Result<bool> {
        Ok(self.processed.write().await.insert(iri.to_string()))
    }

    async fn upsert_follow(
        &self,
        follower_iri: &str,
        followed_iri: &str,
        status: FollowStatus,
    ) -> Result<()> {
        self.follows.write().await.insert(
            (follower_iri.to_string(), followed_iri.to_string()),
            status,
        );
        Ok(())
    }

    async fn find_follow(
        &self,
        follower_iri: &str,
        followed_iri: &str,
    ) -> Result<Option<FollowStatus>> {
        Ok(self
            .follows
            .read()
            .await
            .get(&(follower_iri.to_string(), followed_iri.to_string()))
            .copied())
    }

    async fn delete_follow(&self, follower_iri: &str, followed_iri: &str) -> Result<()> {
        self.follows
            .write()
            .await
            .remove(&(follower_iri.to_string(), followed_iri.to_string()));
        Ok(())
    }

    async fn list_followers(
        &self,
        followed_iri: &str,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<String>, u64)> {
        let guard = self.follows.read().await;
        let mut items: Vec<String> = guard
            .iter()
            .filter(|((_, followed), status)| {
                followed == followed_iri && matches!(status, FollowStatus::Accepted)
            })
            .map(|((follower, _), _)| follower.clone())
            .collect();
        items.sort();
        Ok(paginate(items, offset, limit))
    }

    async fn list_following(
        &self,
        follower_iri: &str,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<String>, u64)> {
        let guard = self.follows.read().await;
        let mut items: Vec<String> = guard
            .iter()
            .filter(|((follower, _), status)| {
                follower == follower_iri && matches!(status, FollowStatus::Accepted)
            })
            .map(|((_, followed), _)| followed.clone())
            .collect();
        items.sort();
        Ok(paginate(items, offset, limit))
    }

    async fn rewrite_follow_iris(&self, old_iri: &str, new_iri: &str) -> Result<()> {
        let mut guard = self.follows.write().await;
        let keys: Vec<_> = guard
            .keys()
            .filter(|(a, b)| a == old_iri || b == old_iri)
            .cloned()
            .collect();
        for key in keys {
            if let Some(status) = guard.remove(&key) {
                let new_key = (
                    if key.0 == old_iri { new_iri.to_string() } else { key.0 },
                    if key.1 == old_iri { new_iri.to_string() } else { key.1 },
                );
                guard.insert(new_key, status);
            }
        }
        Ok(())
    }

    async fn insert_like(&self, liker_iri: &str, liked_object_iri: &str) -> Result<()> {
        self.likes
            .write()
            .await
            .insert((liker_iri.to_string(), liked_object_iri.to_string()));
        Ok(())
    }

    async fn delete_like(&self, liker_iri: &str, liked_object_iri: &str) -> Result<()> {
        self.likes
            .write()
            .await
            .remove(&(liker_iri.to_string(), liked_object_iri.to_string()));
        Ok(())
    }

    async fn list_liked(
        &self,
        liker_iri: &str,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<String>, u64)> {
        let guard = self.likes.read().await;
        let mut items: Vec<String> = guard
            .iter()
            .filter(|(liker, _)| liker == liker_iri)
            .map(|(_, object)| object.clone())
            .collect();
        items.sort();
        Ok(paginate(items, offset, limit))
    }

    async fn rewrite_like_iris(&self, old_iri: &str, new_iri: &str) -> Result<()> {
        let mut guard = self.likes.write().await;
        let keys: Vec<_> = guard
            .iter()
            .filter(|(a, b)| a == old_iri || b == old_iri)
            .cloned()
            .collect();
        for key in keys {
            guard.remove(&key);
            let new_key = (
                if key.0 == old_iri { new_iri.to_string() } else { key.0 },
                if key.1 == old_iri { new_iri.to_string() } else { key.1 },
            );
            guard.insert(new_key);
        }
        Ok(())
    }

    async fn insert_block(&self, blocker_iri: &str, blocked_iri: &str) -> Result<()> {
        self.blocks
            .write()
            .await
            .insert((blocker_iri.to_string(), blocked_iri.to_string()));
        Ok(())
    }

    async fn delete_block(&self, blocker_iri: &str, blocked_iri: &str) -> Result<()> {
        self.blocks
            .write()
            .await
            .remove(&(blocker_iri.to_string(), blocked_iri.to_string()));
        Ok(())
    }

    async fn is_blocked(&self, blocker_iri: &str, blocked_iri: &str) -> Result<bool> {
        Ok(self
            .blocks
            .read()
            .await
            .contains(&(blocker_iri.to_string(), blocked_iri.to_string())))
    }

    async fn rewrite_block_iris(&self, old_iri: &str, new_iri: &str) -> Result<()> {
        let mut guard = self.blocks.write().await;
        let keys: Vec<_> = guard
            .iter()
            .filter(|(a, b)| a == old_iri || b == old_iri)
            .cloned()
            .collect();
        for key in keys {
            guard.remove(&key);
            let new_key = (
                if key.0 == old_iri { new_iri.to_string() } else { key.0 },
                if key.1 == old_iri { new_iri.to_string() } else { key.1 },
            );
            guard.insert(new_key);
        }
        Ok(())
    }

    async fn record_dead_letter(&self, letter: DeadLetter) -> Result<()> {
        self.dead_letters.write().await.push(letter);
        Ok(())
    }
}
