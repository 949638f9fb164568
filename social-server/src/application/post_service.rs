use std::sync::Arc;

use crate::data::post_store::{PostStore, VersionedPost};
use crate::domain::error::DomainError;
use crate::domain::post::{Comment, Like, Post};
use crate::domain::user::Actor;
use tracing::{instrument, warn};
use uuid::Uuid;

/// How many times a lost conditional save is retried before the request
/// is answered with `Conflict`.
const MAX_SAVE_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct PostService<S: PostStore + 'static> {
    store: Arc<S>,
}

impl<S> PostService<S>
where
    S: PostStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn fetch(&self, id: Uuid) -> Result<VersionedPost, DomainError> {
        self.store
            .get(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    /// The fetch-decide-save cycle shared by every mutation of an
    /// existing post. The decision runs on a private snapshot; a lost
    /// conditional save reloads and re-decides from scratch, so a
    /// rejection that only holds against a stale snapshot (say, a like
    /// that landed in the meantime) is re-evaluated against the current
    /// state. Engine rejections return without persisting anything.
    async fn mutate<F>(&self, post_id: Uuid, mut decide: F) -> Result<Post, DomainError>
    where
        F: FnMut(&mut Post) -> Result<(), DomainError>,
    {
        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let VersionedPost { mut post, version } = self.fetch(post_id).await?;
            decide(&mut post)?;
            match self.store.save(post, version).await {
                Ok(saved) => return Ok(saved),
                Err(DomainError::Conflict) if attempt < MAX_SAVE_ATTEMPTS => {
                    warn!(post_id = %post_id, attempt, "conditional save lost the race, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(DomainError::Conflict)
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Post, DomainError> {
        Ok(self.fetch(id).await?.post)
    }

    pub async fn get_posts(&self) -> Result<Vec<Post>, DomainError> {
        self.store.list_all().await
    }

    #[instrument(skip(self, actor), fields(author_id = %actor.id))]
    pub async fn create_post(&self, actor: &Actor, text: &str) -> Result<Post, DomainError> {
        let post = Post::new(actor, text)?;
        self.store.insert(post).await
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, actor_id: Uuid, post_id: Uuid) -> Result<(), DomainError> {
        let snapshot = self.fetch(post_id).await?;
        snapshot.post.ensure_author(actor_id)?;
        self.store.delete(post_id).await
    }

    #[instrument(skip(self))]
    pub async fn like_post(&self, actor_id: Uuid, post_id: Uuid) -> Result<Vec<Like>, DomainError> {
        let post = self.mutate(post_id, |post| post.like(actor_id)).await?;
        Ok(post.likes)
    }

    #[instrument(skip(self))]
    pub async fn unlike_post(
        &self,
        actor_id: Uuid,
        post_id: Uuid,
    ) -> Result<Vec<Like>, DomainError> {
        let post = self.mutate(post_id, |post| post.unlike(actor_id)).await?;
        Ok(post.likes)
    }

    #[instrument(skip(self, actor, text), fields(author_id = %actor.id))]
    pub async fn add_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        text: &str,
    ) -> Result<Vec<Comment>, DomainError> {
        let post = self
            .mutate(post_id, |post| post.add_comment(actor, text))
            .await?;
        Ok(post.comments)
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(
        &self,
        actor_id: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Vec<Comment>, DomainError> {
        let post = self
            .mutate(post_id, |post| post.delete_comment(comment_id, actor_id))
            .await?;
        Ok(post.comments)
    }
}
