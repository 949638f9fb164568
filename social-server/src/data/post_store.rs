use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::post::{Comment, Like, Post};

/// A post snapshot paired with the store's version counter for it.
/// The version never leaves the data layer except to come back through
/// `save` as the expected value of a conditional write.
#[derive(Debug, Clone)]
pub struct VersionedPost {
    pub post: Post,
    pub version: i64,
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<VersionedPost>, DomainError>;
    /// All posts, newest first.
    async fn list_all(&self) -> Result<Vec<Post>, DomainError>;
    async fn insert(&self, post: Post) -> Result<Post, DomainError>;
    /// Conditional write: applies `post` and bumps the version iff the
    /// stored version still equals `expected_version`, as one atomic
    /// step. A lost race is `DomainError::Conflict` with nothing applied.
    async fn save(&self, post: Post, expected_version: i64) -> Result<Post, DomainError>;
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostStore {
    pool: PgPool,
}

impl PostgresPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn post_from_row(row: &PgRow) -> Result<Post, sqlx::Error> {
    let Json(likes): Json<Vec<Like>> = row.try_get("likes")?;
    let Json(comments): Json<Vec<Comment>> = row.try_get("comments")?;
    Ok(Post {
        id: row.try_get("id")?,
        author_id: row.try_get("author_id")?,
        author_name: row.try_get("author_name")?,
        author_avatar: row.try_get("author_avatar")?,
        text: row.try_get("text")?,
        created_at: row.try_get("created_at")?,
        likes,
        comments,
    })
}

#[async_trait]
impl PostStore for PostgresPostStore {
    async fn get(&self, id: Uuid) -> Result<Option<VersionedPost>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, author_id, author_name, author_avatar, text, created_at,
                   likes, comments, version
            FROM posts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error fetching post {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })?;

        match row {
            Some(row) => {
                let version: i64 = row
                    .try_get("version")
                    .map_err(|e| DomainError::Internal(e.to_string()))?;
                let post = post_from_row(&row).map_err(|e| DomainError::Internal(e.to_string()))?;
                Ok(Some(VersionedPost { post, version }))
            }
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<Post>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, author_id, author_name, author_avatar, text, created_at,
                   likes, comments, version
            FROM posts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while listing posts: {}", e);
            DomainError::Internal(e.to_string())
        })?;

        rows.iter()
            .map(|row| post_from_row(row).map_err(|e| DomainError::Internal(e.to_string())))
            .collect()
    }

    async fn insert(&self, post: Post) -> Result<Post, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, author_name, author_avatar, text,
                               created_at, likes, comments, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1)
            "#,
        )
        .bind(post.id)
        .bind(post.author_id)
        .bind(&post.author_name)
        .bind(&post.author_avatar)
        .bind(&post.text)
        .bind(post.created_at)
        .bind(Json(&post.likes))
        .bind(Json(&post.comments))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(post_id = %post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    async fn save(&self, post: Post, expected_version: i64) -> Result<Post, DomainError> {
        // The version check and the write are one statement, so a
        // concurrent writer can never interleave between them.
        let updated = sqlx::query(
            r#"
            UPDATE posts
            SET likes = $1, comments = $2, version = version + 1
            WHERE id = $3 AND version = $4
            "#,
        )
        .bind(Json(&post.likes))
        .bind(Json(&post.comments))
        .bind(post.id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to save post {}: {}", post.id, e);
            DomainError::Internal(e.to_string())
        })?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::Conflict);
        }

        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if deleted.rows_affected() == 0 {
            return Err(DomainError::PostNotFound(id));
        }

        info!(post_id = %id, "post deleted");
        Ok(())
    }
}

/// In-memory store with the same conditional-save contract, backed by a
/// map under an async lock. Holding the write lock across the version
/// check and the swap is what makes `save` atomic here.
pub struct InMemoryPostStore {
    posts: RwLock<HashMap<Uuid, VersionedPost>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPostStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn get(&self, id: Uuid) -> Result<Option<VersionedPost>, DomainError> {
        let posts = self.posts.read().await;
        Ok(posts.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Post>, DomainError> {
        let posts = self.posts.read().await;
        let mut all: Vec<Post> = posts.values().map(|v| v.post.clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn insert(&self, post: Post) -> Result<Post, DomainError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(DomainError::Internal(format!(
                "duplicate post id: {}",
                post.id
            )));
        }
        posts.insert(
            post.id,
            VersionedPost {
                post: post.clone(),
                version: 1,
            },
        );
        Ok(post)
    }

    async fn save(&self, post: Post, expected_version: i64) -> Result<Post, DomainError> {
        let mut posts = self.posts.write().await;
        match posts.get_mut(&post.id) {
            Some(entry) if entry.version == expected_version => {
                entry.post = post.clone();
                entry.version += 1;
                Ok(post)
            }
            _ => Err(DomainError::Conflict),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut posts = self.posts.write().await;
        posts
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::PostNotFound(id))
    }
}
