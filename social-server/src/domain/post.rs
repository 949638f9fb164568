use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::user::Actor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_avatar: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// The post aggregate. `likes` and `comments` are kept most-recent-first;
/// `likes` holds at most one entry per user and every comment id is unique
/// within the post. All mutations go through the methods below, which
/// decide on a snapshot and never touch I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_avatar: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub likes: Vec<Like>,
    pub comments: Vec<Comment>,
}

fn required_text(text: &str) -> Result<String, DomainError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidInput(vec![
            "text is required".to_string(),
        ]));
    }
    Ok(trimmed.to_string())
}

impl Post {
    pub fn new(actor: &Actor, text: &str) -> Result<Self, DomainError> {
        let text = required_text(text)?;
        Ok(Self {
            id: Uuid::new_v4(),
            author_id: actor.id,
            author_name: actor.name.clone(),
            author_avatar: actor.avatar.clone(),
            text,
            created_at: Utc::now(),
            likes: Vec::new(),
            comments: Vec::new(),
        })
    }

    /// Only the post's author may delete it.
    pub fn ensure_author(&self, actor_id: Uuid) -> Result<(), DomainError> {
        if self.author_id != actor_id {
            return Err(DomainError::Forbidden);
        }
        Ok(())
    }

    /// A second like by the same user is an error, not a no-op.
    pub fn like(&mut self, actor_id: Uuid) -> Result<(), DomainError> {
        if self.likes.iter().any(|like| like.user_id == actor_id) {
            return Err(DomainError::AlreadyLiked);
        }
        self.likes.insert(0, Like { user_id: actor_id });
        Ok(())
    }

    pub fn unlike(&mut self, actor_id: Uuid) -> Result<(), DomainError> {
        // At most one entry per user, so the first match is the only one.
        let index = self
            .likes
            .iter()
            .position(|like| like.user_id == actor_id)
            .ok_or(DomainError::NotYetLiked)?;
        self.likes.remove(index);
        Ok(())
    }

    pub fn add_comment(&mut self, actor: &Actor, text: &str) -> Result<(), DomainError> {
        let text = required_text(text)?;
        let comment = Comment {
            id: Uuid::new_v4(),
            author_id: actor.id,
            author_name: actor.name.clone(),
            author_avatar: actor.avatar.clone(),
            text,
            created_at: Utc::now(),
        };
        self.comments.insert(0, comment);
        Ok(())
    }

    /// Existence is checked before ownership: a missing comment is
    /// `CommentNotFound` even when the actor owns nothing on this post.
    /// Only the comment's own author may delete it, regardless of who
    /// owns the post.
    pub fn delete_comment(&mut self, comment_id: Uuid, actor_id: Uuid) -> Result<(), DomainError> {
        let index = self
            .comments
            .iter()
            .position(|comment| comment.id == comment_id)
            .ok_or(DomainError::CommentNotFound(comment_id))?;
        if self.comments[index].author_id != actor_id {
            return Err(DomainError::Forbidden);
        }
        self.comments.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(name: &str) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            name: name.to_string(),
            avatar: format!("https://gravatar.test/{name}"),
        }
    }

    #[test]
    fn create_snapshots_the_author() {
        let author = actor("u1");
        let post = Post::new(&author, "hello").unwrap();

        assert_eq!(post.author_id, author.id);
        assert_eq!(post.author_name, "u1");
        assert_eq!(post.author_avatar, author.avatar);
        assert_eq!(post.text, "hello");
        assert!(post.likes.is_empty());
        assert!(post.comments.is_empty());
    }

    #[test]
    fn create_rejects_blank_text() {
        let author = actor("u1");
        for text in ["", "   ", "\n\t "] {
            match Post::new(&author, text) {
                Err(DomainError::InvalidInput(errors)) => {
                    assert_eq!(errors, vec!["text is required".to_string()]);
                }
                other => panic!("expected InvalidInput, got {other:?}"),
            }
        }
    }

    #[test]
    fn create_trims_text() {
        let post = Post::new(&actor("u1"), "  hello  ").unwrap();
        assert_eq!(post.text, "hello");
    }

    #[test]
    fn like_prepends_and_second_like_rejects() {
        let mut post = Post::new(&actor("u1"), "hello").unwrap();
        let u2 = actor("u2");
        let u3 = actor("u3");

        post.like(u2.id).unwrap();
        post.like(u3.id).unwrap();
        assert_eq!(
            post.likes,
            vec![Like { user_id: u3.id }, Like { user_id: u2.id }]
        );

        assert!(matches!(post.like(u2.id), Err(DomainError::AlreadyLiked)));
        assert_eq!(post.likes.len(), 2);
    }

    #[test]
    fn unlike_requires_prior_like() {
        let mut post = Post::new(&actor("u1"), "hello").unwrap();
        let u2 = actor("u2");
        let u3 = actor("u3");
        post.like(u2.id).unwrap();

        assert!(matches!(post.unlike(u3.id), Err(DomainError::NotYetLiked)));
        // The unrelated entry survives the failed unlike.
        assert_eq!(post.likes, vec![Like { user_id: u2.id }]);
    }

    #[test]
    fn like_unlike_round_trip_restores_likes() {
        let mut post = Post::new(&actor("u1"), "hello").unwrap();
        let u2 = actor("u2");
        let u3 = actor("u3");
        let u4 = actor("u4");
        post.like(u2.id).unwrap();
        post.like(u3.id).unwrap();
        let before = post.likes.clone();

        post.like(u4.id).unwrap();
        post.unlike(u4.id).unwrap();

        assert_eq!(post.likes, before);
    }

    #[test]
    fn likes_never_contain_duplicates() {
        let mut post = Post::new(&actor("u1"), "hello").unwrap();
        let users: Vec<Actor> = (0..5).map(|i| actor(&format!("u{i}"))).collect();

        for user in &users {
            post.like(user.id).unwrap();
            let _ = post.like(user.id);
        }
        let _ = post.unlike(users[1].id);
        let _ = post.like(users[1].id);

        let mut seen: Vec<Uuid> = post.likes.iter().map(|l| l.user_id).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), post.likes.len());
    }

    #[test]
    fn add_comment_prepends_with_author_snapshot() {
        let mut post = Post::new(&actor("u1"), "hello").unwrap();
        let u2 = actor("u2");

        post.add_comment(&u2, "first").unwrap();
        post.add_comment(&u2, "second").unwrap();

        assert_eq!(post.comments.len(), 2);
        assert_eq!(post.comments[0].text, "second");
        assert_eq!(post.comments[1].text, "first");
        assert_eq!(post.comments[0].author_id, u2.id);
        assert_eq!(post.comments[0].author_name, "u2");
        assert_ne!(post.comments[0].id, post.comments[1].id);
    }

    #[test]
    fn add_comment_rejects_blank_text() {
        let mut post = Post::new(&actor("u1"), "hello").unwrap();
        assert!(matches!(
            post.add_comment(&actor("u2"), "  "),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(post.comments.is_empty());
    }

    #[test]
    fn delete_comment_checks_existence_before_ownership() {
        let mut post = Post::new(&actor("u1"), "hello").unwrap();
        let missing = Uuid::new_v4();
        assert!(matches!(
            post.delete_comment(missing, post.author_id),
            Err(DomainError::CommentNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn only_the_comment_author_may_delete_it() {
        let u1 = actor("u1");
        let u2 = actor("u2");
        let mut post = Post::new(&u1, "hello").unwrap();
        post.add_comment(&u2, "nice").unwrap();
        let comment_id = post.comments[0].id;

        // The post's author does not own the comment.
        assert!(matches!(
            post.delete_comment(comment_id, u1.id),
            Err(DomainError::Forbidden)
        ));
        assert_eq!(post.comments.len(), 1);

        post.delete_comment(comment_id, u2.id).unwrap();
        assert!(post.comments.is_empty());
    }

    #[test]
    fn delete_comment_removes_exactly_the_located_one() {
        let u1 = actor("u1");
        let u2 = actor("u2");
        let mut post = Post::new(&u1, "hello").unwrap();
        post.add_comment(&u1, "a").unwrap();
        post.add_comment(&u2, "b").unwrap();
        post.add_comment(&u1, "c").unwrap();
        let target = post.comments[1].id; // u2's comment

        post.delete_comment(target, u2.id).unwrap();

        let texts: Vec<&str> = post.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["c", "a"]);
    }

    #[test]
    fn only_the_post_author_may_delete_the_post() {
        let u1 = actor("u1");
        let u2 = actor("u2");
        let post = Post::new(&u1, "hello").unwrap();

        assert!(matches!(
            post.ensure_author(u2.id),
            Err(DomainError::Forbidden)
        ));
        assert!(post.ensure_author(u1.id).is_ok());
    }
}
