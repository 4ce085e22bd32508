//! In-memory Post Repository
//!
//! Posts live in a `DashMap` arena addressed by id. Single-entry mutations
//! (likes, shares, comments, content) happen inside one entry guard.
//! Operations touching several entries (simple retweet create/delete, deleting
//! a simple retweet) run under the keyed lock of the original post.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::keyed_lock::{KeyedLocks, DEFAULT_LOCK_WAIT};
use crate::domain::{
    Comment, CommentRemoval, LikeToggle, Post, PostRepository, RetweetToggle,
};
use crate::shared::error::AppError;

pub struct InMemoryPostRepository {
    posts: DashMap<i64, Post>,
    /// (author, original) -> live simple retweet id
    ///
    /// An entry lives exactly as long as the retweet post it names. Deleting
    /// the original leaves the retweet (and its entry) in place until the
    /// retweet itself is deleted.
    simple_retweets: DashMap<(i64, i64), i64>,
    locks: KeyedLocks,
}

impl InMemoryPostRepository {
    pub fn new(lock_wait: Duration) -> Self {
        Self {
            posts: DashMap::new(),
            simple_retweets: DashMap::new(),
            locks: KeyedLocks::new(lock_wait),
        }
    }

    /// Number of stored posts.
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    fn newest_first(&self, filter: impl Fn(&Post) -> bool) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts
    }

    fn remove_from_retweets(&self, original_id: i64, user_id: i64) {
        if let Some(mut original) = self.posts.get_mut(&original_id) {
            original.retweets.retain(|&id| id != user_id);
        }
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WAIT)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, AppError> {
        Ok(self.posts.get(&id).map(|post| post.clone()))
    }

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<Post>, AppError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.posts.get(id).map(|post| post.clone()))
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Post>, AppError> {
        Ok(self.newest_first(|_| true))
    }

    async fn find_by_author(&self, author_id: i64) -> Result<Vec<Post>, AppError> {
        Ok(self.newest_first(|post| post.author_id == author_id))
    }

    async fn find_simple_retweet(
        &self,
        author_id: i64,
        original_post_id: i64,
    ) -> Result<Option<Post>, AppError> {
        let child_id = self
            .simple_retweets
            .get(&(author_id, original_post_id))
            .map(|entry| *entry.value());

        Ok(child_id.and_then(|id| self.posts.get(&id).map(|post| post.clone())))
    }

    async fn create(&self, post: &Post) -> Result<Post, AppError> {
        if post.is_retweet {
            return Err(AppError::Validation(
                "simple retweets are created through toggle_retweet".into(),
            ));
        }
        self.posts.insert(post.id, post.clone());
        Ok(post.clone())
    }

    async fn update_content(
        &self,
        id: i64,
        author_id: i64,
        content: &str,
    ) -> Result<Option<Post>, AppError> {
        let Some(mut post) = self.posts.get_mut(&id) else {
            return Ok(None);
        };
        if post.author_id != author_id || post.is_retweet {
            return Ok(None);
        }

        post.content = content.to_string();
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_owned(&self, id: i64, author_id: i64) -> Result<Option<Post>, AppError> {
        let target = self
            .posts
            .get(&id)
            .map(|post| (post.author_id, post.is_retweet, post.original_post_id));

        let Some((owner, is_retweet, original_post_id)) = target else {
            return Ok(None);
        };
        if owner != author_id {
            return Ok(None);
        }

        match original_post_id.filter(|_| is_retweet) {
            Some(original_id) => self.locks.with_lock(original_id, || {
                let Some((_, post)) = self.posts.remove_if(&id, |_, p| p.author_id == author_id)
                else {
                    return Ok(None);
                };
                self.simple_retweets
                    .remove_if(&(author_id, original_id), |_, child| *child == id);
                self.remove_from_retweets(original_id, author_id);
                Ok(Some(post))
            }),
            None => self.locks.with_lock(id, || {
                Ok(self
                    .posts
                    .remove_if(&id, |_, p| p.author_id == author_id)
                    .map(|(_, post)| post))
            }),
        }
    }

    async fn toggle_like(&self, id: i64, user_id: i64) -> Result<Option<LikeToggle>, AppError> {
        let Some(mut post) = self.posts.get_mut(&id) else {
            return Ok(None);
        };

        let liked = post.toggle_like(user_id);
        Ok(Some(LikeToggle {
            liked,
            author_id: post.author_id,
            likes: post.likes.clone(),
        }))
    }

    async fn toggle_retweet(
        &self,
        original_post_id: i64,
        user_id: i64,
        candidate: Post,
    ) -> Result<Option<RetweetToggle>, AppError> {
        self.locks.with_lock(original_post_id, || {
            let original_author_id = match self.posts.get(&original_post_id) {
                Some(original) => original.author_id,
                None => return Ok(None),
            };

            if let Some((_, retweet_id)) = self.simple_retweets.remove(&(user_id, original_post_id)) {
                self.posts.remove(&retweet_id);
                self.remove_from_retweets(original_post_id, user_id);
                return Ok(Some(RetweetToggle::Deleted { retweet_id }));
            }

            self.posts.insert(candidate.id, candidate.clone());
            self.simple_retweets
                .insert((user_id, original_post_id), candidate.id);
            if let Some(mut original) = self.posts.get_mut(&original_post_id) {
                if !original.is_retweeted_by(user_id) {
                    original.retweets.push(user_id);
                }
            }

            Ok(Some(RetweetToggle::Created {
                retweet: candidate,
                original_author_id,
            }))
        })
    }

    async fn increment_share_count(&self, id: i64) -> Result<Option<i64>, AppError> {
        Ok(self.posts.get_mut(&id).map(|mut post| {
            post.share_count += 1;
            post.share_count
        }))
    }

    async fn add_comment(&self, post_id: i64, comment: &Comment) -> Result<Option<Post>, AppError> {
        Ok(self.posts.get_mut(&post_id).map(|mut post| {
            post.comments.push(comment.clone());
            post.clone()
        }))
    }

    async fn remove_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        actor_id: i64,
    ) -> Result<CommentRemoval, AppError> {
        let Some(mut post) = self.posts.get_mut(&post_id) else {
            return Ok(CommentRemoval::PostMissing);
        };
        let Some(index) = post.comments.iter().position(|c| c.id == comment_id) else {
            return Ok(CommentRemoval::CommentMissing);
        };
        if !post.can_remove_comment(&post.comments[index], actor_id) {
            return Ok(CommentRemoval::Forbidden);
        }

        post.comments.remove(index);
        Ok(CommentRemoval::Removed)
    }
}
