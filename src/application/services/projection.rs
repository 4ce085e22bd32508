//! Projection
//!
//! Turns stored aggregates into display DTOs. Every batch is resolved with one
//! user directory call and one repository call for the referenced originals.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::warn;

use crate::application::dto::{CommentView, OriginalPostView, PostView, UserSummary};
use crate::domain::{Comment, Post, PostRepository, UserDirectory, UserProfile};
use crate::shared::error::AppError;

/// Resolved user profiles for one projection batch.
#[derive(Default)]
pub struct ResolvedUsers(HashMap<i64, UserProfile>);

impl ResolvedUsers {
    /// Summary for `id`, or the placeholder identity when it no longer resolves.
    pub fn summary(&self, id: i64) -> UserSummary {
        self.0
            .get(&id)
            .cloned()
            .unwrap_or_else(|| UserProfile::deleted(id))
            .into()
    }
}

pub struct Projector<P, U>
where
    P: PostRepository,
    U: UserDirectory,
{
    post_repo: Arc<P>,
    user_directory: Arc<U>,
}

impl<P, U> Clone for Projector<P, U>
where
    P: PostRepository,
    U: UserDirectory,
{
    fn clone(&self) -> Self {
        Self {
            post_repo: Arc::clone(&self.post_repo),
            user_directory: Arc::clone(&self.user_directory),
        }
    }
}

impl<P, U> Projector<P, U>
where
    P: PostRepository,
    U: UserDirectory,
{
    pub fn new(post_repo: Arc<P>, user_directory: Arc<U>) -> Self {
        Self {
            post_repo,
            user_directory,
        }
    }

    /// Resolve a set of user ids in one directory call.
    pub async fn resolve_users(
        &self,
        ids: impl IntoIterator<Item = i64>,
    ) -> Result<ResolvedUsers, AppError> {
        let unique: Vec<i64> = ids.into_iter().collect::<HashSet<_>>().into_iter().collect();
        if unique.is_empty() {
            return Ok(ResolvedUsers(HashMap::new()));
        }
        Ok(ResolvedUsers(self.user_directory.resolve_many(&unique).await?))
    }

    pub async fn summarize_user(&self, id: i64) -> Result<UserSummary, AppError> {
        Ok(self.resolve_users([id]).await?.summary(id))
    }

    pub async fn project_post(&self, post: Post) -> Result<PostView, AppError> {
        self.project_posts(vec![post])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("projection dropped a post".into()))
    }

    /// Project a post whose write has already committed.
    ///
    /// Lookup failures degrade to placeholder identities and an unresolved
    /// original instead of failing the caller.
    pub async fn project_committed(&self, post: Post) -> PostView {
        match self.project_posts(vec![post.clone()]).await {
            Ok(mut views) => {
                if let Some(view) = views.pop() {
                    return view;
                }
            }
            Err(e) => {
                warn!(post_id = post.id, error_kind = e.kind(), error = %e, "Projecting committed post with placeholders");
            }
        }
        post_view(post, None, &ResolvedUsers::default())
    }

    /// Project posts in order, resolving originals one hop deep.
    pub async fn project_posts(&self, posts: Vec<Post>) -> Result<Vec<PostView>, AppError> {
        let original_ids: Vec<i64> = posts
            .iter()
            .filter_map(|post| post.original_post_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let originals: HashMap<i64, Post> = if original_ids.is_empty() {
            HashMap::new()
        } else {
            self.post_repo
                .find_many(&original_ids)
                .await?
                .into_iter()
                .map(|post| (post.id, post))
                .collect()
        };

        let user_ids = posts
            .iter()
            .flat_map(|post| {
                std::iter::once(post.author_id).chain(post.comments.iter().map(|c| c.author_id))
            })
            .chain(originals.values().map(|original| original.author_id))
            .collect::<Vec<_>>();
        let users = self.resolve_users(user_ids).await?;

        Ok(posts
            .into_iter()
            .map(|post| {
                let original = post
                    .original_post_id
                    .and_then(|id| originals.get(&id))
                    .map(|original| original_view(original, &users));
                post_view(post, original, &users)
            })
            .collect())
    }

    pub async fn project_comments(&self, comments: Vec<Comment>) -> Result<Vec<CommentView>, AppError> {
        let users = self
            .resolve_users(comments.iter().map(|c| c.author_id))
            .await?;
        Ok(comments
            .into_iter()
            .map(|comment| comment_view(comment, &users))
            .collect())
    }
}

fn comment_view(comment: Comment, users: &ResolvedUsers) -> CommentView {
    CommentView {
        id: comment.id,
        author: users.summary(comment.author_id),
        content: comment.content,
        created_at: comment.created_at,
    }
}

fn original_view(original: &Post, users: &ResolvedUsers) -> OriginalPostView {
    OriginalPostView {
        id: original.id,
        author: users.summary(original.author_id),
        content: original.content.clone(),
        image: original.image.clone(),
        like_count: original.likes.len(),
        retweet_count: original.retweets.len(),
        share_count: original.share_count,
        original_post_id: original.original_post_id,
        is_retweet: original.is_retweet,
        is_quote_retweet: original.is_quote_retweet,
        created_at: original.created_at,
    }
}

fn post_view(post: Post, original_post: Option<OriginalPostView>, users: &ResolvedUsers) -> PostView {
    PostView {
        id: post.id,
        author: users.summary(post.author_id),
        like_count: post.likes.len(),
        content: post.content,
        image: post.image,
        likes: post.likes,
        retweets: post.retweets,
        share_count: post.share_count,
        is_retweet: post.is_retweet,
        is_quote_retweet: post.is_quote_retweet,
        original_post_id: post.original_post_id,
        original_post,
        comments: post
            .comments
            .into_iter()
            .map(|comment| comment_view(comment, users))
            .collect(),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}
