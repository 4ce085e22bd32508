//! Post Query Service
//!
//! Read side of the post aggregate.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use super::projection::Projector;
use crate::application::dto::{CommentView, PostView};
use crate::domain::{PostRepository, UserDirectory};
use crate::shared::error::AppError;

/// Post query trait
#[async_trait]
pub trait PostQueryService: Send + Sync {
    /// One post with author, original and comments resolved
    async fn get_post(&self, post_id: i64) -> Result<PostView, PostQueryError>;

    /// Every post, newest first
    async fn list_posts(&self) -> Result<Vec<PostView>, PostQueryError>;

    /// Posts of the user with this username, newest first
    async fn list_posts_by_username(&self, username: &str) -> Result<Vec<PostView>, PostQueryError>;

    /// Comments of a post in the order they were written
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>, PostQueryError>;
}

/// Post query errors
#[derive(Debug, thiserror::Error)]
pub enum PostQueryError {
    #[error("Post not found")]
    PostNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for PostQueryError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(_) => Self::PostNotFound,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// PostQueryService implementation
pub struct PostQueryServiceImpl<P, U>
where
    P: PostRepository,
    U: UserDirectory,
{
    post_repo: Arc<P>,
    user_directory: Arc<U>,
    projector: Projector<P, U>,
}

impl<P, U> PostQueryServiceImpl<P, U>
where
    P: PostRepository,
    U: UserDirectory,
{
    pub fn new(post_repo: Arc<P>, user_directory: Arc<U>) -> Self {
        Self {
            projector: Projector::new(Arc::clone(&post_repo), Arc::clone(&user_directory)),
            post_repo,
            user_directory,
        }
    }
}

#[async_trait]
impl<P, U> PostQueryService for PostQueryServiceImpl<P, U>
where
    P: PostRepository + 'static,
    U: UserDirectory + 'static,
{
    #[instrument(skip(self))]
    async fn get_post(&self, post_id: i64) -> Result<PostView, PostQueryError> {
        let post = self
            .post_repo
            .find_by_id(post_id)
            .await?
            .ok_or(PostQueryError::PostNotFound)?;

        Ok(self.projector.project_post(post).await?)
    }

    async fn list_posts(&self) -> Result<Vec<PostView>, PostQueryError> {
        let posts = self.post_repo.find_all().await?;
        Ok(self.projector.project_posts(posts).await?)
    }

    #[instrument(skip(self))]
    async fn list_posts_by_username(&self, username: &str) -> Result<Vec<PostView>, PostQueryError> {
        let user = self
            .user_directory
            .resolve_by_username(username)
            .await?
            .ok_or(PostQueryError::UserNotFound)?;

        let posts = self.post_repo.find_by_author(user.id).await?;
        Ok(self.projector.project_posts(posts).await?)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>, PostQueryError> {
        let post = self
            .post_repo
            .find_by_id(post_id)
            .await?
            .ok_or(PostQueryError::PostNotFound)?;

        Ok(self.projector.project_comments(post.comments).await?)
    }
}
