//! Interaction Service
//!
//! Applies like, retweet, quote, comment, share, update and delete mutations
//! to posts. Each mutation is one atomic repository step; notifications are
//! emitted after it succeeded and never affect its result. Lookups that can
//! fail run before the step; projections after it degrade instead of failing.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};
use validator::Validate;

use super::notification_fanout::{NotificationDraft, NotificationFanout};
use super::projection::Projector;
use crate::application::dto::{
    CommentDeleted, CommentRequest, CreatePostRequest, LikeSummary, PostDeleted, PostView,
    QuoteRetweetRequest, RetweetOutcome, ShareCountView, UpdatePostRequest,
};
use crate::domain::{
    Comment, CommentRemoval, NotificationRepository, NotificationType, Post, PostRepository,
    RetweetToggle, UserDirectory,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;
use crate::shared::validation::validation_error;

/// Interaction service trait
#[async_trait]
pub trait InteractionService: Send + Sync {
    /// Publish a post, or a quote-retweet when `original_post_id` is set
    async fn create_post(&self, author_id: i64, request: CreatePostRequest) -> Result<PostView, InteractionError>;

    /// Like the post, or take the like back
    async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<LikeSummary, InteractionError>;

    /// Create the user's simple retweet of the post, or delete it
    async fn toggle_retweet(&self, post_id: i64, user_id: i64) -> Result<RetweetOutcome, InteractionError>;

    /// Quote the post with new content
    async fn create_quote_retweet(
        &self,
        post_id: i64,
        user_id: i64,
        request: QuoteRetweetRequest,
    ) -> Result<PostView, InteractionError>;

    /// Append a comment
    async fn add_comment(
        &self,
        post_id: i64,
        user_id: i64,
        request: CommentRequest,
    ) -> Result<PostView, InteractionError>;

    /// Remove a comment (comment author or post author only)
    async fn delete_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        user_id: i64,
    ) -> Result<CommentDeleted, InteractionError>;

    /// Replace the content of the user's own post
    async fn update_post(
        &self,
        post_id: i64,
        user_id: i64,
        request: UpdatePostRequest,
    ) -> Result<PostView, InteractionError>;

    /// Delete the user's own post
    async fn delete_post(&self, post_id: i64, user_id: i64) -> Result<PostDeleted, InteractionError>;

    /// Count one more share
    async fn increment_share_count(&self, post_id: i64) -> Result<ShareCountView, InteractionError>;
}

/// Interaction service errors
#[derive(Debug, thiserror::Error)]
pub enum InteractionError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl InteractionError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<AppError> for InteractionError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(what) => Self::NotFound(what),
            AppError::Unauthorized(msg) => Self::Unauthorized(msg),
            AppError::Validation(msg) => Self::Validation(msg),
            AppError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

fn post_not_found() -> InteractionError {
    InteractionError::NotFound("Post".into())
}

/// Record the outcome of an interaction.
fn observed<T>(kind: &'static str, result: Result<T, InteractionError>) -> Result<T, InteractionError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::record_interaction(kind, outcome);
    result
}

/// InteractionService implementation
pub struct InteractionServiceImpl<P, N, U>
where
    P: PostRepository,
    N: NotificationRepository,
    U: UserDirectory,
{
    post_repo: Arc<P>,
    fanout: NotificationFanout<N>,
    projector: Projector<P, U>,
    id_generator: Arc<SnowflakeGenerator>,
    conflict_retries: u32,
}

impl<P, N, U> InteractionServiceImpl<P, N, U>
where
    P: PostRepository,
    N: NotificationRepository,
    U: UserDirectory,
{
    pub fn new(
        post_repo: Arc<P>,
        notification_repo: Arc<N>,
        user_directory: Arc<U>,
        id_generator: Arc<SnowflakeGenerator>,
        conflict_retries: u32,
    ) -> Self {
        Self {
            projector: Projector::new(Arc::clone(&post_repo), user_directory),
            fanout: NotificationFanout::new(notification_repo, Arc::clone(&id_generator)),
            post_repo,
            id_generator,
            conflict_retries,
        }
    }

    /// Run a store step again while it fails with a concurrent-write conflict.
    async fn retrying<T, F, Fut>(&self, kind: &'static str, mut step: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, AppError>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            match step().await {
                Err(e) if e.is_conflict() && attempt < self.conflict_retries => {
                    attempt += 1;
                    debug!(kind, attempt, error = %e, "Retrying after conflict");
                    tokio::task::yield_now().await;
                }
                result => return result,
            }
        }
    }

    /// Store a quote-retweet of `original_post_id` and notify the original author.
    async fn publish_quote(
        &self,
        original_post_id: i64,
        author_id: i64,
        content: String,
        image: Option<String>,
    ) -> Result<PostView, InteractionError> {
        let original = self
            .post_repo
            .find_by_id(original_post_id)
            .await?
            .ok_or_else(|| InteractionError::NotFound("Original post".into()))?;

        let quote = Post::quote_retweet(
            self.id_generator.generate(),
            author_id,
            original.id,
            content,
            image,
        );
        let created = self.post_repo.create(&quote).await?;

        self.fanout
            .emit(NotificationDraft::new(original.author_id, author_id, NotificationType::Retweet).post(original.id))
            .await;

        info!(post_id = created.id, original_post_id, author_id, "Quote retweet created");
        Ok(self.projector.project_committed(created).await)
    }
}

#[async_trait]
impl<P, N, U> InteractionService for InteractionServiceImpl<P, N, U>
where
    P: PostRepository + 'static,
    N: NotificationRepository + 'static,
    U: UserDirectory + 'static,
{
    #[instrument(skip(self, request))]
    async fn create_post(&self, author_id: i64, request: CreatePostRequest) -> Result<PostView, InteractionError> {
        let result: Result<PostView, InteractionError> = async {
            request.validate().map_err(validation_error)?;
            request
                .check_has_body()
                .map_err(|_| InteractionError::Validation("content: must not be blank".into()))?;

            let content = if request.content_text().is_empty() {
                String::new()
            } else {
                request.content.clone().unwrap_or_default()
            };

            if let Some(original_post_id) = request.original_post_id {
                return self
                    .publish_quote(original_post_id, author_id, content, request.image.clone())
                    .await;
            }

            let post = Post::new(self.id_generator.generate(), author_id, content, request.image.clone());
            let created = self.post_repo.create(&post).await?;
            info!(post_id = created.id, author_id, "Post created");
            Ok(self.projector.project_committed(created).await)
        }
        .await;

        observed("create_post", result)
    }

    #[instrument(skip(self))]
    async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<LikeSummary, InteractionError> {
        let result: Result<LikeSummary, InteractionError> = async {
            let actor = self.projector.summarize_user(user_id).await?;
            let toggle = self
                .retrying("toggle_like", || self.post_repo.toggle_like(post_id, user_id))
                .await?
                .ok_or_else(post_not_found)?;

            if toggle.liked {
                self.fanout
                    .emit(NotificationDraft::new(toggle.author_id, user_id, NotificationType::Like).post(post_id))
                    .await;
            }

            Ok(LikeSummary {
                post_id,
                liked: toggle.liked,
                like_count: toggle.likes.len(),
                likes: toggle.likes,
                actor,
            })
        }
        .await;

        observed("toggle_like", result)
    }

    #[instrument(skip(self))]
    async fn toggle_retweet(&self, post_id: i64, user_id: i64) -> Result<RetweetOutcome, InteractionError> {
        let result: Result<RetweetOutcome, InteractionError> = async {
            let candidate = Post::simple_retweet(self.id_generator.generate(), user_id, post_id);
            let toggle = self
                .retrying("toggle_retweet", || {
                    self.post_repo.toggle_retweet(post_id, user_id, candidate.clone())
                })
                .await?
                .ok_or_else(post_not_found)?;

            match toggle {
                RetweetToggle::Created {
                    retweet,
                    original_author_id,
                } => {
                    self.fanout
                        .emit(
                            NotificationDraft::new(original_author_id, user_id, NotificationType::Retweet)
                                .post(post_id),
                        )
                        .await;
                    info!(retweet_id = retweet.id, post_id, user_id, "Retweet created");
                    let view = self.projector.project_committed(retweet).await;
                    Ok(RetweetOutcome::Created(Box::new(view)))
                }
                RetweetToggle::Deleted { retweet_id } => {
                    info!(retweet_id, post_id, user_id, "Retweet removed");
                    Ok(RetweetOutcome::Deleted { post_id: retweet_id })
                }
            }
        }
        .await;

        observed("toggle_retweet", result)
    }

    #[instrument(skip(self, request))]
    async fn create_quote_retweet(
        &self,
        post_id: i64,
        user_id: i64,
        request: QuoteRetweetRequest,
    ) -> Result<PostView, InteractionError> {
        let result: Result<PostView, InteractionError> = async {
            request.validate().map_err(validation_error)?;
            self.publish_quote(post_id, user_id, request.content, None).await
        }
        .await;

        observed("create_quote_retweet", result)
    }

    #[instrument(skip(self, request))]
    async fn add_comment(
        &self,
        post_id: i64,
        user_id: i64,
        request: CommentRequest,
    ) -> Result<PostView, InteractionError> {
        let result: Result<PostView, InteractionError> = async {
            request.validate().map_err(validation_error)?;

            let comment = Comment::new(self.id_generator.generate(), user_id, request.content);
            let post = self
                .retrying("add_comment", || self.post_repo.add_comment(post_id, &comment))
                .await?
                .ok_or_else(post_not_found)?;

            self.fanout
                .emit(
                    NotificationDraft::new(post.author_id, user_id, NotificationType::Comment)
                        .post(post_id)
                        .comment(comment.id),
                )
                .await;

            Ok(self.projector.project_committed(post).await)
        }
        .await;

        observed("add_comment", result)
    }

    #[instrument(skip(self))]
    async fn delete_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        user_id: i64,
    ) -> Result<CommentDeleted, InteractionError> {
        let result: Result<CommentDeleted, InteractionError> = async {
            let removal = self
                .retrying("delete_comment", || {
                    self.post_repo.remove_comment(post_id, comment_id, user_id)
                })
                .await?;

            match removal {
                CommentRemoval::Removed => Ok(CommentDeleted { post_id, comment_id }),
                CommentRemoval::PostMissing => Err(post_not_found()),
                CommentRemoval::CommentMissing => Err(InteractionError::NotFound("Comment".into())),
                CommentRemoval::Forbidden => Err(InteractionError::Unauthorized(
                    "only the comment author or the post author may delete a comment".into(),
                )),
            }
        }
        .await;

        observed("delete_comment", result)
    }

    #[instrument(skip(self, request))]
    async fn update_post(
        &self,
        post_id: i64,
        user_id: i64,
        request: UpdatePostRequest,
    ) -> Result<PostView, InteractionError> {
        let result: Result<PostView, InteractionError> = async {
            request.validate().map_err(validation_error)?;

            let post = self
                .retrying("update_post", || {
                    self.post_repo.update_content(post_id, user_id, &request.content)
                })
                .await?
                .ok_or_else(post_not_found)?;

            Ok(self.projector.project_committed(post).await)
        }
        .await;

        observed("update_post", result)
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, post_id: i64, user_id: i64) -> Result<PostDeleted, InteractionError> {
        let result: Result<PostDeleted, InteractionError> = async {
            let deleted = self
                .retrying("delete_post", || self.post_repo.delete_owned(post_id, user_id))
                .await?
                .ok_or_else(post_not_found)?;

            info!(post_id = deleted.id, user_id, "Post deleted");
            Ok(PostDeleted { post_id: deleted.id })
        }
        .await;

        observed("delete_post", result)
    }

    #[instrument(skip(self))]
    async fn increment_share_count(&self, post_id: i64) -> Result<ShareCountView, InteractionError> {
        let result: Result<ShareCountView, InteractionError> = async {
            let share_count = self
                .retrying("increment_share_count", || self.post_repo.increment_share_count(post_id))
                .await?
                .ok_or_else(post_not_found)?;

            Ok(ShareCountView { post_id, share_count })
        }
        .await;

        observed("increment_share_count", result)
    }
}
