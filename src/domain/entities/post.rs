//! Post aggregate, embedded comments and the repository trait.
//!
//! Maps to the `posts` and `post_comments` tables in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A comment embedded in a post.
///
/// Maps to the `post_comments` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - post_id: BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE
/// - author_id: BIGINT NOT NULL
/// - content: TEXT NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(id: i64, author_id: i64, content: String) -> Self {
        Self {
            id,
            author_id,
            content,
            created_at: Utc::now(),
        }
    }
}

/// The post aggregate root.
///
/// Maps to the `posts` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - author_id: BIGINT NOT NULL
/// - content: TEXT NOT NULL DEFAULT ''
/// - image: TEXT NULL (opaque URI produced by the upload subsystem)
/// - likes: BIGINT[] NOT NULL (ordered, unique user ids)
/// - retweets: BIGINT[] NOT NULL (authors of live simple retweets)
/// - share_count: BIGINT NOT NULL DEFAULT 0
/// - original_post_id: BIGINT NULL (no foreign key, originals may vanish)
/// - is_retweet / is_quote_retweet: BOOLEAN NOT NULL DEFAULT FALSE
/// - created_at / updated_at: TIMESTAMPTZ NOT NULL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Author user ID
    pub author_id: i64,

    /// Text content, empty for simple retweets and image-only posts
    pub content: String,

    /// Image URI
    pub image: Option<String>,

    /// Users who liked the post, in the order they liked it
    pub likes: Vec<i64>,

    /// Users holding a live simple retweet of this post
    pub retweets: Vec<i64>,

    /// Number of times the post was shared
    pub share_count: i64,

    /// The post this one retweets or quotes
    pub original_post_id: Option<i64>,

    /// Content-less reshare of `original_post_id`
    pub is_retweet: bool,

    /// Reshare of `original_post_id` with its own content
    pub is_quote_retweet: bool,

    /// Comments in insertion order
    pub comments: Vec<Comment>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a regular post.
    pub fn new(id: i64, author_id: i64, content: String, image: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            author_id,
            content,
            image,
            likes: Vec::new(),
            retweets: Vec::new(),
            share_count: 0,
            original_post_id: None,
            is_retweet: false,
            is_quote_retweet: false,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a content-less simple retweet of `original_post_id`.
    pub fn simple_retweet(id: i64, author_id: i64, original_post_id: i64) -> Self {
        Self {
            original_post_id: Some(original_post_id),
            is_retweet: true,
            ..Self::new(id, author_id, String::new(), None)
        }
    }

    /// Create a quote-retweet of `original_post_id`.
    pub fn quote_retweet(
        id: i64,
        author_id: i64,
        original_post_id: i64,
        content: String,
        image: Option<String>,
    ) -> Self {
        Self {
            original_post_id: Some(original_post_id),
            is_quote_retweet: true,
            ..Self::new(id, author_id, content, image)
        }
    }

    pub fn is_liked_by(&self, user_id: i64) -> bool {
        self.likes.contains(&user_id)
    }

    pub fn is_retweeted_by(&self, user_id: i64) -> bool {
        self.retweets.contains(&user_id)
    }

    pub fn find_comment(&self, comment_id: i64) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    /// A comment may be removed by its own author or by the post author.
    pub fn can_remove_comment(&self, comment: &Comment, user_id: i64) -> bool {
        comment.author_id == user_id || self.author_id == user_id
    }

    /// Flip `user_id` in the like set. Returns whether the user now likes the post.
    pub fn toggle_like(&mut self, user_id: i64) -> bool {
        toggle_member(&mut self.likes, user_id)
    }
}

/// Flip membership of `user_id` in an ordered set. Returns whether it is now present.
fn toggle_member(set: &mut Vec<i64>, user_id: i64) -> bool {
    match set.iter().position(|&id| id == user_id) {
        Some(index) => {
            set.remove(index);
            false
        }
        None => {
            set.push(user_id);
            true
        }
    }
}

/// Result of an atomic like toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeToggle {
    /// Whether the acting user likes the post after the toggle
    pub liked: bool,
    /// Author of the liked post (notification recipient)
    pub author_id: i64,
    /// Like set after the toggle
    pub likes: Vec<i64>,
}

/// Result of an atomic simple-retweet toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetweetToggle {
    /// A new simple retweet was stored
    Created {
        retweet: Post,
        original_author_id: i64,
    },
    /// The existing simple retweet was removed
    Deleted { retweet_id: i64 },
}

/// Result of a conditional comment removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentRemoval {
    Removed,
    PostMissing,
    CommentMissing,
    Forbidden,
}

/// Repository trait for Post data access operations.
///
/// Every mutating method is atomic with respect to concurrent callers on
/// the same post; implementations never expose a separate load/store pair.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Find a post by its Snowflake ID, comments included.
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, AppError>;

    /// Find several posts at once. Missing ids are skipped.
    async fn find_many(&self, ids: &[i64]) -> Result<Vec<Post>, AppError>;

    /// All posts, newest first.
    async fn find_all(&self) -> Result<Vec<Post>, AppError>;

    /// Posts written by `author_id`, newest first.
    async fn find_by_author(&self, author_id: i64) -> Result<Vec<Post>, AppError>;

    /// The live simple retweet of `original_post_id` by `author_id`, if any.
    async fn find_simple_retweet(
        &self,
        author_id: i64,
        original_post_id: i64,
    ) -> Result<Option<Post>, AppError>;

    /// Store a new regular post or quote-retweet.
    async fn create(&self, post: &Post) -> Result<Post, AppError>;

    /// Replace the content of a post owned by `author_id`.
    ///
    /// Returns None when the post is missing, owned by someone else, or a
    /// simple retweet.
    async fn update_content(
        &self,
        id: i64,
        author_id: i64,
        content: &str,
    ) -> Result<Option<Post>, AppError>;

    /// Delete a post owned by `author_id`.
    ///
    /// Deleting a simple retweet also removes its author from the original's
    /// retweet set. Returns None when the post is missing or foreign.
    async fn delete_owned(&self, id: i64, author_id: i64) -> Result<Option<Post>, AppError>;

    /// Add or remove `user_id` in the like set in one step.
    async fn toggle_like(&self, id: i64, user_id: i64) -> Result<Option<LikeToggle>, AppError>;

    /// Create or delete the simple retweet of `original_post_id` by `user_id`,
    /// keeping the original's retweet set in step. `candidate` is stored when
    /// no live retweet exists. Returns None when the original is missing.
    async fn toggle_retweet(
        &self,
        original_post_id: i64,
        user_id: i64,
        candidate: Post,
    ) -> Result<Option<RetweetToggle>, AppError>;

    /// Atomically increment the share counter. Returns the new count.
    async fn increment_share_count(&self, id: i64) -> Result<Option<i64>, AppError>;

    /// Append a comment. Returns the updated post, None when the post is missing.
    async fn add_comment(&self, post_id: i64, comment: &Comment) -> Result<Option<Post>, AppError>;

    /// Remove a comment if `actor_id` may remove it.
    async fn remove_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        actor_id: i64,
    ) -> Result<CommentRemoval, AppError>;
}
