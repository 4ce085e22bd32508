//! Request DTOs
//!
//! Payloads accepted by the engine operations.

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::shared::validation::not_blank;

/// Maximum length of post and quote-retweet content, in characters
pub const MAX_POST_LENGTH: u64 = 5000;

/// Maximum length of comment content, in characters
pub const MAX_COMMENT_LENGTH: u64 = 2000;

/// Create post request
///
/// Blank content is allowed only when an image is attached; that rule spans
/// two fields and is checked by [`CreatePostRequest::check_has_body`].
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(max = 5000, message = "Content must be at most 5000 characters"))]
    pub content: Option<String>,

    pub image: Option<String>,

    /// Turns the post into a quote-retweet of this post
    pub original_post_id: Option<i64>,
}

impl CreatePostRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Trimmed content, empty when absent.
    pub fn content_text(&self) -> &str {
        self.content.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn check_has_body(&self) -> Result<(), ValidationError> {
        let has_image = self.image.as_deref().is_some_and(|uri| !uri.trim().is_empty());
        if self.content_text().is_empty() && !has_image {
            return not_blank("");
        }
        Ok(())
    }
}

/// Quote-retweet request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuoteRetweetRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 5000, message = "Content must be at most 5000 characters")
    )]
    pub content: String,
}

/// Update post request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 5000, message = "Content must be at most 5000 characters")
    )]
    pub content: String,
}

/// Add comment request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 2000, message = "Comment must be at most 2000 characters")
    )]
    pub content: String,
}
