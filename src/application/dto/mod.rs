//! Data Transfer Objects
//!
//! Request payloads and display projections.

pub mod request;
pub mod response;

pub use request::{
    CommentRequest, CreatePostRequest, QuoteRetweetRequest, UpdatePostRequest, MAX_COMMENT_LENGTH,
    MAX_POST_LENGTH,
};
pub use response::{
    CommentDeleted, CommentView, LikeSummary, MarkAllReadSummary, NotificationView,
    OriginalPostView, PostDeleted, PostView, RetweetOutcome, ShareCountView, UnreadCount,
    UserSummary,
};
