//! # Domain Entities
//!
//! Core domain entities of the interaction engine.
//!
//! - **Post**: the aggregate root carrying likes, retweets, share count and
//!   embedded comments
//! - **Notification**: a best-effort record of an interaction for its recipient
//! - **UserProfile**: display identity resolved through the user directory
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access
//! operations. These traits are implemented in the infrastructure layer
//! (PostgreSQL and in-memory), following the dependency inversion principle.

mod notification;
mod post;
mod user;

pub use notification::{Notification, NotificationRepository, NotificationType};
pub use post::{
    Comment, CommentRemoval, LikeToggle, Post, PostRepository, RetweetToggle,
};
pub use user::{UserDirectory, UserProfile, DELETED_USERNAME};

#[cfg(test)]
pub use notification::MockNotificationRepository;
