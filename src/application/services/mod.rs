//! Application Services
//!
//! ## Available Services
//!
//! - **InteractionService**: likes, retweets, quotes, comments, shares, edits, deletes
//! - **NotificationService**: listing and read state of notifications
//! - **PostQueryService**: post and comment reads
//!
//! `NotificationFanout` and `Projector` are shared building blocks of the three.

pub mod interaction_service;
pub mod notification_fanout;
pub mod notification_service;
pub mod post_query_service;
pub mod projection;

pub use interaction_service::{InteractionError, InteractionService, InteractionServiceImpl};
pub use notification_fanout::{FanoutOutcome, NotificationDraft, NotificationFanout};
pub use notification_service::{NotificationError, NotificationService, NotificationServiceImpl};
pub use post_query_service::{PostQueryError, PostQueryService, PostQueryServiceImpl};
pub use projection::{Projector, ResolvedUsers};
