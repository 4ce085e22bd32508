//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! ## Available Repositories
//!
//! - **PgPostRepository** - Post aggregate with atomic engagement mutations
//! - **PgNotificationRepository** - Notification storage and read state
//! - **PgUserDirectory** - Read-only public profile lookups
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use social_engine::infrastructure::repositories::{
//!     PgNotificationRepository, PgPostRepository, PgUserDirectory,
//! };
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let posts = PgPostRepository::new(pool.clone());
//!     let notifications = PgNotificationRepository::new(pool.clone());
//!     let users = PgUserDirectory::new(pool);
//! }
//! ```

pub mod notification_repository;
pub mod post_repository;
pub mod user_directory;

pub use notification_repository::PgNotificationRepository;
pub use post_repository::PgPostRepository;
pub use user_directory::PgUserDirectory;
