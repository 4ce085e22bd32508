//! In-memory Store
//!
//! `DashMap`-backed implementations of the repository traits for embedding
//! and tests. Same atomicity guarantees as the PostgreSQL repositories:
//!
//! ```text
//! toggle_like / shares / comments   -> one DashMap entry guard
//! toggle_retweet / delete retweet   -> keyed lock of the original post
//! ```

mod keyed_lock;
mod notification_store;
mod post_store;
mod user_directory;

pub use keyed_lock::{KeyedLocks, DEFAULT_LOCK_WAIT};
pub use notification_store::InMemoryNotificationRepository;
pub use post_store::InMemoryPostRepository;
pub use user_directory::InMemoryUserDirectory;
