//! PostgreSQL Repository Tests
//!
//! Run against a live database with
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use pretty_assertions::assert_eq;
use sqlx::PgPool;

use social_engine::domain::{
    Comment, CommentRemoval, Notification, NotificationRepository, NotificationType, Post,
    PostRepository, RetweetToggle,
};
use social_engine::infrastructure::database::{map_write_error, run_migrations};
use social_engine::infrastructure::repositories::{PgNotificationRepository, PgPostRepository};
use social_engine::shared::error::AppError;
use social_engine::shared::snowflake::SnowflakeGenerator;

/// One generator for the whole binary so ids never collide between tests
static IDS: Lazy<SnowflakeGenerator> = Lazy::new(SnowflakeGenerator::default);

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&url).await.expect("database should be reachable");
    run_migrations(&pool).await.expect("migrations should apply");
    pool
}

async fn seeded_post(repo: &PgPostRepository, author_id: i64) -> Post {
    repo.create(&Post::new(IDS.generate(), author_id, "original".into(), None))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_concurrent_likes_are_all_kept() {
    let repo = Arc::new(PgPostRepository::new(pool().await));
    let post = seeded_post(&repo, IDS.generate()).await;
    let post_id = post.id;
    let fans: Vec<i64> = (0..32).map(|_| IDS.generate()).collect();

    let tasks: Vec<_> = fans
        .iter()
        .map(|&user_id| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.toggle_like(post_id, user_id).await })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().unwrap().unwrap().liked);
    }

    let stored = repo.find_by_id(post_id).await.unwrap().unwrap();
    let likes: HashSet<i64> = stored.likes.iter().copied().collect();
    assert_eq!(stored.likes.len(), fans.len());
    assert_eq!(likes, fans.iter().copied().collect::<HashSet<_>>());

    let undone = repo.toggle_like(post_id, fans[0]).await.unwrap().unwrap();
    assert!(!undone.liked);
    assert_eq!(undone.likes.len(), fans.len() - 1);
    assert!(repo.toggle_like(IDS.generate(), fans[0]).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_retweet_toggle_keeps_row_and_set_in_step() {
    let repo = Arc::new(PgPostRepository::new(pool().await));
    let post = seeded_post(&repo, IDS.generate()).await;
    let post_id = post.id;
    let a = IDS.generate();
    let b = IDS.generate();

    let tasks: Vec<_> = [a, b]
        .into_iter()
        .map(|user_id| {
            let repo = Arc::clone(&repo);
            let candidate = Post::simple_retweet(IDS.generate(), user_id, post_id);
            tokio::spawn(async move { repo.toggle_retweet(post_id, user_id, candidate).await })
        })
        .collect();
    for task in tasks {
        let toggle = task.await.unwrap().unwrap().unwrap();
        assert!(matches!(toggle, RetweetToggle::Created { .. }));
    }

    let original = repo.find_by_id(post_id).await.unwrap().unwrap();
    assert_eq!(
        original.retweets.iter().copied().collect::<HashSet<_>>(),
        HashSet::from([a, b])
    );

    let child = repo.find_simple_retweet(a, post_id).await.unwrap().unwrap();
    let toggle = repo
        .toggle_retweet(post_id, a, Post::simple_retweet(IDS.generate(), a, post_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(toggle, RetweetToggle::Deleted { retweet_id: child.id });
    assert!(repo.find_simple_retweet(a, post_id).await.unwrap().is_none());

    // deleting a simple retweet directly also updates the original
    let child = repo.find_simple_retweet(b, post_id).await.unwrap().unwrap();
    assert_eq!(repo.delete_owned(child.id, b).await.unwrap().map(|p| p.id), Some(child.id));
    assert!(repo.find_by_id(post_id).await.unwrap().unwrap().retweets.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_racing_retweet_toggles_by_one_user() {
    let repo = Arc::new(PgPostRepository::new(pool().await));
    let post = seeded_post(&repo, IDS.generate()).await;
    let post_id = post.id;
    let fan = IDS.generate();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let candidate = Post::simple_retweet(IDS.generate(), fan, post_id);
            tokio::spawn(async move { repo.toggle_retweet(post_id, fan, candidate).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap().unwrap();
    }

    // an even number of toggles ends where it started
    assert!(repo.find_simple_retweet(fan, post_id).await.unwrap().is_none());
    assert!(repo.find_by_id(post_id).await.unwrap().unwrap().retweets.is_empty());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_second_simple_retweet_row_is_a_conflict() {
    let pool = pool().await;
    let repo = PgPostRepository::new(pool.clone());
    let post = seeded_post(&repo, IDS.generate()).await;
    let fan = IDS.generate();
    repo.toggle_retweet(post.id, fan, Post::simple_retweet(IDS.generate(), fan, post.id))
        .await
        .unwrap();

    let err = sqlx::query(
        "INSERT INTO posts (id, author_id, original_post_id, is_retweet) VALUES ($1, $2, $3, TRUE)",
    )
    .bind(IDS.generate())
    .bind(fan)
    .bind(post.id)
    .execute(&pool)
    .await
    .unwrap_err();

    assert!(matches!(map_write_error(err, "posts"), AppError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_comments_and_shares() {
    let repo = PgPostRepository::new(pool().await);
    let author = IDS.generate();
    let commenter = IDS.generate();
    let post = seeded_post(&repo, author).await;

    let comment = Comment::new(IDS.generate(), commenter, "first".into());
    let stored = repo.add_comment(post.id, &comment).await.unwrap().unwrap();
    assert_eq!(stored.comments.len(), 1);
    assert_eq!(stored.comments[0].id, comment.id);

    assert_eq!(
        repo.remove_comment(post.id, comment.id, IDS.generate()).await.unwrap(),
        CommentRemoval::Forbidden
    );
    assert_eq!(
        repo.remove_comment(post.id, comment.id, author).await.unwrap(),
        CommentRemoval::Removed
    );
    assert_eq!(
        repo.remove_comment(post.id, comment.id, author).await.unwrap(),
        CommentRemoval::CommentMissing
    );

    assert_eq!(repo.increment_share_count(post.id).await.unwrap(), Some(1));
    assert_eq!(repo.increment_share_count(post.id).await.unwrap(), Some(2));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_notification_read_state() {
    let repo = PgNotificationRepository::new(pool().await);
    let recipient = IDS.generate();
    let post_id = IDS.generate();

    for _ in 0..2 {
        let from = IDS.generate();
        let notification =
            Notification::new(IDS.generate(), recipient, from, NotificationType::Like, Some(post_id), None);
        let stored = repo.create(&notification).await.unwrap();
        assert_eq!(stored.notification_type, NotificationType::Like);
    }
    assert_eq!(repo.count_unread(recipient).await.unwrap(), 2);

    let inbox = repo.find_by_recipient(recipient).await.unwrap();
    assert!(repo.mark_read(inbox[0].id).await.unwrap());
    assert_eq!(repo.count_unread(recipient).await.unwrap(), 1);
    assert_eq!(repo.mark_all_read(recipient).await.unwrap(), 1);
    assert_eq!(repo.count_unread(recipient).await.unwrap(), 0);

    assert!(repo.delete(inbox[0].id).await.unwrap());
    assert!(!repo.delete(inbox[0].id).await.unwrap());

    let own = Notification::new(IDS.generate(), recipient, recipient, NotificationType::Like, Some(post_id), None);
    assert!(repo.create(&own).await.is_err());
}
