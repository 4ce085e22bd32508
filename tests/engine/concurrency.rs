//! Concurrency Tests
//!
//! Many users racing on one post must never lose an update.

use std::collections::HashSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use social_engine::application::dto::CommentRequest;
use social_engine::application::services::InteractionService;
use social_engine::domain::PostRepository;

use crate::common::TestEngine;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_retweets_by_distinct_users() {
    let engine = Arc::new(TestEngine::new());
    let author = engine.user();
    let a = engine.user();
    let b = engine.user();
    let post = engine.post(&author, "race").await;
    let post_id = post.id;

    let tasks: Vec<_> = [a.id, b.id]
        .into_iter()
        .map(|user_id| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.services.interactions.toggle_retweet(post_id, user_id).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let original = engine.posts.find_by_id(post_id).await.unwrap().unwrap();
    let retweeters: HashSet<i64> = original.retweets.iter().copied().collect();
    assert_eq!(retweeters, HashSet::from([a.id, b.id]));
    assert_eq!(original.retweets.len(), 2);

    for user_id in [a.id, b.id] {
        assert!(engine.posts.find_simple_retweet(user_id, post_id).await.unwrap().is_some());
    }
    assert_eq!(engine.posts.len(), 3);
    assert_eq!(engine.inbox(&author).await.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_likes_by_many_users_are_all_kept() {
    let engine = Arc::new(TestEngine::new());
    let author = engine.user();
    let post = engine.post(&author, "viral").await;
    let post_id = post.id;
    let fans: Vec<i64> = (0..50).map(|_| engine.user().id).collect();

    let tasks: Vec<_> = fans
        .iter()
        .map(|&user_id| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.services.interactions.toggle_like(post_id, user_id).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stored = engine.posts.find_by_id(post_id).await.unwrap().unwrap();
    let likes: HashSet<i64> = stored.likes.iter().copied().collect();
    assert_eq!(stored.likes.len(), fans.len());
    assert_eq!(likes, fans.iter().copied().collect::<HashSet<_>>());
    assert_eq!(engine.inbox(&author).await.len(), fans.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_retweet_toggles_by_one_user_leave_consistent_state() {
    let engine = Arc::new(TestEngine::new());
    let author = engine.user();
    let fan = engine.user();
    let post = engine.post(&author, "flicker").await;
    let post_id = post.id;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let fan_id = fan.id;
            tokio::spawn(async move { engine.services.interactions.toggle_retweet(post_id, fan_id).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // an even number of toggles ends where it started
    let original = engine.posts.find_by_id(post_id).await.unwrap().unwrap();
    assert!(original.retweets.is_empty());
    assert!(engine.posts.find_simple_retweet(fan.id, post_id).await.unwrap().is_none());
    assert_eq!(engine.posts.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_comments_and_shares() {
    let engine = Arc::new(TestEngine::new());
    let author = engine.user();
    let post = engine.post(&author, "busy").await;
    let post_id = post.id;
    let commenters: Vec<i64> = (0..20).map(|_| engine.user().id).collect();

    let comment_tasks: Vec<_> = commenters
        .iter()
        .map(|&user_id| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .services
                    .interactions
                    .add_comment(post_id, user_id, CommentRequest { content: "me too".into() })
                    .await
            })
        })
        .collect();
    let share_tasks: Vec<_> = (0..20)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.services.interactions.increment_share_count(post_id).await })
        })
        .collect();

    for task in comment_tasks {
        task.await.unwrap().unwrap();
    }
    for task in share_tasks {
        task.await.unwrap().unwrap();
    }

    let stored = engine.posts.find_by_id(post_id).await.unwrap().unwrap();
    assert_eq!(stored.comments.len(), commenters.len());
    assert_eq!(stored.share_count, 20);
}
