//! Notification Tests

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use social_engine::application::dto::CommentRequest;
use social_engine::application::services::{
    InteractionService, InteractionServiceImpl, NotificationError, NotificationService,
};
use social_engine::domain::{Notification, NotificationRepository, NotificationType, PostRepository};
use social_engine::shared::error::AppError;
use social_engine::shared::snowflake::SnowflakeGenerator;

use crate::common::TestEngine;

/// Notification store that rejects every write
struct UnavailableNotifications;

#[async_trait]
impl NotificationRepository for UnavailableNotifications {
    async fn create(&self, _: &Notification) -> Result<Notification, AppError> {
        Err(AppError::Internal("notification store unavailable".into()))
    }

    async fn find_by_id(&self, _: i64) -> Result<Option<Notification>, AppError> {
        Ok(None)
    }

    async fn find_by_recipient(&self, _: i64) -> Result<Vec<Notification>, AppError> {
        Ok(Vec::new())
    }

    async fn count_unread(&self, _: i64) -> Result<i64, AppError> {
        Ok(0)
    }

    async fn mark_read(&self, _: i64) -> Result<bool, AppError> {
        Ok(false)
    }

    async fn mark_all_read(&self, _: i64) -> Result<u64, AppError> {
        Ok(0)
    }

    async fn delete(&self, _: i64) -> Result<bool, AppError> {
        Ok(false)
    }
}

#[tokio::test]
async fn test_first_like_notifies_once_and_revert_notifies_nothing() {
    let engine = TestEngine::new();
    let author = engine.user();
    let fan = engine.user();
    let post = engine.post(&author, "hello").await;

    engine.services.interactions.toggle_like(post.id, fan.id).await.unwrap();
    let inbox = engine.inbox(&author).await;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].notification_type, NotificationType::Like);
    assert_eq!(inbox[0].from_user_id, fan.id);
    assert_eq!(inbox[0].post_id, Some(post.id));

    engine.services.interactions.toggle_like(post.id, fan.id).await.unwrap();
    assert_eq!(engine.inbox(&author).await.len(), 1);
}

#[tokio::test]
async fn test_two_fans_like_scenario() {
    let engine = TestEngine::new();
    let author = engine.user();
    let a = engine.user();
    let b = engine.user();
    let post = engine.post(&author, "scenario").await;
    let interactions = &engine.services.interactions;

    let step = interactions.toggle_like(post.id, a.id).await.unwrap();
    assert_eq!(step.likes, vec![a.id]);
    assert_eq!(engine.notifications.len(), 1);

    let step = interactions.toggle_like(post.id, b.id).await.unwrap();
    assert_eq!(step.likes, vec![a.id, b.id]);
    assert_eq!(engine.notifications.len(), 2);

    let step = interactions.toggle_like(post.id, a.id).await.unwrap();
    assert_eq!(step.likes, vec![b.id]);
    assert_eq!(engine.notifications.len(), 2);

    let stored = engine.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.likes, vec![b.id]);
}

#[tokio::test]
async fn test_self_interactions_never_notify() {
    let engine = TestEngine::new();
    let author = engine.user();
    let post = engine.post(&author, "talking to myself").await;
    let interactions = &engine.services.interactions;

    interactions.toggle_like(post.id, author.id).await.unwrap();
    interactions.toggle_retweet(post.id, author.id).await.unwrap();
    interactions
        .add_comment(post.id, author.id, CommentRequest { content: "hm".into() })
        .await
        .unwrap();

    assert!(engine.notifications.is_empty());
}

#[tokio::test]
async fn test_comment_notification_references_comment() {
    let engine = TestEngine::new();
    let author = engine.user();
    let commenter = engine.user();
    let post = engine.post(&author, "thoughts?").await;

    let view = engine
        .services
        .interactions
        .add_comment(post.id, commenter.id, CommentRequest { content: "yes".into() })
        .await
        .unwrap();

    let inbox = engine.inbox(&author).await;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].notification_type, NotificationType::Comment);
    assert_eq!(inbox[0].comment_id, Some(view.comments[0].id));
}

#[tokio::test]
async fn test_retweet_removal_does_not_notify() {
    let engine = TestEngine::new();
    let author = engine.user();
    let fan = engine.user();
    let post = engine.post(&author, "share").await;

    engine.services.interactions.toggle_retweet(post.id, fan.id).await.unwrap();
    engine.services.interactions.toggle_retweet(post.id, fan.id).await.unwrap();

    let inbox = engine.inbox(&author).await;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].notification_type, NotificationType::Retweet);
}

#[tokio::test]
async fn test_failing_notification_store_never_fails_interaction() {
    let engine = TestEngine::new();
    let author = engine.user();
    let fan = engine.user();
    let post = engine.post(&author, "fragile").await;

    let interactions = InteractionServiceImpl::new(
        Arc::clone(&engine.posts),
        Arc::new(UnavailableNotifications),
        Arc::clone(&engine.users),
        Arc::new(SnowflakeGenerator::default()),
        0,
    );

    let summary = interactions.toggle_like(post.id, fan.id).await.unwrap();
    assert!(summary.liked);
    let view = interactions
        .add_comment(post.id, fan.id, CommentRequest { content: "still works".into() })
        .await
        .unwrap();
    assert_eq!(view.comments.len(), 1);
}

#[tokio::test]
async fn test_list_projects_sender_and_post() {
    let engine = TestEngine::new();
    let author = engine.user();
    let fan = engine.user();
    let post = engine.post(&author, "projected").await;

    engine.services.interactions.toggle_like(post.id, fan.id).await.unwrap();
    engine
        .services
        .interactions
        .add_comment(post.id, fan.id, CommentRequest { content: "nice".into() })
        .await
        .unwrap();

    let views = engine.services.notifications.list(author.id).await.unwrap();
    assert_eq!(views.len(), 2);
    // newest first
    assert_eq!(views[0].notification_type, NotificationType::Comment);
    assert_eq!(views[1].notification_type, NotificationType::Like);
    assert!(views.iter().all(|v| v.from_user.username == fan.username));
    assert!(views.iter().all(|v| v.post_content.as_deref() == Some("projected")));

    engine.services.interactions.delete_post(post.id, author.id).await.unwrap();
    let views = engine.services.notifications.list(author.id).await.unwrap();
    assert!(views.iter().all(|v| v.post_id == Some(post.id) && v.post_content.is_none()));
}

#[tokio::test]
async fn test_read_state_lifecycle() {
    let engine = TestEngine::new();
    let author = engine.user();
    let a = engine.user();
    let b = engine.user();
    let post = engine.post(&author, "popular").await;
    let notifications = &engine.services.notifications;

    engine.services.interactions.toggle_like(post.id, a.id).await.unwrap();
    engine.services.interactions.toggle_like(post.id, b.id).await.unwrap();
    assert_eq!(notifications.unread_count(author.id).await.unwrap().count, 2);

    let first = engine.inbox(&author).await[0].id;
    notifications.mark_read(first).await.unwrap();
    assert_eq!(notifications.unread_count(author.id).await.unwrap().count, 1);

    assert_eq!(notifications.mark_all_read(author.id).await.unwrap().updated, 1);
    assert_eq!(notifications.mark_all_read(author.id).await.unwrap().updated, 0);
    assert_eq!(notifications.unread_count(author.id).await.unwrap().count, 0);

    notifications.delete(first).await.unwrap();
    assert!(matches!(notifications.delete(first).await, Err(NotificationError::NotFound)));
    assert!(matches!(notifications.mark_read(first).await, Err(NotificationError::NotFound)));
    assert_eq!(engine.inbox(&author).await.len(), 1);
}
