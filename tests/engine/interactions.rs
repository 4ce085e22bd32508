//! Interaction Tests

use pretty_assertions::assert_eq;

use social_engine::application::dto::{
    CommentRequest, CreatePostRequest, QuoteRetweetRequest, RetweetOutcome, UpdatePostRequest,
};
use social_engine::application::services::{InteractionError, InteractionService, PostQueryService};
use social_engine::domain::PostRepository;

use crate::common::TestEngine;

#[tokio::test]
async fn test_like_twice_restores_like_set() {
    let engine = TestEngine::new();
    let author = engine.user();
    let fan = engine.user();
    let post = engine.post(&author, "hello").await;

    let liked = engine.services.interactions.toggle_like(post.id, fan.id).await.unwrap();
    assert!(liked.liked);
    assert_eq!(liked.likes, vec![fan.id]);
    assert_eq!(liked.like_count, 1);
    assert_eq!(liked.actor.username, fan.username);

    let unliked = engine.services.interactions.toggle_like(post.id, fan.id).await.unwrap();
    assert!(!unliked.liked);
    assert!(unliked.likes.is_empty());
    assert_eq!(unliked.like_count, 0);
}

#[tokio::test]
async fn test_like_missing_post_is_not_found() {
    let engine = TestEngine::new();
    let fan = engine.user();

    let err = engine.services.interactions.toggle_like(404, fan.id).await.unwrap_err();
    assert!(matches!(err, InteractionError::NotFound(_)));
}

#[tokio::test]
async fn test_retweet_toggle_cycle() {
    let engine = TestEngine::new();
    let author = engine.user();
    let fan = engine.user();
    let post = engine.post(&author, "worth sharing").await;
    let interactions = &engine.services.interactions;

    let first = interactions.toggle_retweet(post.id, fan.id).await.unwrap();
    let RetweetOutcome::Created(retweet) = first else {
        panic!("first toggle should create a retweet");
    };
    assert!(retweet.is_retweet);
    assert_eq!(retweet.original_post_id, Some(post.id));
    assert_eq!(retweet.original_post.as_ref().map(|o| o.id), Some(post.id));
    assert_eq!(engine.posts.find_by_id(post.id).await.unwrap().unwrap().retweets, vec![fan.id]);

    let second = interactions.toggle_retweet(post.id, fan.id).await.unwrap();
    match second {
        RetweetOutcome::Deleted { post_id } => assert_eq!(post_id, retweet.id),
        other => panic!("second toggle should delete, got {other:?}"),
    }
    assert!(engine.posts.find_by_id(retweet.id).await.unwrap().is_none());
    assert!(engine.posts.find_by_id(post.id).await.unwrap().unwrap().retweets.is_empty());

    let third = interactions.toggle_retweet(post.id, fan.id).await.unwrap();
    let RetweetOutcome::Created(again) = third else {
        panic!("third toggle should create again");
    };
    assert_ne!(again.id, retweet.id);
    assert_eq!(engine.posts.find_by_id(post.id).await.unwrap().unwrap().retweets, vec![fan.id]);
}

#[tokio::test]
async fn test_quote_retweets_never_deduplicate() {
    let engine = TestEngine::new();
    let author = engine.user();
    let fan = engine.user();
    let post = engine.post(&author, "quotable").await;

    let a = engine
        .services
        .interactions
        .create_quote_retweet(post.id, fan.id, QuoteRetweetRequest { content: "a".into() })
        .await
        .unwrap();
    let b = engine
        .services
        .interactions
        .create_quote_retweet(post.id, fan.id, QuoteRetweetRequest { content: "b".into() })
        .await
        .unwrap();

    assert_ne!(a.id, b.id);
    assert!(a.is_quote_retweet && b.is_quote_retweet);
    assert_eq!(b.original_post.map(|o| o.id), Some(post.id));
    // quotes are not simple retweets
    assert!(engine.posts.find_by_id(post.id).await.unwrap().unwrap().retweets.is_empty());
}

#[tokio::test]
async fn test_quote_requires_content_and_original() {
    let engine = TestEngine::new();
    let author = engine.user();
    let fan = engine.user();
    let post = engine.post(&author, "quotable").await;

    let blank = engine
        .services
        .interactions
        .create_quote_retweet(post.id, fan.id, QuoteRetweetRequest { content: "  ".into() })
        .await
        .unwrap_err();
    assert!(matches!(blank, InteractionError::Validation(_)));

    let missing = engine
        .services
        .interactions
        .create_quote_retweet(404, fan.id, QuoteRetweetRequest { content: "hm".into() })
        .await
        .unwrap_err();
    assert!(matches!(missing, InteractionError::NotFound(_)));
}

#[tokio::test]
async fn test_create_post_with_original_becomes_quote() {
    let engine = TestEngine::new();
    let author = engine.user();
    let fan = engine.user();
    let post = engine.post(&author, "original").await;

    let quote = engine
        .services
        .interactions
        .create_post(
            fan.id,
            CreatePostRequest {
                content: None,
                image: Some("https://cdn.example/cat.png".into()),
                original_post_id: Some(post.id),
            },
        )
        .await
        .unwrap();

    assert!(quote.is_quote_retweet);
    assert!(quote.content.is_empty());
    assert_eq!(quote.image.as_deref(), Some("https://cdn.example/cat.png"));
    assert_eq!(engine.inbox(&author).await.len(), 1);
}

#[tokio::test]
async fn test_create_post_without_body_is_rejected() {
    let engine = TestEngine::new();
    let author = engine.user();

    let err = engine
        .services
        .interactions
        .create_post(author.id, CreatePostRequest::text("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, InteractionError::Validation(_)));
    assert!(engine.posts.is_empty());
}

#[tokio::test]
async fn test_delete_comment_authorization() {
    let engine = TestEngine::new();
    let author = engine.user();
    let commenter = engine.user();
    let stranger = engine.user();
    let post = engine.post(&author, "discuss").await;
    let interactions = &engine.services.interactions;

    let first = interactions
        .add_comment(post.id, commenter.id, CommentRequest { content: "one".into() })
        .await
        .unwrap();
    let second = interactions
        .add_comment(post.id, commenter.id, CommentRequest { content: "two".into() })
        .await
        .unwrap();
    assert_eq!(second.comments.len(), 2);
    assert_eq!(second.comments[0].author.username, commenter.username);
    let first_id = first.comments[0].id;
    let second_id = second.comments[1].id;

    let err = interactions
        .delete_comment(post.id, first_id, stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, InteractionError::Unauthorized(_)));

    // the comment author may delete
    interactions.delete_comment(post.id, first_id, commenter.id).await.unwrap();
    // and so may the post author
    interactions.delete_comment(post.id, second_id, author.id).await.unwrap();

    let missing = interactions
        .delete_comment(post.id, first_id, author.id)
        .await
        .unwrap_err();
    assert!(matches!(missing, InteractionError::NotFound(_)));
    assert!(engine.services.posts.list_comments(post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_foreign_update_and_delete_look_like_missing_post() {
    let engine = TestEngine::new();
    let author = engine.user();
    let intruder = engine.user();
    let post = engine.post(&author, "mine").await;
    let interactions = &engine.services.interactions;

    let update = interactions
        .update_post(post.id, intruder.id, UpdatePostRequest { content: "yours".into() })
        .await
        .unwrap_err();
    assert!(matches!(update, InteractionError::NotFound(_)));

    let delete = interactions.delete_post(post.id, intruder.id).await.unwrap_err();
    assert!(matches!(delete, InteractionError::NotFound(_)));

    let updated = interactions
        .update_post(post.id, author.id, UpdatePostRequest { content: "edited".into() })
        .await
        .unwrap();
    assert_eq!(updated.content, "edited");

    let deleted = interactions.delete_post(post.id, author.id).await.unwrap();
    assert_eq!(deleted.post_id, post.id);
    assert!(engine.posts.find_by_id(post.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_simple_retweets_are_not_editable() {
    let engine = TestEngine::new();
    let author = engine.user();
    let fan = engine.user();
    let post = engine.post(&author, "original").await;

    let RetweetOutcome::Created(retweet) =
        engine.services.interactions.toggle_retweet(post.id, fan.id).await.unwrap()
    else {
        panic!("expected a new retweet");
    };

    let err = engine
        .services
        .interactions
        .update_post(retweet.id, fan.id, UpdatePostRequest { content: "text".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, InteractionError::NotFound(_)));
}

#[tokio::test]
async fn test_deleting_simple_retweet_updates_original_retweets() {
    let engine = TestEngine::new();
    let author = engine.user();
    let fan = engine.user();
    let post = engine.post(&author, "original").await;

    let RetweetOutcome::Created(retweet) =
        engine.services.interactions.toggle_retweet(post.id, fan.id).await.unwrap()
    else {
        panic!("expected a new retweet");
    };

    engine.services.interactions.delete_post(retweet.id, fan.id).await.unwrap();
    assert!(engine.posts.find_by_id(post.id).await.unwrap().unwrap().retweets.is_empty());

    // the next toggle creates instead of deleting a ghost
    let again = engine.services.interactions.toggle_retweet(post.id, fan.id).await.unwrap();
    assert!(matches!(again, RetweetOutcome::Created(_)));
}

#[tokio::test]
async fn test_deleting_original_keeps_children() {
    let engine = TestEngine::new();
    let author = engine.user();
    let fan = engine.user();
    let post = engine.post(&author, "original").await;

    let RetweetOutcome::Created(retweet) =
        engine.services.interactions.toggle_retweet(post.id, fan.id).await.unwrap()
    else {
        panic!("expected a new retweet");
    };
    engine.services.interactions.delete_post(post.id, author.id).await.unwrap();

    let view = engine.services.posts.get_post(retweet.id).await.unwrap();
    assert_eq!(view.original_post_id, Some(post.id));
    assert!(view.original_post.is_none());
}

#[tokio::test]
async fn test_share_count_increments() {
    let engine = TestEngine::new();
    let author = engine.user();
    let post = engine.post(&author, "share me").await;

    for expected in 1..=3 {
        let shares = engine.services.interactions.increment_share_count(post.id).await.unwrap();
        assert_eq!(shares.share_count, expected);
    }

    let err = engine.services.interactions.increment_share_count(404).await.unwrap_err();
    assert!(matches!(err, InteractionError::NotFound(_)));
    assert!(engine.inbox(&author).await.is_empty());
}
