//! Post Repository Implementation
//!
//! PostgreSQL implementation of the post aggregate. Engagement arrays are
//! mutated with single-statement `array_append` / `array_remove` updates;
//! operations spanning two rows (simple retweets) lock the original row with
//! `SELECT ... FOR UPDATE` inside one transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use tracing::{debug, instrument};

use crate::domain::{
    Comment, CommentRemoval, LikeToggle, Post, PostRepository, RetweetToggle,
};
use crate::infrastructure::database::map_write_error;
use crate::shared::error::AppError;

const POST_COLUMNS: &str = "id, author_id, content, image, likes, retweets, share_count, \
     original_post_id, is_retweet, is_quote_retweet, created_at, updated_at";

/// PostgreSQL post repository implementation.
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    /// Creates a new PgPostRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load comments for a set of posts, grouped by post id in insertion order.
    async fn load_comments(&self, post_ids: &[i64]) -> Result<HashMap<i64, Vec<Comment>>, AppError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, post_id, author_id, content, created_at
            FROM post_comments
            WHERE post_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<Comment>> = HashMap::new();
        for row in rows {
            let post_id = row.post_id;
            grouped.entry(post_id).or_default().push(row.into_comment());
        }
        Ok(grouped)
    }

    /// Attach comments to a batch of post rows, preserving row order.
    async fn hydrate(&self, rows: Vec<PostRow>) -> Result<Vec<Post>, AppError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut comments = self.load_comments(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let post_comments = comments.remove(&row.id).unwrap_or_default();
                row.into_post(post_comments)
            })
            .collect())
    }

    async fn hydrate_one(&self, row: Option<PostRow>) -> Result<Option<Post>, AppError> {
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

/// Insert a post row through any executor (pool or open transaction).
async fn insert_post<'e, E>(executor: E, post: &Post) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO posts (
            id, author_id, content, image, likes, retweets, share_count,
            original_post_id, is_retweet, is_quote_retweet, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(post.id)
    .bind(post.author_id)
    .bind(&post.content)
    .bind(&post.image)
    .bind(&post.likes)
    .bind(&post.retweets)
    .bind(post.share_count)
    .bind(post.original_post_id)
    .bind(post.is_retweet)
    .bind(post.is_quote_retweet)
    .bind(post.created_at)
    .bind(post.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Internal row type for post queries.
#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    author_id: i64,
    content: String,
    image: Option<String>,
    likes: Vec<i64>,
    retweets: Vec<i64>,
    share_count: i64,
    original_post_id: Option<i64>,
    is_retweet: bool,
    is_quote_retweet: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self, comments: Vec<Comment>) -> Post {
        Post {
            id: self.id,
            author_id: self.author_id,
            content: self.content,
            image: self.image,
            likes: self.likes,
            retweets: self.retweets,
            share_count: self.share_count,
            original_post_id: self.original_post_id,
            is_retweet: self.is_retweet,
            is_quote_retweet: self.is_quote_retweet,
            comments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Internal row type for comment queries.
#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    content: String,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            author_id: self.author_id,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    #[instrument(skip(self), level = "debug")]
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, AppError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        self.hydrate_one(row).await
    }

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<Post>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    async fn find_all(&self) -> Result<Vec<Post>, AppError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    async fn find_by_author(&self, author_id: i64) -> Result<Vec<Post>, AppError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    async fn find_simple_retweet(
        &self,
        author_id: i64,
        original_post_id: i64,
    ) -> Result<Option<Post>, AppError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE author_id = $1 AND original_post_id = $2 AND is_retweet"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(author_id)
            .bind(original_post_id)
            .fetch_optional(&self.pool)
            .await?;

        self.hydrate_one(row).await
    }

    #[instrument(skip(self, post), fields(post_id = post.id), level = "debug")]
    async fn create(&self, post: &Post) -> Result<Post, AppError> {
        if post.is_retweet {
            return Err(AppError::Validation(
                "simple retweets are created through toggle_retweet".into(),
            ));
        }

        insert_post(&self.pool, post)
            .await
            .map_err(|e| map_write_error(e, "posts"))?;

        Ok(post.clone())
    }

    #[instrument(skip(self, content), level = "debug")]
    async fn update_content(
        &self,
        id: i64,
        author_id: i64,
        content: &str,
    ) -> Result<Option<Post>, AppError> {
        // Ownership is part of the predicate: a foreign post matches no row.
        let sql = format!(
            "UPDATE posts SET content = $3, updated_at = NOW() \
             WHERE id = $1 AND author_id = $2 AND NOT is_retweet \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(author_id)
            .bind(content)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "posts"))?;

        self.hydrate_one(row).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_owned(&self, id: i64, author_id: i64) -> Result<Option<Post>, AppError> {
        let mut tx = self.pool.begin().await?;

        let target: Option<(bool, Option<i64>)> = sqlx::query_as(
            "SELECT is_retweet, original_post_id FROM posts WHERE id = $1 AND author_id = $2",
        )
        .bind(id)
        .bind(author_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((is_retweet, original_post_id)) = target else {
            return Ok(None);
        };

        // Lock the original first, the same order toggle_retweet uses.
        let original = original_post_id.filter(|_| is_retweet);
        if let Some(original_id) = original {
            sqlx::query("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
                .bind(original_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_write_error(e, "posts"))?;
        }

        let comments = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, post_id, author_id, content, created_at
            FROM post_comments
            WHERE post_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let sql = format!(
            "DELETE FROM posts WHERE id = $1 AND author_id = $2 RETURNING {POST_COLUMNS}"
        );
        let deleted = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(author_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "posts"))?;

        let Some(row) = deleted else {
            return Ok(None);
        };

        if let Some(original_id) = original {
            sqlx::query("UPDATE posts SET retweets = array_remove(retweets, $2) WHERE id = $1")
                .bind(original_id)
                .bind(author_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_write_error(e, "posts"))?;
        }

        tx.commit().await.map_err(|e| map_write_error(e, "posts"))?;

        debug!(post_id = id, cascade_retweet = original.is_some(), "Post deleted");
        Ok(Some(row.into_post(
            comments.into_iter().map(CommentRow::into_comment).collect(),
        )))
    }

    #[instrument(skip(self), level = "debug")]
    async fn toggle_like(&self, id: i64, user_id: i64) -> Result<Option<LikeToggle>, AppError> {
        // RETURNING sees the row after the update, so `liked` reflects the new set.
        let row: Option<(bool, i64, Vec<i64>)> = sqlx::query_as(
            r#"
            UPDATE posts
            SET likes = CASE
                WHEN $2 = ANY(likes) THEN array_remove(likes, $2)
                ELSE array_append(likes, $2)
            END
            WHERE id = $1
            RETURNING ($2 = ANY(likes)) AS liked, author_id, likes
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "posts"))?;

        Ok(row.map(|(liked, author_id, likes)| LikeToggle {
            liked,
            author_id,
            likes,
        }))
    }

    #[instrument(skip(self, candidate), level = "debug")]
    async fn toggle_retweet(
        &self,
        original_post_id: i64,
        user_id: i64,
        candidate: Post,
    ) -> Result<Option<RetweetToggle>, AppError> {
        let mut tx = self.pool.begin().await?;

        let original: Option<(i64,)> =
            sqlx::query_as("SELECT author_id FROM posts WHERE id = $1 FOR UPDATE")
                .bind(original_post_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_write_error(e, "posts"))?;

        let Some((original_author_id,)) = original else {
            return Ok(None);
        };

        let removed: Option<(i64,)> = sqlx::query_as(
            r#"
            DELETE FROM posts
            WHERE author_id = $1 AND original_post_id = $2 AND is_retweet
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(original_post_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "posts"))?;

        if let Some((retweet_id,)) = removed {
            sqlx::query("UPDATE posts SET retweets = array_remove(retweets, $2) WHERE id = $1")
                .bind(original_post_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_write_error(e, "posts"))?;

            tx.commit().await.map_err(|e| map_write_error(e, "posts"))?;
            return Ok(Some(RetweetToggle::Deleted { retweet_id }));
        }

        insert_post(&mut *tx, &candidate)
            .await
            .map_err(|e| map_write_error(e, "posts"))?;

        sqlx::query(
            r#"
            UPDATE posts
            SET retweets = array_append(retweets, $2)
            WHERE id = $1 AND NOT ($2 = ANY(retweets))
            "#,
        )
        .bind(original_post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "posts"))?;

        tx.commit().await.map_err(|e| map_write_error(e, "posts"))?;

        Ok(Some(RetweetToggle::Created {
            retweet: candidate,
            original_author_id,
        }))
    }

    async fn increment_share_count(&self, id: i64) -> Result<Option<i64>, AppError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "UPDATE posts SET share_count = share_count + 1 WHERE id = $1 RETURNING share_count",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "posts"))?;

        Ok(row.map(|(count,)| count))
    }

    #[instrument(skip(self, comment), fields(comment_id = comment.id), level = "debug")]
    async fn add_comment(&self, post_id: i64, comment: &Comment) -> Result<Option<Post>, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO post_comments (id, post_id, author_id, content, created_at)
            SELECT $1, p.id, $3, $4, $5 FROM posts p WHERE p.id = $2
            "#,
        )
        .bind(comment.id)
        .bind(post_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => return Ok(None),
            Ok(_) => {}
            // The post was deleted between the SELECT and the insert
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => return Ok(None),
            Err(e) => return Err(map_write_error(e, "post_comments")),
        }

        self.find_by_id(post_id).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn remove_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        actor_id: i64,
    ) -> Result<CommentRemoval, AppError> {
        let authors: Option<(i64, Option<i64>)> = sqlx::query_as(
            r#"
            SELECT p.author_id, c.author_id
            FROM posts p
            LEFT JOIN post_comments c ON c.post_id = p.id AND c.id = $2
            WHERE p.id = $1
            "#,
        )
        .bind(post_id)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        let (post_author, comment_author) = match authors {
            None => return Ok(CommentRemoval::PostMissing),
            Some((_, None)) => return Ok(CommentRemoval::CommentMissing),
            Some((post_author, Some(comment_author))) => (post_author, comment_author),
        };

        // Authorship never changes, so the check cannot go stale before the delete.
        if comment_author != actor_id && post_author != actor_id {
            return Ok(CommentRemoval::Forbidden);
        }

        let result = sqlx::query("DELETE FROM post_comments WHERE id = $1 AND post_id = $2")
            .bind(comment_id)
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "post_comments"))?;

        if result.rows_affected() == 0 {
            return Ok(CommentRemoval::CommentMissing);
        }
        Ok(CommentRemoval::Removed)
    }
}
