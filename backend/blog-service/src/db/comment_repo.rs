use super::{timed, CommentStore, StoreError, StoreResult};
use crate::models::{Comment, NewComment};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

const COMMENT_COLUMNS: &str =
    "id, comment, user_id, username, name, post_id, date, title, created_at, deleting_at";

/// Comment store backed by the `comments` table
#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgCommentStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn create(&self, comment: NewComment) -> StoreResult<Comment> {
        let query = format!(
            r#"
            INSERT INTO comments (comment, user_id, username, name, post_id, date, title)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COMMENT_COLUMNS}
            "#
        );

        timed(
            self.timeout,
            sqlx::query_as::<_, Comment>(&query)
                .bind(&comment.comment)
                .bind(comment.user_id)
                .bind(&comment.username)
                .bind(&comment.name)
                .bind(comment.post_id)
                .bind(&comment.date)
                .bind(&comment.title)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn find_by_id(&self, comment_id: Uuid) -> StoreResult<Comment> {
        let query = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");

        timed(
            self.timeout,
            sqlx::query_as::<_, Comment>(&query)
                .bind(comment_id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| StoreError::comment_not_found(comment_id))
    }

    async fn find_by_author(&self, user_id: Uuid) -> StoreResult<Vec<Comment>> {
        let query = format!(
            r#"
            SELECT {COMMENT_COLUMNS} FROM comments
            WHERE user_id = $1 AND deleting_at IS NULL
            ORDER BY created_at ASC
            "#
        );

        timed(
            self.timeout,
            sqlx::query_as::<_, Comment>(&query)
                .bind(user_id)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn mark_deleting(&self, comment_id: Uuid) -> StoreResult<Comment> {
        let query = format!(
            r#"
            UPDATE comments
            SET deleting_at = COALESCE(deleting_at, NOW())
            WHERE id = $1
            RETURNING {COMMENT_COLUMNS}
            "#
        );

        timed(
            self.timeout,
            sqlx::query_as::<_, Comment>(&query)
                .bind(comment_id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| StoreError::comment_not_found(comment_id))
    }

    async fn delete_by_id(&self, comment_id: Uuid) -> StoreResult<()> {
        let result = timed(
            self.timeout,
            sqlx::query("DELETE FROM comments WHERE id = $1")
                .bind(comment_id)
                .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::comment_not_found(comment_id));
        }

        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<Comment>> {
        let query = format!("SELECT {COMMENT_COLUMNS} FROM comments ORDER BY created_at ASC");

        timed(
            self.timeout,
            sqlx::query_as::<_, Comment>(&query).fetch_all(&self.pool),
        )
        .await
    }
}
