use super::{timed, PostStore, StoreError, StoreResult};
use crate::models::{CommentSummary, NewPost, Post};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

const POST_COLUMNS: &str =
    "id, title, description, user_id, name, username, date, image_id, comments, created_at";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    description: String,
    user_id: Uuid,
    name: String,
    username: String,
    date: String,
    image_id: String,
    comments: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = StoreError;

    fn try_from(row: PostRow) -> StoreResult<Self> {
        let comments: Vec<CommentSummary> = serde_json::from_value(row.comments)
            .map_err(|e| StoreError::Corrupt(format!("post {} comments: {}", row.id, e)))?;

        Ok(Post {
            id: row.id,
            title: row.title,
            description: row.description,
            user_id: row.user_id,
            name: row.name,
            username: row.username,
            date: row.date,
            image_id: row.image_id,
            comments,
            created_at: row.created_at,
        })
    }
}

fn into_posts(rows: Vec<PostRow>) -> StoreResult<Vec<Post>> {
    rows.into_iter().map(Post::try_from).collect()
}

/// Post store backed by the `posts` table.
///
/// The embedded summaries live in a JSONB array and are only ever changed
/// with single-statement updates, so concurrent appends and removals on
/// the same post serialize on the row lock instead of overwriting each other.
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgPostStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create(&self, post: NewPost) -> StoreResult<Post> {
        let query = format!(
            r#"
            INSERT INTO posts (title, description, user_id, name, username, date, image_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {POST_COLUMNS}
            "#
        );

        let row = timed(
            self.timeout,
            sqlx::query_as::<_, PostRow>(&query)
                .bind(&post.title)
                .bind(&post.description)
                .bind(post.user_id)
                .bind(&post.name)
                .bind(&post.username)
                .bind(&post.date)
                .bind(&post.image_id)
                .fetch_one(&self.pool),
        )
        .await?;

        Post::try_from(row)
    }

    async fn find_by_id(&self, post_id: Uuid) -> StoreResult<Post> {
        let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");

        let row = timed(
            self.timeout,
            sqlx::query_as::<_, PostRow>(&query)
                .bind(post_id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| StoreError::post_not_found(post_id))?;

        Post::try_from(row)
    }

    async fn list(&self) -> StoreResult<Vec<Post>> {
        let query = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY created_at ASC");

        let rows = timed(
            self.timeout,
            sqlx::query_as::<_, PostRow>(&query).fetch_all(&self.pool),
        )
        .await?;

        into_posts(rows)
    }

    async fn list_by_author(&self, user_id: Uuid) -> StoreResult<Vec<Post>> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE user_id = $1 ORDER BY created_at ASC"
        );

        let rows = timed(
            self.timeout,
            sqlx::query_as::<_, PostRow>(&query)
                .bind(user_id)
                .fetch_all(&self.pool),
        )
        .await?;

        into_posts(rows)
    }

    async fn delete(&self, post_id: Uuid) -> StoreResult<()> {
        let result = timed(
            self.timeout,
            sqlx::query("DELETE FROM posts WHERE id = $1")
                .bind(post_id)
                .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::post_not_found(post_id));
        }

        Ok(())
    }

    async fn append_comment_summary(
        &self,
        post_id: Uuid,
        summary: &CommentSummary,
    ) -> StoreResult<usize> {
        let count: Option<i32> = timed(
            self.timeout,
            sqlx::query_scalar(
                r#"
                UPDATE posts
                SET comments = comments || jsonb_build_array($2::jsonb)
                WHERE id = $1
                RETURNING jsonb_array_length(comments)
                "#,
            )
            .bind(post_id)
            .bind(Json(summary))
            .fetch_optional(&self.pool),
        )
        .await?;

        count
            .map(|c| c as usize)
            .ok_or_else(|| StoreError::post_not_found(post_id))
    }

    async fn remove_comment_summary(&self, post_id: Uuid, comment_id: Uuid) -> StoreResult<bool> {
        // The CTE locks the row so the removed count is computed against
        // the same version the UPDATE rewrites.
        let removed: Option<i32> = timed(
            self.timeout,
            sqlx::query_scalar(
                r#"
                WITH target AS (
                    SELECT id, comments FROM posts WHERE id = $1 FOR UPDATE
                ),
                updated AS (
                    UPDATE posts p
                    SET comments = COALESCE(
                        (
                            SELECT jsonb_agg(e.elem ORDER BY e.ord)
                            FROM jsonb_array_elements(t.comments) WITH ORDINALITY AS e(elem, ord)
                            WHERE e.elem->>'commentID' IS DISTINCT FROM $2::text
                        ),
                        '[]'::jsonb
                    )
                    FROM target t
                    WHERE p.id = t.id
                    RETURNING jsonb_array_length(t.comments) - jsonb_array_length(p.comments) AS removed
                )
                SELECT removed FROM updated
                "#,
            )
            .bind(post_id)
            .bind(comment_id.to_string())
            .fetch_optional(&self.pool),
        )
        .await?;

        match removed {
            Some(n) => Ok(n > 0),
            None => Err(StoreError::post_not_found(post_id)),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        timed(
            self.timeout,
            sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool),
        )
        .await
        .map(|_| ())
    }
}
