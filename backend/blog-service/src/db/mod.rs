/// Database access layer
///
/// This module provides:
/// - Store traits for posts, comments and users (the seams the services depend on)
/// - PostgreSQL implementations of those traits
/// - Connection pooling and migrations
///
/// Every store call is bounded by the configured store timeout; a timeout
/// surfaces as `StoreError::Timeout` and is handled like any other failure.
pub mod comment_repo;
pub mod post_repo;
pub mod user_repo;

pub use comment_repo::PgCommentStore;
pub use post_repo::PgPostStore;
pub use user_repo::PgUserStore;

use crate::config::DatabaseConfig;
use crate::models::{Comment, CommentSummary, NewComment, NewPost, NewUser, Post, User};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Corrupt document: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn post_not_found(id: Uuid) -> Self {
        StoreError::NotFound { entity: "post", id }
    }

    pub fn comment_not_found(id: Uuid) -> Self {
        StoreError::NotFound { entity: "comment", id }
    }

    pub fn user_not_found(id: Uuid) -> Self {
        StoreError::NotFound { entity: "user", id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Canonical comment documents
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Insert a comment and return it with a fresh identity
    async fn create(&self, comment: NewComment) -> StoreResult<Comment>;

    /// Fails with `NotFound` if the id does not resolve
    async fn find_by_id(&self, comment_id: Uuid) -> StoreResult<Comment>;

    /// Comments written by a user, excluding ones being deleted; empty when there are none
    async fn find_by_author(&self, user_id: Uuid) -> StoreResult<Vec<Comment>>;

    /// Mark a comment as being deleted and return it.
    ///
    /// Repeating the mark keeps the first timestamp. Fails with `NotFound`
    /// if the id does not resolve.
    async fn mark_deleting(&self, comment_id: Uuid) -> StoreResult<Comment>;

    /// Fails with `NotFound` if the id does not resolve
    async fn delete_by_id(&self, comment_id: Uuid) -> StoreResult<()>;

    async fn list_all(&self) -> StoreResult<Vec<Comment>>;
}

/// Post documents and their embedded comment summaries
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create(&self, post: NewPost) -> StoreResult<Post>;

    /// Fails with `NotFound` if the id does not resolve
    async fn find_by_id(&self, post_id: Uuid) -> StoreResult<Post>;

    async fn list(&self) -> StoreResult<Vec<Post>>;

    async fn list_by_author(&self, user_id: Uuid) -> StoreResult<Vec<Post>>;

    /// Fails with `NotFound` if the id does not resolve
    async fn delete(&self, post_id: Uuid) -> StoreResult<()>;

    /// Atomically append a summary and return the new summary count.
    ///
    /// Fails with `NotFound` if the post does not resolve.
    async fn append_comment_summary(
        &self,
        post_id: Uuid,
        summary: &CommentSummary,
    ) -> StoreResult<usize>;

    /// Atomically remove every summary for `comment_id`.
    ///
    /// Returns whether anything was removed; an absent entry is not an error.
    /// Fails with `NotFound` only if the post itself does not resolve.
    async fn remove_comment_summary(&self, post_id: Uuid, comment_id: Uuid) -> StoreResult<bool>;

    /// Cheap round trip used by health checks
    async fn ping(&self) -> StoreResult<()>;
}

/// Account records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Fails with `NotFound` if the id does not resolve
    async fn find_by_id(&self, user_id: Uuid) -> StoreResult<User>;
}

/// Run a query under the store timeout
pub(crate) async fn timed<F, T>(limit: Duration, query: F) -> StoreResult<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, query).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

/// Create the PostgreSQL pool shared by all stores
pub async fn create_pool(config: &DatabaseConfig) -> std::result::Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_millis(config.store_timeout_ms))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        "Connected to PostgreSQL"
    );

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
