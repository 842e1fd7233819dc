use super::{timed, StoreError, StoreResult, UserStore};
use crate::models::{NewUser, User};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, name, email, password_hash, post_ids, created_at";

/// User store backed by the `users` table
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let query = format!(
            r#"
            INSERT INTO users (username, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        );

        timed(
            self.timeout,
            sqlx::query_as::<_, User>(&query)
                .bind(&user.username)
                .bind(&user.name)
                .bind(&user.email)
                .bind(&user.password_hash)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");

        timed(
            self.timeout,
            sqlx::query_as::<_, User>(&query)
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn find_by_id(&self, user_id: Uuid) -> StoreResult<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        timed(
            self.timeout,
            sqlx::query_as::<_, User>(&query)
                .bind(user_id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| StoreError::user_not_found(user_id))
    }
}
