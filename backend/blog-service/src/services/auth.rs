//! Account signup and signin

use crate::db::{StoreError, UserStore};
use crate::models::{generate_username, Clock, NewUser, User};
use crate::security::{hash_password, verify_password, PasswordError, TokenError, TokenIssuer};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid input")]
    InvalidInput,

    #[error("user already exists")]
    UserExists,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 4))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigninRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenIssuer,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenIssuer, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            tokens,
            clock,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Register an account with a generated username
    pub async fn signup(&self, request: SignupRequest) -> Result<User, AuthError> {
        request.validate().map_err(|_| AuthError::InvalidInput)?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let password_hash = hash_password(&request.password)?;
        let new_user = NewUser {
            username: generate_username(self.clock.now()),
            name: request.name,
            email: request.email,
            password_hash,
        };

        match self.users.create(new_user).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "user registered");
                Ok(user)
            }
            // Lost a race with a concurrent signup for the same email
            Err(StoreError::Conflict(_)) => Err(AuthError::UserExists),
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials and issue a session token
    pub async fn signin(&self, request: SigninRequest) -> Result<(User, String), AuthError> {
        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(&request.password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "signin rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user, self.clock.now())?;
        Ok((user, token))
    }
}
