//! Process-scoped services shared by every worker

use crate::config::AuthConfig;
use crate::db::{CommentStore, PostStore, UserStore};
use crate::models::Clock;
use crate::security::TokenIssuer;
use crate::services::{AuthService, CommentService, DescriptionGenerator, MediaUploader, PostService};
use std::sync::Arc;

/// The three stores, constructed once at startup
#[derive(Clone)]
pub struct Stores {
    pub comments: Arc<dyn CommentStore>,
    pub posts: Arc<dyn PostStore>,
    pub users: Arc<dyn UserStore>,
}

/// Session cookie attributes
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
    pub max_age_secs: i64,
}

impl From<&AuthConfig> for CookieSettings {
    fn from(config: &AuthConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            secure: config.secure_cookie,
            max_age_secs: config.token_ttl_secs,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub comments: CommentService,
    pub posts: PostService,
    pub auth: AuthService,
    pub descriptions: Arc<dyn DescriptionGenerator>,
    pub post_store: Arc<dyn PostStore>,
    pub cookie: CookieSettings,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        stores: Stores,
        media: Arc<dyn MediaUploader>,
        descriptions: Arc<dyn DescriptionGenerator>,
        clock: Arc<dyn Clock>,
        auth: &AuthConfig,
        max_upload_bytes: usize,
    ) -> Self {
        let tokens = TokenIssuer::new(&auth.jwt_secret, auth.token_ttl_secs);

        Self {
            comments: CommentService::new(stores.comments.clone(), stores.posts.clone()),
            posts: PostService::new(stores.posts.clone(), media),
            auth: AuthService::new(stores.users, tokens, clock),
            descriptions,
            post_store: stores.posts,
            cookie: CookieSettings::from(auth),
            max_upload_bytes,
        }
    }
}
