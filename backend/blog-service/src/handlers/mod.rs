/// HTTP handlers for blog-service
///
/// Paths and bodies match the routes existing clients already call:
/// - Auth: `/signup`, `/signin`, `/get-token`, `/logout`
/// - Posts: `/create-post`, `/get-all-posts`, `/get-post/{id}`, `/get-all-userPosts/{id}`, `/delete-post`
/// - Comments: `/comment-on-post`, `/comments/{id}`, `/delete-comment`
/// - AI: `/ai-discription`
pub mod ai;
pub mod auth;
pub mod comments;
pub mod health;
pub mod posts;

use crate::error::AppError;
use actix_web::web;

/// Register every route plus the JSON body error handler
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "rejected JSON body");
        AppError::bad_request("Invalid request body").into()
    }))
    .route("/health", web::get().to(health::health))
    .route("/health/live", web::get().to(health::liveness))
    .route("/metrics", web::get().to(crate::metrics::serve_metrics))
    .route("/signup", web::post().to(auth::signup))
    .route("/signin", web::post().to(auth::signin))
    .route("/get-token", web::get().to(auth::get_token))
    .route("/logout", web::get().to(auth::logout))
    .route("/create-post", web::post().to(posts::create_post))
    .route("/get-all-posts", web::get().to(posts::get_all_posts))
    .route("/get-post/{id}", web::get().to(posts::get_post))
    .route("/get-all-userPosts/{id}", web::get().to(posts::get_user_posts))
    .route("/delete-post", web::post().to(posts::delete_post))
    .route("/comment-on-post", web::post().to(comments::create_comment))
    .route("/comments/{id}", web::get().to(comments::get_user_comments))
    .route("/delete-comment", web::post().to(comments::delete_comment))
    .route("/ai-discription", web::post().to(ai::generate_description));
}
