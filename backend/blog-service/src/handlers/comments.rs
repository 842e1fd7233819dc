/// Comment handlers - HTTP endpoints for comment operations
use crate::error::{AppError, Result};
use crate::services::{CommentError, CreateComment};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

const COMMENT_NOT_FOUND: &str = "Comment not found";

/// Request body for deleting a comment
#[derive(Debug, Deserialize)]
pub struct DeleteCommentRequest {
    #[serde(rename = "CommentID")]
    pub comment_id: Option<String>,
    #[serde(rename = "PostID")]
    pub post_id: Option<String>,
}

fn map_comment_error(err: CommentError, internal: &'static str) -> AppError {
    match err {
        CommentError::Validation(msg) => AppError::bad_request(msg),
        CommentError::CommentNotFound(_) => AppError::not_found(COMMENT_NOT_FOUND),
        other => AppError::internal(internal, other),
    }
}

/// Create a comment and attach its summary to the post
pub async fn create_comment(
    state: web::Data<AppState>,
    req: web::Json<CreateComment>,
) -> Result<HttpResponse> {
    state
        .comments
        .create_comment(req.into_inner())
        .await
        .map_err(|e| map_comment_error(e, "Internal Server Error on comment"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "success"})))
}

/// Get the comments written by a user
pub async fn get_user_comments(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse> {
    // An id that is not a uuid cannot own any comment
    let Ok(user_id) = Uuid::parse_str(user_id.trim()) else {
        return Ok(HttpResponse::Ok().json(Vec::<crate::models::Comment>::new()));
    };

    let comments = state
        .comments
        .comments_by_author(user_id)
        .await
        .map_err(|e| map_comment_error(e, "Internal Server Error on get comments"))?;

    Ok(HttpResponse::Ok().json(comments))
}

/// Delete a comment and its summary
pub async fn delete_comment(
    state: web::Data<AppState>,
    req: web::Json<DeleteCommentRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();

    let comment_id = req
        .comment_id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id.trim()).ok())
        .ok_or_else(|| AppError::not_found(COMMENT_NOT_FOUND))?;
    let post_id = req
        .post_id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id.trim()).ok());

    state
        .comments
        .delete_comment(comment_id, post_id)
        .await
        .map_err(|e| map_comment_error(e, "Internal Server Error on delete comment"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "success"})))
}
