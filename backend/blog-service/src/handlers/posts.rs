/// Post handlers - HTTP endpoints for post operations
use crate::error::{AppError, Result};
use crate::models::Post;
use crate::services::media::check_content_type;
use crate::services::{CreatePost, ImageUpload, MediaError, PostError};
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use serde::Deserialize;
use uuid::Uuid;

const POST_NOT_FOUND: &str = "Post not found";
const PHOTO_FIELD: &str = "photo";
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct DeletePostRequest {
    pub id: Option<String>,
}

fn map_post_error(err: PostError, internal: &'static str) -> AppError {
    match err {
        PostError::Validation(msg) => AppError::bad_request(msg),
        PostError::NotFound(_) => AppError::not_found(POST_NOT_FOUND),
        PostError::Media(e @ (MediaError::InvalidType | MediaError::TooLarge { .. })) => {
            AppError::bad_request(e.to_string())
        }
        other => AppError::internal(internal, other),
    }
}

fn multipart_error(err: actix_multipart::MultipartError) -> AppError {
    tracing::debug!(error = %err, "malformed multipart body");
    AppError::bad_request(err.to_string())
}

/// Drain the multipart body into text fields and the (optional) photo.
///
/// Content type and size of the photo are enforced while streaming.
async fn read_post_form(
    mut payload: Multipart,
    max_upload_bytes: usize,
) -> Result<(CreatePost, Option<ImageUpload>)> {
    let mut form = CreatePost::default();
    let mut image = None;

    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == PHOTO_FIELD {
            let content_type = field
                .content_type()
                .map(|m| m.to_string())
                .unwrap_or_default();
            check_content_type(&content_type).map_err(|e| AppError::bad_request(e.to_string()))?;

            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .unwrap_or("upload")
                .to_string();

            let mut bytes = Vec::new();
            while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
                if bytes.len() + chunk.len() > max_upload_bytes {
                    let err = MediaError::TooLarge {
                        limit: max_upload_bytes,
                    };
                    return Err(AppError::bad_request(err.to_string()));
                }
                bytes.extend_from_slice(&chunk);
            }

            image = Some(ImageUpload {
                file_name,
                content_type,
                bytes,
            });
            continue;
        }

        let mut raw = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            if raw.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
                return Err(AppError::bad_request(format!("Field {} is too long", name)));
            }
            raw.extend_from_slice(&chunk);
        }
        let value = String::from_utf8_lossy(&raw).into_owned();

        match name.as_str() {
            "title" => form.title = Some(value),
            "discription" => form.description = Some(value),
            "user_id" => form.user_id = Some(value),
            "name" => form.name = Some(value),
            "username" => form.username = Some(value),
            "date" => form.date = Some(value),
            _ => {}
        }
    }

    Ok((form, image))
}

/// Create a post with an uploaded image
pub async fn create_post(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse> {
    let (form, image) = read_post_form(payload, state.max_upload_bytes).await?;

    state
        .posts
        .create_post(form, image)
        .await
        .map_err(|e| map_post_error(e, "Internal Server Error on create post"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "success"})))
}

/// Get every post
pub async fn get_all_posts(state: web::Data<AppState>) -> Result<HttpResponse> {
    let posts = state
        .posts
        .list_posts()
        .await
        .map_err(|e| map_post_error(e, "Internal Server Error on get all post"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "posts": posts })))
}

/// Get a single post
pub async fn get_post(state: web::Data<AppState>, post_id: web::Path<String>) -> Result<HttpResponse> {
    let post_id =
        Uuid::parse_str(post_id.trim()).map_err(|_| AppError::not_found(POST_NOT_FOUND))?;

    let post = state
        .posts
        .get_post(post_id)
        .await
        .map_err(|e| map_post_error(e, "Internal Server Error on get post"))?;

    Ok(HttpResponse::Ok().json(post))
}

/// Get the posts written by a user
pub async fn get_user_posts(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse> {
    let Ok(user_id) = Uuid::parse_str(user_id.trim()) else {
        return Ok(HttpResponse::Ok().json(Vec::<Post>::new()));
    };

    let posts = state
        .posts
        .posts_by_author(user_id)
        .await
        .map_err(|e| map_post_error(e, "Internal Server Error on get all user post"))?;

    Ok(HttpResponse::Ok().json(posts))
}

/// Delete a post
pub async fn delete_post(
    state: web::Data<AppState>,
    req: web::Json<DeletePostRequest>,
) -> Result<HttpResponse> {
    let post_id = req
        .id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id.trim()).ok())
        .ok_or_else(|| AppError::not_found(POST_NOT_FOUND))?;

    state
        .posts
        .delete_post(post_id)
        .await
        .map_err(|e| map_post_error(e, "Internal Server Error on delete post"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "success"})))
}
