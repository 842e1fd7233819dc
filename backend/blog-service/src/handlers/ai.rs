/// AI description handler
use crate::error::{AppError, Result};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DescriptionRequest {
    pub title: Option<String>,
}

/// Generate a description for a post title
pub async fn generate_description(
    state: web::Data<AppState>,
    req: web::Json<DescriptionRequest>,
) -> Result<HttpResponse> {
    let title = req
        .into_inner()
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Please add title"))?;

    let text = state
        .descriptions
        .describe(title.trim())
        .await
        .map_err(|e| AppError::internal("Internal Server Error on AI description", e))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": text })))
}
