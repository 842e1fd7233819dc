/// Auth handlers - signup, signin and the session cookie
use crate::error::{AppError, Result};
use crate::middleware::{SessionError, SessionUser};
use crate::services::{AuthError, SigninRequest, SignupRequest};
use crate::state::{AppState, CookieSettings};
use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::{web, HttpResponse};

fn map_auth_error(err: AuthError, internal: &'static str) -> AppError {
    match err {
        AuthError::InvalidInput => AppError::bad_request(err.to_string()),
        AuthError::UserExists | AuthError::UserNotFound | AuthError::InvalidCredentials => {
            AppError::unauthorized(err.to_string())
        }
        other => AppError::internal(internal, other),
    }
}

fn session_cookie(settings: &CookieSettings, token: String) -> Cookie<'static> {
    Cookie::build(settings.name.clone(), token)
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .max_age(CookieDuration::seconds(settings.max_age_secs))
        .finish()
}

/// Register a new account
pub async fn signup(
    state: web::Data<AppState>,
    req: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    state
        .auth
        .signup(req.into_inner())
        .await
        .map_err(|e| map_auth_error(e, "Internal Server Error on signup"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "success"})))
}

/// Check credentials and set the session cookie
pub async fn signin(
    state: web::Data<AppState>,
    req: web::Json<SigninRequest>,
) -> Result<HttpResponse> {
    let (user, token) = state
        .auth
        .signin(req.into_inner())
        .await
        .map_err(|e| map_auth_error(e, "Internal Server Error on signin"))?;

    tracing::info!(user_id = %user.id, "user signed in");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&state.cookie, token))
        .json(serde_json::json!({"message": "success"})))
}

/// Return the decoded session, `null` when there is none
pub async fn get_token(session: std::result::Result<SessionUser, SessionError>) -> HttpResponse {
    match session {
        Ok(SessionUser(claims)) => HttpResponse::Ok().json(serde_json::json!({ "token": claims })),
        Err(SessionError::Missing) => {
            HttpResponse::Created().json(serde_json::json!({ "token": null }))
        }
        Err(e @ SessionError::Invalid) => {
            HttpResponse::Unauthorized().json(serde_json::json!({ "message": e.to_string() }))
        }
    }
}

/// Clear the session cookie
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    let mut cookie = Cookie::build(state.cookie.name.clone(), "")
        .path("/")
        .http_only(true)
        .secure(state.cookie.secure)
        .finish();
    cookie.make_removal();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(serde_json::json!({"message": "success"}))
}
