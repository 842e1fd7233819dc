/// Request extractors
///
/// `SessionUser` decodes the session cookie into the caller's identity.
/// Extract it as `Result<SessionUser, SessionError>` to tell a missing
/// cookie apart from a rejected one.
use crate::security::Claims;
use crate::state::AppState;
use actix_web::{
    dev::Payload, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse, ResponseError,
};
use std::future::{ready, Ready};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No token found")]
    Missing,

    #[error("Invalid token")]
    Invalid,
}

impl ResponseError for SessionError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.to_string(),
        }))
    }
}

/// Identity carried by a valid session cookie
#[derive(Debug, Clone)]
pub struct SessionUser(pub Claims);

impl FromRequest for SessionUser {
    type Error = SessionError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(extract_session(req))
    }
}

fn extract_session(req: &HttpRequest) -> Result<SessionUser, SessionError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState not registered; cannot verify session");
        SessionError::Invalid
    })?;

    let cookie = req
        .cookie(&state.cookie.name)
        .filter(|c| !c.value().is_empty())
        .ok_or(SessionError::Missing)?;

    state
        .auth
        .tokens()
        .verify(cookie.value())
        .map(SessionUser)
        .map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            SessionError::Invalid
        })
}
