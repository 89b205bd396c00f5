use super::AppState;
use super::error::ApiError;
use crate::auth;
use crate::models::{User, now_unix};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// `axum::Json` whose rejections render as [`ApiError`] bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// The account behind the request's bearer token.
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(auth::parse_bearer)
            .map(str::to_string)
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

        let lookup = token.clone();
        let user = state
            .storage
            .run(move |s| s.find_session_user(&lookup, now_unix()))
            .await?
            .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))?;

        Ok(Self { user, token })
    }
}
