use crate::auth;
use crate::storage;
use crate::models::{LoginRequest, MessageResponse, Token, User, UserCreate, UserUpdate, now_unix};
use crate::server::AppState;
use crate::server::error::ApiError;
use crate::server::extract::{ApiJson, CurrentUser};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile).put(update_profile))
        .route("/auth/logout", post(logout))
}

async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UserCreate>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    body.validate().map_err(ApiError::Unprocessable)?;

    let user = state
        .storage
        .run(move |s| {
            if s.user_conflicts(Some(&body.email), Some(&body.username), None)? {
                return Ok(None);
            }
            let hashed = auth::hash_password(&body.password)?;
            // A concurrent signup can still win the race between check and insert.
            match s.create_user(&body, &hashed, now_unix()) {
                Ok(user) => Ok(Some(user)),
                Err(e) if storage::is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await?
        .ok_or_else(|| ApiError::bad_request("User with this email or username already exists"))?;

    tracing::info!(user_id = user.id, username = %user.username, "user signed up");
    Ok((StatusCode::CREATED, Json(user)))
}

enum LoginOutcome {
    BadCredentials,
    Inactive,
    Issued(String),
}

async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<Token>, ApiError> {
    let ttl_secs = state.token_ttl_minutes * 60;
    let outcome = state
        .storage
        .run(move |s| {
            let Some(user) = s.find_user_by_email(&body.email)? else {
                return Ok(LoginOutcome::BadCredentials);
            };
            if !auth::verify_password(&body.password, &user.hashed_password)? {
                return Ok(LoginOutcome::BadCredentials);
            }
            if !user.is_active {
                return Ok(LoginOutcome::Inactive);
            }

            let now = now_unix();
            let purged = s.purge_expired_sessions(now)?;
            if purged > 0 {
                tracing::debug!("purged {purged} expired sessions");
            }
            let token = auth::new_token();
            s.create_session(&token, user.id, now + ttl_secs, now)?;
            tracing::info!(user_id = user.id, "user logged in");
            Ok(LoginOutcome::Issued(token))
        })
        .await?;

    match outcome {
        LoginOutcome::Issued(access_token) => Ok(Json(Token {
            access_token,
            token_type: auth::TOKEN_TYPE.to_string(),
        })),
        LoginOutcome::BadCredentials => Err(ApiError::unauthorized("Incorrect email or password")),
        LoginOutcome::Inactive => Err(ApiError::bad_request("Inactive user")),
    }
}

async fn profile(current: CurrentUser) -> Json<User> {
    Json(current.user)
}

async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(update): ApiJson<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    update.validate().map_err(ApiError::Unprocessable)?;

    let mut user = current.user;
    let user = state
        .storage
        .run(move |s| {
            let touches_identity = update.email.is_some() || update.username.is_some();
            if touches_identity
                && s.user_conflicts(
                    update.email.as_deref(),
                    update.username.as_deref(),
                    Some(user.id),
                )?
            {
                return Ok(None);
            }

            if let Some(email) = update.email {
                user.email = email;
            }
            if let Some(username) = update.username {
                user.username = username;
            }
            if let Some(full_name) = update.full_name {
                user.full_name = Some(full_name);
            }
            user.updated_at = now_unix();
            match s.save_user(&user) {
                Ok(()) => Ok(Some(user)),
                Err(e) if storage::is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await?
        .ok_or_else(|| ApiError::bad_request("Email or username already exists"))?;

    Ok(Json(user))
}

async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = current.token;
    state.storage.run(move |s| s.delete_session(&token)).await?;
    tracing::info!(user_id = current.user.id, "user logged out");
    Ok(Json(MessageResponse::new("Successfully logged out")))
}
